//! Core types and shared functionality for urlvault.
//!
//! This crate provides:
//! - URL cache store with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheEntry, PageMetadata, ProcessingStatus};
pub use config::AppConfig;
pub use error::Error;
