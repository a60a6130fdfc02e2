//! SQLite-backed cache for processed URL content.
//!
//! This module provides a persistent URL content cache using SQLite with
//! async access via tokio-rusqlite. It supports:
//!
//! - Deterministic SHA-256 keys over normalized URLs
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - TTL expiry, failed-entry retention, and size-bounded eviction
//! - Process-local hit/miss accounting

pub mod connection;
pub mod entries;
pub mod hash;
pub mod metadata;
pub mod metrics;
pub mod migrations;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{
    CacheEntry, CleanupOptions, CleanupReport, EntryPage, EntryUpdate, ListQuery, PreloadReport, ProcessingStatus,
    SortColumn, SortOrder,
};
pub use metadata::PageMetadata;
pub use metrics::{CacheMetrics, DomainCount, StatusDistribution};
