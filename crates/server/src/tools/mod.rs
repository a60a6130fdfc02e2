//! MCP tool implementations.
//!
//! This module contains all tools exposed by the urlvault server.

pub mod cache;
pub mod process;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Placeholder parameter type for tools that take no input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct EmptyParams {}

pub use process::{ProcessBatchParams, ProcessUrlParams};
