//! cache_get and cache_remove tool implementations.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use urlvault_client::validate;
use urlvault_core::{CacheDb, CacheEntry, Error};

/// Parameters for the cache_get tool. Exactly one of `hash` or `url` must
/// be set.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// The hash of the entry to retrieve.
    #[serde(default)]
    pub hash: Option<String>,

    /// The URL of the entry to retrieve; it is normalized before lookup.
    #[serde(default)]
    pub url: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub entry: CacheEntry,
}

/// Parameters for the cache_remove tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheRemoveParams {
    /// The URL whose entry should be removed; it is normalized first.
    pub url: String,
}

/// Output from the cache_remove tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheRemoveOutput {
    pub removed: bool,
}

fn to_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Implementation of the cache_get tool.
pub async fn get_impl(cache: &CacheDb, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let entry = match (params.hash, params.url) {
        (Some(hash), None) => cache
            .get_entry(&hash)
            .await
            .map_err(McpError::from)?
            .ok_or_else(|| Error::CacheMiss(hash))?,
        (None, Some(url)) => {
            let validation = validate(&url).map_err(McpError::from)?;
            cache
                .get_entry_by_url(&validation.normalized_url)
                .await
                .map_err(McpError::from)?
                .ok_or_else(|| Error::CacheMiss(url))?
        }
        _ => return Err(Error::InvalidInput("exactly one of hash or url must be provided".into()).into()),
    };

    to_result(&CacheGetOutput { entry })
}

/// Implementation of the cache_remove tool.
pub async fn remove_impl(cache: &CacheDb, params: CacheRemoveParams) -> Result<CallToolResult, McpError> {
    let validation = validate(&params.url).map_err(McpError::from)?;
    let removed = cache
        .remove_entry(&validation.normalized_url)
        .await
        .map_err(McpError::from)?;

    if !removed {
        return Err(Error::CacheMiss(params.url).into());
    }

    to_result(&CacheRemoveOutput { removed })
}
