//! cache_cleanup tool implementation.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use urlvault_core::cache::CleanupOptions;
use urlvault_core::{AppConfig, CacheDb, Error};

/// Parameters for the cache_cleanup tool. Unset fields use the configured
/// defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheCleanupParams {
    /// Remove entries whose TTL has elapsed (default true).
    #[serde(default)]
    pub remove_expired: Option<bool>,

    /// Remove failed entries past the retention window (default true).
    #[serde(default)]
    pub remove_failed: Option<bool>,

    /// Retention window for failed entries in days.
    #[serde(default)]
    pub older_than_days: Option<i64>,

    /// Size bound to enforce after removals.
    #[serde(default)]
    pub max_entries: Option<usize>,
}

fn to_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Implementation of the cache_cleanup tool.
pub async fn cleanup_impl(
    cache: &CacheDb, config: &AppConfig, params: CacheCleanupParams,
) -> Result<CallToolResult, McpError> {
    let options = CleanupOptions {
        remove_expired: params.remove_expired.unwrap_or(true),
        remove_failed: params.remove_failed.unwrap_or(true),
        older_than_days: params.older_than_days.unwrap_or(config.failed_retention_days),
        max_entries: params.max_entries.unwrap_or(config.max_cache_size),
    };

    let report = cache.cleanup(options).await.map_err(McpError::from)?;
    to_result(&report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use urlvault_core::cache::{EntryUpdate, ProcessingStatus};

    fn output_json(result: &CallToolResult) -> serde_json::Value {
        let content = serde_json::to_value(&result.content[0]).unwrap();
        let text = content.get("text").and_then(|v| v.as_str()).unwrap();
        serde_json::from_str(text).unwrap()
    }

    #[tokio::test]
    async fn test_cleanup_removes_expired() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let config = AppConfig::default();

        cache
            .upsert_entry(
                "https://example.com/old",
                EntryUpdate {
                    processing_status: Some(ProcessingStatus::Completed),
                    ttl_hours: Some(-1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let result = cleanup_impl(&cache, &config, CacheCleanupParams::default())
            .await
            .unwrap();
        let output = output_json(&result);
        assert_eq!(output["expired_removed"], 1);
        assert_eq!(output["remaining_entries"], 0);
    }

    #[tokio::test]
    async fn test_cleanup_enforces_size_bound() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let config = AppConfig::default();

        for i in 0..4 {
            cache
                .upsert_entry(
                    &format!("https://example.com/{i}"),
                    EntryUpdate { processing_status: Some(ProcessingStatus::Completed), ..Default::default() },
                )
                .await
                .unwrap();
        }

        let params = CacheCleanupParams { max_entries: Some(2), ..Default::default() };
        let result = cleanup_impl(&cache, &config, params).await.unwrap();
        let output = output_json(&result);
        assert_eq!(output["evicted"], 2);
        assert_eq!(output["remaining_entries"], 2);
    }
}
