//! cache_metrics and cache_metrics_reset tool implementations.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use urlvault_core::{CacheDb, Error};

/// Output from the cache_metrics_reset tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MetricsResetOutput {
    pub message: String,
}

fn to_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Implementation of the cache_metrics tool.
pub async fn metrics_impl(cache: &CacheDb) -> Result<CallToolResult, McpError> {
    let metrics = cache.metrics().await.map_err(McpError::from)?;
    to_result(&metrics)
}

/// Implementation of the cache_metrics_reset tool.
pub async fn metrics_reset_impl(cache: &CacheDb) -> Result<CallToolResult, McpError> {
    cache.reset_metrics();
    to_result(&MetricsResetOutput { message: "cache metrics reset".into() })
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
    async fn test_metrics_roundtrip() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let entry = cache
            .upsert_entry(
                "https://example.com/",
                EntryUpdate {
                    content: Some("body".into()),
                    processing_status: Some(ProcessingStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        cache.get_entry(&entry.url_hash).await.unwrap();

        let result = metrics_impl(&cache).await.unwrap();
        let output = output_json(&result);
        assert_eq!(output["total_entries"], 1);
        assert_eq!(output["hit_rate"], 100.0);
    }

    #[tokio::test]
    async fn test_metrics_reset() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        cache.get_entry("missing").await.unwrap();

        metrics_reset_impl(&cache).await.unwrap();

        let result = metrics_impl(&cache).await.unwrap();
        let output = output_json(&result);
        assert_eq!(output["miss_rate"], 0.0);
    }
}
