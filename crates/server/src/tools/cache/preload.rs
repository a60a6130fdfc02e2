//! cache_preload and cache_bulk_status tool implementations.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use urlvault_client::validate_batch;
use urlvault_core::cache::ProcessingStatus;
use urlvault_core::{AppConfig, CacheDb, Error};

/// Largest preload batch accepted in one call.
const MAX_PRELOAD_URLS: usize = 100;

/// Parameters for the cache_preload tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePreloadParams {
    /// URLs to queue as pending placeholders.
    pub urls: Vec<String>,
}

/// Parameters for the cache_bulk_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheBulkStatusParams {
    /// Hashes of the entries to update.
    pub url_hashes: Vec<String>,

    /// Status to apply to every listed entry.
    pub status: ProcessingStatus,
}

/// Output from the cache_bulk_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BulkStatusOutput {
    pub updated: u64,
}

fn to_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Implementation of the cache_preload tool.
///
/// URLs are validated and normalized first; invalid entries count as
/// per-URL failures without aborting the batch.
pub async fn preload_impl(
    cache: &CacheDb, config: &AppConfig, params: CachePreloadParams,
) -> Result<CallToolResult, McpError> {
    if params.urls.is_empty() {
        return Err(Error::InvalidInput("urls cannot be empty".into()).into());
    }
    if params.urls.len() > MAX_PRELOAD_URLS {
        return Err(Error::InvalidInput(format!("maximum {MAX_PRELOAD_URLS} URLs allowed per batch")).into());
    }

    let mut normalized = Vec::with_capacity(params.urls.len());
    let mut invalid = 0u64;
    for validation in validate_batch(&params.urls) {
        match validation.result {
            Ok(valid) => normalized.push(valid.normalized_url),
            Err(e) => {
                tracing::warn!(url = validation.url, error = %e, "skipping invalid preload URL");
                invalid += 1;
            }
        }
    }

    let mut report = cache
        .preload(&normalized, Some(config.cache_ttl_hours))
        .await
        .map_err(McpError::from)?;
    report.failed += invalid;

    to_result(&report)
}

/// Implementation of the cache_bulk_status tool.
pub async fn bulk_status_impl(cache: &CacheDb, params: CacheBulkStatusParams) -> Result<CallToolResult, McpError> {
    if params.url_hashes.is_empty() {
        return Err(Error::InvalidInput("url_hashes cannot be empty".into()).into());
    }

    let updated = cache
        .bulk_set_status(&params.url_hashes, params.status)
        .await
        .map_err(McpError::from)?;

    to_result(&BulkStatusOutput { updated })
}

#[cfg(test)]
mod tests {
    use super::*;
    use urlvault_core::cache::EntryUpdate;

    fn output_json(result: &CallToolResult) -> serde_json::Value {
        let content = serde_json::to_value(&result.content[0]).unwrap();
        let text = content.get("text").and_then(|v| v.as_str()).unwrap();
        serde_json::from_str(text).unwrap()
    }

    #[tokio::test]
    async fn test_preload_counts_invalid_as_failed() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let config = AppConfig::default();

        let params = CachePreloadParams {
            urls: vec!["https://example.com/new".into(), "http://localhost".into()],
        };
        let result = preload_impl(&cache, &config, params).await.unwrap();
        let output = output_json(&result);

        assert_eq!(output["processed"], 1);
        assert_eq!(output["failed"], 1);
        assert_eq!(output["already_cached"], 0);
    }

    #[tokio::test]
    async fn test_preload_skips_cached() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let config = AppConfig::default();

        cache
            .upsert_entry(
                "https://example.com/here",
                EntryUpdate { processing_status: Some(ProcessingStatus::Completed), ..Default::default() },
            )
            .await
            .unwrap();

        let params = CachePreloadParams { urls: vec!["https://example.com/here".into()] };
        let result = preload_impl(&cache, &config, params).await.unwrap();
        let output = output_json(&result);
        assert_eq!(output["already_cached"], 1);
    }

    #[tokio::test]
    async fn test_preload_rejects_oversized_batch() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let config = AppConfig::default();

        let urls = (0..101).map(|i| format!("https://example.com/{i}")).collect();
        let result = preload_impl(&cache, &config, CachePreloadParams { urls }).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_preload_rejects_empty_batch() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let config = AppConfig::default();

        let result = preload_impl(&cache, &config, CachePreloadParams { urls: vec![] }).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_bulk_status() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let entry = cache
            .upsert_entry(
                "https://example.com/x",
                EntryUpdate { processing_status: Some(ProcessingStatus::Completed), ..Default::default() },
            )
            .await
            .unwrap();

        let params = CacheBulkStatusParams { url_hashes: vec![entry.url_hash], status: ProcessingStatus::Pending };
        let result = bulk_status_impl(&cache, params).await.unwrap();
        let output = output_json(&result);
        assert_eq!(output["updated"], 1);
    }

    #[tokio::test]
    async fn test_bulk_status_rejects_empty() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let params = CacheBulkStatusParams { url_hashes: vec![], status: ProcessingStatus::Pending };

        let result = bulk_status_impl(&cache, params).await;
        assert!(result.is_err());
    }
}
