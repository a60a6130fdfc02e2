//! cache_list and cache_domain tool implementations.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use urlvault_core::cache::{CacheEntry, ListQuery, ProcessingStatus, SortColumn, SortOrder};
use urlvault_core::{CacheDb, Error};

/// Largest page size served by the listing tools.
const MAX_PAGE_SIZE: usize = 100;

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {
    /// 1-based page number (default 1).
    #[serde(default)]
    pub page: Option<usize>,

    /// Page size (default 50, max 100).
    #[serde(default)]
    pub limit: Option<usize>,

    /// Only entries with this processing status.
    #[serde(default)]
    pub status: Option<ProcessingStatus>,

    /// Only entries for this domain.
    #[serde(default)]
    pub domain: Option<String>,

    /// Sort column (default created_at).
    #[serde(default)]
    pub sort_by: Option<SortColumn>,

    /// Sort direction (default desc).
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
}

/// Parameters for the cache_domain tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheDomainParams {
    pub domain: String,

    /// Maximum number of entries to return (default 50, max 100).
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Output from the cache_domain tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheDomainOutput {
    pub domain: String,
    pub count: u64,
    pub entries: Vec<CacheEntry>,
}

fn to_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Implementation of the cache_list tool.
pub async fn list_impl(cache: &CacheDb, params: CacheListParams) -> Result<CallToolResult, McpError> {
    let query = ListQuery {
        page: params.page.unwrap_or(1).max(1),
        limit: params.limit.unwrap_or(50).clamp(1, MAX_PAGE_SIZE),
        status: params.status,
        domain: params.domain,
        sort_by: params.sort_by.unwrap_or_default(),
        sort_order: params.sort_order.unwrap_or_default(),
    };

    let page = cache.list_entries(query).await.map_err(McpError::from)?;
    to_result(&page)
}

/// Implementation of the cache_domain tool.
pub async fn domain_impl(cache: &CacheDb, params: CacheDomainParams) -> Result<CallToolResult, McpError> {
    if params.domain.trim().is_empty() {
        return Err(Error::InvalidInput("domain cannot be empty".into()).into());
    }

    let limit = params.limit.unwrap_or(50).clamp(1, MAX_PAGE_SIZE);
    let entries = cache
        .entries_by_domain(&params.domain, limit)
        .await
        .map_err(McpError::from)?;

    to_result(&CacheDomainOutput { domain: params.domain, count: entries.len() as u64, entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use urlvault_core::cache::EntryUpdate;

    async fn seeded_cache() -> CacheDb {
        let cache = CacheDb::open_in_memory().await.unwrap();
        for i in 0..3 {
            cache
                .upsert_entry(
                    &format!("https://example.com/{i}"),
                    EntryUpdate {
                        title: Some(format!("Page {i}")),
                        processing_status: Some(ProcessingStatus::Completed),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }
        cache
    }

    fn output_json(result: &CallToolResult) -> serde_json::Value {
        let content = serde_json::to_value(&result.content[0]).unwrap();
        let text = content.get("text").and_then(|v| v.as_str()).unwrap();
        serde_json::from_str(text).unwrap()
    }

    #[tokio::test]
    async fn test_list_defaults() {
        let cache = seeded_cache().await;
        let result = list_impl(&cache, CacheListParams::default()).await.unwrap();

        let output = output_json(&result);
        assert_eq!(output["total"], 3);
        assert_eq!(output["page"], 1);
    }

    #[tokio::test]
    async fn test_list_limit_is_clamped() {
        let cache = seeded_cache().await;
        let params = CacheListParams { limit: Some(10_000), ..Default::default() };

        let result = list_impl(&cache, params).await.unwrap();
        let output = output_json(&result);
        assert_eq!(output["limit"], MAX_PAGE_SIZE as u64);
    }

    #[tokio::test]
    async fn test_domain_listing() {
        let cache = seeded_cache().await;
        let params = CacheDomainParams { domain: "example.com".into(), limit: None };

        let result = domain_impl(&cache, params).await.unwrap();
        let output = output_json(&result);
        assert_eq!(output["count"], 3);
    }

    #[tokio::test]
    async fn test_domain_requires_domain() {
        let cache = seeded_cache().await;
        let params = CacheDomainParams { domain: "  ".into(), limit: None };

        let result = domain_impl(&cache, params).await;
        assert!(result.is_err());
    }
}
