//! url_process and url_process_batch tool implementations.
//!
//! Thin wrappers over the pipeline; the structured outcome (including
//! failures) is returned as the tool payload rather than a protocol error,
//! so callers can distinguish policy rejections from extraction failures.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use urlvault_client::{UrlPipeline, validate};
use urlvault_core::Error;

/// Input parameters for the url_process tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProcessUrlParams {
    /// The URL to process.
    pub url: String,

    /// Remove any existing cache entry first so extraction is forced.
    #[serde(default)]
    pub force_refresh: bool,
}

/// Input parameters for the url_process_batch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProcessBatchParams {
    /// The URLs to process, in order.
    pub urls: Vec<String>,

    /// Remove any existing cache entries first so extraction is forced.
    #[serde(default)]
    pub force_refresh: bool,
}

fn to_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Implementation of the url_process tool.
pub async fn process_impl(pipeline: &UrlPipeline, params: ProcessUrlParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    if params.force_refresh
        && let Ok(validation) = validate(&params.url)
    {
        pipeline
            .cache()
            .remove_entry(&validation.normalized_url)
            .await
            .map_err(McpError::from)?;
    }

    let outcome = pipeline.process_url(&params.url).await;
    to_result(&outcome)
}

/// Implementation of the url_process_batch tool.
pub async fn process_batch_impl(
    pipeline: &UrlPipeline, params: ProcessBatchParams,
) -> Result<CallToolResult, McpError> {
    if params.urls.is_empty() {
        return Err(Error::InvalidInput("urls cannot be empty".into()).into());
    }

    let outcome = pipeline.process_batch(&params.urls, params.force_refresh).await;
    to_result(&outcome)
}
