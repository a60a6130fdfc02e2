//! MCP server handler implementation.
//!
//! This module defines the main server handler that routes tool calls to
//! the appropriate implementations.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use urlvault_client::UrlPipeline;
use urlvault_core::AppConfig;

use crate::tools::cache::cleanup::{CacheCleanupParams, cleanup_impl};
use crate::tools::cache::get::{CacheGetParams, CacheRemoveParams, get_impl, remove_impl};
use crate::tools::cache::list::{CacheDomainParams, CacheListParams, domain_impl, list_impl};
use crate::tools::cache::metrics::{metrics_impl, metrics_reset_impl};
use crate::tools::cache::preload::{CacheBulkStatusParams, CachePreloadParams, bulk_status_impl, preload_impl};
use crate::tools::process::{ProcessBatchParams, ProcessUrlParams, process_batch_impl, process_impl};
use crate::tools::EmptyParams;

/// The main MCP server handler for urlvault.
#[derive(Clone)]
pub struct UrlVaultServer {
    config: AppConfig,
    pipeline: Arc<UrlPipeline>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler
/// methods.
#[tool_router]
impl UrlVaultServer {
    /// Create a new server handler.
    pub fn new(config: AppConfig, pipeline: Arc<UrlPipeline>) -> Self {
        Self { config, pipeline, tool_router: Self::tool_router() }
    }

    #[tool(description = "Process a URL: validate it, serve cached content or fetch, extract, and cache it.")]
    async fn url_process(&self, params: Parameters<ProcessUrlParams>) -> Result<CallToolResult, McpError> {
        process_impl(&self.pipeline, params.0).await
    }

    #[tool(description = "Process multiple URLs sequentially, isolating per-URL failures.")]
    async fn url_process_batch(&self, params: Parameters<ProcessBatchParams>) -> Result<CallToolResult, McpError> {
        process_batch_impl(&self.pipeline, params.0).await
    }

    #[tool(description = "Get a cache entry by hash or by URL. Only completed, unexpired entries are returned.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(self.pipeline.cache(), params.0).await
    }

    #[tool(description = "Remove a cache entry by URL.")]
    async fn cache_remove(&self, params: Parameters<CacheRemoveParams>) -> Result<CallToolResult, McpError> {
        remove_impl(self.pipeline.cache(), params.0).await
    }

    #[tool(description = "List cache entries with pagination and optional status/domain filters.")]
    async fn cache_list(&self, params: Parameters<CacheListParams>) -> Result<CallToolResult, McpError> {
        list_impl(self.pipeline.cache(), params.0).await
    }

    #[tool(description = "List the most recent cache entries for a domain.")]
    async fn cache_domain(&self, params: Parameters<CacheDomainParams>) -> Result<CallToolResult, McpError> {
        domain_impl(self.pipeline.cache(), params.0).await
    }

    #[tool(description = "Get cache metrics: totals, hit/miss rates, top domains, status distribution.")]
    async fn cache_metrics(&self, _params: Parameters<EmptyParams>) -> Result<CallToolResult, McpError> {
        metrics_impl(self.pipeline.cache()).await
    }

    #[tool(description = "Reset the process-local cache hit/miss counters.")]
    async fn cache_metrics_reset(&self, _params: Parameters<EmptyParams>) -> Result<CallToolResult, McpError> {
        metrics_reset_impl(self.pipeline.cache()).await
    }

    #[tool(description = "Clean up expired and stale failed entries, then enforce the cache size bound.")]
    async fn cache_cleanup(&self, params: Parameters<CacheCleanupParams>) -> Result<CallToolResult, McpError> {
        cleanup_impl(self.pipeline.cache(), &self.config, params.0).await
    }

    #[tool(description = "Queue URLs as pending cache placeholders without fetching them (max 100 per call).")]
    async fn cache_preload(&self, params: Parameters<CachePreloadParams>) -> Result<CallToolResult, McpError> {
        preload_impl(self.pipeline.cache(), &self.config, params.0).await
    }

    #[tool(description = "Set the processing status of several cache entries at once.")]
    async fn cache_bulk_status(&self, params: Parameters<CacheBulkStatusParams>) -> Result<CallToolResult, McpError> {
        bulk_status_impl(self.pipeline.cache(), params.0).await
    }
}

impl ServerHandler for UrlVaultServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "urlvault".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
