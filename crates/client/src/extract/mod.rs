//! Two-strategy content extraction.
//!
//! Strategies implement [`ExtractStrategy`] and are tried in order until one
//! succeeds: the rendered (headless browser) strategy first when enabled,
//! then the static HTTP strategy. Adding or reordering strategies does not
//! touch orchestration logic.

pub mod html;
#[cfg(feature = "render")]
pub mod rendered;
pub mod static_html;

pub use html::{PageContent, TRUNCATION_MARKER, process_html};
pub use static_html::StaticHtmlStrategy;

use async_trait::async_trait;
use url::Url;
use urlvault_core::{Error, PageMetadata};

/// Page produced by a single strategy.
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    pub title: Option<String>,
    pub content: String,
    pub metadata: PageMetadata,
}

/// Final extraction result, annotated with the strategy that produced it.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub title: Option<String>,
    pub content: String,
    pub metadata: PageMetadata,
    pub method: &'static str,
}

/// A single way of turning a URL into page content.
#[async_trait]
pub trait ExtractStrategy: Send + Sync {
    /// Short name recorded in result metadata ("rendered", "static").
    fn name(&self) -> &'static str;

    async fn extract(&self, url: &Url) -> Result<ExtractedPage, Error>;

    /// Release any resources held by the strategy. Default: nothing to do.
    async fn shutdown(&self) {}
}

/// Ordered list of strategies tried until one succeeds.
pub struct ContentExtractor {
    strategies: Vec<Box<dyn ExtractStrategy>>,
}

impl ContentExtractor {
    pub fn new(strategies: Vec<Box<dyn ExtractStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the strategies in order; the first success wins and its name is
    /// recorded in `metadata.extraction_method`. Errors from earlier
    /// strategies are logged, and the last error surfaces only when every
    /// strategy has failed.
    pub async fn extract(&self, url: &Url) -> Result<Extraction, Error> {
        let mut last_error = None;

        for strategy in &self.strategies {
            match strategy.extract(url).await {
                Ok(mut page) => {
                    page.metadata.extraction_method = Some(strategy.name().to_string());
                    return Ok(Extraction {
                        title: page.title,
                        content: page.content,
                        metadata: page.metadata,
                        method: strategy.name(),
                    });
                }
                Err(e) => {
                    tracing::warn!(url = %url, strategy = strategy.name(), error = %e, "extraction strategy failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::ExtractFailed("no extraction strategies configured".to_string())))
    }

    /// Shut down every strategy.
    pub async fn shutdown(&self) {
        for strategy in &self.strategies {
            strategy.shutdown().await;
        }
    }
}
