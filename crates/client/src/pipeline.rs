//! End-to-end URL processing.
//!
//! Composes the validator, cache store, robots checker, rate limiter, and
//! content extractor into one "fetch or serve from cache" operation:
//!
//! validate -> cache lookup -> [hit: done] | [miss: robots -> rate limit ->
//! processing placeholder -> extract -> cache write] -> outcome
//!
//! Failures at any step become a structured failure outcome; nothing here
//! panics or propagates errors past the pipeline boundary.
//!
//! No single-flight guarantee: two concurrent calls for the same cold URL
//! may both extract, and the last writer wins. Callers needing exactly-once
//! extraction must add their own per-hash lease.

use serde::{Deserialize, Serialize};
use url::Url;
use urlvault_core::cache::hash::compute_url_hash;
use urlvault_core::cache::{CacheEntry, EntryUpdate, ProcessingStatus};
use urlvault_core::{AppConfig, CacheDb, Error, PageMetadata};

use crate::extract::{ContentExtractor, ExtractStrategy, StaticHtmlStrategy};
use crate::ratelimit::RateLimiter;
use crate::robots::RobotsChecker;
use crate::validate::validate;

/// Extracted data returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct UrlContent {
    pub title: String,
    pub content: String,
    pub metadata: PageMetadata,
}

/// Outcome of processing one URL.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct UrlOutcome {
    pub success: bool,
    /// Whether the result was served from the cache.
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<UrlContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UrlOutcome {
    fn failure(error: impl Into<String>) -> Self {
        Self { success: false, cached: false, data: None, error: Some(error.into()) }
    }

    fn from_entry(entry: &CacheEntry, cached: bool) -> Self {
        Self {
            success: true,
            cached,
            data: Some(UrlContent {
                title: entry.title.clone().unwrap_or_default(),
                content: entry.content.clone().unwrap_or_default(),
                metadata: entry.metadata.clone(),
            }),
            error: None,
        }
    }
}

/// Per-URL result inside a batch.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BatchUrlOutcome {
    pub url: String,
    pub success: bool,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<UrlContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A URL the batch could not process at all (e.g. cache removal failed).
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BatchError {
    pub url: String,
    pub error: String,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BatchOutcome {
    pub processed: u64,
    pub error_count: u64,
    pub results: Vec<BatchUrlOutcome>,
    pub errors: Vec<BatchError>,
}

/// The URL processing pipeline.
///
/// Owns its sub-components; construct once at startup and share. The
/// rendered strategy's browser is launched here and released by
/// [`UrlPipeline::shutdown`].
pub struct UrlPipeline {
    cache: CacheDb,
    robots: RobotsChecker,
    limiter: RateLimiter,
    extractor: ContentExtractor,
    ttl_hours: i64,
}

impl UrlPipeline {
    /// Build the pipeline from configuration.
    ///
    /// A browser launch failure disables the rendered strategy rather than
    /// failing startup; the static strategy is always available.
    pub async fn new(config: &AppConfig, cache: CacheDb) -> Result<Self, Error> {
        let robots =
            RobotsChecker::new(config.robots_agent.clone(), config.user_agent.clone(), config.robots_timeout())?;
        let limiter = RateLimiter::new(config.rate_limit_delay());

        let mut strategies: Vec<Box<dyn ExtractStrategy>> = Vec::new();

        #[cfg(feature = "render")]
        if config.render_enabled {
            match crate::extract::rendered::RenderedStrategy::new(
                &config.user_agent,
                config.fetch_timeout(),
                config.max_content_chars,
            )
            .await
            {
                Ok(strategy) => strategies.push(Box::new(strategy)),
                Err(e) => {
                    tracing::error!(error = %e, "headless browser launch failed, rendered strategy disabled");
                }
            }
        }

        #[cfg(not(feature = "render"))]
        if config.render_enabled {
            tracing::warn!("render_enabled is set but this build was compiled without the render feature");
        }

        strategies.push(Box::new(StaticHtmlStrategy::new(
            &config.user_agent,
            config.fetch_timeout(),
            config.max_bytes,
            config.max_content_chars,
        )?));

        Ok(Self {
            cache,
            robots,
            limiter,
            extractor: ContentExtractor::new(strategies),
            ttl_hours: config.cache_ttl_hours,
        })
    }

    /// The cache store this pipeline writes through.
    pub fn cache(&self) -> &CacheDb {
        &self.cache
    }

    /// Process one URL: serve from cache or fetch, extract, and store.
    pub async fn process_url(&self, raw_url: &str) -> UrlOutcome {
        let validation = match validate(raw_url) {
            Ok(validation) => validation,
            Err(e) => return UrlOutcome::failure(e.to_string()),
        };
        let url = validation.normalized_url;

        let url_hash = compute_url_hash(&url);
        match self.cache.get_entry(&url_hash).await {
            Ok(Some(entry)) => {
                tracing::debug!(url, "serving URL from cache");
                return UrlOutcome::from_entry(&entry, true);
            }
            Ok(None) => {}
            Err(e) => return UrlOutcome::failure(e.to_string()),
        }

        let parsed = match Url::parse(&url) {
            Ok(parsed) => parsed,
            Err(e) => return UrlOutcome::failure(Error::InvalidUrl(e.to_string()).to_string()),
        };

        if !self.robots.is_allowed(&parsed).await {
            return UrlOutcome::failure("Robots.txt disallows crawling");
        }

        self.limiter.wait_for_domain(&validation.domain).await;

        // Mark the entry in-flight before extraction so concurrent readers
        // observe a consistent state instead of a missing row.
        let placeholder = EntryUpdate {
            processing_status: Some(ProcessingStatus::Processing),
            metadata: Some(PageMetadata { robots_allowed: Some(true), ..Default::default() }),
            ttl_hours: Some(self.ttl_hours),
            ..Default::default()
        };
        if let Err(e) = self.cache.upsert_entry(&url, placeholder).await {
            return UrlOutcome::failure(e.to_string());
        }

        match self.extractor.extract(&parsed).await {
            Ok(extraction) => {
                let update = EntryUpdate {
                    title: extraction.title,
                    content: Some(extraction.content),
                    metadata: Some(extraction.metadata),
                    processing_status: Some(ProcessingStatus::Completed),
                    ttl_hours: Some(self.ttl_hours),
                };
                match self.cache.upsert_entry(&url, update).await {
                    Ok(entry) => UrlOutcome::from_entry(&entry, false),
                    Err(e) => UrlOutcome::failure(e.to_string()),
                }
            }
            Err(e) => {
                let message = e.to_string();
                let update = EntryUpdate {
                    metadata: Some(PageMetadata { processing_error: Some(message.clone()), ..Default::default() }),
                    processing_status: Some(ProcessingStatus::Failed),
                    ttl_hours: Some(self.ttl_hours),
                    ..Default::default()
                };
                if let Err(store_err) = self.cache.upsert_entry(&url, update).await {
                    tracing::error!(url, error = %store_err, "failed to record extraction failure");
                }
                UrlOutcome::failure(message)
            }
        }
    }

    /// Process URLs sequentially, isolating per-URL failures.
    ///
    /// Sequential on purpose: it keeps per-domain rate limiting effective
    /// across a multi-URL batch. With `force_refresh`, any existing entry is
    /// removed first so extraction runs again.
    pub async fn process_batch(&self, urls: &[String], force_refresh: bool) -> BatchOutcome {
        let mut results = Vec::with_capacity(urls.len());
        let mut errors = Vec::new();

        for url in urls {
            if force_refresh
                && let Ok(validation) = validate(url)
                && let Err(e) = self.cache.remove_entry(&validation.normalized_url).await
            {
                errors.push(BatchError { url: url.clone(), error: e.to_string() });
                continue;
            }

            let outcome = self.process_url(url).await;
            results.push(BatchUrlOutcome {
                url: url.clone(),
                success: outcome.success,
                cached: outcome.cached,
                data: outcome.data,
                error: outcome.error,
            });
        }

        BatchOutcome {
            processed: results.len() as u64,
            error_count: errors.len() as u64,
            results,
            errors,
        }
    }

    /// Release held resources (the headless browser, if any).
    pub async fn shutdown(&self) {
        self.extractor.shutdown().await;
    }
}
