//! Client code for urlvault.
//!
//! This crate provides URL validation, robots.txt compliance, per-domain
//! rate limiting, content extraction, and the processing pipeline that
//! composes them over the cache store.

pub mod extract;
pub mod pipeline;
pub mod ratelimit;
pub mod robots;
pub mod validate;

pub use extract::{ContentExtractor, ExtractStrategy, ExtractedPage, Extraction, StaticHtmlStrategy};
pub use pipeline::{BatchOutcome, UrlContent, UrlOutcome, UrlPipeline};
pub use ratelimit::RateLimiter;
pub use robots::RobotsChecker;
pub use validate::{UrlMetadata, UrlValidation, extract_domain, is_safe_for_crawling, is_web_page, url_metadata, validate, validate_batch};

#[cfg(feature = "render")]
pub use extract::rendered::RenderedStrategy;
