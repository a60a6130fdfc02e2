//! Static HTML extraction strategy.
//!
//! Plain HTTP GET and selector-based parsing of the returned markup. Used
//! as the fallback when the rendered strategy is disabled or fails.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;
use urlvault_core::Error;

use super::html::process_html;
use super::{ExtractStrategy, ExtractedPage};

/// Extraction via a plain HTTP GET of the static markup.
pub struct StaticHtmlStrategy {
    http: reqwest::Client,
    max_bytes: usize,
    max_chars: usize,
}

impl StaticHtmlStrategy {
    pub fn new(user_agent: &str, timeout: Duration, max_bytes: usize, max_chars: usize) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, max_bytes, max_chars })
    }
}

#[async_trait]
impl ExtractStrategy for StaticHtmlStrategy {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn extract(&self, url: &Url) -> Result<ExtractedPage, Error> {
        let response = self
            .http
            .get(url.as_str())
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::FetchTimeout(e.to_string())
                } else {
                    Error::HttpError(format!("network error: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpError(format!("status {}", status.as_u16())));
        }

        if let Some(len) = response.content_length()
            && len as usize > self.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{len} bytes exceeds {}", self.max_bytes)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::HttpError(format!("failed to read response: {e}")))?;

        if bytes.len() > self.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", bytes.len(), self.max_bytes)));
        }

        let html = String::from_utf8_lossy(&bytes);
        let page = process_html(&html, Some(status.as_u16()), self.max_chars);

        Ok(ExtractedPage { title: page.title, content: page.content, metadata: page.metadata })
    }
}
