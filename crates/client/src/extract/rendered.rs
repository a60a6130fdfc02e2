//! Rendered extraction strategy via headless Chrome/Chromium.
//!
//! One browser instance is launched when the strategy is constructed and
//! reused across requests; each request gets its own page, closed after the
//! extraction whether it succeeded or not. The browser is closed through
//! [`ExtractStrategy::shutdown`].

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use futures_util::StreamExt;
use tokio::sync::Mutex;
use url::Url;
use urlvault_core::Error;

use super::html::process_html;
use super::{ExtractStrategy, ExtractedPage};

const VIEWPORT_WIDTH: u32 = 1280;
const VIEWPORT_HEIGHT: u32 = 720;

/// Extraction from the rendered DOM of a headless browser page.
pub struct RenderedStrategy {
    browser: Mutex<Browser>,
    user_agent: String,
    timeout: Duration,
    max_chars: usize,
}

impl RenderedStrategy {
    /// Launch the browser and spawn its CDP event handler task.
    pub async fn new(user_agent: &str, timeout: Duration, max_chars: usize) -> Result<Self, Error> {
        let config = BrowserConfig::builder()
            .viewport(Viewport { width: VIEWPORT_WIDTH, height: VIEWPORT_HEIGHT, ..Default::default() })
            .build()
            .map_err(Error::RenderFailed)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::RenderFailed(format!("browser launch failed: {e}")))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("browser handler event error: {e}");
                    break;
                }
            }
        });

        tracing::info!("headless browser launched");

        Ok(Self { browser: Mutex::new(browser), user_agent: user_agent.to_string(), timeout, max_chars })
    }

    async fn render(&self, page: &chromiumoxide::Page, url: &Url) -> Result<(String, Option<u16>), Error> {
        page.set_user_agent(self.user_agent.as_str())
            .await
            .map_err(|e| Error::RenderFailed(format!("failed to set user agent: {e}")))?;

        page.goto(url.as_str())
            .await
            .map_err(|e| Error::RenderFailed(format!("navigation failed: {e}")))?;

        let request = page
            .wait_for_navigation_response()
            .await
            .map_err(|e| Error::RenderFailed(format!("navigation failed: {e}")))?;

        let status = request.and_then(|r| r.response.as_ref().map(|resp| resp.status as u16));
        if let Some(code) = status
            && !(200..300).contains(&code)
        {
            return Err(Error::HttpError(format!("status {code}")));
        }

        let html = page
            .content()
            .await
            .map_err(|e| Error::RenderFailed(format!("content retrieval failed: {e}")))?;

        Ok((html, status))
    }
}

#[async_trait]
impl ExtractStrategy for RenderedStrategy {
    fn name(&self) -> &'static str {
        "rendered"
    }

    async fn extract(&self, url: &Url) -> Result<ExtractedPage, Error> {
        let page = {
            let browser = self.browser.lock().await;
            browser
                .new_page("about:blank")
                .await
                .map_err(|e| Error::RenderFailed(format!("failed to open page: {e}")))?
        };

        // The page is closed whatever the render produced.
        let rendered = tokio::time::timeout(self.timeout, self.render(&page, url)).await;
        page.close().await.ok();

        let (html, status) = match rendered {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::FetchTimeout(format!("render timed out after {}ms", self.timeout.as_millis())));
            }
        };

        let page = process_html(&html, status, self.max_chars);
        Ok(ExtractedPage { title: page.title, content: page.content, metadata: page.metadata })
    }

    async fn shutdown(&self) {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            tracing::warn!(error = %e, "failed to close headless browser");
        }
    }
}
