//! robots.txt compliance with per-host policy caching.
//!
//! Fetches and caches robots.txt files per host, respecting a 24-hour TTL.
//! The check is advisory policy, not a security control: when the policy
//! cannot be fetched or parsed, the checker fails open and allows the URL.

use robotstxt_rs::RobotsTxt;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use url::Url;
use urlvault_core::Error;

/// TTL for cached robots.txt policies (24 hours).
const ROBOTS_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Maximum size of robots.txt to fetch (1MB).
const MAX_ROBOTS_SIZE: usize = 1024 * 1024;

/// Cached robots.txt policy with fetch timestamp.
struct CachedPolicy {
    robots: RobotsTxt,
    fetched_at: Instant,
}

impl CachedPolicy {
    fn is_expired(&self) -> bool {
        self.fetched_at.elapsed() > ROBOTS_TTL
    }
}

/// Fail-open robots.txt checker with an in-memory per-host policy cache.
pub struct RobotsChecker {
    cache: RwLock<HashMap<String, CachedPolicy>>,
    agent: String,
    http: reqwest::Client,
}

impl RobotsChecker {
    /// Create a new checker.
    ///
    /// `agent` is the token evaluated against robots.txt rule groups;
    /// `user_agent` is the full header sent when fetching the policy file.
    pub fn new(agent: String, user_agent: String, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { cache: RwLock::new(HashMap::new()), agent, http })
    }

    /// Whether robots.txt allows fetching the URL.
    ///
    /// Fetches and caches the host's policy on first use. Any failure to
    /// obtain the policy allows the URL: absence of a robots file is not a
    /// denial signal, and transient failure must not block legitimate
    /// fetches.
    pub async fn is_allowed(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return true;
        };
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let robots_url = format!("{}://{}/robots.txt", url.scheme(), authority);

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&robots_url)
                && !cached.is_expired()
            {
                let allowed = cached.robots.can_fetch(&self.agent, url.as_str());
                tracing::debug!(robots_url, allowed, "robots.txt cache hit");
                return allowed;
            }
        }

        let robots = match self.fetch_policy(&robots_url).await {
            Ok(robots) => robots,
            Err(e) => {
                tracing::warn!(robots_url, error = %e, "could not check robots.txt, allowing");
                return true;
            }
        };

        let allowed = robots.can_fetch(&self.agent, url.as_str());

        let mut cache = self.cache.write().await;
        cache.insert(robots_url, CachedPolicy { robots, fetched_at: Instant::now() });

        allowed
    }

    /// Fetch and parse robots.txt from the given URL.
    ///
    /// A non-2xx response parses as an empty (allow-all) policy.
    async fn fetch_policy(&self, robots_url: &str) -> Result<RobotsTxt, Error> {
        let response = self
            .http
            .get(robots_url)
            .send()
            .await
            .map_err(|e| Error::HttpError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(robots_url, status = %status, "no robots.txt, allowing all");
            return Ok(RobotsTxt::parse(""));
        }

        if let Some(len) = response.content_length()
            && len as usize > MAX_ROBOTS_SIZE
        {
            return Err(Error::FetchTooLarge(format!("robots.txt is {len} bytes")));
        }

        let bytes = response.bytes().await.map_err(|e| Error::HttpError(e.to_string()))?;

        if bytes.len() > MAX_ROBOTS_SIZE {
            return Err(Error::FetchTooLarge(format!("robots.txt is {} bytes", bytes.len())));
        }

        let content = String::from_utf8_lossy(&bytes);
        Ok(RobotsTxt::parse(&content))
    }

    /// Clear expired policies from the cache.
    pub async fn evict_expired(&self) {
        let mut cache = self.cache.write().await;
        cache.retain(|_, cached| !cached.is_expired());
    }
}
