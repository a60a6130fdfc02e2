//! URL validation and normalization.
//!
//! Parses, normalizes, and screens user-submitted URL strings before any
//! network activity. Fully deterministic; performs no I/O.
//!
//! ### Normalization
//! - Default scheme to https:// if missing
//! - Lowercase scheme and host
//! - Remove fragment (#...)
//! - Sort query parameters by key (stable, so per-key order is preserved)
//! - Strip one trailing slash from non-root paths

pub mod screen;

use url::Url;
use urlvault_core::Error;

pub use screen::{BLOCKED_HOSTS, is_private_or_reserved, screen_host};

/// Maximum accepted URL length in characters.
pub const MAX_URL_LENGTH: usize = 2048;

/// Path extensions treated as file downloads rather than web pages.
///
/// A content-type heuristic, not a download-prevention boundary: archives,
/// executables, media, office documents, and images.
const BLOCKED_EXTENSIONS: &[&str] = &[
    "7z", "avi", "bmp", "deb", "dmg", "doc", "docx", "exe", "flv", "gif", "gz", "ico", "iso", "jpeg", "jpg", "mkv",
    "mov", "mp3", "mp4", "msi", "pdf", "pkg", "png", "ppt", "pptx", "rar", "rpm", "svg", "tar", "tgz", "wav", "webp",
    "wmv", "xls", "xlsx", "zip",
];

/// Path extensions recognized as web pages by the `is_web_page` heuristic.
const WEB_PAGE_EXTENSIONS: &[&str] = &["asp", "aspx", "cfm", "htm", "html", "jsp", "php", "shtml"];

/// Schemes that must never be crawled.
const UNSAFE_SCHEMES: &[&str] = &["javascript", "data", "vbscript", "file", "ftp"];

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlValidation {
    /// Canonical string form used for hashing and fetching.
    pub normalized_url: String,
    /// Lowercased host.
    pub domain: String,
    /// Lowercased scheme ("http" or "https").
    pub protocol: String,
}

/// Structural facts about a URL, `None` where parsing failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlMetadata {
    pub domain: Option<String>,
    pub protocol: Option<String>,
    pub path: Option<String>,
    pub is_secure: bool,
}

/// One result of a batch validation.
#[derive(Debug)]
pub struct BatchValidation {
    pub url: String,
    pub result: Result<UrlValidation, Error>,
}

fn ensure_scheme(input: &str) -> String {
    if input.contains("://") { input.to_string() } else { format!("https://{input}") }
}

fn parse(raw_url: &str) -> Result<Url, Error> {
    let trimmed = raw_url.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidUrl("empty URL".to_string()));
    }
    Url::parse(&ensure_scheme(trimmed)).map_err(|e| Error::InvalidUrl(e.to_string()))
}

fn path_extension(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next()?;
    let (stem, extension) = segment.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}

fn query_key(pair: &str) -> &str {
    pair.split('=').next().unwrap_or(pair)
}

fn sorted_query(query: &str) -> String {
    let mut pairs: Vec<&str> = query.split('&').filter(|p| !p.is_empty()).collect();
    // Stable sort: repeated keys keep their relative order.
    pairs.sort_by(|a, b| query_key(a).cmp(query_key(b)));
    pairs.join("&")
}

/// Reassemble a parsed URL in canonical form.
fn normalize(parsed: &Url) -> String {
    let scheme = parsed.scheme().to_lowercase();
    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    let port = parsed.port().map(|p| format!(":{p}")).unwrap_or_default();

    let mut path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }

    let query = match parsed.query() {
        Some(q) if !q.is_empty() => format!("?{}", sorted_query(q)),
        _ => String::new(),
    };

    format!("{scheme}://{host}{port}{path}{query}")
}

/// Validate and normalize a raw URL string.
///
/// Rejects non-HTTP(S) schemes, blocked/private hosts, file-download
/// extensions, and over-long inputs. On success the returned
/// `normalized_url` is the canonical form equivalent spellings collapse to.
pub fn validate(raw_url: &str) -> Result<UrlValidation, Error> {
    if raw_url.trim().len() > MAX_URL_LENGTH {
        return Err(Error::InvalidUrl(format!("URL exceeds {MAX_URL_LENGTH} characters")));
    }

    let parsed = parse(raw_url)?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(Error::InvalidUrl(format!("unsupported scheme: {scheme}"))),
    }

    screen_host(&parsed)?;

    if let Some(extension) = path_extension(parsed.path())
        && BLOCKED_EXTENSIONS.contains(&extension.as_str())
    {
        return Err(Error::BlockedUrl(format!("file downloads are not supported (.{extension})")));
    }

    let domain = parsed.host_str().unwrap_or_default().to_lowercase();
    let protocol = parsed.scheme().to_lowercase();

    Ok(UrlValidation { normalized_url: normalize(&parsed), domain, protocol })
}

/// Validate a list of URLs independently.
///
/// One invalid entry does not affect the others' results.
pub fn validate_batch(urls: &[String]) -> Vec<BatchValidation> {
    urls.iter()
        .map(|url| BatchValidation { url: url.clone(), result: validate(url) })
        .collect()
}

/// Heuristic: does the URL look like a web page rather than a file?
///
/// True for extensionless paths, trailing slashes, and known web-page
/// extensions. False on parse failure.
pub fn is_web_page(raw_url: &str) -> bool {
    let Ok(parsed) = parse(raw_url) else {
        return false;
    };
    let path = parsed.path();
    if path.ends_with('/') {
        return true;
    }
    match path_extension(path) {
        None => true,
        Some(extension) => WEB_PAGE_EXTENSIONS.contains(&extension.as_str()),
    }
}

/// Whether a URL's scheme is safe to crawl.
///
/// Rejects javascript:, data:, vbscript:, file:, and ftp: URLs. False on
/// parse failure.
pub fn is_safe_for_crawling(raw_url: &str) -> bool {
    let Ok(parsed) = Url::parse(raw_url.trim()).or_else(|_| Url::parse(&ensure_scheme(raw_url.trim()))) else {
        return false;
    };
    !UNSAFE_SCHEMES.contains(&parsed.scheme())
}

/// Lowercased host of a URL, if it parses.
pub fn extract_domain(raw_url: &str) -> Option<String> {
    parse(raw_url).ok()?.host_str().map(|h| h.to_lowercase())
}

/// Structural metadata for a URL, degrading to `None` fields instead of
/// failing when the input does not parse.
pub fn url_metadata(raw_url: &str) -> UrlMetadata {
    match parse(raw_url) {
        Ok(parsed) => UrlMetadata {
            domain: parsed.host_str().map(|h| h.to_lowercase()),
            protocol: Some(parsed.scheme().to_lowercase()),
            path: Some(parsed.path().to_string()),
            is_secure: parsed.scheme() == "https",
        },
        Err(_) => UrlMetadata::default(),
    }
}
