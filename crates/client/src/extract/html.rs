//! Shared HTML document processing.
//!
//! Both extraction strategies produce an HTML string; this module turns it
//! into title, plain-text content, and metadata with one set of rules:
//!
//! - Strip script/style/nav/header/footer/aside subtrees
//! - Title: `<title>`, else first `<h1>`, else `og:title`
//! - Content: first non-empty match in a priority list of content
//!   containers, else the whole body text
//! - Collapse whitespace runs, truncate at the character cap

use scraper::{Html, Selector};
use urlvault_core::PageMetadata;

/// Marker appended when content is truncated at the cap.
pub const TRUNCATION_MARKER: &str = "...";

const STRIP_SELECTOR: &str = "script, style, nav, header, footer, aside";

/// Content containers, most specific first.
const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role=\"main\"]",
    ".content",
    ".post-content",
    ".entry-content",
    ".article-content",
    ".page-content",
];

/// Processed page: title, capped plain-text content, harvested metadata.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub title: Option<String>,
    pub content: String,
    pub metadata: PageMetadata,
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

/// Process an HTML document into extractable page content.
pub fn process_html(html: &str, status_code: Option<u16>, max_chars: usize) -> PageContent {
    let mut doc = Html::parse_document(html);
    strip_chrome(&mut doc);

    let title = page_title(&doc);
    let content = truncate(collapse_whitespace(&main_content(&doc)), max_chars);
    let metadata = harvest_metadata(&doc, &content, status_code);

    PageContent { title, content, metadata }
}

/// Detach boilerplate subtrees so their text never leaks into content.
fn strip_chrome(doc: &mut Html) {
    let strip = selector(STRIP_SELECTOR);
    let ids: Vec<_> = doc.select(&strip).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn element_text(doc: &Html, css: &str) -> Option<String> {
    doc.select(&selector(css))
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join(" "))
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn page_title(doc: &Html) -> Option<String> {
    element_text(doc, "title")
        .or_else(|| element_text(doc, "h1"))
        .or_else(|| meta_value(doc, "og:title"))
}

fn main_content(doc: &Html) -> String {
    for css in CONTENT_SELECTORS {
        if let Some(text) = element_text(doc, css) {
            return text;
        }
    }
    element_text(doc, "body").unwrap_or_default()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(content: String, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content;
    }
    let mut truncated: String = content.chars().take(max_chars).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// Value of a `<meta>` tag matched by name or property attribute.
fn meta_value(doc: &Html, name: &str) -> Option<String> {
    let css = format!("meta[name=\"{name}\"], meta[property=\"{name}\"]");
    doc.select(&selector(&css))
        .find_map(|el| el.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

fn harvest_metadata(doc: &Html, content: &str, status_code: Option<u16>) -> PageMetadata {
    PageMetadata {
        description: meta_value(doc, "description").or_else(|| meta_value(doc, "og:description")),
        author: meta_value(doc, "author"),
        published_date: meta_value(doc, "article:published_time").or_else(|| meta_value(doc, "datePublished")),
        image_url: meta_value(doc, "og:image"),
        site_name: meta_value(doc, "og:site_name"),
        content_type: meta_value(doc, "og:type"),
        word_count: Some(content.split_whitespace().count() as u64),
        status_code,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html>
        <head>
            <title>Test Article</title>
            <meta name="description" content="A test page">
            <meta name="author" content="Jo Writer">
            <meta property="article:published_time" content="2024-05-01T10:00:00Z">
            <meta property="og:image" content="https://example.com/hero.png">
            <meta property="og:site_name" content="Example">
            <meta property="og:type" content="article">
        </head>
        <body>
            <nav>Home About Contact</nav>
            <article>
                <h1>Main Heading</h1>
                <p>First paragraph of body text.</p>
                <p>Second   paragraph with   extra   spacing.</p>
            </article>
            <footer>Copyright notice</footer>
            <script>console.log("ignored");</script>
        </body>
        </html>
    "#;

    #[test]
    fn test_title_from_title_tag() {
        let page = process_html(ARTICLE_HTML, Some(200), 50_000);
        assert_eq!(page.title.as_deref(), Some("Test Article"));
    }

    #[test]
    fn test_title_falls_back_to_h1() {
        let html = "<html><body><h1>Heading Only</h1><p>text</p></body></html>";
        let page = process_html(html, None, 50_000);
        assert_eq!(page.title.as_deref(), Some("Heading Only"));
    }

    #[test]
    fn test_title_falls_back_to_og_title() {
        let html = r#"<html><head><meta property="og:title" content="OG Title"></head><body><p>text</p></body></html>"#;
        let page = process_html(html, None, 50_000);
        assert_eq!(page.title.as_deref(), Some("OG Title"));
    }

    #[test]
    fn test_content_prefers_article_over_body() {
        let page = process_html(ARTICLE_HTML, Some(200), 50_000);
        assert!(page.content.contains("First paragraph"));
        assert!(!page.content.contains("Copyright"));
        assert!(!page.content.contains("Home About"));
    }

    #[test]
    fn test_strips_scripts_from_body_fallback() {
        let html = "<html><body><p>visible</p><script>var hidden = 1;</script></body></html>";
        let page = process_html(html, None, 50_000);
        assert_eq!(page.content, "visible");
    }

    #[test]
    fn test_content_selector_priority() {
        let html = r#"
            <html><body>
                <div class="content">less specific</div>
                <main>from main</main>
            </body></html>
        "#;
        let page = process_html(html, None, 50_000);
        assert_eq!(page.content, "from main");
    }

    #[test]
    fn test_empty_container_falls_through() {
        let html = r#"<html><body><main>   </main><div class="content">fallback text</div></body></html>"#;
        let page = process_html(html, None, 50_000);
        assert_eq!(page.content, "fallback text");
    }

    #[test]
    fn test_whitespace_collapsed() {
        let page = process_html(ARTICLE_HTML, Some(200), 50_000);
        assert!(page.content.contains("Second paragraph with extra spacing."));
    }

    #[test]
    fn test_truncation_appends_marker() {
        let html = format!("<html><body><main>{}</main></body></html>", "word ".repeat(100));
        let page = process_html(&html, None, 20);
        assert_eq!(page.content.chars().count(), 20 + TRUNCATION_MARKER.len());
        assert!(page.content.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_short_content_not_truncated() {
        let html = "<html><body><main>short</main></body></html>";
        let page = process_html(html, None, 50_000);
        assert_eq!(page.content, "short");
    }

    #[test]
    fn test_metadata_harvest() {
        let page = process_html(ARTICLE_HTML, Some(200), 50_000);
        let meta = page.metadata;

        assert_eq!(meta.description.as_deref(), Some("A test page"));
        assert_eq!(meta.author.as_deref(), Some("Jo Writer"));
        assert_eq!(meta.published_date.as_deref(), Some("2024-05-01T10:00:00Z"));
        assert_eq!(meta.image_url.as_deref(), Some("https://example.com/hero.png"));
        assert_eq!(meta.site_name.as_deref(), Some("Example"));
        assert_eq!(meta.content_type.as_deref(), Some("article"));
        assert_eq!(meta.status_code, Some(200));
        assert!(meta.word_count.unwrap() > 0);
    }

    #[test]
    fn test_description_falls_back_to_og() {
        let html =
            r#"<html><head><meta property="og:description" content="og desc"></head><body><p>x</p></body></html>"#;
        let page = process_html(html, None, 50_000);
        assert_eq!(page.metadata.description.as_deref(), Some("og desc"));
    }

    #[test]
    fn test_word_count_matches_content() {
        let html = "<html><body><main>one two three</main></body></html>";
        let page = process_html(html, None, 50_000);
        assert_eq!(page.metadata.word_count, Some(3));
    }
}
