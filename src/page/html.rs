// src/page/html.rs
// =============================================================================
// Turns raw HTML into a Page.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (built on html5ever, never rejects markup)
// - Supports CSS selectors for finding elements
//
// A Page carries:
// - title: text of the first <title>
// - text: up to 500 words of visible text
// - links: absolute http/https URLs from <a href>
// =============================================================================

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ParseError;

/// Text under these elements is navigation, scripting or chrome, not content.
const SKIPPED_TAGS: [&str; 10] = [
    "script", "style", "link", "head", "noscript", "template", "nav", "footer", "aside", "button",
];

const DEFAULT_MAX_WORDS: usize = 500;

/// A parsed web page, as handed to the storage sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub url: String,
    pub title: String,
    pub text: String,
    pub links: Vec<String>,
}

impl Page {
    pub fn has_title(&self) -> bool {
        !self.title.is_empty()
    }

    /// No text and nowhere to go from here.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.links.is_empty()
    }
}

pub trait PageParser: Send + Sync {
    fn parse(&self, url: &str, raw: &str) -> Result<Page, ParseError>;
}

/// `PageParser` built on scraper.
#[derive(Debug)]
pub struct HtmlParser {
    title: Selector,
    anchor: Selector,
    max_words: usize,
}

impl HtmlParser {
    pub fn new() -> Self {
        Self::with_max_words(DEFAULT_MAX_WORDS)
    }

    pub fn with_max_words(max_words: usize) -> Self {
        // Both selectors are constants and known to be valid, so a failure
        // here is a programmer error.
        Self {
            title: Selector::parse("title").expect("valid title selector"),
            anchor: Selector::parse("a[href]").expect("valid anchor selector"),
            max_words,
        }
    }

    fn extract_title(&self, document: &Html) -> String {
        document
            .select(&self.title)
            .next()
            .map(|title| title.text().collect::<String>().trim().to_string())
            .unwrap_or_default()
    }

    fn extract_text(&self, document: &Html) -> String {
        let mut words: Vec<&str> = Vec::new();

        for node in document.root_element().descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };

            let skipped = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|element| SKIPPED_TAGS.contains(&element.name()))
            });
            if skipped {
                continue;
            }

            for word in text.split_whitespace() {
                if words.len() >= self.max_words {
                    return words.join(" ");
                }
                words.push(word);
            }
        }

        words.join(" ")
    }

    fn extract_links(&self, document: &Html, base: &Url) -> Vec<String> {
        document
            .select(&self.anchor)
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| resolve_url(base, href))
            .filter(|url| is_crawlable_link(url))
            .collect()
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PageParser for HtmlParser {
    fn parse(&self, url: &str, raw: &str) -> Result<Page, ParseError> {
        let base = Url::parse(url).map_err(|source| ParseError::InvalidBaseUrl {
            url: url.to_string(),
            source,
        })?;

        let document = Html::parse_document(raw);

        Ok(Page {
            url: url.to_string(),
            title: self.extract_title(&document),
            text: self.extract_text(&document),
            links: self.extract_links(&document, &base),
        })
    }
}

// Resolves a possibly-relative href against the page URL.
//
// Examples:
//   base = "https://example.com/page"
//   href = "/docs" -> Some("https://example.com/docs")
//   href = "https://other.com" -> Some("https://other.com/")
fn resolve_url(base: &Url, href: &str) -> Option<String> {
    match Url::parse(href) {
        Ok(url) => Some(url.to_string()),
        Err(_) => base.join(href).ok().map(|url| url.to_string()),
    }
}

// mailto:, tel:, javascript: and friends are not crawlable.
fn is_crawlable_link(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> Page {
        HtmlParser::new().parse("https://example.com/page/", html).unwrap()
    }

    #[test]
    fn test_extracts_title() {
        let page = parse("<html><head><title>  Rust Docs </title></head><body></body></html>");
        assert_eq!(page.title, "Rust Docs");
        assert!(page.has_title());
    }

    #[test]
    fn test_missing_title_is_empty() {
        let page = parse("<p>just text</p>");
        assert_eq!(page.title, "");
        assert!(!page.has_title());
    }

    #[test]
    fn test_text_skips_scripts_and_navigation() {
        let page = parse(
            r#"<html><head><title>T</title></head><body>
                <nav>Home About</nav>
                <p>Hello   crawling
                world</p>
                <script>var x = 1;</script>
                <footer>Copyright</footer>
            </body></html>"#,
        );
        assert_eq!(page.text, "Hello crawling world");
    }

    #[test]
    fn test_text_is_capped() {
        let body = "word ".repeat(20);
        let page = HtmlParser::with_max_words(5)
            .parse("https://example.com/", &format!("<p>{}</p>", body))
            .unwrap();
        assert_eq!(page.text, "word word word word word");
    }

    #[test]
    fn test_links_are_resolved_and_filtered() {
        let page = parse(
            r#"
            <a href="https://rust-lang.org">Rust</a>
            <a href="/docs">Docs</a>
            <a href="../about">About</a>
            <a href="mailto:test@example.com">Email</a>
            <a href="javascript:void(0)">Nothing</a>
        "#,
        );
        assert_eq!(
            page.links,
            vec![
                "https://rust-lang.org/",
                "https://example.com/docs",
                "https://example.com/about",
            ]
        );
    }

    #[test]
    fn test_empty_page() {
        let page = parse("<html><head><title>Empty</title></head><body></body></html>");
        assert!(page.is_empty());
    }

    #[test]
    fn test_invalid_base_url_fails() {
        let result = HtmlParser::new().parse("not a url", "<title>x</title>");
        assert!(matches!(result, Err(ParseError::InvalidBaseUrl { .. })));
    }
}
