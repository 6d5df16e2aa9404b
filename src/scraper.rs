use reqwest::{Client, ClientBuilder};
use scraper::{ElementRef, Html, Node, Selector};
use std::time::Duration;
use once_cell::sync::Lazy;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const HOMEPAGE_TIMEOUT: Duration = Duration::from_secs(10);
pub const ARTICLE_TIMEOUT: Duration = Duration::from_secs(100);

/// Removed from homepages before they are shown to the extraction model.
/// Scripts are handled separately since some carry publication times.
const HOMEPAGE_NOISE_TAGS: &[&str] = &[
    "style", "noscript", "footer", "header", "nav", "iframe", "svg", "img",
    "link", "button", "input", "form",
];

/// Inline scripts mentioning one of these are kept on homepages.
const TIME_SCRIPT_KEYWORDS: &[&str] = &["timestamp", "datetime", "pubdate", "published_time"];

/// Ignored entirely when pulling the text out of an article page.
const ARTICLE_NOISE_TAGS: &[&str] = &[
    "script", "style", "noscript", "footer", "header", "nav", "iframe", "svg",
    "img", "link", "button", "input", "form", "aside", "meta",
];

/// Class-name fragments of common article body containers, in priority order.
const CONTENT_CLASS_FRAGMENTS: &[&str] = &[
    "article", "content", "post-content", "news-body", "story-body", "main",
];

const MIN_PARAGRAPH_CHARS: usize = 10;
const MIN_PARAGRAPH_TEXT_CHARS: usize = 50;

// Create static selectors to avoid recompiling them each time
static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("body").expect("Failed to parse body selector")
});

static ARTICLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("article").expect("Failed to parse article selector")
});

static CLASSED_DIV_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div[class]").expect("Failed to parse div selector")
});

static PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("p").expect("Failed to parse paragraph selector")
});

/// HTTP access to news sites. Cheap to clone; clones share one connection pool.
#[derive(Clone, Debug)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new() -> Result<Self> {
        let client = ClientBuilder::new()
            .user_agent(BROWSER_USER_AGENT)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn fetch_html(&self, url: &str, timeout: Duration) -> Result<String> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;
        let html = response.text().await?;
        Ok(html)
    }

    /// Fetches a homepage and strips it down for the extraction model.
    pub async fn fetch_page_content(&self, url: &str) -> Result<String> {
        info!(url, "fetching homepage");
        let html = self.fetch_html(url, HOMEPAGE_TIMEOUT).await.map_err(|e| {
            warn!(url, error = %e, "homepage fetch failed");
            e
        })?;
        let cleaned = sanitize_homepage_html(&html);
        debug!(url, raw_len = html.len(), cleaned_len = cleaned.len(), "homepage sanitized");
        Ok(cleaned)
    }

    /// Fetches an article page and returns its best-effort plain text.
    pub async fn fetch_article_content(&self, url: &str) -> Result<String> {
        info!(url, "fetching article");
        let html = self.fetch_html(url, ARTICLE_TIMEOUT).await.map_err(|e| {
            warn!(url, error = %e, "article fetch failed");
            e
        })?;
        Ok(extract_article_text(&html))
    }
}

/// Drops presentational noise, comments, and scripts that cannot contain
/// publication times from a homepage, then serializes what is left.
pub fn sanitize_homepage_html(html: &str) -> String {
    let mut document = Html::parse_document(html);

    let doomed: Vec<_> = document
        .tree
        .root()
        .descendants()
        .filter(|node| match node.value() {
            Node::Comment(_) => true,
            Node::Element(el) if HOMEPAGE_NOISE_TAGS.contains(&el.name()) => true,
            Node::Element(el) if el.name() == "script" => ElementRef::wrap(*node)
                .map(|script| !script_mentions_time(script))
                .unwrap_or(true),
            _ => false,
        })
        .map(|node| node.id())
        .collect();

    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
    document.html()
}

fn script_mentions_time(script: ElementRef<'_>) -> bool {
    let body = script.text().collect::<String>();
    if body.trim().is_empty() {
        return false;
    }
    let body = body.to_lowercase();
    TIME_SCRIPT_KEYWORDS.iter().any(|kw| body.contains(kw))
}

/// Pulls the readable body text out of an article page. Never fails; the
/// worst case is an empty string.
pub fn extract_article_text(html: &str) -> String {
    let document = Html::parse_document(html);

    if let Some(node) = find_content_node(&document) {
        return element_text(node, "\n");
    }

    let paragraphs: Vec<String> = document
        .select(&PARAGRAPH_SELECTOR)
        .filter(|p| !inside_noise(p))
        .map(|p| element_text(p, ""))
        .filter(|p| p.chars().count() > MIN_PARAGRAPH_CHARS)
        .collect();
    let text = paragraphs.join("\n\n");

    if text.chars().count() < MIN_PARAGRAPH_TEXT_CHARS {
        if let Some(body) = document.select(&BODY_SELECTOR).next() {
            return element_text(body, "\n");
        }
    }
    text
}

fn find_content_node(document: &Html) -> Option<ElementRef<'_>> {
    if let Some(article) = document.select(&ARTICLE_SELECTOR).find(|el| !inside_noise(el)) {
        return Some(article);
    }
    CONTENT_CLASS_FRAGMENTS.iter().find_map(|fragment| {
        document
            .select(&CLASSED_DIV_SELECTOR)
            .filter(|el| !inside_noise(el))
            .find(|el| el.value().classes().any(|class| class.contains(*fragment)))
    })
}

fn inside_noise(element: &ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ARTICLE_NOISE_TAGS.contains(&ancestor.value().name()))
}

/// Trimmed, non-empty text nodes joined by `separator`, skipping noise subtrees.
fn element_text(element: ElementRef<'_>, separator: &str) -> String {
    let mut parts = Vec::new();
    collect_text(element, &mut parts);
    parts.join(separator)
}

fn collect_text<'a>(element: ElementRef<'a>, parts: &mut Vec<&'a str>) {
    for child in element.children() {
        match child.value() {
            Node::Element(el) if ARTICLE_NOISE_TAGS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, parts);
                }
            }
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    parts.push(trimmed);
                }
            }
            _ => {}
        }
    }
}
