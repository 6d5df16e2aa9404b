// Shared fixtures: a fake chat model and a throwaway news site on localhost.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{http::StatusCode, response::Html, routing::get, Router};
use tokio::net::TcpListener;

use news_window_fetcher::error::{AppError, Result};
use news_window_fetcher::llm::{ChatModel, Message};
use news_window_fetcher::pipeline::NewsPipeline;
use news_window_fetcher::scraper::{PageFetcher, BROWSER_USER_AGENT};

pub const HOMEPAGE: &str = r#"<html><head><title>Daily</title><style>.x{}</style></head>
<body><nav>Home | World</nav>
<ul><li><a href="/news/1">Rust 2024 ships</a> <span>2024-05-10 09:00</span></li>
<li><a href="/news/2">Server melts</a></li></ul>
<footer>Contact us</footer></body></html>"#;

pub const ARTICLE_ONE: &str = r#"<html><body><nav>Menu</nav>
<article><h1>Rust 2024 ships</h1><p>The new edition is out today.</p></article>
</body></html>"#;

pub const ARTICLE_ONE_TEXT: &str = "Rust 2024 ships\nThe new edition is out today.";

/// Serves `/site-a`, `/site-b`, `/news/1`, an article page without any text
/// at `/news/blank`; `/news/2` answers 500 and anything else 404.
pub async fn spawn_site() -> String {
    let router = Router::new()
        .route("/site-a", get(|| async { Html(HOMEPAGE) }))
        .route("/site-b", get(|| async { Html(HOMEPAGE) }))
        .route("/news/1", get(|| async { Html(ARTICLE_ONE) }))
        .route("/news/blank", get(|| async { Html("<html><body></body></html>") }))
        .route("/news/2", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test site");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve test site");
    });
    format!("http://{addr}")
}

/// Answers extraction prompts with the listing registered for the base URL
/// found in the prompt, and summary prompts with a fixed reply.
#[derive(Default)]
pub struct FakeModel {
    listings: HashMap<String, String>,
    summary: Option<String>,
    pub calls: Mutex<Vec<(Vec<Message>, bool)>>,
}

impl FakeModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing(mut self, homepage_url: &str, listing: serde_json::Value) -> Self {
        self.listings.insert(homepage_url.to_string(), listing.to_string());
        self
    }

    pub fn with_summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }

    pub fn summary_calls(&self) -> usize {
        self.calls.lock().unwrap().iter().filter(|(_, json)| !json).count()
    }
}

#[async_trait]
impl ChatModel for FakeModel {
    async fn complete(&self, messages: &[Message], json_mode: bool) -> Result<String> {
        self.calls.lock().unwrap().push((messages.to_vec(), json_mode));
        let prompt = messages.last().map(|m| m.content.as_str()).unwrap_or_default();

        if json_mode {
            let base = prompt
                .lines()
                .find_map(|line| line.strip_prefix("The site's base URL is: "))
                .unwrap_or_default()
                .trim();
            return Ok(self
                .listings
                .get(base)
                .cloned()
                .unwrap_or_else(|| r#"{"articles": []}"#.to_string()));
        }

        self.summary
            .clone()
            .ok_or_else(|| AppError::LlmError("model unavailable".into()))
    }
}

pub fn pipeline(model: Arc<FakeModel>) -> NewsPipeline {
    let client = reqwest::Client::builder()
        .no_proxy()
        .user_agent(BROWSER_USER_AGENT)
        .build()
        .expect("test http client");
    NewsPipeline::new(PageFetcher::from_client(client), model)
}
