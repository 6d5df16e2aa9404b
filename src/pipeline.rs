//! Time-windowed fetch-and-filter pipeline.
//!
//! A homepage is fetched and shown to the extraction model, every listed
//! article is checked against the requested window, and articles inside it
//! are optionally fetched and summarized. Work fans out over bounded sets of
//! tokio tasks; results are gathered on the calling task as each unit
//! finishes, so output order is completion order.

use std::future::Future;
use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, instrument, warn};
use url::Url;

use crate::error::Result;
use crate::llm::ChatModel;
use crate::models::{ArticleResult, CandidateArticle, TimeWindow};
use crate::oracle;
use crate::scraper::PageFetcher;
use crate::timeparse;

/// Articles of one homepage processed at the same time.
pub const ARTICLE_WORKERS: usize = 5;

/// Upper bound on homepages processed at the same time.
pub const MAX_HOMEPAGE_WORKERS: usize = 10;

#[derive(Clone)]
pub struct NewsPipeline {
    fetcher: PageFetcher,
    model: Arc<dyn ChatModel>,
}

impl NewsPipeline {
    pub fn new(fetcher: PageFetcher, model: Arc<dyn ChatModel>) -> Self {
        Self { fetcher, model }
    }

    /// Filters one listed article by time and fills in content and summary
    /// when asked to. `None` means the article was excluded.
    pub async fn process_single_article(
        &self,
        article: CandidateArticle,
        homepage_url: &str,
        window: TimeWindow,
        enable_summary: bool,
        return_content: bool,
    ) -> Option<ArticleResult> {
        let title = article.title.clone();
        let label = title.as_deref().unwrap_or("<untitled>");
        let url = resolve_url(homepage_url, &article.url);

        let Some((article_time, datetime)) = derive_article_time(&article) else {
            info!(title = label, "skipping article without a usable time");
            return None;
        };

        if !window.contains(&article_time) {
            info!(title = label, datetime = %datetime, "skipping article outside the time window");
            return None;
        }

        info!(title = label, url = %url, "processing article");
        let mut summary = String::new();
        let mut content = String::new();
        if enable_summary || return_content {
            // A failed fetch has already been logged; the article stays with empty fields.
            // Empty text counts as nothing fetched and is never summarized.
            let fetched = self.fetcher.fetch_article_content(&url).await.ok();
            if let Some(text) = fetched.filter(|text| !text.is_empty()) {
                if enable_summary {
                    summary = oracle::summarize_article(self.model.as_ref(), &text).await;
                }
                if return_content {
                    content = text;
                }
            }
        }

        Some(ArticleResult {
            title,
            summary,
            content,
            url,
            datetime,
        })
    }

    /// Runs the whole pipeline for one homepage.
    ///
    /// Bad window bounds and an unreachable homepage are errors; everything
    /// after that degrades to fewer results instead.
    #[instrument(level = "info", skip(self))]
    pub async fn process_news(
        &self,
        homepage_url: &str,
        start_time: &str,
        end_time: &str,
        enable_summary: bool,
        return_content: bool,
    ) -> Result<Vec<ArticleResult>> {
        let window = TimeWindow::new(
            timeparse::parse_input_time(start_time)?,
            timeparse::parse_input_time(end_time)?,
        );

        let html = self.fetcher.fetch_page_content(homepage_url).await?;
        let articles = oracle::extract_articles(self.model.as_ref(), &html, homepage_url).await;
        info!(count = articles.len(), "model listed articles; filtering by time");

        let pipeline = self.clone();
        let homepage = homepage_url.to_string();
        let outcomes = run_bounded(articles, ARTICLE_WORKERS, move |article| {
            let pipeline = pipeline.clone();
            let homepage = homepage.clone();
            async move {
                pipeline
                    .process_single_article(article, &homepage, window, enable_summary, return_content)
                    .await
            }
        })
        .await;

        let mut results = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => error!(error = %e, "article task failed"),
            }
        }
        info!(kept = results.len(), "homepage done");
        Ok(results)
    }

    /// Runs [`process_news`](Self::process_news) for every homepage without
    /// summaries and concatenates whatever each one produced. Never fails.
    #[instrument(level = "info", skip(self, urls), fields(homepages = urls.len()))]
    pub async fn fetch_news(
        &self,
        urls: &[String],
        start_time: &str,
        end_time: &str,
        return_content: bool,
    ) -> Vec<ArticleResult> {
        let workers = urls.len().min(MAX_HOMEPAGE_WORKERS).max(1);
        let pipeline = self.clone();
        let start_time = start_time.to_string();
        let end_time = end_time.to_string();

        let outcomes = run_bounded(urls.to_vec(), workers, move |url| {
            let pipeline = pipeline.clone();
            let start_time = start_time.clone();
            let end_time = end_time.clone();
            async move {
                info!(url = %url, "starting homepage");
                let result = pipeline
                    .process_news(&url, &start_time, &end_time, false, return_content)
                    .await;
                (url, result)
            }
        })
        .await;

        let mut all_results = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok((_, Ok(results))) => all_results.extend(results),
                Ok((url, Err(e))) => warn!(url = %url, error = %e, "homepage produced no results"),
                Err(e) => error!(error = %e, "homepage task failed"),
            }
        }
        info!(total = all_results.len(), "all homepages done");
        all_results
    }
}

/// Spawns one task per item, at most `limit` running at once, and returns the
/// outcomes in completion order. A panicking task shows up as a `JoinError`.
async fn run_bounded<I, F, Fut>(
    items: I,
    limit: usize,
    task: F,
) -> Vec<std::result::Result<Fut::Output, JoinError>>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future + Send + 'static,
    Fut::Output: Send + 'static,
{
    let permits = Arc::new(Semaphore::new(limit.max(1)));
    let mut set = JoinSet::new();
    for item in items {
        let permits = Arc::clone(&permits);
        let unit = task(item);
        set.spawn(async move {
            // The semaphore is never closed, so acquiring cannot fail.
            let _permit = permits.acquire_owned().await.ok();
            unit.await
        });
    }

    let mut outcomes = Vec::with_capacity(set.len());
    while let Some(outcome) = set.join_next().await {
        outcomes.push(outcome);
    }
    outcomes
}

/// Makes an article link absolute. Links already starting with `http` and
/// empty links are returned as they are.
pub fn resolve_url(homepage_url: &str, url: &str) -> String {
    if url.is_empty() || url.starts_with("http") {
        return url.to_string();
    }
    match Url::parse(homepage_url).and_then(|base| base.join(url)) {
        Ok(resolved) => resolved.to_string(),
        Err(e) => {
            warn!(homepage_url, url, error = %e, "could not resolve article url");
            url.to_string()
        }
    }
}

/// Derives an article's publication time and the string reported for it.
///
/// `datetime_str` wins when it parses; the timestamp is only consulted when
/// the string is missing or malformed.
pub fn derive_article_time(article: &CandidateArticle) -> Option<(NaiveDateTime, String)> {
    if let Some(raw) = article.datetime_str.as_deref().filter(|s| !s.trim().is_empty()) {
        match timeparse::parse_article_datetime(raw) {
            Some(time) => return Some((time, raw.to_string())),
            None => warn!(datetime_str = raw, title = ?article.title, "unparsable article datetime"),
        }
    }

    if article.timestamp.is_some() {
        // Zero is what models emit for "no timestamp", not the epoch.
        let ts = article.timestamp_value().filter(|ts| *ts != 0.0);
        match ts.and_then(timeparse::timestamp_to_local) {
            Some(time) => return Some((time, timeparse::format_datetime(&time))),
            None => warn!(timestamp = ?article.timestamp, title = ?article.title, "unparsable article timestamp"),
        }
    }
    None
}
