//! Prompts for the two language-model tasks and parsing of their answers.

use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::llm::{ChatModel, Message};
use crate::models::{ArticleListing, CandidateArticle};

/// Article text beyond this many characters is not sent for summarization.
pub const SUMMARY_INPUT_CHARS: usize = 5000;

const EXTRACTION_SYSTEM_PROMPT: &str =
    "You are a helpful data extraction assistant that outputs strict JSON.";

const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful news summarizer.";

pub fn extraction_prompt(html: &str, base_url: &str) -> String {
    format!(
        r#"You are a web crawling assistant. Below is a cleaned HTML fragment of a news site's homepage.
Extract the list of news articles from it.

The site's base URL is: {base_url}

Rules:
1. Extract each article's title ("title").
2. Extract the full article link ("url"). Complete relative links against the base URL.
3. Extract the publication time.
   - Date/time text must be converted to "YYYY-MM-DD HH:MM:SS" and stored in "datetime_str".
   - A numeric timestamp must be stored in "timestamp".
   - Leave both empty when no time can be found.

Answer with a pure JSON object of this shape:
{{
    "articles": [
        {{
            "title": "Article title",
            "url": "https://example.com/article/1",
            "datetime_str": "2023-10-01 12:00:00",
            "timestamp": 1696161600
        }}
    ]
}}

HTML fragment:
{html}
"#
    )
}

pub fn summary_prompt(content: &str) -> String {
    let excerpt: String = content.chars().take(SUMMARY_INPUT_CHARS).collect();
    format!(
        "Read the following raw text of a news page and write a concise summary in Chinese, \
         no longer than 100 characters.\n\nPage text:\n{excerpt}\n"
    )
}

/// Parses the extraction model's answer. Anything but `{"articles": [...]}` is an
/// error; inside the list, entries of the wrong shape are skipped one by one.
pub fn parse_article_listing(reply: &str) -> Result<Vec<CandidateArticle>> {
    let listing: ArticleListing = serde_json::from_str(reply.trim())
        .map_err(|e| AppError::ParseError(format!("article listing is not valid JSON: {}", e)))?;
    Ok(listing.into_candidates())
}

/// Asks the model for the homepage's article list. Failures yield an empty list.
pub async fn extract_articles(
    model: &dyn ChatModel,
    html: &str,
    base_url: &str,
) -> Vec<CandidateArticle> {
    info!(base_url, html_len = html.len(), "asking model for article list");
    let messages = [
        Message::system(EXTRACTION_SYSTEM_PROMPT),
        Message::user(extraction_prompt(html, base_url)),
    ];

    let reply = match model.complete(&messages, true).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(base_url, error = %e, "article list extraction failed");
            return Vec::new();
        }
    };

    match parse_article_listing(&reply) {
        Ok(articles) => articles,
        Err(e) => {
            warn!(base_url, error = %e, "model returned a non-conforming article list");
            Vec::new()
        }
    }
}

/// Summarizes article text. Failures come back as a readable message in place
/// of the summary.
pub async fn summarize_article(model: &dyn ChatModel, content: &str) -> String {
    let messages = [
        Message::system(SUMMARY_SYSTEM_PROMPT),
        Message::user(summary_prompt(content)),
    ];
    match model.complete(&messages, false).await {
        Ok(summary) => summary.trim().to_string(),
        Err(e) => {
            warn!(error = %e, "summary generation failed");
            format!("Summary generation failed: {}", e)
        }
    }
}
