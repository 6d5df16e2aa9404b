use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// One article as listed by the extraction model, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CandidateArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default)]
    pub datetime_str: Option<String>,
    /// Epoch seconds or milliseconds; models emit both numbers and numeric strings.
    #[serde(default)]
    pub timestamp: Option<Value>,
}

impl CandidateArticle {
    pub fn timestamp_value(&self) -> Option<f64> {
        match self.timestamp.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Shape the extraction model is asked to answer with. Entries stay raw so
/// one malformed article cannot sink its siblings.
#[derive(Debug, Default, Deserialize)]
pub struct ArticleListing {
    #[serde(default)]
    pub articles: Vec<Value>,
}

impl ArticleListing {
    /// Converts every entry that fits [`CandidateArticle`], dropping the rest.
    pub fn into_candidates(self) -> Vec<CandidateArticle> {
        self.articles
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(article) => Some(article),
                Err(e) => {
                    warn!(index, error = %e, "dropping non-conforming article entry");
                    None
                }
            })
            .collect()
    }
}

/// Inclusive on both ends. An inverted window matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: &NaiveDateTime) -> bool {
        self.start <= *time && *time <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleResult {
    pub title: Option<String>,
    pub summary: String,
    pub content: String,
    pub url: String,
    pub datetime: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 10).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn window_is_inclusive_on_both_ends() {
        let window = TimeWindow::new(at(8, 0, 0), at(18, 0, 0));
        assert!(window.contains(&at(8, 0, 0)));
        assert!(window.contains(&at(18, 0, 0)));
        assert!(window.contains(&at(12, 30, 0)));
        assert!(!window.contains(&at(7, 59, 59)));
        assert!(!window.contains(&at(18, 0, 1)));
    }

    #[test]
    fn inverted_window_matches_nothing() {
        let window = TimeWindow::new(at(18, 0, 0), at(8, 0, 0));
        assert!(!window.contains(&at(12, 0, 0)));
    }

    #[test]
    fn candidate_accepts_loose_model_output() {
        let listing: ArticleListing = serde_json::from_str(
            r#"{"articles": [
                {"title": "A", "url": "/a", "datetime_str": null, "timestamp": "1700000000"},
                {"url": null, "timestamp": 1700000000000},
                {"title": "C", "url": "https://x.test/c", "timestamp": true}
            ]}"#,
        )
        .unwrap();
        let articles = listing.into_candidates();
        assert_eq!(articles.len(), 3);
        assert_eq!(articles[0].timestamp_value(), Some(1_700_000_000.0));
        assert_eq!(articles[1].url, "");
        assert_eq!(articles[1].timestamp_value(), Some(1_700_000_000_000.0));
        assert_eq!(articles[2].timestamp_value(), None);
    }

    #[test]
    fn malformed_entries_are_dropped_individually() {
        let listing: ArticleListing = serde_json::from_str(
            r#"{"articles": [
                {"title": "good", "url": "/news/1", "datetime_str": "2024-05-10 09:00:00"},
                {"title": 42, "url": "/news/2"},
                {"title": "odd date", "url": "/news/3", "datetime_str": 20240510},
                "just a string",
                {"title": "also good", "url": "/news/4"}
            ]}"#,
        )
        .unwrap();
        let articles = listing.into_candidates();
        let titles: Vec<_> = articles.iter().map(|a| a.title.as_deref()).collect();
        assert_eq!(titles, [Some("good"), Some("also good")]);
    }

    #[test]
    fn missing_articles_key_is_an_empty_listing() {
        let listing: ArticleListing = serde_json::from_str("{}").unwrap();
        assert!(listing.into_candidates().is_empty());
    }
}
