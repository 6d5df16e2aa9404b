use serde::Deserialize;

fn default_true() -> bool {
    true
}

/// Body of the `fetch_news` tool. Missing bounds default to the last 24 hours.
#[derive(Debug, Deserialize)]
pub struct FetchNewsRequest {
    pub urls: Vec<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default = "default_true")]
    pub return_content: bool,
}

/// Body of the single-homepage call.
#[derive(Debug, Deserialize)]
pub struct ProcessNewsRequest {
    pub url: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_true")]
    pub enable_summary: bool,
    #[serde(default)]
    pub return_content: bool,
}
