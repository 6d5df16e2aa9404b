pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod oracle;
pub mod pipeline;
pub mod scraper;
pub mod timeparse;

use pipeline::NewsPipeline;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: NewsPipeline,
}
