use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt as tfmt, EnvFilter};
use news_window_fetcher::{
    config::Config,
    api::routes::create_router,
    llm::OpenAiChat,
    pipeline::NewsPipeline,
    scraper::PageFetcher,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    // Load configuration
    let config = Config::load()?;
    let server_addr = config.server_addr;
    info!(model = %config.model_name, llm_base_url = %config.llm_base_url, "configuration loaded");

    let model = Arc::new(OpenAiChat::from_config(&config));
    let pipeline = NewsPipeline::new(PageFetcher::new()?, model);
    let app = create_router(AppState { pipeline });

    let listener = TcpListener::bind(server_addr).await?;
    info!(%server_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
