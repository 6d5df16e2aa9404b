use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use crate::error::{AppError, Result};

pub const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1/";
pub const DEFAULT_MODEL_NAME: &str = "qwen-flash";

#[derive(Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub openai_api_key: String,
    /// Root of an OpenAI-compatible API; `chat/completions` is appended to it.
    pub llm_base_url: String,
    pub model_name: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_addr", &self.server_addr)
            .field("openai_api_key", &"<redacted>")
            .field("llm_base_url", &self.llm_base_url)
            .field("model_name", &self.model_name)
            .finish()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        let openai_api_key = env::var("OPENAI_API_KEY")?;
        let llm_base_url = env::var("BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model_name = env::var("MODEL_NAME").unwrap_or_else(|_| DEFAULT_MODEL_NAME.to_string());

        // Load server configuration with defaults
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        let port = port.parse::<u16>().map_err(|e| AppError::ConfigError(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host).map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;

        let server_addr = SocketAddr::new(ip, port);

        Ok(Config {
            server_addr,
            openai_api_key,
            llm_base_url,
            model_name,
        })
    }
}
