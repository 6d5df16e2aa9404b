use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use reqwest::Client;
use tracing::debug;

use crate::config::Config;
use crate::error::{Result, AppError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

/// A chat-completion backend. `json_mode` asks the model for a JSON object.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[Message], json_mode: bool) -> Result<String>;
}

/// OpenAI-compatible `chat/completions` client.
#[derive(Clone)]
pub struct OpenAiChat {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl std::fmt::Debug for OpenAiChat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiChat")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiChat {
    pub fn new(api_key: impl Into<String>, base_url: &str, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            endpoint: completions_endpoint(base_url),
            model: model.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.openai_api_key, &config.llm_base_url, &config.model_name)
    }
}

fn completions_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, messages: &[Message], json_mode: bool) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            response_format: json_mode.then_some(ResponseFormat { kind: "json_object" }),
        };

        debug!(endpoint = %self.endpoint, model = %self.model, json_mode, "calling chat model");
        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LlmError(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::LlmError(e.to_string()))?;

        let json: serde_json::Value = res
            .json()
            .await
            .map_err(|e| AppError::LlmError(e.to_string()))?;
        let reply = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| AppError::LlmError("Invalid response format from LLM".to_string()))?
            .to_string();

        Ok(reply)
    }
}
