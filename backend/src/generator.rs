use std::time::Duration;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use crate::prompt::POET_PERSONA;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TEMPERATURE: f32 = 0.8;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("API key missing")]
    MissingApiKey,
    #[error("could not build HTTP client: {0}")]
    Client(String),
    #[error("request failed: {0}")]
    Transport(String),
    /// `body` is for the server log only.
    #[error("service answered {status}")]
    Service { status: u16, body: String },
    #[error("service returned no text")]
    EmptyResponse,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat-completions endpoint.
pub struct PoemGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f32,
    api_key: Option<String>,
}

impl PoemGenerator {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        api_key: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| GenerationError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            temperature,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub(crate) fn request_body<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: POET_PERSONA },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: self.temperature,
        }
    }

    /// A key supplied with the request wins over the configured one.
    #[instrument(skip_all, fields(model = %self.model))]
    pub async fn generate(&self, prompt: &str, api_key_override: Option<&str>) -> Result<String, GenerationError> {
        let api_key = api_key_override
            .filter(|key| !key.trim().is_empty())
            .or(self.api_key.as_deref())
            .ok_or(GenerationError::MissingApiKey)?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Generation service answered {}: {}", status, body);
            return Err(GenerationError::Service { status: status.as_u16(), body });
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let poem = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        info!("🎉 Poem generated ({} chars)", poem.chars().count());
        Ok(poem)
    }
}
