//! Chat-completions client for an OpenAI-compatible endpoint (Groq by default).

use async_trait::async_trait;
use reqwest::{Client, Request, StatusCode};
use serde::{Deserialize, Serialize};

use crate::util::{compact_text, is_http_url, normalize_text_option};

use super::{AssistError, GenerationOptions, TextGenerator, AI_UNAVAILABLE};

const ENV_GROQ_API_KEY: &str = "GROQ_API_KEY";
const ENV_GROQ_BASE_URL: &str = "GROQ_BASE_URL";
const ENV_GROQ_MODEL: &str = "GROQ_MODEL";

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai";
const DEFAULT_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";

/// Endpoint, credentials and model for text generation.
#[derive(Clone, PartialEq, Eq)]
pub struct AssistConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl std::fmt::Debug for AssistConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AssistConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .finish()
    }
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl AssistConfig {
    /// Resolve from `GROQ_API_KEY`, `GROQ_BASE_URL` and `GROQ_MODEL`.
    pub fn from_env() -> Result<Self, AssistError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AssistError> {
        let base_url = normalize_text_option(lookup(ENV_GROQ_BASE_URL))
            .map_or_else(|| DEFAULT_BASE_URL.to_string(), |url| {
                url.trim_end_matches('/').to_string()
            });
        if !is_http_url(&base_url) {
            return Err(AssistError::InvalidConfiguration(
                "GROQ_BASE_URL must start with http:// or https://",
            ));
        }

        Ok(Self {
            base_url,
            api_key: normalize_text_option(lookup(ENV_GROQ_API_KEY)),
            model: normalize_text_option(lookup(ENV_GROQ_MODEL))
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    pub const fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    config: AssistConfig,
}

impl GroqClient {
    pub fn new(config: AssistConfig) -> Result<Self, AssistError> {
        Ok(Self {
            client: Client::builder().build()?,
            config,
        })
    }

    pub fn from_env() -> Result<Self, AssistError> {
        Self::new(AssistConfig::from_env()?)
    }

    pub const fn config(&self) -> &AssistConfig {
        &self.config
    }

    /// Send one chat completion and return the assistant message.
    pub async fn complete(
        &self,
        prompt: &str,
        system_prompt: &str,
        options: GenerationOptions,
    ) -> Result<String, AssistError> {
        let request = self.build_request(prompt, system_prompt, options)?;
        let response = self.client.execute(request).await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AssistError::Api(parse_api_error(status, &body)));
        }

        let payload: ChatResponse = response.json().await?;
        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AssistError::Api("Unexpected response format".to_string()))
    }

    fn build_request(
        &self,
        prompt: &str,
        system_prompt: &str,
        options: GenerationOptions,
    ) -> Result<Request, AssistError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(AssistError::NotConfigured)?;

        let mut messages = Vec::with_capacity(2);
        if !system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: system_prompt,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let body = ChatRequest {
            model: &self.config.model,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        self.client
            .post(format!("{}/v1/chat/completions", self.config.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .build()
            .map_err(AssistError::Http)
    }
}

#[async_trait(?Send)]
impl TextGenerator for GroqClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: &str,
        options: GenerationOptions,
    ) -> String {
        match self.complete(prompt, system_prompt, options).await {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!("Text generation failed: {error}");
                format!("{AI_UNAVAILABLE}: {error}")
            }
        }
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.error.and_then(|detail| detail.message) {
            return message.trim().to_string();
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("HTTP {}: {trimmed}", status.as_u16())
    }
}
