//! Clients for text-completion providers.

use std::{fmt::Debug, time::Duration};

use serde::{Deserialize, Serialize};
use ureq::Agent;

use crate::extractor::ExtractionError;

/// Something that can answer a prompt with text.
///
/// Calls block the current thread, run them with [tokio::task::spawn_blocking].
pub trait CompletionClient: Debug + Send + Sync {
    /// Ask the model to respond to `prompt` while following `system_instruction`.
    ///
    /// # Errors
    ///
    /// Returns an [ExtractionError] if the provider could not be reached, did
    /// not answer in time, or answered with something other than text.
    fn complete(&self, system_instruction: &str, prompt: &str) -> Result<String, ExtractionError>;
}

/// Connection settings for an OpenAI-compatible provider.
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    /// Sent as a bearer token. Extraction is disabled when this is `None`.
    pub api_key: Option<String>,
    /// The API root, e.g. "https://api.deepseek.com". `/chat/completions` is appended.
    pub base_url: String,
    /// The model name, e.g. "deepseek-chat".
    pub model: String,
    /// How long a whole request may take, including reading the response.
    pub timeout: Duration,
}

impl ProviderConfig {
    /// The default API root.
    pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";
    /// The default model name.
    pub const DEFAULT_MODEL: &str = "deepseek-chat";
    /// The default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            model: Self::DEFAULT_MODEL.to_owned(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

// Keep the API key out of logs.
impl Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// A [CompletionClient] for providers that speak the OpenAI chat-completions protocol.
pub struct OpenAiCompatibleClient {
    config: ProviderConfig,
    agent: Agent,
}

impl Debug for OpenAiCompatibleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OpenAiCompatibleClient {
    /// Create a client whose requests give up after `config.timeout`.
    pub fn new(config: ProviderConfig) -> Self {
        let agent = Agent::new_with_config(
            Agent::config_builder()
                .timeout_global(Some(config.timeout))
                .build(),
        );

        Self { config, agent }
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

impl CompletionClient for OpenAiCompatibleClient {
    fn complete(&self, system_instruction: &str, prompt: &str) -> Result<String, ExtractionError> {
        let Some(api_key) = &self.config.api_key else {
            return Err(ExtractionError::NotConfigured);
        };

        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            stream: false,
        };

        tracing::debug!(
            "sending completion request to {} with model {}",
            self.config.base_url,
            self.config.model
        );

        let mut response = self
            .agent
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {api_key}"))
            .send_json(&request)
            .map_err(map_ureq_error)?;

        let response: ChatResponse = response
            .body_mut()
            .read_json()
            .map_err(map_ureq_error)?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ExtractionError::MalformedResponse("the response had no message content".to_owned())
            })
    }
}

fn map_ureq_error(error: ureq::Error) -> ExtractionError {
    match error {
        ureq::Error::Timeout(_) => ExtractionError::Timeout,
        ureq::Error::Json(error) => ExtractionError::MalformedResponse(error.to_string()),
        error => ExtractionError::Request(error.to_string()),
    }
}
