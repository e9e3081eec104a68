//! Optional remote advice from a hosted language model.
//!
//! [`Advisor::ask`] always produces text. When no backend is configured, the
//! backend fails, or it answers with nothing, a fixed message pointing at the
//! offline guides is returned instead.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::AdvisoryConfig;
use crate::error::{Error, Result};

/// Returned when no API key is configured.
pub const MISSING_KEY_MESSAGE: &str =
    "Set advisory.api_key (or GUARDIAN_ADVISORY__API_KEY) to use the assistant.";

/// Returned when the model answers with nothing.
pub const EMPTY_REPLY_MESSAGE: &str =
    "No advice is available right now. Please refer to the offline guides.";

/// Returned when the request fails.
pub const NETWORK_FAILURE_MESSAGE: &str =
    "The network or the service is unavailable. Please use the offline first-aid cards.";

/// Returned for a blank question.
pub const EMPTY_QUERY_MESSAGE: &str = "Describe the situation to get advice.";

const SYSTEM_INSTRUCTION: &str = "You are an emergency response expert. Based on the \
situation the user describes, give concise, accurate, step-by-step first-aid or safety \
guidance.\n\
- If the situation is life-threatening, the first line must be: call emergency services now.\n\
- Structure the answer clearly using Markdown.\n\
- Keep a calm, professional and direct tone.\n\
- Do not give vague advice.";

/// Something that can turn a question into advice text.
#[async_trait]
pub trait AdvisoryBackend: Send + Sync {
    /// Ask the backend. An empty string means it had nothing to say.
    async fn generate(&self, query: &str) -> Result<String>;
}

/// Why the fallback text was used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// No backend configured.
    NotConfigured,
    /// The question was blank.
    EmptyQuery,
    /// The backend returned no text.
    EmptyReply,
    /// The backend failed.
    Failed,
}

/// Advice text and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advice {
    /// Text to show.
    pub text: String,
    /// `None` when the text came from the backend.
    pub fallback: Option<FallbackReason>,
}

impl Advice {
    fn fallback(reason: FallbackReason) -> Self {
        let text = match reason {
            FallbackReason::NotConfigured => MISSING_KEY_MESSAGE,
            FallbackReason::EmptyQuery => EMPTY_QUERY_MESSAGE,
            FallbackReason::EmptyReply => EMPTY_REPLY_MESSAGE,
            FallbackReason::Failed => NETWORK_FAILURE_MESSAGE,
        };
        Self {
            text: text.to_string(),
            fallback: Some(reason),
        }
    }

    /// Whether the text came from the backend.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.fallback.is_none()
    }
}

/// Front door for advisory queries.
pub struct Advisor {
    backend: Option<Box<dyn AdvisoryBackend>>,
}

impl std::fmt::Debug for Advisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Advisor")
            .field("configured", &self.backend.is_some())
            .finish()
    }
}

impl Advisor {
    /// An advisor that always falls back.
    #[must_use]
    pub fn offline() -> Self {
        Self { backend: None }
    }

    /// An advisor over `backend`.
    #[must_use]
    pub fn with_backend(backend: impl AdvisoryBackend + 'static) -> Self {
        Self {
            backend: Some(Box::new(backend)),
        }
    }

    /// Build from configuration. Without an API key, or when disabled, the
    /// advisor is offline.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &AdvisoryConfig) -> Result<Self> {
        if !config.enabled {
            debug!("Advisory disabled by configuration");
            return Ok(Self::offline());
        }
        match config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => {
                Ok(Self::with_backend(GeminiBackend::new(config, key)?))
            }
            _ => Ok(Self::offline()),
        }
    }

    /// Whether a backend is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    /// Ask for advice on `query`.
    pub async fn ask(&self, query: &str) -> Advice {
        let query = query.trim();
        if query.is_empty() {
            return Advice::fallback(FallbackReason::EmptyQuery);
        }
        let Some(backend) = &self.backend else {
            return Advice::fallback(FallbackReason::NotConfigured);
        };

        match backend.generate(query).await {
            Ok(text) if text.trim().is_empty() => Advice::fallback(FallbackReason::EmptyReply),
            Ok(text) => Advice {
                text: text.trim().to_string(),
                fallback: None,
            },
            Err(e) => {
                warn!("Advisory request failed: {e}");
                Advice::fallback(FallbackReason::Failed)
            }
        }
    }
}

/// Google Generative Language API backend.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    url: String,
    api_key: String,
    temperature: f32,
}

impl GeminiBackend {
    /// Create a backend for the configured model.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &AdvisoryConfig, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("guardian/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: format!(
                "{}/models/{}:generateContent",
                config.endpoint.trim_end_matches('/'),
                config.model
            ),
            api_key: api_key.to_string(),
            temperature: config.temperature,
        })
    }

    /// The request URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn request_body(&self, query: &str) -> Value {
        serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": query}]
            }],
            "systemInstruction": {
                "parts": [{"text": SYSTEM_INSTRUCTION}]
            },
            "generationConfig": {
                "temperature": self.temperature
            }
        })
    }
}

#[async_trait]
impl AdvisoryBackend for GeminiBackend {
    async fn generate(&self, query: &str) -> Result<String> {
        debug!("Advisory request to {}", self.url);
        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(query))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::AdvisoryStatus {
                status: status.as_u16(),
            });
        }

        let json: Value = response.json().await?;
        Ok(reply_text(&json))
    }
}

/// Concatenated text parts of the first candidate, or an empty string.
fn reply_text(json: &Value) -> String {
    json.get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}
