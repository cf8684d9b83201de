use std::env;
use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use edutrack_core::model::{ChatMessage, ChatRole};

use crate::error::GenerationError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Credential for the generative-text service.
///
/// Never blank: `ApiKey::new` returns `None` for blank input, which is how demo
/// mode is represented.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Clone, Debug)]
pub struct GenerativeTextConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<ApiKey>,
}

impl Default for GenerativeTextConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
            api_key: None,
        }
    }
}

impl GenerativeTextConfig {
    /// Reads `EDUTRACK_API_KEY`, `EDUTRACK_AI_BASE_URL` and `EDUTRACK_AI_MODEL`.
    ///
    /// A missing or blank key leaves `api_key` empty (demo mode).
    #[must_use]
    pub fn from_env() -> Self {
        let api_key = env::var("EDUTRACK_API_KEY").ok().and_then(ApiKey::new);
        let base_url = env::var("EDUTRACK_AI_BASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let model = env::var("EDUTRACK_AI_MODEL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.into());
        Self {
            base_url,
            model,
            api_key,
        }
    }
}

/// A prior conversation turn passed back to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: ChatRole,
    pub text: String,
}

impl Turn {
    #[must_use]
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

impl From<&ChatMessage> for Turn {
    fn from(message: &ChatMessage) -> Self {
        Self::new(message.role, message.text.clone())
    }
}

/// Everything the service needs for one generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system_instruction: Option<String>,
    pub history: Vec<Turn>,
    pub prompt: String,
}

impl GenerationRequest {
    #[must_use]
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }
}

/// Seam to the external generative-text service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a reply for `request`.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError` when the request fails or yields no text.
    async fn generate(
        &self,
        credential: &ApiKey,
        request: GenerationRequest,
    ) -> Result<String, GenerationError>;
}

/// `TextGenerator` speaking the OpenAI-compatible chat completions protocol.
#[derive(Clone)]
pub struct HttpTextGenerator {
    client: Client,
    base_url: String,
    model: String,
}

impl HttpTextGenerator {
    #[must_use]
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &GenerativeTextConfig) -> Self {
        Self::new(config.base_url.clone(), config.model.clone())
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(
        &self,
        credential: &ApiKey,
        request: GenerationRequest,
    ) -> Result<String, GenerationError> {
        let payload = ChatRequest {
            model: self.model.clone(),
            messages: build_messages(request),
            temperature: 0.7,
        };
        debug!(
            model = %self.model,
            messages = payload.messages.len(),
            "sending generation request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(credential.expose())
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenerationError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        Ok(content)
    }
}

fn wire_role(role: ChatRole) -> &'static str {
    match role {
        ChatRole::Student => "user",
        ChatRole::Tutor => "assistant",
    }
}

fn build_messages(request: GenerationRequest) -> Vec<WireMessage> {
    let mut messages = Vec::with_capacity(request.history.len() + 2);
    if let Some(system) = request.system_instruction {
        messages.push(WireMessage {
            role: "system",
            content: system,
        });
    }
    messages.extend(request.history.into_iter().map(|turn| WireMessage {
        role: wire_role(turn.role),
        content: turn.text,
    }));
    messages.push(WireMessage {
        role: "user",
        content: request.prompt,
    });
    messages
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_key_means_demo_mode() {
        assert!(ApiKey::new("   ").is_none());
        assert_eq!(ApiKey::new(" k-1 ").unwrap().expose(), "k-1");
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("secret").unwrap();
        assert_eq!(format!("{key:?}"), "ApiKey(***)");
    }

    #[test]
    fn messages_put_system_first_and_prompt_last() {
        let request = GenerationRequest {
            system_instruction: Some("persona".into()),
            history: vec![
                Turn::new(ChatRole::Tutor, "Bonjour"),
                Turn::new(ChatRole::Student, "Salut"),
            ],
            prompt: "Explique Thalès".into(),
        };
        let messages = build_messages(request);
        let roles: Vec<&str> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["system", "assistant", "user", "user"]);
        assert_eq!(messages[3].content, "Explique Thalès");
    }

    #[test]
    fn bare_prompt_is_a_single_user_message() {
        let messages = build_messages(GenerationRequest::prompt("hello"));
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let generator = HttpTextGenerator::new("http://localhost:8080/v1/", "m");
        assert_eq!(
            generator.endpoint(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn response_body_parses_openai_shape() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":" ok "}}]}"#;
        let body: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(body.choices[0].message.content.as_deref(), Some(" ok "));
    }
}
