//! Chat-completion adapter shared by the story and frame generators.
//!
//! One [`ChatClient`] is chosen at startup from [`LlmSettings`] and handed to the
//! generators; nothing downstream knows which provider is on the other end.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::{LlmSettings, Provider};
use crate::error::{MovieError, Result};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Ordered conversation plus optional per-request sampling overrides
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

impl ChatRequest {
    pub fn user(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(prompt)],
            ..Self::default()
        }
    }

    /// Text of the last user message, if any
    pub fn last_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// A decoded JSON-mode reply with the text it was decoded from
#[derive(Debug, Clone, PartialEq)]
pub struct JsonReply {
    pub value: Value,
    pub raw: String,
}

pub trait ChatClient {
    /// Plain completion; the model's reply verbatim.
    fn complete_text(&self, request: &ChatRequest) -> Result<String>;

    /// Completion whose reply must be a JSON document.
    ///
    /// Providers without a native JSON mode fall back to a text completion.
    /// Non-JSON content is an error carrying the raw reply.
    fn complete_json(&self, request: &ChatRequest) -> Result<JsonReply> {
        let raw = self.complete_text(request)?;
        let value = parse_json_content(&raw)?;
        Ok(JsonReply { value, raw })
    }

    fn supports_json_mode(&self) -> bool {
        false
    }
}

/// Decodes a JSON-mode reply, tolerating a surrounding code fence.
pub fn parse_json_content(raw: &str) -> Result<Value> {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```").trim())
        .unwrap_or(trimmed);

    serde_json::from_str(unfenced).map_err(|source| {
        warn!(error = %source, raw = %raw, "JSON-mode completion returned non-JSON content");
        MovieError::MalformedJson {
            raw: raw.to_string(),
            source,
        }
    })
}

/// Blocking HTTP client for every supported provider
pub struct HttpChatClient {
    client: Client,
    settings: LlmSettings,
}

impl HttpChatClient {
    pub fn new(settings: LlmSettings) -> Result<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    fn post(&self, endpoint: &str, body: &Value) -> Result<Value> {
        debug!(%endpoint, provider = %self.settings.provider, "Sending chat completion request");

        let mut request = self.client.post(endpoint).json(body);
        request = match self.settings.provider {
            Provider::Anthropic => request
                .header("x-api-key", &self.settings.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            Provider::Openai | Provider::Ollama => {
                request.header("Authorization", format!("Bearer {}", self.settings.api_key))
            }
        };

        let response = request.send()?;
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MovieError::Llm(format!(
                "{} API error {}: {}",
                self.settings.provider, status, error_text
            )));
        }

        Ok(response.json()?)
    }

    fn chat(&self, request: &ChatRequest, json_mode: bool) -> Result<String> {
        match self.settings.provider {
            Provider::Openai | Provider::Ollama => {
                let endpoint = format!("{}/chat/completions", self.settings.base_url);
                let body = openai_body(&self.settings, request, json_mode);
                openai_text(&self.post(&endpoint, &body)?)
            }
            Provider::Anthropic => {
                let endpoint = format!("{}/messages", self.settings.base_url);
                let body = anthropic_body(&self.settings, request);
                anthropic_text(&self.post(&endpoint, &body)?)
            }
        }
    }
}

impl ChatClient for HttpChatClient {
    fn complete_text(&self, request: &ChatRequest) -> Result<String> {
        self.chat(request, false)
    }

    fn complete_json(&self, request: &ChatRequest) -> Result<JsonReply> {
        let raw = self.chat(request, self.supports_json_mode())?;
        let value = parse_json_content(&raw)?;
        Ok(JsonReply { value, raw })
    }

    fn supports_json_mode(&self) -> bool {
        matches!(self.settings.provider, Provider::Openai | Provider::Ollama)
    }
}

/// Request body for OpenAI-compatible `/chat/completions` endpoints
pub fn openai_body(settings: &LlmSettings, request: &ChatRequest, json_mode: bool) -> Value {
    let mut body = json!({
        "model": request.model.as_deref().unwrap_or(&settings.model),
        "messages": request.messages,
        "temperature": request.temperature.unwrap_or(settings.temperature),
    });
    if json_mode {
        body["response_format"] = json!({ "type": "json_object" });
    }
    body
}

/// Request body for the Anthropic messages API; system turns move to `system`.
pub fn anthropic_body(settings: &LlmSettings, request: &ChatRequest) -> Value {
    let system: Vec<&str> = request
        .messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();
    let messages: Vec<&ChatMessage> = request
        .messages
        .iter()
        .filter(|m| m.role != Role::System)
        .collect();

    let mut body = json!({
        "model": request.model.as_deref().unwrap_or(&settings.model),
        "max_tokens": settings.max_tokens,
        "temperature": request.temperature.unwrap_or(settings.temperature),
        "messages": messages,
    });
    if !system.is_empty() {
        body["system"] = Value::String(system.join("\n\n"));
    }
    body
}

pub fn openai_text(response: &Value) -> Result<String> {
    response
        .get("choices")
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("message"))
        .and_then(|v| v.get("content"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| MovieError::Llm("Invalid OpenAI-compatible response format".to_string()))
}

pub fn anthropic_text(response: &Value) -> Result<String> {
    let blocks = response
        .get("content")
        .and_then(|v| v.as_array())
        .ok_or_else(|| MovieError::Llm("No content in Anthropic response".to_string()))?;

    let text: String = blocks
        .iter()
        .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
        .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.is_empty() {
        return Err(MovieError::Llm(
            "Anthropic response contained no text blocks".to_string(),
        ));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmOverrides;

    fn settings(provider: Provider) -> LlmSettings {
        LlmSettings::from_lookup(provider, LlmOverrides::default(), |_| Some("key".into()))
            .unwrap()
    }

    #[test]
    fn openai_body_carries_model_and_json_mode() {
        let request = ChatRequest::user("hi");
        let s = settings(Provider::Openai);

        let plain = openai_body(&s, &request, false);
        assert_eq!(plain["model"], s.model.as_str());
        assert_eq!(plain["messages"][0]["role"], "user");
        assert!(plain.get("response_format").is_none());

        let json = openai_body(&s, &request, true);
        assert_eq!(json["response_format"]["type"], "json_object");
    }

    #[test]
    fn anthropic_body_lifts_system_messages() {
        let request = ChatRequest {
            messages: vec![ChatMessage::system("be brief"), ChatMessage::user("hi")],
            model: Some("claude-test".into()),
            temperature: Some(0.1),
        };
        let body = anthropic_body(&settings(Provider::Anthropic), &request);
        assert_eq!(body["system"], "be brief");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["model"], "claude-test");
        assert!(body["max_tokens"].as_u64().unwrap() > 0);
    }

    #[test]
    fn response_text_extraction() {
        let openai = json!({"choices": [{"message": {"role": "assistant", "content": "hello"}}]});
        assert_eq!(openai_text(&openai).unwrap(), "hello");
        assert!(openai_text(&json!({"choices": []})).is_err());

        let anthropic = json!({"content": [
            {"type": "text", "text": "he"},
            {"type": "tool_use", "id": "x"},
            {"type": "text", "text": "llo"}
        ]});
        assert_eq!(anthropic_text(&anthropic).unwrap(), "hello");
        assert!(anthropic_text(&json!({"content": []})).is_err());
    }

    #[test]
    fn json_content_is_strict_but_fence_tolerant() {
        assert_eq!(parse_json_content("```json\n{\"a\":1}\n```").unwrap()["a"], 1);
        match parse_json_content("Sure! {\"a\":1}") {
            Err(MovieError::MalformedJson { raw, .. }) => assert!(raw.starts_with("Sure!")),
            other => panic!("expected MalformedJson, got {other:?}"),
        }
    }
}
