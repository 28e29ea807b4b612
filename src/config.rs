use clap::ValueEnum;
use std::fmt;
use std::time::Duration;

use crate::error::{MovieError, Result};
use crate::types::consts::{
    CAPTION_HEIGHT, DEFAULT_FRAME_DELAY, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, FRAME_HEIGHT,
    FRAME_WIDTH,
};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
/// Local endpoints ignore the key but OpenAI-style clients must send one.
pub const OLLAMA_PLACEHOLDER_KEY: &str = "ollama";

/// Chat-completion backend family
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    Openai,
    Anthropic,
    Ollama,
}

impl Provider {
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Openai => "gpt-4o-mini",
            Provider::Anthropic => "claude-3-sonnet-20240229",
            Provider::Ollama => "llama3.1",
        }
    }

    fn model_var(self) -> &'static str {
        match self {
            Provider::Openai => "OPENAI_MODEL",
            Provider::Anthropic => "ANTHROPIC_MODEL",
            Provider::Ollama => "OLLAMA_MODEL",
        }
    }

    fn key_var(self) -> Option<&'static str> {
        match self {
            Provider::Openai => Some("OPENAI_API_KEY"),
            Provider::Anthropic => Some("ANTHROPIC_API_KEY"),
            Provider::Ollama => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::Openai => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Ollama => "ollama",
        };
        f.write_str(name)
    }
}

/// Everything needed to talk to one provider, resolved once at startup
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: Provider,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// Values given on the command line take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct LlmOverrides {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
}

impl LlmSettings {
    pub fn from_env(provider: Provider, overrides: LlmOverrides) -> Result<Self> {
        Self::from_lookup(provider, overrides, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(provider: Provider, overrides: LlmOverrides, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let model = overrides
            .model
            .or_else(|| non_empty(provider.model_var()))
            .unwrap_or_else(|| provider.default_model().to_string());

        let api_key = match provider.key_var() {
            Some(var) => non_empty(var).ok_or_else(|| {
                MovieError::Config(format!("{var} is not set; it is required for the {provider} provider"))
            })?,
            None => OLLAMA_PLACEHOLDER_KEY.to_string(),
        };

        let base_url = match provider {
            Provider::Openai => overrides
                .base_url
                .unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            Provider::Anthropic => overrides
                .base_url
                .unwrap_or_else(|| ANTHROPIC_BASE_URL.to_string()),
            Provider::Ollama => overrides
                .base_url
                .or_else(|| non_empty("OLLAMA_BASE_URL"))
                .unwrap_or_else(|| OLLAMA_BASE_URL.to_string()),
        };

        let temperature = overrides.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(MovieError::Config(format!(
                "temperature must be between 0 and 2, got {temperature}"
            )));
        }

        Ok(Self {
            provider,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            temperature,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(300),
        })
    }
}

/// Dimensions of a generated frame file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSettings {
    pub width: usize,
    /// Total lines, caption footer included
    pub height: usize,
}

impl FrameSettings {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height <= CAPTION_HEIGHT {
            return Err(MovieError::Config(format!(
                "frame must be at least 1 column wide and {} lines tall, got {width}x{height}",
                CAPTION_HEIGHT + 1
            )));
        }
        Ok(Self { width, height })
    }

    /// Lines left for the art once the caption footer is reserved
    pub fn art_height(&self) -> usize {
        self.height - CAPTION_HEIGHT
    }
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSettings {
    pub frame_delay: Duration,
    /// Inner width of the playback box
    pub width: usize,
    /// Inner height of the playback box
    pub height: usize,
}

impl PlaybackSettings {
    pub fn new(delay_secs: f64, width: usize, height: usize) -> Result<Self> {
        if !delay_secs.is_finite() || delay_secs < 0.0 {
            return Err(MovieError::Config(format!(
                "frame delay must be a non-negative number of seconds, got {delay_secs}"
            )));
        }
        if width == 0 || height == 0 {
            return Err(MovieError::Config(format!(
                "playback area must not be empty, got {width}x{height}"
            )));
        }
        Ok(Self {
            frame_delay: Duration::from_secs_f64(delay_secs),
            width,
            height,
        })
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            frame_delay: Duration::from_secs_f64(DEFAULT_FRAME_DELAY),
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn cloud_provider_requires_key() {
        let err = LlmSettings::from_lookup(Provider::Openai, LlmOverrides::default(), lookup(&[]))
            .unwrap_err();
        assert!(matches!(err, MovieError::Config(msg) if msg.contains("OPENAI_API_KEY")));
    }

    #[test]
    fn ollama_uses_placeholder_key_and_env_model() {
        let settings = LlmSettings::from_lookup(
            Provider::Ollama,
            LlmOverrides::default(),
            lookup(&[("OLLAMA_MODEL", "gemma2"), ("OLLAMA_BASE_URL", "http://box:11434/v1/")]),
        )
        .unwrap();
        assert_eq!(settings.model, "gemma2");
        assert_eq!(settings.api_key, OLLAMA_PLACEHOLDER_KEY);
        assert_eq!(settings.base_url, "http://box:11434/v1");
    }

    #[test]
    fn overrides_win_over_environment() {
        let settings = LlmSettings::from_lookup(
            Provider::Anthropic,
            LlmOverrides {
                model: Some("claude-x".into()),
                base_url: None,
                temperature: Some(0.2),
            },
            lookup(&[("ANTHROPIC_API_KEY", "k"), ("ANTHROPIC_MODEL", "ignored")]),
        )
        .unwrap();
        assert_eq!(settings.model, "claude-x");
        assert_eq!(settings.base_url, ANTHROPIC_BASE_URL);
        assert_eq!(settings.temperature, 0.2);
    }

    #[test]
    fn frame_settings_reserve_caption_lines() {
        assert_eq!(FrameSettings::default().art_height(), 12);
        assert!(FrameSettings::new(68, 2).is_err());
        assert!(PlaybackSettings::new(-1.0, 68, 14).is_err());
    }
}
