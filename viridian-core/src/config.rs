use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_USERNAME: &str = "guest";
pub const DEFAULT_BOT_NAME: &str = "Viridian";
pub const DEFAULT_LANGUAGE: &str = "en-US";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base url {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("base url must use http or https, got {0:?}")]
    UnsupportedScheme(String),

    #[error("username must not be empty")]
    EmptyUsername,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceMode {
    /// Record microphone audio and upload it to the server for transcription.
    #[default]
    Upload,
    Off,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,

    // Placeholder identity sent when opening a session.
    pub username: String,
    pub bot_name: String,
    pub voice_mode: VoiceMode,
    pub language: String,
    pub microphone_device: Option<String>,

    // None means requests wait as long as the server takes.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            username: DEFAULT_USERNAME.into(),
            bot_name: DEFAULT_BOT_NAME.into(),
            voice_mode: VoiceMode::default(),
            language: DEFAULT_LANGUAGE.into(),
            microphone_device: None,
            request_timeout_secs: None,
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<Url, ConfigError> {
        if self.username.trim().is_empty() {
            return Err(ConfigError::EmptyUsername);
        }
        parse_base_url(&self.base_url)
    }
}

pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}
