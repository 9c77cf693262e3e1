use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use viridian_core::types::{EntryId, Sender, SessionId};

#[derive(Debug, Clone, PartialEq)]
pub struct AudioInput {
    // Mono PCM samples at `sample_rate_hz`.
    // Capture/resampling happens at the boundary.
    pub sample_rate_hz: u32,
    pub samples: Vec<f32>,
}

impl AudioInput {
    /// Anything under 10 ms is treated as "nothing recorded".
    pub fn is_too_short(&self) -> bool {
        (self.samples.len() as u64) * 100 < self.sample_rate_hz as u64
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotReply {
    pub reply: Option<String>,
    pub emotion: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceReply {
    pub transcript: Option<String>,
    pub reply: Option<String>,
    pub emotion: Option<String>,
}

/// The chat server, one method per endpoint.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn start_session(&self, username: &str) -> anyhow::Result<SessionId>;

    async fn send_text(&self, session: &SessionId, text: &str) -> anyhow::Result<BotReply>;

    async fn upload_audio(&self, session: &SessionId, audio: &AudioInput)
    -> anyhow::Result<VoiceReply>;

    /// `Ok(None)` when the server has no summary to give.
    async fn end_session(&self, session: &SessionId) -> anyhow::Result<Option<String>>;
}

/// Where transcript entries are rendered.
pub trait ChatView: Send + Sync {
    fn append(&self, sender: Sender, text: &str) -> EntryId;

    fn append_transient(&self, sender: Sender, text: &str) -> EntryId;

    fn remove(&self, id: EntryId) -> bool;

    fn clear_input(&self) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("voice capture is not supported here")]
    Unsupported,

    #[error("voice capture failed: {0}")]
    Failed(String),
}

/// Buffers microphone audio between `start` and `stop`.
pub trait AudioSource: Send + Sync {
    fn start(&self) -> Result<(), CaptureError>;

    fn stop(&self) -> Result<AudioInput, CaptureError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Interim(String),
    Final(String),
    Error(String),
    End,
}

/// Streaming speech-to-text.
///
/// `start` hands back the event stream for one recognition run. The stream
/// should end with `End` (or `Error`) after `stop`.
pub trait SpeechRecognizer: Send + Sync {
    fn start(&self, language: &str) -> Result<mpsc::Receiver<RecognitionEvent>, CaptureError>;

    fn stop(&self);
}
