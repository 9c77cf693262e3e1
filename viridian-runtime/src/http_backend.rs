use std::time::Duration;

use viridian_audio::wav::{UPLOAD_FILE_NAME, WAV_MIME_TYPE, encode_upload_wav};
use viridian_core::types::SessionId;
use viridian_engine::traits::{AudioInput, BotReply, ChatBackend, VoiceReply};
use viridian_providers::endpoints::ChatEndpoints;
use viridian_providers::multipart::AudioFile;
use viridian_providers::parse;
use viridian_providers::runtime::{HttpClient, build_client, execute};

/// [`ChatBackend`] over the chat server's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: HttpClient,
    endpoints: ChatEndpoints,
}

impl HttpChatBackend {
    pub fn new(base_url: impl Into<String>, request_timeout: Option<Duration>) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_client(request_timeout)?,
            endpoints: ChatEndpoints::new(base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        self.endpoints.base_url()
    }
}

#[async_trait::async_trait]
impl ChatBackend for HttpChatBackend {
    async fn start_session(&self, username: &str) -> anyhow::Result<SessionId> {
        let resp = execute(&self.client, &self.endpoints.start_session(username)).await?;
        parse::ensure_success(&resp, "start_session")?;
        let id = parse::parse_session_id(&resp.body)?;
        Ok(SessionId::new(id))
    }

    async fn send_text(&self, session: &SessionId, text: &str) -> anyhow::Result<BotReply> {
        let resp = execute(&self.client, &self.endpoints.send_text(session, text)).await?;
        parse::ensure_success(&resp, "send_text")?;
        let parsed = parse::parse_send_text(&resp.body)?;
        Ok(BotReply {
            reply: parsed.reply,
            emotion: parsed.emotion,
        })
    }

    async fn upload_audio(
        &self,
        session: &SessionId,
        audio: &AudioInput,
    ) -> anyhow::Result<VoiceReply> {
        let file = AudioFile {
            filename: UPLOAD_FILE_NAME.into(),
            mime_type: WAV_MIME_TYPE.into(),
            bytes: encode_upload_wav(&audio.samples, audio.sample_rate_hz),
        };
        let resp = execute(&self.client, &self.endpoints.upload_audio(session, &file)).await?;
        parse::ensure_success(&resp, "upload_audio")?;
        let parsed = parse::parse_upload_audio(&resp.body)?;
        Ok(VoiceReply {
            transcript: parsed.text,
            reply: parsed.reply,
            emotion: parsed.emotion,
        })
    }

    async fn end_session(&self, session: &SessionId) -> anyhow::Result<Option<String>> {
        let resp = execute(&self.client, &self.endpoints.end_session(session)).await?;
        parse::ensure_success(&resp, "end_session")?;
        parse::parse_summary(&resp.body)
    }
}
