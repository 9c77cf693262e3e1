use crate::multipart::{AudioFile, MultipartForm};
use crate::request::{Body, HttpRequest};
use serde_json::json;
use viridian_core::types::SessionId;

pub const PATH_START_SESSION: &str = "/start_session";
pub const PATH_SEND_TEXT: &str = "/send_text";
pub const PATH_UPLOAD_AUDIO: &str = "/upload_audio";
pub const PATH_END_SESSION: &str = "/end_session";

/// Request builders for the chat server's four endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEndpoints {
    base_url: String,
}

impl ChatEndpoints {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn start_session(&self, username: &str) -> HttpRequest {
        HttpRequest::post_json(
            join_url(&self.base_url, PATH_START_SESSION),
            &json!({ "username": username }),
        )
    }

    pub fn send_text(&self, session: &SessionId, text: &str) -> HttpRequest {
        HttpRequest::post_json(
            join_url(&self.base_url, PATH_SEND_TEXT),
            &json!({ "session_id": session.as_str(), "text": text }),
        )
    }

    pub fn upload_audio(&self, session: &SessionId, audio: &AudioFile) -> HttpRequest {
        let form = MultipartForm::new()
            .file("audio", audio)
            .field("session_id", session.as_str());
        let content_type = form.content_type();
        let (boundary, bytes) = form.finish();

        HttpRequest {
            method: "POST".into(),
            url: join_url(&self.base_url, PATH_UPLOAD_AUDIO),
            headers: vec![
                ("Content-Type".into(), content_type),
                ("Accept".into(), "application/json".into()),
            ],
            body: Body::MultipartFormData { boundary, bytes },
        }
    }

    pub fn end_session(&self, session: &SessionId) -> HttpRequest {
        HttpRequest::post_json(
            join_url(&self.base_url, PATH_END_SESSION),
            &json!({ "session_id": session.as_str() }),
        )
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}
