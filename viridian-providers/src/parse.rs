use crate::runtime::HttpResponse;
use anyhow::{Context, anyhow};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct StartSessionResponse {
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SendTextResponse {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub emotion: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UploadAudioResponse {
    // Older servers echo the transcript as `text`, newer ones as `transcript`.
    #[serde(default, alias = "transcript")]
    pub text: Option<String>,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub emotion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EndSessionResponse {
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Turns a non-2xx response into an error, keeping the server's `error` text if any.
pub fn ensure_success(resp: &HttpResponse, what: &str) -> anyhow::Result<()> {
    if resp.is_success() {
        return Ok(());
    }
    let detail = serde_json::from_slice::<ErrorResponse>(&resp.body)
        .map(|e| e.error)
        .unwrap_or_else(|_| String::from_utf8_lossy(&resp.body).into_owned());
    Err(anyhow!(
        "{what} failed: status={} body={}",
        resp.status,
        detail
    ))
}

pub fn parse_session_id(body: &[u8]) -> anyhow::Result<String> {
    let resp: StartSessionResponse =
        serde_json::from_slice(body).context("decode start_session JSON")?;
    non_blank(resp.session_id).ok_or_else(|| anyhow!("no session_id in start_session response"))
}

pub fn parse_send_text(body: &[u8]) -> anyhow::Result<SendTextResponse> {
    let resp: SendTextResponse = serde_json::from_slice(body).context("decode send_text JSON")?;
    Ok(SendTextResponse {
        reply: non_blank(resp.reply),
        emotion: non_blank(resp.emotion),
    })
}

pub fn parse_upload_audio(body: &[u8]) -> anyhow::Result<UploadAudioResponse> {
    let resp: UploadAudioResponse =
        serde_json::from_slice(body).context("decode upload_audio JSON")?;
    Ok(UploadAudioResponse {
        text: non_blank(resp.text),
        reply: non_blank(resp.reply),
        emotion: non_blank(resp.emotion),
    })
}

/// `Ok(None)` when the server answered but had no summary (`null`, blank or absent).
pub fn parse_summary(body: &[u8]) -> anyhow::Result<Option<String>> {
    let resp: EndSessionResponse =
        serde_json::from_slice(body).context("decode end_session JSON")?;
    Ok(non_blank(resp.summary))
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session_id() {
        assert_eq!(parse_session_id(br#"{"session_id":"abc"}"#).unwrap(), "abc");
        assert!(parse_session_id(br#"{}"#).is_err());
        assert!(parse_session_id(br#"{"session_id":""}"#).is_err());
        assert!(parse_session_id(b"<html>").is_err());
    }

    #[test]
    fn reply_is_optional() {
        let r = parse_send_text(br#"{"reply":"hi","emotion":"joy"}"#).unwrap();
        assert_eq!(r.reply.as_deref(), Some("hi"));
        assert_eq!(r.emotion.as_deref(), Some("joy"));

        let r = parse_send_text(br#"{"emotion":"sadness"}"#).unwrap();
        assert_eq!(r.reply, None);

        let r = parse_send_text(br#"{"reply":"  "}"#).unwrap();
        assert_eq!(r.reply, None);
    }

    #[test]
    fn upload_accepts_text_or_transcript() {
        let r = parse_upload_audio(br#"{"text":"hello","reply":"hi"}"#).unwrap();
        assert_eq!(r.text.as_deref(), Some("hello"));
        let r = parse_upload_audio(br#"{"transcript":"hello","reply":"hi"}"#).unwrap();
        assert_eq!(r.text.as_deref(), Some("hello"));
        let r = parse_upload_audio(br#"{"reply":"hi"}"#).unwrap();
        assert_eq!(r.text, None);
    }

    #[test]
    fn summary_keeps_line_breaks_and_allows_null() {
        let s = parse_summary(br#"{"summary":"Session Summary:\n\n* calm"}"#).unwrap();
        assert_eq!(s.as_deref(), Some("Session Summary:\n\n* calm"));
        assert_eq!(parse_summary(br#"{"summary":null}"#).unwrap(), None);
        assert_eq!(parse_summary(br#"{}"#).unwrap(), None);
    }

    #[test]
    fn failure_uses_server_error_field() {
        let resp = HttpResponse {
            status: 500,
            body: br#"{"error":"Internal server error"}"#.to_vec(),
        };
        let err = ensure_success(&resp, "send_text").unwrap_err().to_string();
        assert!(err.contains("status=500"));
        assert!(err.contains("Internal server error"));

        let ok = HttpResponse {
            status: 200,
            body: vec![],
        };
        assert!(ensure_success(&ok, "send_text").is_ok());
    }
}
