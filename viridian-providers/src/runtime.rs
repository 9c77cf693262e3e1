use crate::request::{Body, HttpRequest};
use anyhow::{Context, anyhow};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub type HttpClient = reqwest::Client;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Builds the shared client.
///
/// Only the TCP connect is bounded unless `request_timeout` is set; chat
/// replies and summaries can legitimately take a long time.
pub fn build_client(request_timeout: Option<Duration>) -> anyhow::Result<HttpClient> {
    let mut builder = reqwest::Client::builder().connect_timeout(CONNECT_TIMEOUT);
    if let Some(t) = request_timeout {
        builder = builder.timeout(t);
    }
    builder.build().context("build http client")
}

pub async fn execute(client: &HttpClient, req: &HttpRequest) -> anyhow::Result<HttpResponse> {
    let mut headers = HeaderMap::new();
    for (k, v) in &req.headers {
        let name = HeaderName::from_bytes(k.as_bytes())
            .with_context(|| format!("invalid header name: {k}"))?;
        let value =
            HeaderValue::from_str(v).with_context(|| format!("invalid header value for {k}"))?;
        headers.insert(name, value);
    }

    let builder = match req.method.as_str() {
        "POST" => client.post(&req.url),
        other => return Err(anyhow!("unsupported method: {other}")),
    }
    .headers(headers);

    let builder = match &req.body {
        Body::Json(s) => builder.body(s.clone()),
        Body::MultipartFormData { bytes, .. } => builder.body(bytes.clone()),
    };

    log::debug!("-> {req:?}");
    let resp = builder.send().await.context("http request failed")?;
    let status = resp.status().as_u16();
    let body = resp
        .bytes()
        .await
        .context("failed reading response body")?
        .to_vec();
    log::debug!("<- {} {} ({} bytes)", status, req.url, body.len());

    Ok(HttpResponse { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_json_and_returns_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send_text"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"session_id": "s", "text": "hi"})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"reply":"yo"}"#, "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        let client = build_client(None).unwrap();
        let req = HttpRequest::post_json(
            format!("{}/send_text", server.uri()),
            &json!({"session_id": "s", "text": "hi"}),
        );
        let resp = execute(&client, &req).await.unwrap();
        assert!(resp.is_success());
        assert_eq!(resp.body, br#"{"reply":"yo"}"#);
    }

    #[tokio::test]
    async fn non_success_status_is_returned_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = build_client(Some(Duration::from_secs(5))).unwrap();
        let req = HttpRequest::post_json(server.uri(), &json!({}));
        let resp = execute(&client, &req).await.unwrap();
        assert_eq!(resp.status, 500);
        assert!(!resp.is_success());
    }

    #[tokio::test]
    async fn unsupported_method_errors() {
        let client = build_client(None).unwrap();
        let mut req = HttpRequest::post_json("http://127.0.0.1:9", &json!({}));
        req.method = "PATCH".into();
        let err = execute(&client, &req).await.unwrap_err();
        assert!(err.to_string().contains("unsupported method"));
    }
}
