#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

// Bodies carry user text and recorded audio; logs only get their size.
impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("body", &self.body.summary())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Json(String),
    MultipartFormData { boundary: String, bytes: Vec<u8> },
}

impl Body {
    pub fn len(&self) -> usize {
        match self {
            Body::Json(s) => s.len(),
            Body::MultipartFormData { bytes, .. } => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn summary(&self) -> String {
        let kind = match self {
            Body::Json(_) => "json",
            Body::MultipartFormData { .. } => "multipart",
        };
        format!("{kind}, {} bytes", self.len())
    }
}

impl HttpRequest {
    pub fn post_json(url: impl Into<String>, payload: &serde_json::Value) -> Self {
        Self {
            method: "POST".into(),
            url: url.into(),
            headers: vec![
                ("Content-Type".into(), "application/json".into()),
                ("Accept".into(), "application/json".into()),
            ],
            body: Body::Json(payload.to_string()),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = HttpRequest::post_json("http://localhost/send_text", &json!({}));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.method, "POST");
    }

    #[test]
    fn debug_summarizes_body() {
        let req = HttpRequest::post_json(
            "http://localhost/send_text",
            &json!({"session_id": "s", "text": "i feel anxious"}),
        );

        let s = format!("{req:?}");
        assert!(!s.contains("i feel anxious"));
        assert!(s.contains(&format!("json, {} bytes", req.body.len())));
        assert!(s.contains("/send_text"));
    }
}
