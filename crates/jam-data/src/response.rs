//! HTTP response handling.

use crate::FetchError;

/// Longest error message kept from a failed response body.
const MAX_ERROR_MESSAGE_LEN: usize = 512;

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    /// The HTTP status code.
    pub status: u16,
    /// The response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// Buffer a reqwest response.
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self, FetchError> {
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(Self::new(status, body))
    }

    /// Check if the response was successful (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String, FetchError> {
        String::from_utf8(self.body.clone())
            .map_err(|e| FetchError::ParseError(format!("Invalid UTF-8: {}", e)))
    }

    /// Get the raw response body.
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Convert to a Result, returning an error for non-2xx status codes.
    ///
    /// JSON error bodies of the form `{"detail": ...}`, `{"message": ...}`
    /// or `{"mensaje": ...}` are reduced to that field.
    pub fn error_for_status(self) -> Result<Self, FetchError> {
        if self.is_success() {
            return Ok(self);
        }
        Err(FetchError::HttpError {
            status: self.status,
            message: self.error_message(),
        })
    }

    fn error_message(&self) -> String {
        let text = match self.text() {
            Ok(text) if !text.trim().is_empty() => text,
            _ => return "Unknown error".to_string(),
        };

        let extracted = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| {
                ["detail", "message", "mensaje", "error"]
                    .iter()
                    .find_map(|k| v.get(*k).cloned())
            })
            .map(|v| match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            });

        let mut message = extracted.unwrap_or(text);
        if message.len() > MAX_ERROR_MESSAGE_LEN {
            let mut cut = MAX_ERROR_MESSAGE_LEN;
            while !message.is_char_boundary(cut) {
                cut -= 1;
            }
            message.truncate(cut);
            message.push_str("...");
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_response(status: u16, body: &[u8]) -> Response {
        Response::new(status, body.to_vec())
    }

    #[test]
    fn test_status_classes() {
        assert!(make_response(200, b"").is_success());
        assert!(!make_response(300, b"").is_success());
        assert!(!make_response(404, b"").is_success());
    }

    #[test]
    fn test_text_rejects_invalid_utf8() {
        assert_eq!(make_response(200, b"ok").text().unwrap(), "ok");
        assert!(matches!(
            make_response(200, &[0xff, 0xfe]).text(),
            Err(FetchError::ParseError(_))
        ));
    }

    #[test]
    fn test_error_for_status_success() {
        assert!(make_response(204, b"").error_for_status().is_ok());
    }

    #[test]
    fn test_error_for_status_extracts_detail() {
        let err = make_response(400, br#"{"detail": "Zona no encontrada"}"#)
            .error_for_status()
            .unwrap_err();
        match err {
            FetchError::HttpError { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Zona no encontrada");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_for_status_plain_text_and_empty() {
        let err = make_response(502, b"Bad Gateway").error_for_status().unwrap_err();
        assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");

        let err = make_response(500, b"").error_for_status().unwrap_err();
        assert_eq!(err.to_string(), "HTTP 500: Unknown error");
    }

    #[test]
    fn test_error_message_truncated() {
        let body = "x".repeat(2000);
        let err = make_response(500, body.as_bytes()).error_for_status().unwrap_err();
        match err {
            FetchError::HttpError { message, .. } => {
                assert_eq!(message.len(), MAX_ERROR_MESSAGE_LEN + 3);
                assert!(message.ends_with("..."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
