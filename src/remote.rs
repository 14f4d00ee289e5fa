//! Delegates the whole pipeline to a remote box-score parser.
//!
//! `POST {base_url}/parse-boxscore` with multipart fields `file` and
//! `username`. A 2xx answer carries the stats as JSON; anything else carries
//! `{"detail": "..."}`.

use reqwest::blocking::{Client, multipart};
use serde::Deserialize;
use std::time::Duration;

use crate::boxscore::{BoxScoreSource, BoxScoreStats, ExtractError};
use crate::log;

pub struct RemoteExtractor {
    client: Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl RemoteExtractor {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("boxscore-ocr/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint_url(base_url),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl BoxScoreSource for RemoteExtractor {
    fn extract(&self, image: &[u8], identifier: &str) -> Result<BoxScoreStats, ExtractError> {
        let mime = image::guess_format(image)
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream");
        let part = multipart::Part::bytes(image.to_vec())
            .file_name("screenshot")
            .mime_str(mime)
            .map_err(|e| ExtractError::Network(e.to_string()))?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("username", identifier.to_string());

        log(&format!("POST {} (username={})", self.endpoint, identifier));

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .map_err(|e| ExtractError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ExtractError::Network(e.to_string()))?;

        decode_response(status.as_u16(), &body)
    }
}

fn endpoint_url(base_url: &str) -> String {
    format!("{}/parse-boxscore", base_url.trim_end_matches('/'))
}

/// Turns a status code and body into stats or a typed failure.
pub fn decode_response(status: u16, body: &str) -> Result<BoxScoreStats, ExtractError> {
    if (200..300).contains(&status) {
        return serde_json::from_str(body).map_err(|e| ExtractError::Remote {
            status,
            detail: format!("Invalid response body: {}", e),
        });
    }

    Err(ExtractError::Remote {
        status,
        detail: error_detail(body),
    })
}

/// Reads `detail` from an error body, falling back to the raw text.
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if body.trim().is_empty() => "no details".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK_BODY: &str = r#"{"username": "testuser", "grade": "A", "points": 10,
        "rebounds": 5, "assists": 3, "steals": 2, "blocks": 1, "fouls": 2,
        "turnovers": 1, "fgm": 5, "fga": 10, "tpm": 2, "tpa": 5, "ftm": 1,
        "fta": 2, "date": "2026-10-16"}"#;

    #[test]
    fn test_endpoint_url() {
        assert_eq!(
            endpoint_url("http://localhost:8000/"),
            "http://localhost:8000/parse-boxscore"
        );
        assert_eq!(endpoint_url("http://api"), "http://api/parse-boxscore");
    }

    #[test]
    fn test_decode_success() {
        let stats = decode_response(200, OK_BODY).unwrap();
        assert_eq!(stats.username, "testuser");
        assert_eq!((stats.fgm, stats.fga), (5, 10));
        assert_eq!((stats.three_pm, stats.three_pa), (2, 5));
    }

    #[test]
    fn test_decode_error_detail() {
        let err = decode_response(400, r#"{"detail": "Username not found in image"}"#).unwrap_err();
        assert_eq!(
            err,
            ExtractError::Remote {
                status: 400,
                detail: "Username not found in image".to_string()
            }
        );
    }

    #[test]
    fn test_decode_structured_detail() {
        let err = decode_response(422, r#"{"detail": [{"loc": ["file"]}]}"#).unwrap_err();
        match err {
            ExtractError::Remote { status, detail } => {
                assert_eq!(status, 422);
                assert!(detail.contains("loc"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_plain_text_error() {
        let err = decode_response(502, "Bad Gateway\n").unwrap_err();
        assert_eq!(
            err,
            ExtractError::Remote {
                status: 502,
                detail: "Bad Gateway".to_string()
            }
        );
    }

    #[test]
    fn test_decode_bad_success_body() {
        let err = decode_response(200, "{}").unwrap_err();
        assert!(matches!(err, ExtractError::Remote { status: 200, .. }));
    }

    #[test]
    fn test_unreachable_server_is_network_error() {
        // Port 9 (discard) on localhost is essentially never listening
        let remote = RemoteExtractor::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = remote.extract(b"\x89PNG", "AUSWEN").unwrap_err();
        assert!(matches!(err, ExtractError::Network(_)), "got {:?}", err);
    }
}
