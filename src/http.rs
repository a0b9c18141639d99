use std::time::Duration;

use crate::dtos::{SentimentRequestDto, SentimentResponseDto};
use crate::error::HttpError;

/// Upper bound on establishing the TCP/TLS connection, whatever the total timeout
const MAX_CONNECT_TIMEOUT_SECS: u64 = 10;

/// HTTP client wrapper for calls to external services
///
/// Used by the remote sentiment scorer. Cloning is cheap because
/// `reqwest::Client` keeps its connection pool behind an Arc.
#[derive(Clone)]
pub struct HttpClient {
    pub conn: reqwest::Client,
}

impl HttpClient {
    pub fn new(conn: reqwest::Client) -> Self {
        Self { conn }
    }

    /// Client whose requests give up after `timeout_secs`
    ///
    /// A stalled service then surfaces as an ordinary transport error instead
    /// of holding the request (and the review submission waiting on it) open
    /// forever.
    pub fn with_timeout(timeout_secs: u64) -> Self {
        let conn = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(
                timeout_secs.min(MAX_CONNECT_TIMEOUT_SECS),
            ))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to a default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self::new(conn)
    }

    /// Ask a text-analysis service for the polarity of `text`
    ///
    /// Sends `{"text": ...}` to `url` and expects `{"polarity": <f64>}` back.
    /// Non-2xx replies and malformed bodies are errors; the caller decides how to
    /// degrade.
    pub async fn get_sentiment(&self, url: &str, text: &str) -> Result<f64, HttpError> {
        let request_body = SentimentRequestDto {
            text: text.to_string(),
        };

        let response = self
            .conn
            .post(url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?
            .error_for_status()
            .map_err(|e| HttpError::server_error(e.to_string()))?;

        let body: SentimentResponseDto = response
            .json()
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?;

        if !body.polarity.is_finite() {
            return Err(HttpError::server_error("Sentiment service returned a non-finite score"));
        }

        Ok(body.polarity)
    }
}
