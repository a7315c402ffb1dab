//! Outbound remote write sender
//!
//! Re-encodes a transformed batch (protobuf + snappy) and POSTs it to the
//! configured collector with the Remote Write 2.0 headers. Transient
//! failures are retried with exponential backoff; exhausting the attempts
//! fails the invocation and the host drops the batch.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE, USER_AGENT};
use thiserror::Error;

use crate::core::config::SenderConfig;
use crate::core::constants::{
    REMOTE_WRITE_CONTENT_TYPE, REMOTE_WRITE_VERSION, SENDER_USER_AGENT,
};
use crate::wire::{self, WriteRequest};

/// Remote write protocol version header
const VERSION_HEADER: &str = "X-Prometheus-Remote-Write-Version";

#[derive(Error, Debug)]
pub enum ForwardError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("snappy compression failed: {0}")]
    Compress(#[from] snap::Error),

    #[error("remote write rejected: status {status}, body: {body}")]
    Rejected { status: StatusCode, body: String },
}

impl ForwardError {
    /// Whether another attempt could plausibly succeed
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Compress(_) => false,
            Self::Rejected { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
        }
    }
}

/// Downstream collaborator interface: where transformed batches go.
#[async_trait]
pub trait BatchSink: Send + Sync {
    async fn deliver(&self, batch: &WriteRequest) -> Result<(), ForwardError>;
}

/// HTTP remote write sender
pub struct Forwarder {
    client: reqwest::Client,
    endpoint: String,
    max_attempts: u32,
    base_delay: Duration,
}

impl Forwarder {
    pub fn new(config: &SenderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }

    async fn post(&self, body: Vec<u8>) -> Result<(), ForwardError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, REMOTE_WRITE_CONTENT_TYPE)
            .header(CONTENT_ENCODING, "snappy")
            .header(VERSION_HEADER, REMOTE_WRITE_VERSION)
            .header(USER_AGENT, SENDER_USER_AGENT)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ForwardError::Rejected { status, body });
        }
        Ok(())
    }
}

#[async_trait]
impl BatchSink for Forwarder {
    async fn deliver(&self, batch: &WriteRequest) -> Result<(), ForwardError> {
        let body = wire::encode_snappy(batch)?;

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.post(body.clone()).await {
                Ok(()) => {
                    tracing::debug!(
                        series = batch.timeseries.len(),
                        bytes = body.len(),
                        attempts,
                        "batch forwarded"
                    );
                    return Ok(());
                }
                Err(e) if attempts < self.max_attempts && e.is_retryable() => {
                    let delay = self.base_delay * 2u32.pow(attempts - 1);
                    tracing::warn!(
                        error = %e,
                        attempt = attempts,
                        delay_ms = delay.as_millis(),
                        "Retrying remote write after transient error"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(status: StatusCode) -> ForwardError {
        ForwardError::Rejected {
            status,
            body: String::new(),
        }
    }

    #[test]
    fn test_server_errors_are_retryable() {
        assert!(rejected(StatusCode::BAD_GATEWAY).is_retryable());
        assert!(rejected(StatusCode::TOO_MANY_REQUESTS).is_retryable());
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        assert!(!rejected(StatusCode::BAD_REQUEST).is_retryable());
        assert!(!rejected(StatusCode::UNPROCESSABLE_ENTITY).is_retryable());
    }

    #[test]
    fn test_rejected_display_carries_status_and_body() {
        let err = ForwardError::Rejected {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "out of order sample".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "remote write rejected: status 500 Internal Server Error, body: out of order sample"
        );
    }
}
