//! Remote write receive endpoint
//!
//! `POST /api/v1/write` accepts a snappy-compressed
//! `io.prometheus.write.v2.Request` body and enqueues the decoded batch for
//! the pipeline. The sender sees `204` on accept, `400` on an undecodable
//! body, and `503` with `Retry-After` when the relay is backed up.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::core::constants::BACKPRESSURE_RETRY_AFTER_SECS;
use crate::wire::{self, WriteRequest};

/// Shared state for the write route
#[derive(Clone)]
pub struct WriteState {
    pub queue: mpsc::Sender<WriteRequest>,
}

pub async fn receive(State(state): State<WriteState>, body: Bytes) -> Response {
    let request = match wire::decode_snappy(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(error = %e, bytes = body.len(), "Rejecting undecodable write body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match state.queue.try_send(request) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(TrySendError::Full(_)) => {
            tracing::warn!("Receive queue full, applying backpressure");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [(
                    header::RETRY_AFTER,
                    BACKPRESSURE_RETRY_AFTER_SECS.to_string(),
                )],
            )
                .into_response()
        }
        Err(TrySendError::Closed(_)) => {
            tracing::error!("Receive queue closed, rejecting write");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::TimeSeries;

    fn state(capacity: usize) -> (WriteState, mpsc::Receiver<WriteRequest>) {
        let (tx, rx) = mpsc::channel(capacity);
        (WriteState { queue: tx }, rx)
    }

    fn sample_body() -> Bytes {
        let request = WriteRequest {
            symbols: vec!["".to_string(), "__name__".to_string(), "up".to_string()],
            timeseries: vec![TimeSeries {
                labels_refs: vec![1, 2],
                ..Default::default()
            }],
        };
        Bytes::from(wire::encode_snappy(&request).unwrap())
    }

    #[tokio::test]
    async fn test_accepts_valid_body_and_enqueues() {
        let (write_state, mut rx) = state(4);
        let response = receive(State(write_state), sample_body()).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let queued = rx.try_recv().unwrap();
        assert_eq!(queued.timeseries.len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_garbage_body() {
        let (write_state, mut rx) = state(4);
        let response = receive(State(write_state), Bytes::from_static(b"not snappy")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_queue_returns_retry_after() {
        let (write_state, _rx) = state(1);
        assert_eq!(
            receive(State(write_state.clone()), sample_body()).await.status(),
            StatusCode::NO_CONTENT
        );

        let response = receive(State(write_state), sample_body()).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok()),
            Some("1")
        );
    }

    #[tokio::test]
    async fn test_closed_queue_returns_unavailable() {
        let (write_state, rx) = state(1);
        drop(rx);
        let response = receive(State(write_state), sample_body()).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
