use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::utils::sanitize::sanitize_json;
use crate::AppState;

const MAX_BODY_LOG_SIZE: usize = 16 * 1024;
/// axum's default body limit.
const MAX_BUFFERED_BODY_SIZE: usize = 2 * 1024 * 1024;
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Reuses the caller's request id when it sent a usable one.
fn request_id(req: &Request) -> HeaderValue {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .filter(|value| !value.is_empty() && value.len() <= 128)
        .cloned()
        .or_else(|| HeaderValue::from_str(&Uuid::new_v4().to_string()).ok())
        .unwrap_or_else(|| HeaderValue::from_static("unknown"))
}

/// Renders a buffered body for the log line with sensitive fields masked.
/// Bodies over 16 KiB are summarised by size only.
fn loggable_body(bytes: &Bytes) -> String {
    if bytes.len() > MAX_BODY_LOG_SIZE {
        return format!("[{} bytes, not logged]", bytes.len());
    }

    match serde_json::from_slice::<serde_json::Value>(bytes) {
        Ok(json) => sanitize_json(&json).to_string(),
        Err(_) => format!("[non-json, {} bytes]", bytes.len()),
    }
}

/// Tags every request with `x-request-id` and logs status and latency inside
/// a per-request span. With body logging on, the body is buffered and logged
/// after masking; oversized bodies are still forwarded.
pub async fn request_logger_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let request_id = request_id(&req);
    req.headers_mut()
        .insert(REQUEST_ID_HEADER, request_id.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id.to_str().unwrap_or_default(),
        method = %req.method(),
        uri = %req.uri(),
    );

    async move {
        let start = Instant::now();

        if state.log_request_body {
            let (parts, body) = req.into_parts();
            let Ok(bytes) = axum::body::to_bytes(body, MAX_BUFFERED_BODY_SIZE).await else {
                tracing::warn!("Request body too large or unreadable");
                return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
            };
            tracing::info!(body_size = bytes.len(), body = %loggable_body(&bytes), "Incoming request");
            req = Request::from_parts(parts, Body::from(bytes));
        } else {
            tracing::info!("Incoming request");
        }

        let mut response = next.run(req).await;

        tracing::info!(
            status = response.status().as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );

        response.headers_mut().insert(REQUEST_ID_HEADER, request_id);
        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_caller_request_id() {
        let req = Request::builder()
            .header(REQUEST_ID_HEADER, "abc-123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_id(&req), "abc-123");
    }

    #[test]
    fn generates_request_id_when_missing() {
        let req = Request::builder().body(Body::empty()).unwrap();
        let id = request_id(&req);
        assert!(Uuid::parse_str(id.to_str().unwrap()).is_ok());
    }

    #[test]
    fn masks_body_for_logging() {
        let body = Bytes::from(r#"{"phoneNumber":"254712345678","amount":500}"#);
        let logged = loggable_body(&body);
        assert!(!logged.contains("254712345678"));
        assert!(logged.contains("500"));
        assert_eq!(loggable_body(&Bytes::from("abc")), "[non-json, 3 bytes]");
    }

    #[test]
    fn oversized_body_is_summarised() {
        let body = Bytes::from(vec![b' '; MAX_BODY_LOG_SIZE + 1]);
        assert_eq!(
            loggable_body(&body),
            format!("[{} bytes, not logged]", MAX_BODY_LOG_SIZE + 1)
        );
    }
}
