use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::gateway::CallbackEnvelope;
use crate::use_cases::ResolveCallback;
use crate::utils::sanitize::sanitize_json;
use crate::AppState;

/// Acknowledgment the gateway expects for every delivery.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallbackAck {
    #[serde(rename = "ResultCode")]
    pub result_code: i32,
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
}

impl CallbackAck {
    pub fn success() -> Self {
        Self {
            result_code: 0,
            result_desc: "Success".to_string(),
        }
    }
}

/// Always answers 200 with a success acknowledgment. Anything that goes wrong
/// here is logged and swallowed, otherwise the gateway keeps redelivering.
#[instrument(skip_all)]
pub async fn callback(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(value) => {
            tracing::debug!(payload = %sanitize_json(&value), "Received gateway callback");

            match serde_json::from_value::<CallbackEnvelope>(value) {
                Ok(envelope) => {
                    let callback = envelope.body.stk_callback;
                    if let Err(e) = ResolveCallback::new(state.store.clone())
                        .execute(&callback)
                        .await
                    {
                        tracing::error!(
                            checkout_request_id = %callback.checkout_request_id,
                            error = %e,
                            "Failed to apply gateway callback"
                        );
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Unrecognised callback envelope"),
            }
        }
        Err(e) => tracing::warn!(error = %e, "Callback body is not JSON"),
    }

    (StatusCode::OK, Json(CallbackAck::success()))
}
