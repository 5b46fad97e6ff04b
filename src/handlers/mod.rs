pub mod payments;
pub mod webhook;

use crate::AppState;
use axum::{extract::State, response::IntoResponse, Json};

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(crate::health::check_health(state.start_time))
}
