use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::AppState;

/// Guards admin routes when `ADMIN_API_KEY` is configured. Without a key the
/// routes stay open.
pub async fn admin_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(expected) = state.admin_api_key.as_deref() else {
        return next.run(req).await;
    };

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match auth_header {
        Some(auth) if auth.strip_prefix("Bearer ") == Some(expected) || auth == expected => {
            next.run(req).await
        }
        _ => {
            tracing::warn!(uri = %req.uri(), "Rejected admin request without valid API key");
            AppError::Unauthorized("missing or invalid admin API key".to_string()).into_response()
        }
    }
}
