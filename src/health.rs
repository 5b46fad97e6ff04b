use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
}

/// Liveness only: the process is up and serving.
pub fn check_health(start_time: Instant) -> HealthResponse {
    HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now(),
        uptime_seconds: start_time.elapsed().as_secs(),
    }
}
