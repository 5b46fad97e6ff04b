use async_trait::async_trait;
use base64::{prelude::BASE64_STANDARD, Engine};
use chrono::{DateTime, Utc};
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::{header, Client};
use std::time::Duration;
use thiserror::Error;

use super::payload::{
    AccessTokenResponse, GatewayErrorBody, PushAcknowledgement, PushRequest, StkPushPayload,
    TRANSACTION_TYPE,
};
use crate::config::GatewayConfig;
use crate::ports::PaymentGateway;

const TOKEN_PATH: &str = "/oauth/v1/generate?grant_type=client_credentials";
const STK_PUSH_PATH: &str = "/mpesa/stkpush/v1/processrequest";
const EAT_OFFSET_HOURS: i64 = 3;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Access token request failed: {0}")]
    Auth(String),
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Push rejected by gateway (HTTP {status}): {body:?}")]
    Rejected { status: u16, body: GatewayErrorBody },
    #[error("Invalid response from gateway: {0}")]
    InvalidResponse(String),
    #[error("Circuit breaker open: {0}")]
    CircuitBreakerOpen(String),
}

impl GatewayError {
    /// Message the gateway itself supplied, if any.
    pub fn gateway_message(&self) -> Option<&str> {
        match self {
            GatewayError::Rejected { body, .. } => body.error_message.as_deref(),
            _ => None,
        }
    }

    fn is_transport_failure(&self) -> bool {
        !matches!(self, GatewayError::Rejected { .. })
    }
}

/// Formats `at` as the gateway's 14-digit `YYYYMMDDHHmmss` timestamp in
/// East Africa Time.
pub fn gateway_timestamp(at: DateTime<Utc>) -> String {
    (at.naive_utc() + chrono::Duration::hours(EAT_OFFSET_HOURS))
        .format("%Y%m%d%H%M%S")
        .to_string()
}

/// HTTP client for the mobile-money gateway's OAuth and STK push endpoints.
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    config: GatewayConfig,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_circuit_breaker(config, 3, 60)
    }

    /// Creates a client with custom circuit breaker configuration
    pub fn with_circuit_breaker(
        config: GatewayConfig,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs * 2),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        GatewayClient {
            client,
            config,
            circuit_breaker,
        }
    }

    /// Returns the current state of the circuit breaker
    pub fn circuit_state(&self) -> String {
        if self.circuit_breaker.is_call_permitted() {
            "closed".to_string()
        } else {
            "open".to_string()
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Exchanges the consumer key and secret for a bearer token.
    pub async fn get_access_token(&self) -> Result<String, GatewayError> {
        let credentials = BASE64_STANDARD.encode(format!(
            "{}:{}",
            self.config.consumer_key, self.config.consumer_secret
        ));

        let response = self
            .client
            .get(self.url(TOKEN_PATH))
            .header(header::AUTHORIZATION, format!("Basic {credentials}"))
            .send()
            .await
            .map_err(|e| GatewayError::Auth(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Access token request rejected");
            return Err(GatewayError::Auth(format!("token endpoint returned {status}")));
        }

        let token = response
            .json::<AccessTokenResponse>()
            .await
            .map_err(|e| GatewayError::Auth(e.to_string()))?;

        match token.access_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(GatewayError::Auth("no access token in response".to_string())),
        }
    }

    /// Base64 of short code, passkey and timestamp, concatenated.
    pub fn derive_password(&self, timestamp: &str) -> String {
        BASE64_STANDARD.encode(format!(
            "{}{}{}",
            self.config.short_code, self.config.passkey, timestamp
        ))
    }

    pub fn build_payload(&self, request: &PushRequest, timestamp: &str) -> StkPushPayload {
        StkPushPayload {
            business_short_code: self.config.short_code.clone(),
            password: self.derive_password(timestamp),
            timestamp: timestamp.to_string(),
            transaction_type: TRANSACTION_TYPE.to_string(),
            amount: request.amount,
            party_a: request.phone_number.clone(),
            party_b: self.config.short_code.clone(),
            phone_number: request.phone_number.clone(),
            callback_url: self.config.callback_url.clone(),
            account_reference: request.account_reference.clone(),
            transaction_desc: request.description.clone(),
        }
    }

    async fn submit_push(&self, request: &PushRequest) -> Result<PushAcknowledgement, GatewayError> {
        let token = self.get_access_token().await?;
        let timestamp = gateway_timestamp(Utc::now());
        let payload = self.build_payload(request, &timestamp);

        let response = self
            .client
            .post(self.url(STK_PUSH_PATH))
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = serde_json::from_str::<GatewayErrorBody>(&text).unwrap_or_default();
            tracing::error!(status = %status, body = %text, "STK push rejected by gateway");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<PushAcknowledgement>()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }

    /// Submits an STK push, fetching a fresh token for this call.
    pub async fn initiate_push(
        &self,
        request: &PushRequest,
    ) -> Result<PushAcknowledgement, GatewayError> {
        let result = self
            .circuit_breaker
            .call_with(GatewayError::is_transport_failure, self.submit_push(request))
            .await;

        match result {
            Ok(ack) => Ok(ack),
            Err(FailsafeError::Rejected) => Err(GatewayError::CircuitBreakerOpen(
                "gateway circuit breaker is open".to_string(),
            )),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }
}

#[async_trait]
impl PaymentGateway for GatewayClient {
    async fn initiate_push(
        &self,
        request: &PushRequest,
    ) -> Result<PushAcknowledgement, GatewayError> {
        GatewayClient::initiate_push(self, request).await
    }
}
