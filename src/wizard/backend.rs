use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use super::{WizardFormData, NETWORK_ERROR_MESSAGE};
use crate::gateway::ACCEPTED_RESPONSE_CODE;

/// Body returned by `POST /initiate`, on success or failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiationReply {
    #[serde(rename = "ResponseCode", default)]
    pub response_code: Option<String>,
    #[serde(rename = "ResponseDescription", default)]
    pub response_description: Option<String>,
    #[serde(rename = "CustomerMessage", default)]
    pub customer_message: Option<String>,
    #[serde(rename = "transactionId", default)]
    pub transaction_id: Option<String>,
    #[serde(rename = "CheckoutRequestID", default)]
    pub checkout_request_id: Option<String>,
    #[serde(rename = "errorMessage", default)]
    pub error_message: Option<String>,
}

impl InitiationReply {
    pub fn is_accepted(&self) -> bool {
        self.response_code.as_deref() == Some(ACCEPTED_RESPONSE_CODE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitiationFailure {
    /// Non-2xx answer; `message` is the server's `errorMessage` if present.
    Http { status: u16, message: Option<String> },
    Network(String),
}

impl InitiationFailure {
    pub fn user_message(&self) -> String {
        match self {
            InitiationFailure::Http {
                message: Some(message),
                ..
            } => message.clone(),
            InitiationFailure::Http { message: None, .. } | InitiationFailure::Network(_) => {
                NETWORK_ERROR_MESSAGE.to_string()
            }
        }
    }
}

#[async_trait]
pub trait InitiationBackend: Send + Sync {
    async fn initiate(&self, form: &WizardFormData) -> Result<InitiationReply, InitiationFailure>;
}

/// Calls a running relay's `/initiate` endpoint. The PIN stays local: the
/// customer confirms on the handset prompt.
#[derive(Clone)]
pub struct HttpInitiationBackend {
    client: Client,
    base_url: String,
    account_reference: String,
}

impl HttpInitiationBackend {
    pub fn new(base_url: String, account_reference: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url,
            account_reference,
        }
    }
}

#[async_trait]
impl InitiationBackend for HttpInitiationBackend {
    async fn initiate(&self, form: &WizardFormData) -> Result<InitiationReply, InitiationFailure> {
        let url = format!("{}/initiate", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .json(&json!({
                "amount": form.amount.trim(),
                "phoneNumber": form.phone_number.trim(),
                "accountReference": self.account_reference,
                "transactionDesc": "Payment",
            }))
            .send()
            .await
            .map_err(|e| InitiationFailure::Network(e.to_string()))?;

        let status = response.status();
        let reply = response.json::<InitiationReply>().await;

        if status.is_success() {
            reply.map_err(|e| InitiationFailure::Network(e.to_string()))
        } else {
            Err(InitiationFailure::Http {
                status: status.as_u16(),
                message: reply.ok().and_then(|r| r.error_message),
            })
        }
    }
}
