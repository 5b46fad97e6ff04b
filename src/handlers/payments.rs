use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{TransactionRecord, TransactionStatus};
use crate::error::AppError;
use crate::ports::RepositoryError;
use crate::use_cases::{InitiateInput, InitiatePayment};
use crate::validation::ValidationError;
use crate::AppState;

/// A JSON scalar the browser may send either quoted or bare.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    Number(serde_json::Number),
    Text(String),
}

impl RawField {
    fn into_string(self) -> String {
        match self {
            RawField::Number(n) => n.to_string(),
            RawField::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRequest {
    #[serde(default)]
    pub amount: Option<RawField>,
    #[serde(default)]
    pub phone_number: Option<RawField>,
    #[serde(default)]
    pub account_reference: Option<String>,
    #[serde(default)]
    pub transaction_desc: Option<String>,
}

impl From<InitiateRequest> for InitiateInput {
    fn from(req: InitiateRequest) -> Self {
        InitiateInput {
            amount: req.amount.map(RawField::into_string).unwrap_or_default(),
            phone_number: req.phone_number.map(RawField::into_string).unwrap_or_default(),
            account_reference: req.account_reference.unwrap_or_default(),
            transaction_desc: req.transaction_desc,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InitiateResponse {
    #[serde(rename = "ResponseCode")]
    pub response_code: String,
    #[serde(rename = "ResponseDescription")]
    pub response_description: String,
    #[serde(rename = "CustomerMessage", skip_serializing_if = "Option::is_none")]
    pub customer_message: Option<String>,
    #[serde(rename = "transactionId")]
    pub transaction_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatusResponse {
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub amount: BigDecimal,
    pub phone_number: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<TransactionRecord> for TransactionStatusResponse {
    fn from(record: TransactionRecord) -> Self {
        Self {
            transaction_id: record.transaction_id,
            status: record.status,
            amount: record.amount,
            phone_number: record.phone_number,
            timestamp: record.created_at,
            receipt_number: record.receipt_number,
            failure_reason: record.failure_reason,
            resolved_at: record.resolved_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub transaction_id: String,
    pub status: TransactionStatus,
    pub amount: BigDecimal,
    pub phone_number: String,
    pub account_reference: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
}

impl From<TransactionRecord> for TransactionSummary {
    fn from(record: TransactionRecord) -> Self {
        Self {
            transaction_id: record.transaction_id,
            status: record.status,
            amount: record.amount,
            phone_number: record.phone_number,
            account_reference: record.account_reference,
            timestamp: record.created_at,
            receipt_number: record.receipt_number,
        }
    }
}

pub async fn initiate(
    State(state): State<AppState>,
    payload: Result<Json<InitiateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        AppError::Validation(vec![ValidationError::new("body", rejection.body_text())])
    })?;

    let output = InitiatePayment::new(state.store.clone(), state.gateway.clone())
        .execute(request.into())
        .await?;

    let ack = output.acknowledgement;
    Ok(Json(InitiateResponse {
        response_code: ack.response_code,
        response_description: ack.response_description,
        customer_message: ack.customer_message,
        transaction_id: output.transaction_id,
        checkout_request_id: ack.checkout_request_id,
        merchant_request_id: ack.merchant_request_id,
    }))
}

pub async fn get_status(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = state
        .store
        .find_by_id(&transaction_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound(_) => {
                AppError::NotFound(format!("Transaction {} not found", transaction_id))
            }
            other => AppError::Internal(other.to_string()),
        })?;

    Ok(Json(TransactionStatusResponse::from(record)))
}

pub async fn list_transactions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let records = state
        .store
        .list()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let summaries: Vec<TransactionSummary> = records.into_iter().map(Into::into).collect();
    Ok(Json(summaries))
}
