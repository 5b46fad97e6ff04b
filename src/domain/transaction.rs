//! Transaction domain entity.
//! Framework-agnostic representation of one STK push attempt.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a push. Only `Pending -> Success` and `Pending -> Failed` exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

impl TransactionStatus {
    pub fn is_resolved(self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

/// Outcome reported by the gateway callback for a pending record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Success { receipt_number: Option<String> },
    Failed { reason: String },
}

/// Domain entity representing a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub gateway_request_id: Option<String>,
    pub amount: BigDecimal,
    pub phone_number: String,
    pub account_reference: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub receipt_number: Option<String>,
    pub failure_reason: Option<String>,
}

impl TransactionRecord {
    pub fn new(
        transaction_id: String,
        gateway_request_id: Option<String>,
        amount: BigDecimal,
        phone_number: String,
        account_reference: String,
    ) -> Self {
        Self {
            transaction_id,
            gateway_request_id,
            amount,
            phone_number,
            account_reference,
            status: TransactionStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
            receipt_number: None,
            failure_reason: None,
        }
    }

    /// Applies a callback outcome. Returns `false` and leaves the record
    /// untouched when it has already been resolved.
    pub fn resolve(&mut self, resolution: Resolution, at: DateTime<Utc>) -> bool {
        if self.status.is_resolved() {
            return false;
        }

        match resolution {
            Resolution::Success { receipt_number } => {
                self.status = TransactionStatus::Success;
                self.receipt_number = receipt_number;
            }
            Resolution::Failed { reason } => {
                self.status = TransactionStatus::Failed;
                self.failure_reason = Some(reason);
            }
        }
        self.resolved_at = Some(at);
        true
    }
}

/// Generates a local transaction id: `TXN-<unix millis>-<random suffix>`.
pub fn generate_transaction_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "TXN-{}-{}",
        Utc::now().timestamp_millis(),
        &suffix[..12].to_uppercase()
    )
}
