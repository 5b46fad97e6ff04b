//! Initiate payment use case.
//! Validates a payment request, relays it to the gateway and records the
//! pending transaction.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use thiserror::Error;

use crate::domain::{generate_transaction_id, TransactionRecord};
use crate::error::AppError;
use crate::gateway::{GatewayError, PushAcknowledgement, PushRequest};
use crate::ports::{PaymentGateway, RepositoryError, TransactionStore};
use crate::validation::{self, ValidationError};

const DEFAULT_DESCRIPTION: &str = "Payment";
const MAX_ID_ATTEMPTS: usize = 3;

/// Input for the InitiatePayment use case, as received from the caller.
#[derive(Debug, Clone)]
pub struct InitiateInput {
    pub amount: String,
    pub phone_number: String,
    pub account_reference: String,
    pub transaction_desc: Option<String>,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPayment {
    pub amount: BigDecimal,
    pub push: PushRequest,
}

/// Output of the InitiatePayment use case.
#[derive(Debug, Clone)]
pub struct InitiateOutput {
    pub transaction_id: String,
    pub acknowledgement: PushAcknowledgement,
}

/// How the gateway answered a push.
#[derive(Debug, Clone, PartialEq)]
pub enum InitiateResult {
    Accepted(PushAcknowledgement),
    Rejected { code: String, reason: String },
}

impl From<PushAcknowledgement> for InitiateResult {
    fn from(ack: PushAcknowledgement) -> Self {
        if ack.is_accepted() {
            InitiateResult::Accepted(ack)
        } else {
            InitiateResult::Rejected {
                code: ack.response_code,
                reason: ack.response_description,
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum InitiateError {
    #[error("invalid payment request")]
    Validation(Vec<ValidationError>),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("push rejected with code {code}: {reason}")]
    Rejected { code: String, reason: String },
    #[error("could not record transaction: {0}")]
    Store(#[from] RepositoryError),
}

impl From<InitiateError> for AppError {
    fn from(err: InitiateError) -> Self {
        match err {
            InitiateError::Validation(errors) => AppError::Validation(errors),
            InitiateError::Gateway(GatewayError::Auth(detail)) => AppError::Auth(detail),
            InitiateError::Gateway(e) => AppError::Gateway {
                message: e.gateway_message().map(str::to_string),
                detail: e.to_string(),
            },
            InitiateError::Rejected { code, reason } => AppError::Gateway {
                detail: format!("response code {}: {}", code, reason),
                message: Some(reason),
            },
            InitiateError::Store(e) => AppError::Internal(e.to_string()),
        }
    }
}

/// Checks every field and reports all failures together.
pub fn validate(input: &InitiateInput) -> Result<ValidatedPayment, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let amount = validation::parse_amount(&input.amount)
        .map_err(|e| errors.push(e))
        .ok();
    let phone_number = validation::validate_phone(&input.phone_number)
        .map_err(|e| errors.push(e))
        .ok();
    let account_reference = validation::validate_account_reference(&input.account_reference)
        .map_err(|e| errors.push(e))
        .ok();
    let description = match input.transaction_desc.as_deref() {
        Some(raw) if !raw.trim().is_empty() => validation::validate_transaction_desc(raw)
            .map_err(|e| errors.push(e))
            .ok(),
        _ => Some(DEFAULT_DESCRIPTION.to_string()),
    };

    let rounded = amount.as_ref().and_then(|a| {
        validation::round_amount(a).or_else(|| {
            errors.push(ValidationError::new("amount", "is out of range"));
            None
        })
    });

    match (amount, rounded, phone_number, account_reference, description) {
        (Some(amount), Some(rounded), Some(phone_number), Some(account_reference), Some(description))
            if errors.is_empty() =>
        {
            Ok(ValidatedPayment {
                amount,
                push: PushRequest {
                    amount: rounded,
                    phone_number,
                    account_reference,
                    description,
                },
            })
        }
        _ => Err(errors),
    }
}

/// Use case for relaying a payment to the gateway.
pub struct InitiatePayment {
    store: Arc<dyn TransactionStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl InitiatePayment {
    pub fn new(store: Arc<dyn TransactionStore>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { store, gateway }
    }

    async fn fresh_transaction_id(&self) -> Result<String, InitiateError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = generate_transaction_id();
            match self.store.find_by_id(&candidate).await {
                Err(RepositoryError::NotFound(_)) => return Ok(candidate),
                Ok(_) => tracing::warn!(transaction_id = %candidate, "Transaction id collision"),
                Err(e) => return Err(e.into()),
            }
        }
        Err(RepositoryError::Conflict("could not allocate a transaction id".to_string()).into())
    }

    pub async fn execute(&self, input: InitiateInput) -> Result<InitiateOutput, InitiateError> {
        let payment = validate(&input).map_err(InitiateError::Validation)?;
        let transaction_id = self.fresh_transaction_id().await?;

        tracing::info!(
            transaction_id = %transaction_id,
            amount = payment.push.amount,
            "Submitting STK push"
        );

        let ack = match InitiateResult::from(self.gateway.initiate_push(&payment.push).await?) {
            InitiateResult::Accepted(ack) => ack,
            InitiateResult::Rejected { code, reason } => {
                tracing::warn!(
                    transaction_id = %transaction_id,
                    response_code = %code,
                    reason = %reason,
                    "STK push not accepted"
                );
                return Err(InitiateError::Rejected { code, reason });
            }
        };

        let record = TransactionRecord::new(
            transaction_id,
            Some(ack.checkout_request_id.clone()),
            payment.amount,
            payment.push.phone_number,
            payment.push.account_reference,
        );
        let inserted = self.store.insert(record).await?;

        tracing::info!(
            transaction_id = %inserted.transaction_id,
            checkout_request_id = %ack.checkout_request_id,
            "STK push accepted, transaction pending"
        );

        Ok(InitiateOutput {
            transaction_id: inserted.transaction_id,
            acknowledgement: ack,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(amount: &str, phone: &str, reference: &str) -> InitiateInput {
        InitiateInput {
            amount: amount.to_string(),
            phone_number: phone.to_string(),
            account_reference: reference.to_string(),
            transaction_desc: None,
        }
    }

    #[test]
    fn validates_and_normalizes() {
        let payment = validate(&input("100.6", "0712345678", "INV-001")).unwrap();
        assert_eq!(payment.push.amount, 101);
        assert_eq!(payment.push.phone_number, "254712345678");
        assert_eq!(payment.push.description, DEFAULT_DESCRIPTION);
    }

    #[test]
    fn aggregates_all_errors() {
        let errors = validate(&input("0", "12345", "ab")).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["amount", "phoneNumber", "accountReference"]);
    }

    #[test]
    fn classifies_acknowledgements() {
        let mut ack = PushAcknowledgement {
            merchant_request_id: "m".to_string(),
            checkout_request_id: "c".to_string(),
            response_code: "0".to_string(),
            response_description: "Success. Request accepted for processing".to_string(),
            customer_message: None,
        };
        assert!(matches!(
            InitiateResult::from(ack.clone()),
            InitiateResult::Accepted(_)
        ));

        ack.response_code = "1".to_string();
        assert!(matches!(
            InitiateResult::from(ack),
            InitiateResult::Rejected { .. }
        ));
    }

    #[test]
    fn auth_failures_map_to_auth_error() {
        let err: AppError = InitiateError::Gateway(GatewayError::Auth("denied".to_string())).into();
        assert!(matches!(err, AppError::Auth(_)));
    }
}
