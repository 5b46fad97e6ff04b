//! Seams between the use cases and their collaborators.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Resolution, TransactionRecord};
use crate::gateway::{GatewayError, PushAcknowledgement, PushRequest};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record already exists: {0}")]
    Conflict(String),

    #[error("Record not found: {0}")]
    NotFound(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Outcome of applying a callback to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackResult {
    /// A record carried the correlation id. `applied` is false when it had
    /// already been resolved by an earlier delivery.
    Matched {
        record: TransactionRecord,
        applied: bool,
    },
    Unmatched,
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Inserts a new record. Fails with `Conflict` when the transaction id or
    /// the gateway request id is already taken.
    async fn insert(&self, record: TransactionRecord) -> RepositoryResult<TransactionRecord>;

    async fn find_by_id(&self, transaction_id: &str) -> RepositoryResult<TransactionRecord>;

    async fn find_by_correlation_id(
        &self,
        gateway_request_id: &str,
    ) -> RepositoryResult<TransactionRecord>;

    /// Atomically resolves the record matching `gateway_request_id` if it is
    /// still pending.
    async fn update_status(
        &self,
        gateway_request_id: &str,
        resolution: Resolution,
    ) -> RepositoryResult<CallbackResult>;

    /// All records, newest first.
    async fn list(&self) -> RepositoryResult<Vec<TransactionRecord>>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initiate_push(&self, request: &PushRequest)
        -> Result<PushAcknowledgement, GatewayError>;
}
