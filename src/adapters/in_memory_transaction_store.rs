//! In-memory implementation of TransactionStore.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{Resolution, TransactionRecord};
use crate::ports::{CallbackResult, RepositoryError, RepositoryResult, TransactionStore};

#[derive(Default)]
struct Inner {
    records: HashMap<String, TransactionRecord>,
    // gateway request id -> transaction id
    correlation: HashMap<String, String>,
}

/// Process-local transaction store. A single lock guards both indexes so the
/// pending check and the status write in `update_status` happen together.
#[derive(Clone, Default)]
pub struct InMemoryTransactionStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(&self, record: TransactionRecord) -> RepositoryResult<TransactionRecord> {
        let mut inner = self.inner.write().await;

        if inner.records.contains_key(&record.transaction_id) {
            return Err(RepositoryError::Conflict(record.transaction_id));
        }
        if let Some(request_id) = &record.gateway_request_id {
            if inner.correlation.contains_key(request_id) {
                return Err(RepositoryError::Conflict(request_id.clone()));
            }
            inner
                .correlation
                .insert(request_id.clone(), record.transaction_id.clone());
        }

        inner
            .records
            .insert(record.transaction_id.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, transaction_id: &str) -> RepositoryResult<TransactionRecord> {
        self.inner
            .read()
            .await
            .records
            .get(transaction_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(transaction_id.to_string()))
    }

    async fn find_by_correlation_id(
        &self,
        gateway_request_id: &str,
    ) -> RepositoryResult<TransactionRecord> {
        let inner = self.inner.read().await;
        inner
            .correlation
            .get(gateway_request_id)
            .and_then(|id| inner.records.get(id))
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(gateway_request_id.to_string()))
    }

    async fn update_status(
        &self,
        gateway_request_id: &str,
        resolution: Resolution,
    ) -> RepositoryResult<CallbackResult> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        let Some(transaction_id) = inner.correlation.get(gateway_request_id) else {
            return Ok(CallbackResult::Unmatched);
        };
        let Some(record) = inner.records.get_mut(transaction_id) else {
            return Ok(CallbackResult::Unmatched);
        };

        let applied = record.resolve(resolution, Utc::now());
        Ok(CallbackResult::Matched {
            record: record.clone(),
            applied,
        })
    }

    async fn list(&self) -> RepositoryResult<Vec<TransactionRecord>> {
        let mut records: Vec<TransactionRecord> =
            self.inner.read().await.records.values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}
