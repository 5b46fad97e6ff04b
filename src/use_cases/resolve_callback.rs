//! Resolve callback use case.
//! Correlates a gateway notification with its pending transaction.

use std::sync::Arc;

use crate::domain::Resolution;
use crate::gateway::{StkCallback, RECEIPT_ITEM_NAME};
use crate::ports::{CallbackResult, RepositoryResult, TransactionStore};

pub struct ResolveCallback {
    store: Arc<dyn TransactionStore>,
}

impl ResolveCallback {
    pub fn new(store: Arc<dyn TransactionStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, callback: &StkCallback) -> RepositoryResult<CallbackResult> {
        let resolution = if callback.result_code == 0 {
            Resolution::Success {
                receipt_number: callback.metadata_value(RECEIPT_ITEM_NAME),
            }
        } else {
            Resolution::Failed {
                reason: callback.result_desc.clone(),
            }
        };

        let result = self
            .store
            .update_status(&callback.checkout_request_id, resolution)
            .await?;

        match &result {
            CallbackResult::Matched {
                record,
                applied: true,
            } => tracing::info!(
                transaction_id = %record.transaction_id,
                status = ?record.status,
                result_code = callback.result_code,
                "Transaction resolved"
            ),
            CallbackResult::Matched {
                record,
                applied: false,
            } => tracing::warn!(
                transaction_id = %record.transaction_id,
                status = ?record.status,
                "Duplicate callback for resolved transaction ignored"
            ),
            CallbackResult::Unmatched => tracing::warn!(
                checkout_request_id = %callback.checkout_request_id,
                "Callback does not match any transaction"
            ),
        }

        Ok(result)
    }
}
