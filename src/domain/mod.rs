pub mod transaction;

pub use transaction::{generate_transaction_id, Resolution, TransactionRecord, TransactionStatus};
