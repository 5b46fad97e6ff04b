pub mod initiate_payment;
pub mod resolve_callback;

pub use initiate_payment::{InitiateError, InitiateInput, InitiateOutput, InitiatePayment};
pub use resolve_callback::ResolveCallback;
