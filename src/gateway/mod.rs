pub mod client;
pub mod payload;

pub use client::{gateway_timestamp, GatewayClient, GatewayError};
pub use payload::{
    CallbackEnvelope, GatewayErrorBody, PushAcknowledgement, PushRequest, StkCallback,
    ACCEPTED_RESPONSE_CODE, RECEIPT_ITEM_NAME,
};
