#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use serde_json::Value;
use tower::ServiceExt;
use tracing::subscriber::DefaultGuard;

use stk_relay::adapters::InMemoryTransactionStore;
use stk_relay::gateway::{GatewayError, PushAcknowledgement, PushRequest};
use stk_relay::ports::PaymentGateway;
use stk_relay::{create_app, AppState};

/// Gateway double that answers every push with a scripted outcome.
pub struct StubGateway {
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<PushRequest>>,
    respond: Box<dyn Fn(usize) -> Result<PushAcknowledgement, GatewayError> + Send + Sync>,
}

impl StubGateway {
    pub fn accepting() -> Self {
        Self::with(|n| Ok(accepted_ack(&format!("ws_CO_{n}"))))
    }

    pub fn with(
        respond: impl Fn(usize) -> Result<PushAcknowledgement, GatewayError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn initiate_push(
        &self,
        request: &PushRequest,
    ) -> Result<PushAcknowledgement, GatewayError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        (self.respond)(n)
    }
}

pub fn accepted_ack(checkout_request_id: &str) -> PushAcknowledgement {
    PushAcknowledgement {
        merchant_request_id: format!("m-{checkout_request_id}"),
        checkout_request_id: checkout_request_id.to_string(),
        response_code: "0".to_string(),
        response_description: "Success. Request accepted for processing".to_string(),
        customer_message: Some("Success. Request accepted for processing".to_string()),
    }
}

/// Installs a DEBUG subscriber for the current thread so log fields (and the
/// sanitizer behind them) are actually evaluated.
pub fn init_test_tracing() -> DefaultGuard {
    tracing::subscriber::set_default(
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish(),
    )
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryTransactionStore>,
    pub gateway: Arc<StubGateway>,
}

pub fn test_app(gateway: StubGateway) -> TestApp {
    test_app_with(gateway, |_| {})
}

pub fn test_app_with(gateway: StubGateway, configure: impl FnOnce(&mut AppState)) -> TestApp {
    let store = Arc::new(InMemoryTransactionStore::new());
    let gateway = Arc::new(gateway);
    let mut state = AppState::new(store.clone(), gateway.clone());
    configure(&mut state);

    TestApp {
        router: create_app(state),
        store,
        gateway,
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> (u16, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status().as_u16();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn success_callback(checkout_request_id: &str, receipt: &str) -> Value {
    serde_json::json!({
        "Body": {
            "stkCallback": {
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": checkout_request_id,
                "ResultCode": 0,
                "ResultDesc": "The service request is processed successfully.",
                "CallbackMetadata": {
                    "Item": [
                        { "Name": "Amount", "Value": 500.00 },
                        { "Name": "MpesaReceiptNumber", "Value": receipt },
                        { "Name": "TransactionDate", "Value": 20240101120000u64 },
                        { "Name": "PhoneNumber", "Value": 254712345678u64 }
                    ]
                }
            }
        }
    })
}

pub fn failed_callback(checkout_request_id: &str, code: i64, desc: &str) -> Value {
    serde_json::json!({
        "Body": {
            "stkCallback": {
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": checkout_request_id,
                "ResultCode": code,
                "ResultDesc": desc
            }
        }
    })
}
