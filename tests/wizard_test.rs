use std::sync::Mutex;

use async_trait::async_trait;

use stk_relay::wizard::{
    InitiationBackend, InitiationFailure, InitiationReply, PaymentWizard, WizardFormData,
    WizardStep, NETWORK_ERROR_MESSAGE,
};

/// Backend double returning one scripted outcome and recording what it was sent.
struct ScriptedBackend {
    outcome: Result<InitiationReply, InitiationFailure>,
    sent: Mutex<Vec<WizardFormData>>,
}

impl ScriptedBackend {
    fn new(outcome: Result<InitiationReply, InitiationFailure>) -> Self {
        Self {
            outcome,
            sent: Mutex::new(Vec::new()),
        }
    }

    fn accepting() -> Self {
        Self::new(Ok(InitiationReply {
            response_code: Some("0".to_string()),
            response_description: Some("Success. Request accepted for processing".to_string()),
            customer_message: Some("Success. Request accepted for processing".to_string()),
            transaction_id: Some("TXN-1".to_string()),
            checkout_request_id: Some("ws_CO_1".to_string()),
            error_message: None,
        }))
    }

    fn sent(&self) -> Vec<WizardFormData> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl InitiationBackend for ScriptedBackend {
    async fn initiate(&self, form: &WizardFormData) -> Result<InitiationReply, InitiationFailure> {
        self.sent.lock().unwrap().push(form.clone());
        self.outcome.clone()
    }
}

async fn enter<B: InitiationBackend>(wizard: &mut PaymentWizard, backend: &B, value: &str) {
    match wizard.step() {
        WizardStep::Amount => wizard.set_amount(value),
        WizardStep::Phone => wizard.set_phone(value),
        WizardStep::Pin => wizard.set_pin(value),
        _ => {}
    }
    wizard.submit_with(backend).await;
}

async fn wizard_at_pin<B: InitiationBackend>(backend: &B) -> PaymentWizard {
    let mut wizard = PaymentWizard::new();
    enter(&mut wizard, backend, "500").await;
    enter(&mut wizard, backend, "0712345678").await;
    assert_eq!(wizard.step(), WizardStep::Pin);
    wizard
}

#[tokio::test]
async fn test_happy_path_reaches_success() {
    let backend = ScriptedBackend::accepting();
    let mut wizard = PaymentWizard::new();

    enter(&mut wizard, &backend, "0").await;
    assert_eq!(wizard.step(), WizardStep::Amount);
    assert!(wizard.error().is_some());

    enter(&mut wizard, &backend, "500").await;
    assert_eq!(wizard.step(), WizardStep::Phone);
    assert!(wizard.error().is_none());

    enter(&mut wizard, &backend, "0712345678").await;
    assert_eq!(wizard.step(), WizardStep::Pin);

    enter(&mut wizard, &backend, "123").await;
    assert_eq!(wizard.step(), WizardStep::Pin);
    assert!(wizard.error().unwrap().contains("4 digits"));
    assert!(backend.sent().is_empty());

    enter(&mut wizard, &backend, "1234").await;
    assert_eq!(wizard.step(), WizardStep::Success);
    assert_eq!(
        wizard.reply().and_then(|r| r.transaction_id.as_deref()),
        Some("TXN-1")
    );

    let sent = backend.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].amount, "500");
    assert_eq!(sent[0].phone_number, "0712345678");
}

#[tokio::test]
async fn test_invalid_phone_stays_on_phone() {
    let backend = ScriptedBackend::accepting();
    let mut wizard = PaymentWizard::new();
    enter(&mut wizard, &backend, "500").await;

    for phone in ["12345", "0812345678", ""] {
        enter(&mut wizard, &backend, phone).await;
        assert_eq!(wizard.step(), WizardStep::Phone, "phone {phone:?}");
        assert!(wizard.error().is_some());
    }

    enter(&mut wizard, &backend, "+254712345678").await;
    assert_eq!(wizard.step(), WizardStep::Pin);
}

#[tokio::test]
async fn test_server_message_is_shown_on_error() {
    let backend = ScriptedBackend::new(Err(InitiationFailure::Http {
        status: 500,
        message: Some("Bad Request - Invalid PhoneNumber".to_string()),
    }));
    let mut wizard = wizard_at_pin(&backend).await;

    enter(&mut wizard, &backend, "1234").await;

    assert_eq!(wizard.step(), WizardStep::Error);
    assert_eq!(wizard.error(), Some("Bad Request - Invalid PhoneNumber"));
}

#[tokio::test]
async fn test_network_failure_shows_generic_message() {
    let backend = ScriptedBackend::new(Err(InitiationFailure::Network(
        "connection refused".to_string(),
    )));
    let mut wizard = wizard_at_pin(&backend).await;

    enter(&mut wizard, &backend, "1234").await;

    assert_eq!(wizard.step(), WizardStep::Error);
    assert_eq!(wizard.error(), Some(NETWORK_ERROR_MESSAGE));
}

#[tokio::test]
async fn test_non_accepted_reply_is_an_error() {
    let backend = ScriptedBackend::new(Ok(InitiationReply {
        response_code: Some("1".to_string()),
        response_description: Some("Unable to lock subscriber".to_string()),
        ..InitiationReply::default()
    }));
    let mut wizard = wizard_at_pin(&backend).await;

    enter(&mut wizard, &backend, "1234").await;

    assert_eq!(wizard.step(), WizardStep::Error);
    assert_eq!(wizard.error(), Some("Unable to lock subscriber"));
}

#[tokio::test]
async fn test_retry_keeps_amount_and_phone() {
    let backend = ScriptedBackend::new(Err(InitiationFailure::Network("timeout".to_string())));
    let mut wizard = wizard_at_pin(&backend).await;
    enter(&mut wizard, &backend, "1234").await;
    assert_eq!(wizard.step(), WizardStep::Error);

    wizard.retry();

    assert_eq!(wizard.step(), WizardStep::Pin);
    assert_eq!(wizard.form().amount, "500");
    assert_eq!(wizard.form().phone_number, "0712345678");
    assert!(wizard.form().pin.is_empty());
    assert!(wizard.error().is_none());
}

#[tokio::test]
async fn test_reset_clears_everything() {
    let backend = ScriptedBackend::accepting();
    let mut wizard = wizard_at_pin(&backend).await;
    enter(&mut wizard, &backend, "1234").await;
    assert_eq!(wizard.step(), WizardStep::Success);

    wizard.reset();

    assert_eq!(wizard.step(), WizardStep::Amount);
    assert_eq!(wizard.form(), &WizardFormData::default());
    assert!(wizard.reply().is_none());
    assert!(wizard.error().is_none());
}

#[tokio::test]
async fn test_retry_and_reset_ignored_mid_flow() {
    let backend = ScriptedBackend::accepting();
    let mut wizard = wizard_at_pin(&backend).await;

    wizard.retry();
    wizard.reset();

    assert_eq!(wizard.step(), WizardStep::Pin);
    assert_eq!(wizard.form().amount, "500");
}
