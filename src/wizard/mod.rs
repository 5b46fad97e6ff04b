//! Payment wizard.
//!
//! A linear flow `Amount -> Phone -> Pin -> Processing -> {Success | Error}`
//! driven by a single transition table. Field validation acts as a guard: a
//! submit whose input fails validation records an inline error and the step
//! does not change. Rendering is left to the caller (see `cli::run_wizard`).

pub mod backend;

use serde::{Deserialize, Serialize};

use crate::validation::{self, PIN_LEN};

pub use backend::{
    HttpInitiationBackend, InitiationBackend, InitiationFailure, InitiationReply,
};

pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection and try again.";
pub const INITIATION_FAILED_MESSAGE: &str = "Payment could not be initiated. Please try again.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    #[default]
    Amount,
    Phone,
    Pin,
    Processing,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardAction {
    SubmitAmount,
    SubmitPhone,
    SubmitPin,
    Back,
    InitiationAccepted,
    InitiationFailed,
    Retry,
    Reset,
}

use WizardAction as A;
use WizardStep as S;

const TRANSITIONS: &[(WizardStep, WizardAction, WizardStep)] = &[
    (S::Amount, A::SubmitAmount, S::Phone),
    (S::Phone, A::SubmitPhone, S::Pin),
    (S::Phone, A::Back, S::Amount),
    (S::Pin, A::SubmitPin, S::Processing),
    (S::Pin, A::Back, S::Phone),
    (S::Processing, A::InitiationAccepted, S::Success),
    (S::Processing, A::InitiationFailed, S::Error),
    (S::Success, A::Reset, S::Amount),
    (S::Error, A::Reset, S::Amount),
    (S::Error, A::Retry, S::Pin),
];

/// Target step for `action` taken from `from`, if the table allows it.
pub fn transition(from: WizardStep, action: WizardAction) -> Option<WizardStep> {
    TRANSITIONS
        .iter()
        .find(|(step, a, _)| *step == from && *a == action)
        .map(|(_, _, to)| *to)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardFormData {
    pub amount: String,
    pub phone_number: String,
    pub pin: String,
}

/// What the caller must do after a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// The wizard entered `Processing`; call the initiation backend with this
    /// data and feed the outcome to `resolve`.
    Initiate(WizardFormData),
}

#[derive(Debug, Clone, Default)]
pub struct PaymentWizard {
    step: WizardStep,
    form: WizardFormData,
    error: Option<String>,
    reply: Option<InitiationReply>,
}

impl PaymentWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn form(&self) -> &WizardFormData {
        &self.form
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Gateway reply of the last accepted initiation.
    pub fn reply(&self) -> Option<&InitiationReply> {
        self.reply.as_ref()
    }

    fn apply(&mut self, action: WizardAction) -> bool {
        match transition(self.step(), action) {
            Some(next) => {
                self.step = next;
                true
            }
            None => false,
        }
    }

    fn fail(&mut self, message: impl Into<String>) -> Effect {
        self.error = Some(message.into());
        Effect::None
    }

    pub fn set_amount(&mut self, value: &str) {
        if self.step() == WizardStep::Amount {
            self.form.amount = value.to_string();
        }
    }

    pub fn set_phone(&mut self, value: &str) {
        if self.step() == WizardStep::Phone {
            self.form.phone_number = value.to_string();
        }
    }

    /// Keeps digits only, at most four of them.
    pub fn set_pin(&mut self, value: &str) {
        if self.step() == WizardStep::Pin {
            self.form.pin = value
                .chars()
                .filter(|ch| ch.is_ascii_digit())
                .take(PIN_LEN)
                .collect();
        }
    }

    /// Enter-key equivalent: submits whatever step is active.
    pub fn submit(&mut self) -> Effect {
        match self.step() {
            WizardStep::Amount => self.submit_amount(),
            WizardStep::Phone => self.submit_phone(),
            WizardStep::Pin => self.submit_pin(),
            WizardStep::Processing | WizardStep::Success | WizardStep::Error => Effect::None,
        }
    }

    pub fn submit_amount(&mut self) -> Effect {
        if self.step() != WizardStep::Amount {
            return Effect::None;
        }
        if let Err(e) = validation::parse_amount(&self.form.amount) {
            return self.fail(format!("Please enter a valid amount ({})", e.message));
        }
        self.error = None;
        self.apply(WizardAction::SubmitAmount);
        Effect::None
    }

    pub fn submit_phone(&mut self) -> Effect {
        if self.step() != WizardStep::Phone {
            return Effect::None;
        }
        if !validation::is_accepted_phone_entry(&self.form.phone_number) {
            return self.fail("Please enter a valid phone number (e.g. 0712345678)");
        }
        self.error = None;
        self.apply(WizardAction::SubmitPhone);
        Effect::None
    }

    pub fn submit_pin(&mut self) -> Effect {
        if self.step() != WizardStep::Pin {
            return Effect::None;
        }
        if validation::validate_pin(&self.form.pin).is_err() {
            return self.fail(format!("PIN must be exactly {} digits", PIN_LEN));
        }
        self.error = None;
        self.reply = None;
        self.apply(WizardAction::SubmitPin);
        Effect::Initiate(self.form.clone())
    }

    pub fn back(&mut self) {
        if self.apply(WizardAction::Back) {
            self.error = None;
        }
    }

    /// Feeds the initiation outcome into a `Processing` wizard.
    pub fn resolve(&mut self, outcome: Result<InitiationReply, InitiationFailure>) {
        if self.step() != WizardStep::Processing {
            return;
        }

        match outcome {
            Ok(reply) if reply.is_accepted() => {
                self.reply = Some(reply);
                self.apply(WizardAction::InitiationAccepted);
            }
            Ok(reply) => {
                let message = reply
                    .error_message
                    .clone()
                    .or_else(|| reply.response_description.clone())
                    .unwrap_or_else(|| INITIATION_FAILED_MESSAGE.to_string());
                self.error = Some(message);
                self.apply(WizardAction::InitiationFailed);
            }
            Err(failure) => {
                self.error = Some(failure.user_message());
                self.apply(WizardAction::InitiationFailed);
            }
        }
    }

    /// Back to the PIN step keeping amount and phone.
    pub fn retry(&mut self) {
        if self.apply(WizardAction::Retry) {
            self.form.pin.clear();
            self.error = None;
        }
    }

    pub fn reset(&mut self) {
        if self.apply(WizardAction::Reset) {
            *self = Self::new();
        }
    }

    /// Submits the active step and, when that starts an initiation, awaits
    /// the backend and resolves.
    pub async fn submit_with<B>(&mut self, backend: &B)
    where
        B: InitiationBackend + ?Sized,
    {
        if let Effect::Initiate(form) = self.submit() {
            let outcome = backend.initiate(&form).await;
            self.resolve(outcome);
        }
    }
}
