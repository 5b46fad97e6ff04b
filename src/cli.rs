use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::Config;
use crate::validation;
use crate::wizard::{HttpInitiationBackend, InitiationBackend, PaymentWizard, WizardStep};

#[derive(Parser)]
#[command(name = "stk-relay")]
#[command(about = "STK push relay - mobile payment initiation and callback tracking", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Walk through a payment in the terminal against a running relay
    Wizard {
        /// Base URL of the relay
        #[arg(long, default_value = "http://localhost:3000")]
        server: String,

        /// Account reference sent with every payment
        #[arg(long, default_value = "DEMO-PAY")]
        account_reference: String,
    },

    /// Configuration validation
    Config,
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!("  Environment: {:?}", config.environment);
    println!("  Gateway URL: {}", config.gateway.base_url);
    println!("  Consumer Key: {}", mask_secret(&config.gateway.consumer_key));
    println!("  Short Code: {}", config.gateway.short_code);
    println!("  Callback URL: {}", config.gateway.callback_url);
    println!("  Gateway Timeout: {}s", config.gateway.timeout_secs);
    println!(
        "  Admin API Key: {}",
        if config.admin_api_key.is_some() { "set" } else { "not set (admin routes open)" }
    );

    config.validate()?;
    tracing::info!("Configuration is valid");
    println!("✓ Configuration is valid");

    Ok(())
}

fn mask_secret(secret: &str) -> String {
    if secret.chars().count() > 8 {
        format!("{}****", secret.chars().take(4).collect::<String>())
    } else {
        "****".to_string()
    }
}

fn prompt(wizard: &PaymentWizard) -> String {
    let mut out = String::new();
    if let Some(error) = wizard.error() {
        out.push_str(&format!("  ! {}\n", error));
    }

    let line = match wizard.step() {
        WizardStep::Amount => "Amount to pay (KES):".to_string(),
        WizardStep::Phone => "Phone number (e.g. 0712345678), or 'back':".to_string(),
        WizardStep::Pin => "4-digit PIN, or 'back':".to_string(),
        WizardStep::Processing => "Processing payment...".to_string(),
        WizardStep::Success => {
            let reply = wizard.reply();
            format!(
                "Payment request sent. Check your phone to complete it.\n  Transaction: {}\n  {}\n'reset' to start over:",
                reply.and_then(|r| r.transaction_id.as_deref()).unwrap_or("-"),
                reply
                    .and_then(|r| r.customer_message.as_deref().or(r.response_description.as_deref()))
                    .unwrap_or(""),
            )
        }
        WizardStep::Error => "Payment failed. 'retry' to re-enter the PIN or 'reset' to start over:".to_string(),
    };
    out.push_str(&line);
    out
}

/// Drives the payment wizard from stdin. Enter submits the active step.
pub async fn run_wizard<B>(wizard: &mut PaymentWizard, backend: &B) -> anyhow::Result<()>
where
    B: InitiationBackend + ?Sized,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        println!("{}", prompt(wizard));

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let input = line.trim();

        match input {
            "quit" | "exit" => return Ok(()),
            "back" => wizard.back(),
            "retry" => wizard.retry(),
            "reset" => wizard.reset(),
            _ => {
                match wizard.step() {
                    WizardStep::Amount => wizard.set_amount(input),
                    WizardStep::Phone => wizard.set_phone(input),
                    WizardStep::Pin => wizard.set_pin(input),
                    WizardStep::Processing | WizardStep::Success | WizardStep::Error => {}
                }
                if wizard.step() == WizardStep::Pin
                    && validation::validate_pin(&wizard.form().pin).is_ok()
                {
                    println!("Processing payment...");
                }
                wizard.submit_with(backend).await;
            }
        }
    }
}

pub async fn handle_wizard(server: String, account_reference: String) -> anyhow::Result<()> {
    tracing::info!(server = %server, "Starting payment wizard");
    let backend = HttpInitiationBackend::new(server, account_reference);
    let mut wizard = PaymentWizard::new();
    run_wizard(&mut wizard, &backend).await
}
