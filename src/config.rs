use anyhow::Context;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

pub const SANDBOX_BASE_URL: &str = "https://sandbox.safaricom.co.ke";
pub const PRODUCTION_BASE_URL: &str = "https://api.safaricom.co.ke";

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GatewayEnvironment {
    Sandbox,
    Production,
}

impl GatewayEnvironment {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            other => anyhow::bail!("GATEWAY_ENVIRONMENT must be 'sandbox' or 'production', got '{}'", other),
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Sandbox => SANDBOX_BASE_URL,
            Self::Production => PRODUCTION_BASE_URL,
        }
    }
}

/// Credentials and endpoints for the payment gateway.
#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub short_code: String,
    pub passkey: String,
    pub callback_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: u16,
    pub environment: GatewayEnvironment,
    pub gateway: GatewayConfig,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub admin_api_key: Option<String>,
    pub log_request_body: bool,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        let environment = GatewayEnvironment::parse(
            &env::var("GATEWAY_ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string()),
        )?;
        let base_url = env::var("GATEWAY_BASE_URL")
            .unwrap_or_else(|_| environment.default_base_url().to_string());

        let gateway = GatewayConfig {
            base_url,
            consumer_key: required("GATEWAY_CONSUMER_KEY")?,
            consumer_secret: required("GATEWAY_CONSUMER_SECRET")?,
            short_code: required("GATEWAY_SHORT_CODE")?,
            passkey: required("GATEWAY_PASSKEY")?,
            callback_url: required("GATEWAY_CALLBACK_URL")?,
            timeout_secs: env::var("GATEWAY_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("GATEWAY_TIMEOUT_SECS must be a positive integer")?,
        };

        let config = Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a port number")?,
            environment,
            gateway,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|raw| parse_origins(&raw))
                .filter(|origins| !origins.is_empty()),
            admin_api_key: env::var("ADMIN_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            log_request_body: env::var("LOG_REQUEST_BODY")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server_port == 0 {
            anyhow::bail!("SERVER_PORT must be greater than 0");
        }
        if self.gateway.timeout_secs == 0 {
            anyhow::bail!("GATEWAY_TIMEOUT_SECS must be greater than 0");
        }
        url::Url::parse(&self.gateway.base_url).context("GATEWAY_BASE_URL is not a valid URL")?;
        url::Url::parse(&self.gateway.callback_url)
            .context("GATEWAY_CALLBACK_URL is not a valid URL")?;
        if !self.gateway.short_code.chars().all(|ch| ch.is_ascii_digit()) {
            anyhow::bail!("GATEWAY_SHORT_CODE must be numeric");
        }

        Ok(())
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    let value = env::var(name).with_context(|| format!("{} is required", name))?;
    if value.trim().is_empty() {
        anyhow::bail!("{} must not be empty", name);
    }
    Ok(value)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
