use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stk_relay::adapters::InMemoryTransactionStore;
use stk_relay::cli::{self, Cli, Commands};
use stk_relay::config::{Config, LogFormat};
use stk_relay::gateway::GatewayClient;
use stk_relay::{cors_layer, create_app, AppState};

fn init_tracing(format: LogFormat) {
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let gateway = GatewayClient::new(config.gateway.clone());
    tracing::info!(
        environment = ?config.environment,
        "Gateway client initialized with URL: {}",
        config.gateway.base_url
    );

    let mut state = AppState::new(Arc::new(InMemoryTransactionStore::new()), Arc::new(gateway));
    state.admin_api_key = config.admin_api_key.clone();
    state.log_request_body = config.log_request_body;

    if state.admin_api_key.is_none() {
        tracing::warn!("ADMIN_API_KEY not set; /transactions is unauthenticated");
    }

    let app = create_app(state).layer(cors_layer(config.cors_allowed_origins.as_deref()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Wizard {
            server,
            account_reference,
        }) => {
            init_tracing(LogFormat::Text);
            cli::handle_wizard(server, account_reference).await
        }
        Some(Commands::Config) => {
            let config = Config::from_env()?;
            init_tracing(config.log_format);
            cli::handle_config_validate(&config)
        }
        Some(Commands::Serve) | None => {
            let config = Config::from_env()?;
            init_tracing(config.log_format);
            serve(config).await
        }
    }
}
