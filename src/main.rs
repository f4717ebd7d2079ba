//! Application entry point.

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use secrecy::{ExposeSecret, SecretString};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cash_deposit_service::api::{RateLimitConfig, create_router, create_router_with_rate_limit};
use cash_deposit_service::app::AppState;
use cash_deposit_service::domain::Notifier;
use cash_deposit_service::infra::{
    LogNotifier, PostgresClient, PostgresConfig, SmtpConfig, SmtpNotifier,
};

/// Application configuration
struct Config {
    database_url: SecretString,
    host: String,
    port: u16,
    enable_rate_limiting: bool,
    rate_limit_config: RateLimitConfig,
    /// SMTP relay; deposits are only logged when absent
    smtp_config: Option<SmtpConfig>,
}

impl Config {
    fn from_env() -> Result<Self> {
        let database_url = Self::database_url()?;
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let enable_rate_limiting = env::var("ENABLE_RATE_LIMITING")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let rate_limit_config = RateLimitConfig::from_env();
        let smtp_config = SmtpConfig::from_env();

        Ok(Self {
            database_url,
            host,
            port,
            enable_rate_limiting,
            rate_limit_config,
            smtp_config,
        })
    }

    /// `DATABASE_URL` wins; otherwise the URL is assembled from `DB_*` parts.
    fn database_url() -> Result<SecretString> {
        if let Ok(url) = env::var("DATABASE_URL") {
            if !url.is_empty() {
                return Ok(SecretString::from(url));
            }
        }

        let host = env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string());
        let user = env::var("DB_USERNAME").context("DATABASE_URL or DB_USERNAME must be set")?;
        let password = env::var("DB_PASSWORD").unwrap_or_default();
        let name = env::var("DB_NAME").context("DB_NAME not set")?;

        Ok(SecretString::from(format!(
            "postgres://{user}:{password}@{host}:{port}/{name}"
        )))
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

fn build_notifier(smtp_config: Option<SmtpConfig>) -> Result<Arc<dyn Notifier>> {
    match smtp_config {
        Some(smtp) => {
            let notifier = SmtpNotifier::new(smtp).context("Failed to build SMTP transport")?;
            info!("   ✓ SMTP notifier configured");
            Ok(Arc::new(notifier))
        }
        None => {
            warn!("   ⚠ SMTP_SERVER not set, deposit notifications will only be logged");
            Ok(Arc::new(LogNotifier::new()))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    info!("🏦 Cash Deposit Service v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    info!("📦 Initializing infrastructure...");

    let postgres_client = PostgresClient::new(
        config.database_url.expose_secret(),
        PostgresConfig::default(),
    )
    .await?;
    postgres_client.run_migrations().await?;
    info!("   ✓ Database connected and migrations applied");

    let notifier = build_notifier(config.smtp_config)?;

    let app_state = Arc::new(AppState::new(Arc::new(postgres_client), notifier));

    let router = if config.enable_rate_limiting {
        info!(
            rps = config.rate_limit_config.requests_per_second,
            burst = config.rate_limit_config.burst_size,
            "   ✓ Rate limiting enabled"
        );
        create_router_with_rate_limit(app_state, config.rate_limit_config)
    } else {
        info!("   ○ Rate limiting disabled");
        create_router(app_state)
    };

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🚀 Server starting on http://{}", addr);
    info!("📖 Swagger UI available at http://{}/swagger-ui", addr);
    info!("📄 OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
