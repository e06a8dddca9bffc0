use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use carpool_api::auth::{AppState, AppStateInner};
use carpool_api::notify::Notifier;
use carpool_store::Store;

/// Everything the process reads from the environment, gathered once at
/// startup. Handlers never touch ambient env.
struct Config {
    jwt_secret: String,
    host: String,
    port: u16,
    public_base_url: String,
    mail_relay_url: Option<String>,
    mail_sender: String,
}

impl Config {
    fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("CARPOOL_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("CARPOOL_PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()?;
        Ok(Self {
            jwt_secret: std::env::var("CARPOOL_JWT_SECRET")
                .unwrap_or_else(|_| "dev-secret-change-me".into()),
            public_base_url: std::env::var("CARPOOL_PUBLIC_URL")
                .unwrap_or_else(|_| format!("http://localhost:{port}")),
            mail_relay_url: std::env::var("CARPOOL_MAIL_RELAY_URL").ok(),
            mail_sender: std::env::var("CARPOOL_MAIL_SENDER")
                .unwrap_or_else(|_| "no-reply@carpool.local".into()),
            host,
            port,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carpool=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let notifier = match &config.mail_relay_url {
        Some(url) => Notifier::relay(url.clone(), config.mail_sender.clone()),
        None => {
            info!("no mail relay configured, notifications are log-only");
            Notifier::Log
        }
    };

    let state: AppState = Arc::new(AppStateInner {
        store: Store::new(),
        jwt_secret: config.jwt_secret.clone(),
        notifier,
        public_base_url: config.public_base_url.clone(),
    });

    let app = carpool_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Carpool server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
