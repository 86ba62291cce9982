use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marketgate_api::app::build_app;
use marketgate_api::config::ServerConfig;
use marketgate_api::state::AppState;
use marketgate_db::{MemoryStore, PgStore, Store};
use marketgate_gateways::fake::FakePaymentGateway;
use marketgate_gateways::{
    HttpSmsGateway, LogSmsGateway, PaymentGateway, PaytrGateway, SmsGateway,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "marketgate_api=debug,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        production = config.production,
        "Loaded server configuration"
    );

    // --- Store ---
    let store = build_store(&config).await;

    // --- Gateways ---
    let sms: Arc<dyn SmsGateway> = match &config.sms {
        Some(sms_config) => Arc::new(
            HttpSmsGateway::new(sms_config.clone()).expect("Failed to build SMS client"),
        ),
        None => {
            assert!(!config.production, "SMS_API_URL must be set in production");
            tracing::warn!("SMS_API_URL is not set; verification codes will only be logged");
            Arc::new(LogSmsGateway)
        }
    };

    let payments: Arc<dyn PaymentGateway> = match &config.paytr {
        Some(paytr_config) => Arc::new(
            PaytrGateway::new(paytr_config.clone()).expect("Failed to build payment client"),
        ),
        None => {
            assert!(
                !config.production,
                "PAYTR_MERCHANT_ID, PAYTR_MERCHANT_KEY and PAYTR_MERCHANT_SALT must be set in production"
            );
            tracing::warn!("PayTR credentials are not set; using the local fake payment gateway");
            Arc::new(FakePaymentGateway::new("dev-merchant-key", "dev-merchant-salt"))
        }
    };

    // --- App state ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    let state = AppState {
        store,
        config: Arc::new(config),
        sms,
        payments,
    };

    // --- Router ---
    let app = build_app(state).unwrap_or_else(|e| panic!("{e}"));

    // --- Start server ---
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Connect to PostgreSQL when `DATABASE_URL` is set; otherwise fall back to the
/// in-memory store outside production.
async fn build_store(config: &ServerConfig) -> Arc<dyn Store> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        assert!(!config.production, "DATABASE_URL must be set in production");
        tracing::warn!("DATABASE_URL is not set; using the in-memory store (data is lost on exit)");
        return Arc::new(MemoryStore::new());
    };

    let pool = marketgate_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    marketgate_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    marketgate_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    Arc::new(PgStore::new(pool))
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
