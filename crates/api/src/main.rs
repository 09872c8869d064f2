//! API server entry point.

use api::config::Config;
use domain::WalletAddress;
use event_log::InMemoryEventLog;
use orchestrator::OrchestratorConfig;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Create event log and application state
    let orchestrator_config = OrchestratorConfig::from_env().unwrap_or_else(|| {
        tracing::warn!("TREASURY_WALLET/WEBHOOK_SECRET not set, using local dev defaults");
        OrchestratorConfig::new(WalletAddress::new("0xtreasury-local"), "dev-webhook-secret")
    });
    let log = InMemoryEventLog::new();
    let (state, processor, clients) = api::create_default_state(log, orchestrator_config);

    // Local dev key so the API is usable out of the box
    if let Ok(api_key) = std::env::var("DEV_API_KEY") {
        clients.auth.add_key(api_key, domain::ClientId::new());
    }

    // 4. Run catch-up on projections (replay any existing events)
    processor.run_catch_up().await.expect("catch-up failed");

    // 5. Build the application
    let app = api::create_app(state, metrics_handle);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
