//! HTTP API server with observability for the stablecoin backend.
//!
//! Provides REST endpoints for program registration, deposits,
//! withdrawals, operation queries, and the payment-provider webhook,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use event_log::EventLog;
use metrics_exporter_prometheus::PrometheusHandle;
use orchestrator::OrchestratorConfig;
use projections::ProjectionProcessor;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EventLog + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/programs", post(routes::programs::create::<S>))
        .route("/programs", get(routes::programs::list::<S>))
        .route("/programs/{id}", get(routes::programs::get::<S>))
        .route("/deposits", post(routes::operations::deposit::<S>))
        .route("/withdrawals", post(routes::operations::withdraw::<S>))
        .route("/operations", get(routes::operations::list::<S>))
        .route("/operations/{id}", get(routes::operations::get::<S>))
        .route(
            "/operations/{id}/events",
            get(routes::operations::events::<S>),
        )
        .route(
            "/reconciliation",
            get(routes::operations::reconciliation::<S>),
        )
        .route("/webhooks/payment", post(routes::webhooks::payment::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// In-memory collaborator clients the default state is wired with,
/// kept accessible for key provisioning and tests.
pub struct DefaultClients {
    pub ledger: orchestrator::InMemoryLedger,
    pub payment: orchestrator::InMemoryPaymentProvider,
    pub notifier: orchestrator::InMemoryNotifier,
    pub auth: orchestrator::InMemoryAuthProvider,
}

/// Creates the default application state with in-memory clients.
pub fn create_default_state<S: EventLog + Clone + 'static>(
    log: S,
    config: OrchestratorConfig,
) -> (
    Arc<AppState<S>>,
    Arc<ProjectionProcessor<S>>,
    DefaultClients,
) {
    use orchestrator::{
        InMemoryAuthProvider, InMemoryLedger, InMemoryNotifier, InMemoryPaymentProvider,
        Orchestrator,
    };
    use projections::{OperationsView, ProgramsView, Projection, ReconciliationView};

    let ledger = InMemoryLedger::new();
    let payment = InMemoryPaymentProvider::new();
    let notifier = InMemoryNotifier::new();
    let auth = InMemoryAuthProvider::new();

    let orchestrator = Orchestrator::new(
        config,
        log.clone(),
        ledger.clone(),
        payment.clone(),
        notifier.clone(),
        auth.clone(),
    );

    let operations_view = Arc::new(OperationsView::new());
    let programs_view = Arc::new(ProgramsView::new());
    let reconciliation_view = Arc::new(ReconciliationView::new());

    let mut processor = ProjectionProcessor::new(log);
    processor.register(Box::new(operations_view.as_ref().clone()) as Box<dyn Projection>);
    processor.register(Box::new(programs_view.as_ref().clone()) as Box<dyn Projection>);
    processor.register(Box::new(reconciliation_view.as_ref().clone()) as Box<dyn Projection>);
    let processor = Arc::new(processor);

    let state = Arc::new(AppState {
        orchestrator,
        operations_view,
        programs_view,
        reconciliation_view,
        projection_processor: processor.clone(),
    });

    let clients = DefaultClients {
        ledger,
        payment,
        notifier,
        auth,
    };

    (state, processor, clients)
}
