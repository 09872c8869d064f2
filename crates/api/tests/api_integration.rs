//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use domain::{ClientId, WalletAddress};
use event_log::InMemoryEventLog;
use metrics_exporter_prometheus::PrometheusHandle;
use orchestrator::{OrchestratorConfig, guard};
use tower::ServiceExt;

const SECRET: &str = "test-webhook-secret";
const API_KEY: &str = "test-api-key";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> (axum::Router, api::DefaultClients, ClientId) {
    let log = InMemoryEventLog::new();
    let config = OrchestratorConfig::new(WalletAddress::new("0xtreasury"), SECRET);
    let (state, _, clients) = api::create_default_state(log, config);

    let client_id = ClientId::new();
    clients.auth.add_key(API_KEY, client_id);

    let app = api::create_app(state, get_metrics_handle());
    (app, clients, client_id)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-api-key", API_KEY)
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("x-api-key", API_KEY)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn program_body() -> serde_json::Value {
    serde_json::json!({
        "symbol": "BRLX",
        "name": "Brazilian Real X",
        "decimals": 6,
        "client_wallet": "0xclient",
        "payout_pix_key": "client@bank.example",
        "webhook_url": "https://client.example/webhook"
    })
}

async fn create_program(app: &axum::Router) -> String {
    let response = app
        .clone()
        .oneshot(post("/programs", program_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = read_json(response).await;
    json["program_id"].as_str().unwrap().to_string()
}

async fn create_deposit(app: &axum::Router, program_id: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(post(
            "/deposits",
            serde_json::json!({"program_id": program_id, "amount": "250.00"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

/// Delivers a signed payment confirmation for an operation.
async fn confirm_payment(app: &axum::Router, operation_id: &str) {
    let body = serde_json::to_vec(&serde_json::json!({
        "id": "evt-1",
        "event": "payment.confirmed",
        "data": {
            "id": "col-0001",
            "value": "250.00",
            "status": "paid",
            "external_reference": operation_id,
        }
    }))
    .unwrap();
    let signature = guard::sign(&body, SECRET);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/payment")
                .header("content-type", "application/json")
                .header("x-webhook-signature", signature)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

/// Registers a program and runs one deposit to completion, which also
/// deploys the token contract.
async fn deployed_program(app: &axum::Router) -> String {
    let program_id = create_program(app).await;
    let deposit = create_deposit(app, &program_id).await;
    confirm_payment(app, deposit["operation_id"].as_str().unwrap()).await;
    program_id
}

#[tokio::test]
async fn test_health_check() {
    let (app, _, _) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "stablemint-api");
}

#[tokio::test]
async fn test_create_and_get_program() {
    let (app, _, _) = setup();

    let response = app
        .clone()
        .oneshot(post("/programs", program_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = read_json(response).await;
    assert_eq!(created["symbol"], "BRLX");
    assert_eq!(created["status"], "Registered");
    let program_id = created["program_id"].as_str().unwrap();

    let response = app
        .oneshot(get(&format!("/programs/{program_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let program = read_json(response).await;
    assert_eq!(program["id"], program_id);
    assert_eq!(program["name"], "Brazilian Real X");
    assert_eq!(program["decimals"], 6);
    assert!(program["contract_address"].is_null());
}

#[tokio::test]
async fn test_create_program_rejects_excessive_decimals() {
    let (app, _, _) = setup();

    let mut body = program_body();
    body["decimals"] = serde_json::json!(40);

    let response = app.oneshot(post("/programs", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_api_key_rejected() {
    let (app, _, _) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/programs")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_api_key_rejected() {
    let (app, _, _) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/programs")
                .header("x-api-key", "wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_foreign_program_hidden() {
    let (app, clients, _) = setup();
    let program_id = create_program(&app).await;

    // A second client must not see the first client's program
    clients.auth.add_key("other-key", ClientId::new());
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/programs/{program_id}"))
                .header("x-api-key", "other-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_program_id_format() {
    let (app, _, _) = setup();

    let response = app.oneshot(get("/programs/not-a-uuid")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_programs() {
    let (app, _, _) = setup();
    create_program(&app).await;

    let response = app.oneshot(get("/programs")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let programs = read_json(response).await;
    let programs = programs.as_array().unwrap();
    assert_eq!(programs.len(), 1);
    assert_eq!(programs[0]["symbol"], "BRLX");
    assert_eq!(programs[0]["webhook_url"], "https://client.example/webhook");
}

#[tokio::test]
async fn test_deposit_returns_pay_code() {
    let (app, _, _) = setup();
    let program_id = create_program(&app).await;

    let deposit = create_deposit(&app, &program_id).await;
    assert_eq!(deposit["status"], "PaymentPending");
    assert!(deposit["operation_id"].as_str().is_some());
    assert!(!deposit["pay_code"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_payment_webhook_drives_mint() {
    let (app, _, _) = setup();
    let program_id = create_program(&app).await;
    let deposit = create_deposit(&app, &program_id).await;
    let operation_id = deposit["operation_id"].as_str().unwrap();

    confirm_payment(&app, operation_id).await;

    let response = app
        .clone()
        .oneshot(get(&format!("/operations/{operation_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let operation = read_json(response).await;
    assert_eq!(operation["status"], "ClientNotified");
    assert_eq!(operation["kind"], "Deposit");
    assert!(operation["mint_tx_hash"].as_str().is_some());

    // The first completed deposit deploys the token contract
    let response = app
        .oneshot(get(&format!("/programs/{program_id}")))
        .await
        .unwrap();
    let program = read_json(response).await;
    assert_eq!(program["status"], "Deployed");
    assert!(program["contract_address"].as_str().is_some());
}

#[tokio::test]
async fn test_tampered_webhook_rejected() {
    let (app, _, _) = setup();
    let program_id = create_program(&app).await;
    let deposit = create_deposit(&app, &program_id).await;
    let operation_id = deposit["operation_id"].as_str().unwrap();

    let body = serde_json::to_vec(&serde_json::json!({
        "id": "evt-1",
        "event": "payment.confirmed",
        "data": {
            "id": "col-0001",
            "value": "250.00",
            "status": "paid",
            "external_reference": operation_id,
        }
    }))
    .unwrap();
    let signature = guard::sign(&body, "wrong-secret");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/payment")
                .header("content-type", "application/json")
                .header("x-webhook-signature", signature)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The operation must be untouched
    let response = app
        .oneshot(get(&format!("/operations/{operation_id}")))
        .await
        .unwrap();
    let operation = read_json(response).await;
    assert_eq!(operation["status"], "PaymentPending");
}

#[tokio::test]
async fn test_unsigned_webhook_rejected() {
    let (app, _, _) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/payment")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"id":"evt-1","event":"payment.confirmed","data":{}}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_withdraw_flow() {
    let (app, _, _) = setup();
    let program_id = deployed_program(&app).await;

    let response = app
        .clone()
        .oneshot(post(
            "/withdrawals",
            serde_json::json!({"program_id": program_id, "amount": "100.00"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let withdraw = read_json(response).await;
    assert_eq!(withdraw["status"], "PixTransferPending");
    assert!(withdraw["payout_id"].as_str().is_some());
    assert!(!withdraw["burn_tx_hash"].as_str().unwrap().is_empty());

    // Payout confirmation completes the operation
    let payout_id = withdraw["payout_id"].as_str().unwrap();
    let body = serde_json::to_vec(&serde_json::json!({
        "id": "evt-2",
        "event": "payout.confirmed",
        "data": {"id": payout_id, "status": "done"}
    }))
    .unwrap();
    let signature = guard::sign(&body, SECRET);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhooks/payment")
                .header("content-type", "application/json")
                .header("x-webhook-signature", signature)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let operation_id = withdraw["operation_id"].as_str().unwrap();
    let response = app
        .oneshot(get(&format!("/operations/{operation_id}")))
        .await
        .unwrap();
    let operation = read_json(response).await;
    assert_eq!(operation["status"], "WithdrawSuccessful");
}

#[tokio::test]
async fn test_withdraw_before_deployment_conflicts() {
    let (app, _, _) = setup();
    let program_id = create_program(&app).await;

    let response = app
        .oneshot(post(
            "/withdrawals",
            serde_json::json!({"program_id": program_id, "amount": "100.00"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_partial_failure_surfaces_burn() {
    let (app, clients, _) = setup();
    let program_id = deployed_program(&app).await;

    clients.payment.set_payout_transport_failure(true);

    let response = app
        .clone()
        .oneshot(post(
            "/withdrawals",
            serde_json::json!({"program_id": program_id, "amount": "100.00"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let error = read_json(response).await;
    assert_eq!(error["burn_occurred"], true);
    assert!(error["burn_tx_hash"].as_str().is_some());
    let operation_id = error["operation_id"].as_str().unwrap().to_string();

    // The stranded operation shows up for reconciliation
    let response = app.oneshot(get("/reconciliation")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let entries = read_json(response).await;
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["operation_id"], operation_id);
    assert!(entries[0]["burn_tx_hash"].as_str().is_some());
}

#[tokio::test]
async fn test_list_operations_with_status_filter() {
    let (app, _, _) = setup();
    let program_id = create_program(&app).await;
    create_deposit(&app, &program_id).await;

    let response = app
        .clone()
        .oneshot(get("/operations?status=PaymentPending"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let operations = read_json(response).await;
    assert_eq!(operations.as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(get("/operations?status=Minted"))
        .await
        .unwrap();
    let operations = read_json(response).await;
    assert!(operations.as_array().unwrap().is_empty());

    let response = app
        .oneshot(get("/operations?status=NoSuchStatus"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_operation_events() {
    let (app, _, _) = setup();
    let program_id = create_program(&app).await;
    let deposit = create_deposit(&app, &program_id).await;
    let operation_id = deposit["operation_id"].as_str().unwrap();

    let response = app
        .oneshot(get(&format!("/operations/{operation_id}/events")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let events = read_json(response).await;
    let events = events.as_array().unwrap();

    assert_eq!(events[0]["event_type"], "DepositRequested");
    assert_eq!(events[0]["version"], 1);
    assert!(events[0]["event_id"].as_str().is_some());
    assert!(events[0]["timestamp"].as_str().is_some());
    assert!(events[0]["payload"].is_object());
    assert_eq!(events[1]["event_type"], "CollectionCreated");
}

#[tokio::test]
async fn test_get_nonexistent_operation() {
    let (app, _, _) = setup();
    let fake_id = uuid::Uuid::new_v4();

    let response = app
        .oneshot(get(&format!("/operations/{fake_id}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
