//! Test fixtures for integration testing

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use rally_ledger::auth::StaticPermissionAuthenticator;
use rally_ledger::config::{AppConfig, AuthBackend, SheetsBackend};
use rally_ledger::http::create_router;
use rally_ledger::metrics::MetricsCollector;
use rally_ledger::service::AppState;
use rally_ledger::sheets::InMemorySheets;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Token carrying the write permission
pub const WRITER_TOKEN: &str = "umpire-token";

/// Token that authenticates but may not write
pub const READER_TOKEN: &str = "viewer-token";

/// A small competition: four singles players and three doubles teams
pub fn competition_sheets() -> InMemorySheets {
    InMemorySheets::new()
        .with_sheet(
            "player",
            &[&["Name"], &["Ana"], &["Leo"], &["Mia"], &["Zoe"]],
        )
        .with_sheet(
            "single",
            &[
                &["Player", "Score"],
                &[],
                &["Ana", "11"],
                &["Mia", "7"],
                &[],
                &["Leo", "11"],
                &["Zoe", "9"],
                &[],
                &["Leo", "13"],
                &["Ana", "11"],
            ],
        )
        .with_sheet(
            "double_player",
            &[&["Team"], &["Eagles"], &["Hawks"], &["Owls"]],
        )
        .with_sheet(
            "double_match",
            &[
                &["Team", "Score"],
                &[],
                &["Eagles", "11"],
                &["Hawks", "6"],
                &[],
                &["Hawks", "11"],
                &["Eagles", "8"],
                &[],
                &["Eagles", "11"],
                &["Hawks", "9"],
            ],
        )
}

/// Configuration for the in-memory backends
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.service.name = "rally-ledger-test".to_string();
    config.sheets.backend = SheetsBackend::Memory;
    config.auth.backend = AuthBackend::Static;
    config
}

/// A started application over `sheets`
pub async fn create_test_state(sheets: Arc<InMemorySheets>) -> Arc<AppState> {
    let config = test_config();
    let authenticator = StaticPermissionAuthenticator::default()
        .with_token(WRITER_TOKEN, &[config.auth.write_permission.as_str()])
        .with_token(READER_TOKEN, &["read:table_tennis_score"]);
    let metrics = Arc::new(MetricsCollector::new().expect("metrics collector"));

    let state = Arc::new(AppState::from_parts(
        config,
        sheets,
        Arc::new(authenticator),
        metrics,
    ));
    state.start().await.expect("service should start");
    state
}

/// Router plus a handle on the spreadsheet behind it
pub async fn create_test_app() -> (Router, Arc<InMemorySheets>, Arc<AppState>) {
    let sheets = Arc::new(competition_sheets());
    let state = create_test_state(sheets.clone()).await;
    (create_router(state.clone()), sheets, state)
}

/// Send one request through the router, returning the status and raw body
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    (status, body.to_vec())
}

/// `GET uri` returning the JSON body
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request");
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

/// `POST uri` with a JSON body and an optional bearer token
pub async fn post_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: &Value,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = builder
        .body(Body::from(body.to_string()))
        .expect("valid request");
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}
