#![allow(dead_code)]

use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use fleetdesk_api::config::{ScriptingConfig, ServerConfig};
use fleetdesk_api::router::build_app_router;
use fleetdesk_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        scripting: ScriptingConfig::default(),
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, ScriptingConfig::default())
}

/// Like [`build_test_app`] with custom coordinator settings.
///
/// Each router owns its coordinator, so tests that depend on the worker pool
/// must send every request through clones of the same router.
pub fn build_test_app_with(pool: PgPool, scripting: ScriptingConfig) -> Router {
    let config = ServerConfig {
        scripting,
        ..test_config()
    };
    let state = AppState::new(pool, config.clone());
    build_app_router(state, &config)
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn post_empty(app: Router, uri: &str) -> Response {
    send(app, Method::POST, uri, None).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    send(app, Method::DELETE, uri, None).await
}

/// Read a response body as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Send a request and return status plus the decoded envelope.
pub async fn expect_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    (status, body_json(response).await)
}

/// Create a script task and return its `data` object.
pub async fn create_script(pool: &PgPool, body: Value) -> Value {
    let response = post_json(build_test_app(pool.clone()), "/api/v1/system/scripts/", body).await;
    let (status, json) = expect_json(response).await;
    assert_eq!(status, StatusCode::OK, "create failed: {json}");
    json["data"].clone()
}

/// Create an active shell script with the given body.
pub async fn create_active_shell(pool: &PgPool, name: &str, content: &str) -> Value {
    create_script(
        pool,
        serde_json::json!({
            "name": name,
            "script_type": "bash",
            "content": content,
            "status": "active",
        }),
    )
    .await
}

/// Poll an execution until it leaves `running`, returning the final record.
pub async fn wait_for_terminal(pool: &PgPool, execution_id: &str) -> Value {
    let uri = format!("/api/v1/system/executions/{execution_id}/");
    for _ in 0..200 {
        let json = body_json(get(build_test_app(pool.clone()), &uri).await).await;
        if json["data"]["status"] != "running" {
            return json["data"].clone();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("execution {execution_id} did not finish in time");
}
