//! Integration tests for script task management and execution.

mod common;

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use axum::Router;
use common::{
    body_json, build_test_app_with, create_active_shell, create_script, delete, expect_json, get,
    post_empty, post_json, put_json, wait_for_terminal,
};
use fleetdesk_api::config::ScriptingConfig;
use serde_json::json;
use sqlx::PgPool;

fn script_uri(id: &serde_json::Value) -> String {
    format!("/api/v1/system/scripts/{}/", id.as_str().unwrap())
}

fn execute_uri(id: &serde_json::Value) -> String {
    format!("/api/v1/system/scripts/{}/execute/", id.as_str().unwrap())
}

/// Start an execution through `app` and return its id.
async fn start(app: &Router, script: &serde_json::Value) -> String {
    let (status, json) =
        expect_json(post_empty(app.clone(), &execute_uri(&script["id"])).await).await;
    assert_eq!(status, StatusCode::OK, "execute failed: {json}");
    json["data"]["id"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_applies_defaults_and_labels(pool: PgPool) {
    let data = create_script(
        &pool,
        json!({"name": "  cleanup  ", "script_type": "bash", "content": "echo hi"}),
    )
    .await;

    assert_eq!(data["name"], "cleanup");
    assert_eq!(data["script_type"], "bash");
    assert_eq!(data["script_type_display"], "Shell script");
    assert_eq!(data["return_type"], "text");
    assert_eq!(data["status"], "draft");
    assert_eq!(data["timeout"], 300);
    assert_eq!(data["execution_count"], 0);
    assert!(data["last_executed_at"].is_null());
    assert_eq!(data["parameters"], json!({}));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn get_update_and_list(pool: PgPool) {
    let data = create_script(
        &pool,
        json!({
            "name": "report",
            "script_type": "python",
            "content": "print(PARAMS)",
            "parameters": {"region": "eu", "limit": 5},
        }),
    )
    .await;
    // jsonb orders keys by length first
    assert_eq!(data["parameter_names"], json!(["limit", "region"]));

    let app = common::build_test_app(pool.clone());
    let (status, json) = expect_json(get(app, &script_uri(&data["id"])).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["parameters"], json!({"region": "eu", "limit": 5}));

    let app = common::build_test_app(pool.clone());
    let response = put_json(
        app,
        &script_uri(&data["id"]),
        json!({"status": "active", "timeout": 60}),
    )
    .await;
    let (status, json) = expect_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "active");
    assert_eq!(json["data"]["timeout"], 60);
    assert_eq!(json["data"]["content"], "print(PARAMS)");

    let app = common::build_test_app(pool.clone());
    let json = body_json(get(app, "/api/v1/system/scripts/?status=active&name=rep").await).await;
    assert_eq!(json["data"]["pagination"]["total_items"], 1);
    assert_eq!(json["data"]["items"][0]["name"], "report");

    let app = common::build_test_app(pool);
    let json = body_json(get(app, "/api/v1/system/scripts/?script_type=bash").await).await;
    assert_eq!(json["data"]["pagination"]["total_items"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn validation_failures_are_400(pool: PgPool) {
    create_active_shell(&pool, "dup", "true").await;

    let cases = [
        json!({"name": "dup", "script_type": "bash", "content": "true"}),
        json!({"name": "", "script_type": "bash", "content": "true"}),
        json!({"name": "x", "script_type": "ruby", "content": "true"}),
        json!({"name": "x", "script_type": "bash", "content": "  "}),
        json!({"name": "x", "script_type": "bash", "content": "true", "timeout": 0}),
        json!({"name": "x", "script_type": "bash", "content": "true", "parameters": [1]}),
    ];
    for body in cases {
        let app = common::build_test_app(pool.clone());
        let (status, json) =
            expect_json(post_json(app, "/api/v1/system/scripts/", body.clone()).await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body} should be rejected");
        assert_eq!(json["code"], 400);
        assert_eq!(json["success"], false);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn malformed_json_is_enveloped_400(pool: PgPool) {
    let app = common::build_test_app(pool);
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/v1/system/scripts/")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();

    let (status, json) = expect_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_script_is_404(pool: PgPool) {
    let uri = format!("/api/v1/system/scripts/{}/", uuid::Uuid::new_v4());
    let app = common::build_test_app(pool);
    let (status, json) = expect_json(get(app, &uri).await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], 404);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_hides_script_and_frees_name(pool: PgPool) {
    let data = create_active_shell(&pool, "temp", "true").await;

    let app = common::build_test_app(pool.clone());
    let (status, json) = expect_json(delete(app, &script_uri(&data["id"])).await).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"].is_null());

    let app = common::build_test_app(pool.clone());
    assert_eq!(get(app, &script_uri(&data["id"])).await.status(), StatusCode::NOT_FOUND);

    create_active_shell(&pool, "temp", "true").await;
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn successful_run_is_recorded_and_counted(pool: PgPool) {
    let script = create_active_shell(&pool, "hello", "echo hello").await;

    let app = common::build_test_app(pool.clone());
    let (status, json) = expect_json(post_empty(app, &execute_uri(&script["id"])).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "running");
    assert_eq!(json["data"]["script_task"], script["id"]);

    let id = json["data"]["id"].as_str().unwrap().to_string();
    let execution = wait_for_terminal(&pool, &id).await;
    assert_eq!(execution["status"], "success");
    assert!(execution["output"].as_str().unwrap().contains("hello"));
    assert!(execution["error_message"].is_null());
    assert!(execution["execution_time"].as_f64().unwrap() >= 0.0);
    assert!(!execution["finished_at"].is_null());

    let app = common::build_test_app(pool);
    let json = body_json(get(app, &script_uri(&script["id"])).await).await;
    assert_eq!(json["data"]["execution_count"], 1);
    assert!(!json["data"]["last_executed_at"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn parameters_reach_shell_and_python(pool: PgPool) {
    let shell = create_active_shell(&pool, "greet", "echo \"hi $WHO\"").await;
    let app = common::build_test_app(pool.clone());
    let json = body_json(
        post_json(app, &execute_uri(&shell["id"]), json!({"parameters": {"WHO": "fleet"}})).await,
    )
    .await;
    assert_eq!(json["data"]["input_parameters"], json!({"WHO": "fleet"}));
    let execution = wait_for_terminal(&pool, json["data"]["id"].as_str().unwrap()).await;
    assert!(execution["output"].as_str().unwrap().contains("hi fleet"));

    let python = create_script(
        &pool,
        json!({
            "name": "py",
            "script_type": "python",
            "status": "active",
            "content": "print(PARAMS['n'] * 2)",
        }),
    )
    .await;
    let app = common::build_test_app(pool.clone());
    let json = body_json(
        post_json(app, &execute_uri(&python["id"]), json!({"parameters": {"n": 21}})).await,
    )
    .await;
    let execution = wait_for_terminal(&pool, json["data"]["id"].as_str().unwrap()).await;
    assert_eq!(execution["status"], "success", "{execution}");
    assert!(execution["output"].as_str().unwrap().contains("42"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failing_script_keeps_output_and_stderr(pool: PgPool) {
    let script = create_active_shell(&pool, "broken", "echo partial; echo boom >&2; exit 3").await;

    let app = common::build_test_app(pool.clone());
    let json = body_json(post_empty(app, &execute_uri(&script["id"])).await).await;
    let execution = wait_for_terminal(&pool, json["data"]["id"].as_str().unwrap()).await;

    assert_eq!(execution["status"], "failed");
    assert!(execution["output"].as_str().unwrap().contains("partial"));
    assert_eq!(execution["error_message"], "boom\n");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn slow_script_times_out(pool: PgPool) {
    let script = create_script(
        &pool,
        json!({
            "name": "slow",
            "script_type": "bash",
            "status": "active",
            "timeout": 1,
            "content": "sleep 5",
        }),
    )
    .await;

    let app = common::build_test_app(pool.clone());
    let json = body_json(post_empty(app, &execute_uri(&script["id"])).await).await;
    let execution = wait_for_terminal(&pool, json["data"]["id"].as_str().unwrap()).await;

    assert_eq!(execution["status"], "timeout");
    assert_eq!(execution["error_message"], "Script execution timed out");
    let elapsed = execution["execution_time"].as_f64().unwrap();
    assert!((0.9..4.0).contains(&elapsed), "elapsed {elapsed}");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn inactive_script_is_rejected_without_record(pool: PgPool) {
    let script = create_script(
        &pool,
        json!({"name": "draft", "script_type": "bash", "content": "true"}),
    )
    .await;

    let app = common::build_test_app(pool.clone());
    let (status, json) = expect_json(post_empty(app, &execute_uri(&script["id"])).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Script 'draft' is not active");

    let app = common::build_test_app(pool);
    let json = body_json(get(app, "/api/v1/system/executions/").await).await;
    assert_eq!(json["data"]["pagination"]["total_items"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_execute_bodies_are_400(pool: PgPool) {
    let script = create_active_shell(&pool, "strict", "true").await;

    for body in [json!({"parameters": "a=1"}), json!({"parameters": {"bad name": 1}})] {
        let app = common::build_test_app(pool.clone());
        let response = post_json(app, &execute_uri(&script["id"]), body.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body}");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_is_refused_while_running(pool: PgPool) {
    let script = create_active_shell(&pool, "busy", "sleep 2").await;

    let app = common::build_test_app(pool.clone());
    let json = body_json(post_empty(app, &execute_uri(&script["id"])).await).await;
    let execution_id = json["data"]["id"].as_str().unwrap().to_string();

    let app = common::build_test_app(pool.clone());
    let (status, json) = expect_json(delete(app, &script_uri(&script["id"])).await).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], 409);

    wait_for_terminal(&pool, &execution_id).await;
    let app = common::build_test_app(pool);
    assert_eq!(delete(app, &script_uri(&script["id"])).await.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_list_filters_are_400(pool: PgPool) {
    for uri in [
        "/api/v1/system/scripts/?status=bogus",
        "/api/v1/system/scripts/?script_type=perl",
        "/api/v1/system/executions/?status=bogus",
    ] {
        let app = common::build_test_app(pool.clone());
        let (status, json) = expect_json(get(app, uri).await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri {uri}");
        assert_eq!(json["success"], false);
    }

    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/system/executions/?status=cancelled").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn execution_stays_readable_after_task_deletion(pool: PgPool) {
    let script = create_active_shell(&pool, "once", "echo once").await;

    let app = common::build_test_app(pool.clone());
    let execution_id = start(&app, &script).await;
    wait_for_terminal(&pool, &execution_id).await;

    let app = common::build_test_app(pool.clone());
    assert_eq!(delete(app, &script_uri(&script["id"])).await.status(), StatusCode::OK);

    let app = common::build_test_app(pool.clone());
    let uri = format!("/api/v1/system/executions/{execution_id}/");
    let (status, json) = expect_json(get(app, &uri).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "success");
    assert_eq!(json["data"]["script_name"], "once");

    let app = common::build_test_app(pool);
    let json = body_json(get(app, "/api/v1/system/executions/").await).await;
    assert_eq!(json["data"]["pagination"]["total_items"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unpreparable_workspace_fails_without_counting(pool: PgPool) {
    let root = tempfile::tempdir().unwrap();
    let app = build_test_app_with(
        pool.clone(),
        ScriptingConfig {
            workspace_root: Some(root.path().join("missing")),
            ..ScriptingConfig::default()
        },
    );
    let script = create_active_shell(&pool, "homeless", "echo never").await;

    let execution_id = start(&app, &script).await;
    let execution = wait_for_terminal(&pool, &execution_id).await;

    assert_eq!(execution["status"], "failed");
    let message = execution["error_message"].as_str().unwrap();
    assert!(message.contains("Failed to prepare script"), "{message}");
    assert!(!execution["finished_at"].is_null());

    let json = body_json(get(app, &script_uri(&script["id"])).await).await;
    assert_eq!(json["data"]["execution_count"], 0);
    assert!(json["data"]["last_executed_at"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn worker_pool_bounds_parallel_runs(pool: PgPool) {
    let app = build_test_app_with(
        pool.clone(),
        ScriptingConfig {
            max_concurrency: 1,
            ..ScriptingConfig::default()
        },
    );
    let script = create_active_shell(&pool, "nap", "sleep 1").await;

    let started = Instant::now();
    let first = start(&app, &script).await;
    let second = start(&app, &script).await;
    wait_for_terminal(&pool, &first).await;
    let last = wait_for_terminal(&pool, &second).await;

    assert_eq!(last["status"], "success");
    assert!(
        started.elapsed() >= Duration::from_millis(1900),
        "runs overlapped: {:?}",
        started.elapsed()
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_executions_are_all_counted(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let script = create_active_shell(&pool, "burst", "echo burst").await;

    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(start(&app, &script).await);
    }
    for id in &ids {
        let execution = wait_for_terminal(&pool, id).await;
        assert_eq!(execution["status"], "success");
    }

    let json = body_json(get(app, &script_uri(&script["id"])).await).await;
    assert_eq!(json["data"]["execution_count"], 5);
}
