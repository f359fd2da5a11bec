mod common;

use common::{ACME_TOKEN, ADMIN_TOKEN, GLOBEX_TOKEN};
use serde_json::{json, Value};

async fn deployment_status(app: &common::TestApp, deployment_id: i64) -> String {
    sqlx::query_scalar("SELECT status FROM config_deployments WHERE id = $1")
        .bind(deployment_id as i32)
        .fetch_one(&app.db_pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn deploy_without_active_config_fails() {
    let app = match common::spawn_app().await {
        Some(app) => app,
        None => return,
    };
    app.add_device("D1", "acme").await;
    app.create_config(ADMIN_TOKEN, "D1", json!({"v": 1})).await;

    let response = app
        .post(ADMIN_TOKEN, "/admin/deployments/D1/deploy", json!({}))
        .await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["kind"], "precondition");
}

#[tokio::test]
async fn deploy_body_is_empty_or_well_formed() {
    let app = match common::spawn_app().await {
        Some(app) => app,
        None => return,
    };
    app.add_device("D1", "acme").await;
    let v1 = app.create_config(ADMIN_TOKEN, "D1", json!({"v": 1})).await;
    let v2 = app.create_config(ADMIN_TOKEN, "D1", json!({"v": 2})).await;
    app.activate(ADMIN_TOKEN, "D1", v1).await;
    let before = app.count("SELECT COUNT(*) FROM config_deployments").await;

    for body in [r#"{"configId":"two"}"#, "{", r#"{"configId":1.5}"#] {
        let response = app
            .client
            .post(app.url("/admin/deployments/D1/deploy"))
            .bearer_auth(ADMIN_TOKEN)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(response.status().as_u16(), 400, "body {}", body);
        let json: Value = response.json().await.unwrap();
        assert_eq!(json["kind"], "validation");
    }
    assert_eq!(
        app.count("SELECT COUNT(*) FROM config_deployments").await,
        before
    );

    let response = app
        .client
        .post(app.url("/admin/deployments/D1/deploy"))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .expect("Failed to execute request.");
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["item"]["configId"], v1);

    let response = app
        .post(ADMIN_TOKEN, "/admin/deployments/D1/deploy", json!({"configId": v2}))
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["item"]["configId"], v2);
}

#[tokio::test]
async fn device_reports_drive_the_deployment() {
    let app = match common::spawn_app().await {
        Some(app) => app,
        None => return,
    };
    app.add_device("D1", "acme").await;
    let config_id = app.create_config(ACME_TOKEN, "D1", json!({"v": 1})).await;
    app.activate(ACME_TOKEN, "D1", config_id).await;

    let response = app
        .post(ACME_TOKEN, "/admin/deployments/D1/deploy", json!({}))
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    let deployment_id = body["id"].as_i64().unwrap();
    assert_eq!(body["item"]["status"], "pending");
    assert_eq!(body["item"]["method"], "manual");

    let response = app
        .report_status("D1", json!({"configId": config_id, "status": "in_progress"}))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(deployment_status(&app, deployment_id).await, "in_progress");

    let response = app
        .report_status("D1", json!({"configId": config_id, "status": "success"}))
        .await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"success": true}));
    assert_eq!(deployment_status(&app, deployment_id).await, "success");

    let body: Value = app
        .get(ACME_TOKEN, "/admin/configs/D1")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["item"]["deployed"], true);
    assert_eq!(body["item"]["deploymentStatus"], "success");
}

#[tokio::test]
async fn repeated_reports_are_no_ops() {
    let app = match common::spawn_app().await {
        Some(app) => app,
        None => return,
    };
    app.add_device("D1", "acme").await;
    let config_id = app.create_config(ADMIN_TOKEN, "D1", json!({"v": 1})).await;
    app.activate(ADMIN_TOKEN, "D1", config_id).await;

    for _ in 0..3 {
        let response = app
            .report_status(
                "D1",
                json!({"configId": config_id, "status": "failed", "error": "disk full"}),
            )
            .await;
        assert_eq!(response.status().as_u16(), 200);
    }
    // terminal state sticks
    app.report_status("D1", json!({"configId": config_id, "status": "success"}))
        .await;

    let (status, error): (String, Option<String>) = sqlx::query_as(
        "SELECT status, error_message FROM config_deployments WHERE config_id = $1",
    )
    .bind(config_id)
    .fetch_one(&app.db_pool)
    .await
    .unwrap();
    assert_eq!(status, "failed");
    assert_eq!(error.as_deref(), Some("disk full"));

    let updates = app
        .count("SELECT COUNT(*) FROM config_audit_log WHERE action = 'STATUS_UPDATE'")
        .await;
    assert_eq!(updates, 1);
}

async fn deployment_snapshot(
    app: &common::TestApp,
    config_id: i32,
) -> (String, Option<chrono::DateTime<chrono::Utc>>) {
    sqlx::query_as("SELECT status, completed_at FROM config_deployments WHERE config_id = $1")
        .bind(config_id)
        .fetch_one(&app.db_pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn repeated_success_leaves_state_unchanged() {
    let app = match common::spawn_app().await {
        Some(app) => app,
        None => return,
    };
    app.add_device("D1", "acme").await;
    let config_id = app.create_config(ADMIN_TOKEN, "D1", json!({"v": 1})).await;
    app.activate(ADMIN_TOKEN, "D1", config_id).await;

    let response = app
        .report_status("D1", json!({"configId": config_id, "status": "success"}))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let deployment = deployment_snapshot(&app, config_id).await;
    assert_eq!(deployment.0, "success");
    assert!(deployment.1.is_some());
    let config: Value = app
        .get(ADMIN_TOKEN, "/admin/configs/D1")
        .await
        .json()
        .await
        .unwrap();
    let deployed_at: Option<chrono::DateTime<chrono::Utc>> =
        sqlx::query_scalar("SELECT deployed_at FROM device_configurations WHERE id = $1")
            .bind(config_id)
            .fetch_one(&app.db_pool)
            .await
            .unwrap();
    assert!(deployed_at.is_some());

    let response = app
        .report_status("D1", json!({"configId": config_id, "status": "success"}))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"success": true}));

    assert_eq!(deployment_snapshot(&app, config_id).await, deployment);
    let again: Value = app
        .get(ADMIN_TOKEN, "/admin/configs/D1")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(again["item"]["deployed"], true);
    assert_eq!(again["item"]["deploymentStatus"], "success");
    assert_eq!(again["item"], config["item"]);
    let deployed_again: Option<chrono::DateTime<chrono::Utc>> =
        sqlx::query_scalar("SELECT deployed_at FROM device_configurations WHERE id = $1")
            .bind(config_id)
            .fetch_one(&app.db_pool)
            .await
            .unwrap();
    assert_eq!(deployed_again, deployed_at);

    let updates = app
        .count("SELECT COUNT(*) FROM config_audit_log WHERE action = 'STATUS_UPDATE'")
        .await;
    assert_eq!(updates, 1);
}

#[tokio::test]
async fn failed_deployments_can_be_retried_once_failed() {
    let app = match common::spawn_app().await {
        Some(app) => app,
        None => return,
    };
    app.add_device("D1", "acme").await;
    let config_id = app.create_config(ADMIN_TOKEN, "D1", json!({"v": 1})).await;
    app.activate(ADMIN_TOKEN, "D1", config_id).await;
    let deployment_id: i32 =
        sqlx::query_scalar("SELECT id FROM config_deployments WHERE config_id = $1")
            .bind(config_id)
            .fetch_one(&app.db_pool)
            .await
            .unwrap();

    let response = app
        .post(
            ADMIN_TOKEN,
            &format!("/admin/deployments/{}/retry", deployment_id),
            json!({}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);

    app.report_status("D1", json!({"configId": config_id, "status": "failed"}))
        .await;

    let response = app
        .post(
            ACME_TOKEN,
            &format!("/admin/deployments/{}/retry", deployment_id),
            json!({}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["item"]["retryCount"], 1);
    assert_eq!(body["item"]["method"], "retry");
    assert_eq!(body["item"]["status"], "pending");

    let response = app
        .post(
            GLOBEX_TOKEN,
            &format!("/admin/deployments/{}/retry", deployment_id),
            json!({}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 404);

    // the configuration now mirrors the newest deployment
    let body: Value = app
        .get(ADMIN_TOKEN, "/admin/configs/D1")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["item"]["deploymentStatus"], "pending");
}

#[tokio::test]
async fn admin_override_and_listing() {
    let app = match common::spawn_app().await {
        Some(app) => app,
        None => return,
    };
    app.add_device("D1", "acme").await;
    app.add_device("G1", "globex").await;
    let acme = app.create_config(ADMIN_TOKEN, "D1", json!({"v": 1})).await;
    let globex = app.create_config(ADMIN_TOKEN, "G1", json!({"v": 1})).await;
    app.activate(ADMIN_TOKEN, "D1", acme).await;
    app.activate(ADMIN_TOKEN, "G1", globex).await;

    let body: Value = app
        .get(ACME_TOKEN, "/admin/deployments?status=pending")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["meta"]["total"], 1);
    let deployment_id = body["list"][0]["id"].as_i64().unwrap();

    let response = app
        .post(
            ACME_TOKEN,
            &format!("/admin/deployments/{}/status", deployment_id),
            json!({"status": "failed", "error": "operator abort"}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["item"]["status"], "failed");
    assert_eq!(body["item"]["errorMessage"], "operator abort");

    let body: Value = app
        .get(ADMIN_TOKEN, "/admin/deployments")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["meta"]["total"], 2);

    let response = app.get(ADMIN_TOKEN, "/admin/deployments?status=done").await;
    assert_eq!(response.status().as_u16(), 400);
}
