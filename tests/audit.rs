mod common;

use common::{ACME_TOKEN, ADMIN_TOKEN};
use serde_json::{json, Value};

#[tokio::test]
async fn audit_trail_is_newest_first() {
    let app = match common::spawn_app().await {
        Some(app) => app,
        None => return,
    };
    app.add_device("D1", "acme").await;
    let v1 = app.create_config(ACME_TOKEN, "D1", json!({"v": 1})).await;
    let v2 = app.create_config(ACME_TOKEN, "D1", json!({"v": 2})).await;
    app.activate(ACME_TOKEN, "D1", v1).await;
    app.activate(ACME_TOKEN, "D1", v2).await;

    let body: Value = app
        .get(ACME_TOKEN, &format!("/admin/audit/{}", v2))
        .await
        .json()
        .await
        .unwrap();
    let actions: Vec<&str> = body["list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["DEPLOY", "ACTIVATE", "CREATE"]);

    let activate = &body["list"][1];
    assert_eq!(activate["actorUserId"], "acme-user");
    assert_eq!(activate["changeReason"], "test");
    assert_eq!(activate["previousSnapshot"]["id"], v1);
    assert_eq!(activate["newSnapshot"]["data"]["v"], 2);

    let body: Value = app
        .get(ACME_TOKEN, &format!("/admin/audit/{}?limit=1&page=3", v2))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["meta"], json!({"total": 3, "page": 3, "limit": 1}));
    assert_eq!(body["list"][0]["action"], "CREATE");
}

#[tokio::test]
async fn first_activation_has_no_previous_snapshot() {
    let app = match common::spawn_app().await {
        Some(app) => app,
        None => return,
    };
    app.add_device("D1", "acme").await;
    let v1 = app.create_config(ADMIN_TOKEN, "D1", json!({"v": 1})).await;
    app.activate(ADMIN_TOKEN, "D1", v1).await;

    let previous: Option<Value> = sqlx::query_scalar(
        "SELECT previous_snapshot FROM config_audit_log WHERE config_id = $1 AND action = 'ACTIVATE'",
    )
    .bind(v1)
    .fetch_one(&app.db_pool)
    .await
    .unwrap();
    assert!(previous.is_none());
}

#[tokio::test]
async fn audit_failure_does_not_fail_the_action() {
    let app = match common::spawn_app().await {
        Some(app) => app,
        None => return,
    };
    app.add_device("D1", "acme").await;
    sqlx::query("DROP TABLE config_audit_log")
        .execute(&app.db_pool)
        .await
        .unwrap();

    let v1 = app.create_config(ADMIN_TOKEN, "D1", json!({"v": 1})).await;
    let response = app.activate(ADMIN_TOKEN, "D1", v1).await;
    assert_eq!(response.status().as_u16(), 200);
}
