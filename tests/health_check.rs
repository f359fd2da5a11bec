mod common;

#[tokio::test]
async fn health_check_reports_database_and_schema() {
    let app = match common::spawn_app().await {
        Some(app) => app,
        None => return,
    };

    let response = app
        .client
        .get(app.url("/health_check"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["components"]["database"]["status"], "healthy");
    assert_eq!(body["components"]["schema"]["status"], "healthy");
}

#[tokio::test]
async fn health_check_fails_without_schema() {
    let app = match common::spawn_app().await {
        Some(app) => app,
        None => return,
    };

    sqlx::query("DROP TABLE config_audit_log")
        .execute(&app.db_pool)
        .await
        .unwrap();

    let response = app
        .client
        .get(app.url("/health_check"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 503);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["components"]["schema"]["status"], "unhealthy");
}
