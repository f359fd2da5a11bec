#![allow(dead_code)]

use fleetconf::configuration::{get_configuration, DatabaseSettings, Settings};
use serde_json::{json, Value};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Role listed in the default `access.admin_roles`.
pub const ADMIN_TOKEN: &str = "admin-token";
/// Member of tenant `acme` only.
pub const ACME_TOKEN: &str = "acme-token";
/// Member of tenant `globex` only.
pub const GLOBEX_TOKEN: &str = "globex-token";

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
    pub client: reqwest::Client,
    // keeps the identity service alive for the test's duration
    pub auth_server: MockServer,
}

async fn mount_user(server: &MockServer, token: &str, id: &str, role: &str) {
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {
                "_id": id,
                "first_name": "Test",
                "last_name": "User",
                "email": format!("{}@example.com", id),
                "role": role,
                "email_confirmed": true
            }
        })))
        .mount(server)
        .await;
}

pub async fn spawn_app_with_configuration(
    mut configuration: Settings,
    auth_server: MockServer,
) -> Option<TestApp> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);
    configuration.database.database_name = uuid::Uuid::new_v4().to_string();

    let connection_pool = match configure_database(&configuration.database).await {
        Ok(pool) => pool,
        Err(err) => {
            eprintln!("Skipping tests: failed to connect to postgres: {}", err);
            return None;
        }
    };

    let server = fleetconf::startup::run(listener, connection_pool.clone(), configuration)
        .await
        .expect("Failed to bind address.");
    let _ = tokio::spawn(server);

    Some(TestApp {
        address,
        db_pool: connection_pool,
        client: reqwest::Client::new(),
        auth_server,
    })
}

pub async fn spawn_app() -> Option<TestApp> {
    let mut configuration = get_configuration().expect("Failed to get configuration");

    let auth_server = MockServer::start().await;
    mount_user(&auth_server, ADMIN_TOKEN, "admin-1", "group_admin").await;
    mount_user(&auth_server, ACME_TOKEN, "acme-user", "group_user").await;
    mount_user(&auth_server, GLOBEX_TOKEN, "globex-user", "group_user").await;
    configuration.auth_url = format!("{}/me", auth_server.uri());

    let app = spawn_app_with_configuration(configuration, auth_server).await?;
    app.add_member("acme-user", "acme").await;
    app.add_member("globex-user", "globex").await;
    Some(app)
}

pub async fn configure_database(config: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    let mut connection = PgConnection::connect(&config.connection_string_without_db()).await?;

    connection
        .execute(format!(r#"CREATE DATABASE "{}""#, config.database_name).as_str())
        .await?;

    let connection_pool = PgPool::connect(&config.connection_string()).await?;

    sqlx::migrate!("./migrations").run(&connection_pool).await?;

    Ok(connection_pool)
}

impl TestApp {
    pub async fn add_device(&self, device_id: &str, tenant_id: &str) {
        sqlx::query("INSERT INTO devices (id, tenant_id, name) VALUES ($1, $2, $1)")
            .bind(device_id)
            .bind(tenant_id)
            .execute(&self.db_pool)
            .await
            .expect("Failed to insert device");
    }

    pub async fn add_member(&self, user_id: &str, tenant_id: &str) {
        sqlx::query("INSERT INTO tenant_members (user_id, tenant_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(tenant_id)
            .execute(&self.db_pool)
            .await
            .expect("Failed to insert tenant member");
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post(&self, token: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Creates a configuration and returns its id.
    pub async fn create_config(&self, token: &str, device_id: &str, data: Value) -> i32 {
        let response = self
            .post(
                token,
                &format!("/admin/configs/{}", device_id),
                json!({"name": "test config", "data": data}),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap() as i32
    }

    pub async fn activate(&self, token: &str, device_id: &str, config_id: i32) -> reqwest::Response {
        self.post(
            token,
            &format!("/admin/configs/{}/activate", device_id),
            json!({"configId": config_id, "changeReason": "test"}),
        )
        .await
    }

    pub async fn version_check(&self, device_id: &str) -> String {
        self.client
            .get(self.url(&format!("/device/version/{}", device_id)))
            .send()
            .await
            .expect("Failed to execute request.")
            .text()
            .await
            .unwrap()
    }

    pub async fn report_status(&self, device_id: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/device/status/{}", device_id)))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn count(&self, sql: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(sql)
            .fetch_one(&self.db_pool)
            .await
            .expect("Failed to count rows")
    }
}
