use super::models::{ComponentHealth, HealthCheckResponse};
use sqlx::PgPool;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::time::timeout;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);
const SLOW_RESPONSE_THRESHOLD_MS: u64 = 1000;

/// Tables the service cannot run without.
const REQUIRED_TABLES: &[&str] = &[
    "devices",
    "device_configurations",
    "config_deployments",
    "config_audit_log",
];

pub struct HealthChecker {
    pg_pool: PgPool,
    start_time: Instant,
}

impl HealthChecker {
    pub fn new(pg_pool: PgPool) -> Self {
        Self {
            pg_pool,
            start_time: Instant::now(),
        }
    }

    pub async fn check_all(&self) -> HealthCheckResponse {
        let version = env!("CARGO_PKG_VERSION").to_string();
        let uptime = self.start_time.elapsed().as_secs();
        let mut response = HealthCheckResponse::new(version, uptime);

        let (db_result, schema_result) = tokio::join!(
            timeout(CHECK_TIMEOUT, self.check_database()),
            timeout(CHECK_TIMEOUT, self.check_schema())
        );

        let db_health =
            db_result.unwrap_or_else(|_| ComponentHealth::unhealthy("Timeout".to_string()));
        let schema_health =
            schema_result.unwrap_or_else(|_| ComponentHealth::unhealthy("Timeout".to_string()));

        response.add_component("database".to_string(), db_health);
        response.add_component("schema".to_string(), schema_health);

        response
    }

    #[tracing::instrument(name = "Check database health", skip(self))]
    async fn check_database(&self) -> ComponentHealth {
        let start = Instant::now();

        match sqlx::query("SELECT 1 as health_check")
            .fetch_one(&self.pg_pool)
            .await
        {
            Ok(_) => {
                let elapsed = start.elapsed().as_millis() as u64;
                let mut health = ComponentHealth::healthy(elapsed);

                if elapsed > SLOW_RESPONSE_THRESHOLD_MS {
                    health = ComponentHealth::degraded(
                        "Database responding slowly".to_string(),
                        Some(elapsed),
                    );
                }

                let pool_size = self.pg_pool.size();
                let idle_connections = self.pg_pool.num_idle();
                let mut details = HashMap::new();
                details.insert("pool_size".to_string(), serde_json::json!(pool_size));
                details.insert(
                    "idle_connections".to_string(),
                    serde_json::json!(idle_connections),
                );

                health.with_details(details)
            }
            Err(e) => {
                tracing::error!("Database health check failed: {:?}", e);
                ComponentHealth::unhealthy("Database unreachable".to_string())
            }
        }
    }

    #[tracing::instrument(name = "Check schema health", skip(self))]
    async fn check_schema(&self) -> ComponentHealth {
        let start = Instant::now();
        let tables: Vec<String> = REQUIRED_TABLES.iter().map(|t| t.to_string()).collect();

        match sqlx::query_scalar::<_, String>(
            r#"
            SELECT t.name
            FROM UNNEST($1::text[]) AS t(name)
            WHERE to_regclass('public.' || t.name) IS NULL
            "#,
        )
        .bind(&tables)
        .fetch_all(&self.pg_pool)
        .await
        {
            Ok(missing) if missing.is_empty() => {
                ComponentHealth::healthy(start.elapsed().as_millis() as u64)
            }
            Ok(missing) => {
                tracing::error!("Schema incomplete, missing tables: {:?}", missing);
                let mut details = HashMap::new();
                details.insert("missing_tables".to_string(), serde_json::json!(missing));
                ComponentHealth::unhealthy("Schema incomplete".to_string()).with_details(details)
            }
            Err(e) => {
                tracing::error!("Schema health check failed: {:?}", e);
                ComponentHealth::unhealthy("Schema check failed".to_string())
            }
        }
    }
}
