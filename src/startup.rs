use crate::configuration::Settings;
use crate::errors::{ServiceError, ValidationError};
use crate::health::HealthChecker;
use crate::middleware;
use crate::middleware::access_control::{DbTenantResolver, TenantResolver};
use crate::routes;
use crate::services::{
    ActivationManager, AuditLogger, ConfigStore, ConfigValidator, DeploymentTracker,
    DevicePollingService,
};
use actix_cors::Cors;
use actix_web::{dev::Server, error, web, App, HttpServer};
use sqlx::{Pool, Postgres};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use tracing_actix_web::TracingLogger;

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let reason = match &err {
            error::JsonPayloadError::Deserialize(err) => format!(
                "line {}, column {}: {}",
                err.line(),
                err.column(),
                err
            ),
            other => other.to_string(),
        };
        ServiceError::from(ValidationError::field("body", reason)).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        ServiceError::from(ValidationError::field("query", err.to_string())).into()
    })
}

pub async fn run(
    listener: TcpListener,
    pg_pool: Pool<Postgres>,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let audit = AuditLogger::new(pg_pool.clone());
    let validator = ConfigValidator::new(settings.validation.device_types.clone());
    let store = ConfigStore::new(pg_pool.clone(), validator, audit.clone());
    let tracker = DeploymentTracker::new(pg_pool.clone(), audit.clone());
    let activation =
        ActivationManager::new(pg_pool.clone(), store.clone(), tracker.clone(), audit.clone());
    let polling = DevicePollingService::new(store.clone(), tracker.clone());

    let resolver: Arc<dyn TenantResolver> = Arc::new(DbTenantResolver::new(
        pg_pool.clone(),
        settings.access.admin_roles.clone(),
        settings.access.permission_cache_ttl(),
    ));
    let resolver: web::Data<dyn TenantResolver> = web::Data::from(resolver);
    let user_cache = web::Data::new(middleware::authentication::UserCache::new(
        settings.access.user_cache_ttl(),
    ));
    let oauth_http_client = reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(90))
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;
    let oauth_http_client = web::Data::new(oauth_http_client);

    let health_checker = web::Data::new(Arc::new(HealthChecker::new(pg_pool.clone())));

    let audit = web::Data::new(audit);
    let store = web::Data::new(store);
    let tracker = web::Data::new(tracker);
    let activation = web::Data::new(activation);
    let polling = web::Data::new(polling);
    let settings = web::Data::new(settings);
    let pg_pool = web::Data::new(pg_pool);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(Cors::permissive())
            .service(web::scope("/health_check").service(routes::health_check))
            .service(
                web::scope("/device")
                    .app_data(routes::device::json_config())
                    .service(routes::device::version_handler)
                    .service(routes::device::config_handler)
                    .service(routes::device::status_handler),
            )
            .service(
                web::scope("/admin")
                    .wrap(middleware::authentication::BearerAuth)
                    .service(
                        web::scope("/configs")
                            .service(routes::admin::configs::list_handler)
                            .service(routes::admin::configs::history_handler)
                            .service(routes::admin::configs::activate_handler)
                            .service(routes::admin::configs::active_handler)
                            .service(routes::admin::configs::create_handler),
                    )
                    .service(
                        web::scope("/deployments")
                            .service(routes::admin::deployments::list_handler)
                            .service(routes::admin::deployments::deploy_handler)
                            .service(routes::admin::deployments::retry_handler)
                            .service(routes::admin::deployments::override_handler),
                    )
                    .service(web::scope("/audit").service(routes::admin::audit::audit_handler)),
            )
            .app_data(json_config())
            .app_data(query_config())
            .app_data(health_checker.clone())
            .app_data(resolver.clone())
            .app_data(user_cache.clone())
            .app_data(oauth_http_client.clone())
            .app_data(audit.clone())
            .app_data(store.clone())
            .app_data(tracker.clone())
            .app_data(activation.clone())
            .app_data(polling.clone())
            .app_data(pg_pool.clone())
            .app_data(settings.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
