use anyhow::Context;
use fleetconf::configuration::get_configuration;
use fleetconf::startup::run;
use fleetconf::telemetry::{get_subscriber, init_subscriber};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use std::net::TcpListener;
use std::time::Duration;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("fleetconf".into(), "info".into());
    init_subscriber(subscriber).map_err(anyhow::Error::msg)?;

    let settings = get_configuration().context("Failed to read configuration")?;

    tracing::info!(
        db_host = %settings.database.host,
        db_port = settings.database.port,
        db_name = %settings.database.database_name,
        "Connecting to PostgreSQL"
    );

    let connect_options = PgConnectOptions::new()
        .host(&settings.database.host)
        .port(settings.database.port)
        .username(&settings.database.username)
        .password(&settings.database.password)
        .database(&settings.database.database_name)
        .ssl_mode(PgSslMode::Prefer);

    let pg_pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(connect_options)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pg_pool)
        .await
        .context("Failed to apply migrations")?;

    let address = format!("{}:{}", settings.app_host, settings.app_port);
    tracing::info!("Start server at {:?}", &address);
    let listener =
        TcpListener::bind(&address).with_context(|| format!("failed to bind to {}", address))?;

    run(listener, pg_pool, settings).await?.await?;
    Ok(())
}
