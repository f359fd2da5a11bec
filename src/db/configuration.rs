use crate::db::scope::ScopedQuery;
use crate::models::{
    ConfigFilter, ConfigOrder, ConfigStatusFilter, Configuration, DeploymentStatus,
    NewConfiguration, PageRequest, TenantScope,
};
use sqlx::{PgConnection, PgExecutor, PgPool};
use tracing::Instrument;

const COLUMNS: &str = "id, device_id, version, name, payload, content_hash, schema_version, \
    lifecycle, deployment_status, deployed_at, notes, created_by, created_at, activated_by, activated_at";

const SCOPED_COLUMNS: &str = "c.id, c.device_id, c.version, c.name, c.payload, c.content_hash, \
    c.schema_version, c.lifecycle, c.deployment_status, c.deployed_at, c.notes, c.created_by, \
    c.created_at, c.activated_by, c.activated_at";

fn scoped<'a>(scope: &TenantScope, columns: &str) -> ScopedQuery<'a> {
    ScopedQuery::joined(scope, columns, "device_configurations c", "c.device_id")
}

/// Next free version number for a device. Only meaningful while the device
/// row is locked by the surrounding transaction.
pub async fn next_version(conn: &mut PgConnection, device_id: &str) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        "SELECT COALESCE(MAX(version), 0) + 1 FROM device_configurations WHERE device_id = $1",
    )
    .bind(device_id)
    .fetch_one(conn)
    .await
    .map_err(|err| {
        tracing::error!("Failed to compute next version for {}: {:?}", device_id, err);
        err
    })
}

pub async fn insert(
    conn: &mut PgConnection,
    config: &NewConfiguration,
    version: i32,
) -> Result<Configuration, sqlx::Error> {
    let query_span = tracing::info_span!("Saving new configuration version into the database");
    sqlx::query_as::<_, Configuration>(&format!(
        r#"
        INSERT INTO device_configurations (
            device_id, version, name, payload, content_hash, schema_version, lifecycle,
            notes, created_by, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, 'draft', $7, $8, NOW())
        RETURNING {}
        "#,
        COLUMNS
    ))
    .bind(&config.device_id)
    .bind(version)
    .bind(&config.name)
    .bind(&config.payload)
    .bind(&config.content_hash)
    .bind(config.schema_version)
    .bind(&config.notes)
    .bind(&config.created_by)
    .fetch_one(conn)
    .instrument(query_span)
    .await
    .map_err(|err| {
        tracing::error!("Failed to insert configuration: {:?}", err);
        err
    })
}

#[tracing::instrument(name = "Fetch configuration", skip(executor, scope))]
pub async fn fetch<'e, E>(
    executor: E,
    scope: &TenantScope,
    config_id: i32,
) -> Result<Option<Configuration>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let mut query = scoped(scope, SCOPED_COLUMNS);
    query.and_eq("c.id", config_id);

    query
        .builder()
        .build_query_as::<Configuration>()
        .fetch_optional(executor)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch configuration {}: {:?}", config_id, err);
            err
        })
}

/// Loads a configuration of `device_id` and locks it for the transaction.
pub async fn fetch_for_update(
    conn: &mut PgConnection,
    scope: &TenantScope,
    device_id: &str,
    config_id: i32,
) -> Result<Option<Configuration>, sqlx::Error> {
    let mut query = scoped(scope, SCOPED_COLUMNS);
    query
        .and_eq("c.id", config_id)
        .and_eq("c.device_id", device_id.to_string())
        .push(" FOR UPDATE OF c");

    query
        .builder()
        .build_query_as::<Configuration>()
        .fetch_optional(conn)
        .await
        .map_err(|err| {
            tracing::error!("Failed to lock configuration {}: {:?}", config_id, err);
            err
        })
}

pub async fn fetch_active<'e, E>(
    executor: E,
    scope: &TenantScope,
    device_id: &str,
) -> Result<Option<Configuration>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query_span = tracing::info_span!("Fetching active configuration", device_id = %device_id);
    let mut query = scoped(scope, SCOPED_COLUMNS);
    query
        .and_eq("c.device_id", device_id.to_string())
        .push(" AND c.lifecycle = 'active'");

    query
        .builder()
        .build_query_as::<Configuration>()
        .fetch_optional(executor)
        .instrument(query_span)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch active configuration: {:?}", err);
            err
        })
}

/// Demotes whatever is active for the device. Returns the demoted row.
pub async fn retire_active(
    conn: &mut PgConnection,
    device_id: &str,
) -> Result<Option<Configuration>, sqlx::Error> {
    sqlx::query_as::<_, Configuration>(&format!(
        r#"
        UPDATE device_configurations
        SET lifecycle = 'retired'
        WHERE device_id = $1 AND lifecycle = 'active'
        RETURNING {}
        "#,
        COLUMNS
    ))
    .bind(device_id)
    .fetch_optional(conn)
    .await
    .map_err(|err| {
        tracing::error!("Failed to retire active configuration: {:?}", err);
        err
    })
}

pub async fn activate(
    conn: &mut PgConnection,
    config_id: i32,
    actor: &str,
) -> Result<Configuration, sqlx::Error> {
    sqlx::query_as::<_, Configuration>(&format!(
        r#"
        UPDATE device_configurations
        SET lifecycle = 'active', activated_by = $2, activated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        COLUMNS
    ))
    .bind(config_id)
    .bind(actor)
    .fetch_one(conn)
    .await
    .map_err(|err| {
        tracing::error!("Failed to activate configuration {}: {:?}", config_id, err);
        err
    })
}

/// Copies a deployment's status onto its configuration, unless a newer
/// deployment of the same configuration exists.
pub async fn mirror_deployment_status(
    conn: &mut PgConnection,
    config_id: i32,
    deployment_id: i32,
    status: DeploymentStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE device_configurations
        SET deployment_status = $2
        WHERE id = $1
          AND NOT EXISTS (
              SELECT 1 FROM config_deployments x
              WHERE x.config_id = $1 AND x.id > $3
          )
        "#,
    )
    .bind(config_id)
    .bind(status.as_str())
    .bind(deployment_id)
    .execute(conn)
    .await
    .map(|_| ())
    .map_err(|err| {
        tracing::error!("Failed to mirror deployment status: {:?}", err);
        err
    })
}

pub async fn mark_deployed(conn: &mut PgConnection, config_id: i32) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE device_configurations SET deployed_at = COALESCE(deployed_at, NOW()) WHERE id = $1",
    )
    .bind(config_id)
    .execute(conn)
    .await
    .map(|_| ())
    .map_err(|err| {
        tracing::error!("Failed to mark configuration {} deployed: {:?}", config_id, err);
        err
    })
}

fn push_filters(query: &mut ScopedQuery<'_>, filter: &ConfigFilter) {
    if let Some(device_id) = &filter.device_id {
        query.and_eq("c.device_id", device_id.clone());
    }
    match filter.status {
        Some(ConfigStatusFilter::Active) => {
            query.push(" AND c.lifecycle = 'active'");
        }
        Some(ConfigStatusFilter::Inactive) => {
            query.push(" AND c.lifecycle <> 'active'");
        }
        Some(ConfigStatusFilter::Draft) => {
            query.push(" AND c.lifecycle = 'draft'");
        }
        Some(ConfigStatusFilter::Deployment(status)) => {
            query.and_eq("c.deployment_status", status.as_str());
        }
        None => {}
    }
}

#[tracing::instrument(name = "List configurations", skip(pool, scope))]
pub async fn list(
    pool: &PgPool,
    scope: &TenantScope,
    filter: &ConfigFilter,
    order: ConfigOrder,
    page: PageRequest,
) -> Result<(Vec<Configuration>, i64), sqlx::Error> {
    let mut count = scoped(scope, "COUNT(*)");
    push_filters(&mut count, filter);
    let total = count
        .builder()
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to count configurations: {:?}", err);
            err
        })?;

    let order_by = match order {
        ConfigOrder::VersionDesc => "c.version DESC",
        ConfigOrder::CreatedDesc => "c.created_at DESC, c.id DESC",
    };
    let mut query = scoped(scope, SCOPED_COLUMNS);
    push_filters(&mut query, filter);
    query.paginate(order_by, page.limit, page.offset());

    let items = query
        .builder()
        .build_query_as::<Configuration>()
        .fetch_all(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to list configurations: {:?}", err);
            err
        })?;

    Ok((items, total))
}
