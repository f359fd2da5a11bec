use crate::db::scope::ScopedQuery;
use crate::models::{Deployment, DeploymentStatus, NewDeployment, PageRequest, TenantScope};
use sqlx::{PgConnection, PgPool};
use tracing::Instrument;

const COLUMNS: &str = "id, config_id, device_id, status, method, initiated_by, initiated_at, \
    completed_at, error_message, retry_count";

const SCOPED_COLUMNS: &str = "x.id, x.config_id, x.device_id, x.status, x.method, x.initiated_by, \
    x.initiated_at, x.completed_at, x.error_message, x.retry_count";

fn scoped<'a>(scope: &TenantScope, columns: &str) -> ScopedQuery<'a> {
    ScopedQuery::joined(scope, columns, "config_deployments x", "x.device_id")
}

pub async fn insert(
    conn: &mut PgConnection,
    deployment: &NewDeployment,
) -> Result<Deployment, sqlx::Error> {
    let query_span = tracing::info_span!("Saving new deployment into the database");
    sqlx::query_as::<_, Deployment>(&format!(
        r#"
        INSERT INTO config_deployments (
            config_id, device_id, status, method, initiated_by, initiated_at, retry_count
        )
        VALUES ($1, $2, 'pending', $3, $4, NOW(), $5)
        RETURNING {}
        "#,
        COLUMNS
    ))
    .bind(deployment.config_id)
    .bind(&deployment.device_id)
    .bind(deployment.method.as_str())
    .bind(&deployment.initiated_by)
    .bind(deployment.retry_count)
    .fetch_one(conn)
    .instrument(query_span)
    .await
    .map_err(|err| {
        tracing::error!("Failed to insert deployment: {:?}", err);
        err
    })
}

/// Locks the deployment a device report refers to: the given id when
/// supplied, otherwise the most recently initiated one for the pair.
pub async fn fetch_for_report(
    conn: &mut PgConnection,
    scope: &TenantScope,
    device_id: &str,
    config_id: i32,
    deployment_id: Option<i32>,
) -> Result<Option<Deployment>, sqlx::Error> {
    let mut query = scoped(scope, SCOPED_COLUMNS);
    query
        .and_eq("x.device_id", device_id.to_string())
        .and_eq("x.config_id", config_id);
    match deployment_id {
        Some(id) => {
            query.and_eq("x.id", id);
        }
        None => {
            query.push(" ORDER BY x.initiated_at DESC, x.id DESC LIMIT 1");
        }
    }
    query.push(" FOR UPDATE OF x");

    query
        .builder()
        .build_query_as::<Deployment>()
        .fetch_optional(conn)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch deployment for report: {:?}", err);
            err
        })
}

pub async fn fetch_for_update(
    conn: &mut PgConnection,
    scope: &TenantScope,
    deployment_id: i32,
) -> Result<Option<Deployment>, sqlx::Error> {
    let mut query = scoped(scope, SCOPED_COLUMNS);
    query.and_eq("x.id", deployment_id).push(" FOR UPDATE OF x");

    query
        .builder()
        .build_query_as::<Deployment>()
        .fetch_optional(conn)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch deployment {}: {:?}", deployment_id, err);
            err
        })
}

pub async fn update_status(
    conn: &mut PgConnection,
    deployment_id: i32,
    status: DeploymentStatus,
    error_message: Option<&str>,
) -> Result<Deployment, sqlx::Error> {
    let query_span = tracing::info_span!("Updating deployment status", deployment_id, %status);
    sqlx::query_as::<_, Deployment>(&format!(
        r#"
        UPDATE config_deployments
        SET status = $2,
            error_message = COALESCE($3, error_message),
            completed_at = CASE WHEN $4 THEN NOW() ELSE completed_at END
        WHERE id = $1
        RETURNING {}
        "#,
        COLUMNS
    ))
    .bind(deployment_id)
    .bind(status.as_str())
    .bind(error_message)
    .bind(status.is_terminal())
    .fetch_one(conn)
    .instrument(query_span)
    .await
    .map_err(|err| {
        tracing::error!("Failed to update deployment {}: {:?}", deployment_id, err);
        err
    })
}

#[tracing::instrument(name = "List deployments", skip(pool, scope))]
pub async fn list(
    pool: &PgPool,
    scope: &TenantScope,
    status: Option<DeploymentStatus>,
    page: PageRequest,
) -> Result<(Vec<Deployment>, i64), sqlx::Error> {
    let mut count = scoped(scope, "COUNT(*)");
    if let Some(status) = status {
        count.and_eq("x.status", status.as_str());
    }
    let total = count
        .builder()
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to count deployments: {:?}", err);
            err
        })?;

    let mut query = scoped(scope, SCOPED_COLUMNS);
    if let Some(status) = status {
        query.and_eq("x.status", status.as_str());
    }
    query.paginate("x.initiated_at DESC, x.id DESC", page.limit, page.offset());

    let items = query
        .builder()
        .build_query_as::<Deployment>()
        .fetch_all(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to list deployments: {:?}", err);
            err
        })?;

    Ok((items, total))
}
