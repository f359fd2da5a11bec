use crate::db::scope::ScopedQuery;
use crate::models::{AuditEntry, PageRequest, TenantScope};
use sqlx::PgPool;
use tracing::Instrument;

const SCOPED_COLUMNS: &str = "a.id, a.config_id, a.action, a.actor_user_id, a.previous_snapshot, \
    a.new_snapshot, a.ip_address, a.user_agent, a.change_reason, a.created_at";

fn scoped<'a>(scope: &TenantScope, columns: &str) -> ScopedQuery<'a> {
    ScopedQuery::joined(
        scope,
        columns,
        "config_audit_log a JOIN device_configurations c ON c.id = a.config_id",
        "c.device_id",
    )
}

pub async fn insert(pool: &PgPool, entry: &AuditEntry) -> Result<(), sqlx::Error> {
    let query_span = tracing::info_span!("Inserting audit entry", action = %entry.action);
    sqlx::query(
        r#"
        INSERT INTO config_audit_log (
            id, config_id, action, actor_user_id, previous_snapshot, new_snapshot,
            ip_address, user_agent, change_reason, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(entry.id)
    .bind(entry.config_id)
    .bind(entry.action.as_str())
    .bind(&entry.actor_user_id)
    .bind(&entry.previous_snapshot)
    .bind(&entry.new_snapshot)
    .bind(&entry.ip_address)
    .bind(&entry.user_agent)
    .bind(&entry.change_reason)
    .bind(entry.created_at)
    .execute(pool)
    .instrument(query_span)
    .await
    .map(|_| ())
}

#[tracing::instrument(name = "List audit entries", skip(pool, scope))]
pub async fn list_for_config(
    pool: &PgPool,
    scope: &TenantScope,
    config_id: i32,
    page: PageRequest,
) -> Result<(Vec<AuditEntry>, i64), sqlx::Error> {
    let mut count = scoped(scope, "COUNT(*)");
    count.and_eq("a.config_id", config_id);
    let total = count
        .builder()
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to count audit entries: {:?}", err);
            err
        })?;

    let mut query = scoped(scope, SCOPED_COLUMNS);
    query
        .and_eq("a.config_id", config_id)
        .paginate("a.created_at DESC, a.id DESC", page.limit, page.offset());

    let items = query
        .builder()
        .build_query_as::<AuditEntry>()
        .fetch_all(pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to list audit entries: {:?}", err);
            err
        })?;

    Ok((items, total))
}
