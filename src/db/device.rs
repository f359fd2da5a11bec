use crate::db::scope::ScopedQuery;
use crate::models::{Device, TenantScope};
use sqlx::{PgConnection, PgExecutor};
use tracing::Instrument;

const DEVICE_COLUMNS: &str = "d.id, d.tenant_id, d.name, d.device_type, d.created_at";

#[tracing::instrument(name = "Fetch device in scope", skip(executor, scope))]
pub async fn fetch<'e, E>(
    executor: E,
    scope: &TenantScope,
    device_id: &str,
) -> Result<Option<Device>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let mut query = ScopedQuery::devices(scope, DEVICE_COLUMNS);
    query.and_eq("d.id", device_id.to_string());

    query
        .builder()
        .build_query_as::<Device>()
        .fetch_optional(executor)
        .await
        .map_err(|err| {
            tracing::error!("Failed to fetch device {}: {:?}", device_id, err);
            err
        })
}

/// Locks the device row for the rest of the transaction. Version assignment
/// and activation for one device serialize on this lock.
pub async fn lock(
    conn: &mut PgConnection,
    scope: &TenantScope,
    device_id: &str,
) -> Result<Option<Device>, sqlx::Error> {
    let query_span = tracing::info_span!("Locking device row", device_id = %device_id);
    let mut query = ScopedQuery::devices(scope, DEVICE_COLUMNS);
    query.and_eq("d.id", device_id.to_string()).push(" FOR UPDATE");

    query
        .builder()
        .build_query_as::<Device>()
        .fetch_optional(conn)
        .instrument(query_span)
        .await
        .map_err(|err| {
            tracing::error!("Failed to lock device {}: {:?}", device_id, err);
            err
        })
}
