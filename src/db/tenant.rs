use sqlx::PgPool;
use tracing::Instrument;

/// Tenants a (non-admin) user is a member of.
pub async fn fetch_memberships(pool: &PgPool, user_id: &str) -> Result<Vec<String>, sqlx::Error> {
    let query_span = tracing::info_span!("Fetching tenant memberships", user_id = %user_id);
    sqlx::query_scalar::<_, String>(
        "SELECT tenant_id FROM tenant_members WHERE user_id = $1 ORDER BY tenant_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .instrument(query_span)
    .await
    .map_err(|err| {
        tracing::error!("Failed to fetch tenant memberships: {:?}", err);
        err
    })
}
