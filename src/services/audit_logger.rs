use crate::db;
use crate::errors::ServiceError;
use crate::models::{AuditEntry, Page, PageRequest, TenantScope};
use sqlx::PgPool;

/// Append-only trail of configuration state changes.
///
/// `record` is the non-critical boundary: it returns nothing and a failed
/// write is logged here, never handed back to the action being described.
#[derive(Clone)]
pub struct AuditLogger {
    pool: PgPool,
}

impl AuditLogger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, entry: AuditEntry) {
        if let Err(err) = db::audit::insert(&self.pool, &entry).await {
            tracing::warn!(
                config_id = entry.config_id,
                action = %entry.action,
                actor = %entry.actor_user_id,
                "Audit entry dropped: {:?}",
                err
            );
        }
    }

    /// Entries for one configuration, newest first. The caller is expected
    /// to have checked that the configuration itself is visible.
    pub async fn history(
        &self,
        scope: &TenantScope,
        config_id: i32,
        page: PageRequest,
    ) -> Result<Page<AuditEntry>, ServiceError> {
        let (items, total) = db::audit::list_for_config(&self.pool, scope, config_id, page).await?;
        Ok(Page::new(items, total, page))
    }
}
