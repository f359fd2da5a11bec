use crate::db;
use crate::errors::ServiceError;
use crate::forms::CreateConfig;
use crate::models::{
    AuditAction, AuditContext, AuditEntry, ConfigFilter, ConfigOrder, Configuration,
    NewConfiguration, Page, PageRequest, TenantScope,
};
use crate::services::{AuditLogger, ConfigValidator, VersionHasher};
use sqlx::{PgConnection, PgPool};

/// Owner of configuration rows. Other services change configurations only
/// through the transaction-bound methods here.
#[derive(Clone)]
pub struct ConfigStore {
    pool: PgPool,
    validator: ConfigValidator,
    audit: AuditLogger,
}

impl ConfigStore {
    pub fn new(pool: PgPool, validator: ConfigValidator, audit: AuditLogger) -> Self {
        Self {
            pool,
            validator,
            audit,
        }
    }

    /// Validates and stores a new draft version for a device.
    ///
    /// The version number is assigned while the device row is locked, so
    /// concurrent creates for one device get distinct, gap-free versions.
    #[tracing::instrument(name = "Create configuration", skip(self, scope, form, ctx))]
    pub async fn create(
        &self,
        scope: &TenantScope,
        device_id: &str,
        form: CreateConfig,
        ctx: &AuditContext,
    ) -> Result<Configuration, ServiceError> {
        let parsed = self.validator.validate(&form.data)?;
        let hash = VersionHasher::hash(&parsed.document);

        let mut tx = self.pool.begin().await?;
        db::device::lock(&mut *tx, scope, device_id)
            .await?
            .ok_or_else(ServiceError::device_not_found)?;

        let version = db::configuration::next_version(&mut *tx, device_id).await?;
        let new_config = NewConfiguration {
            device_id: device_id.to_string(),
            name: form.name.trim().to_string(),
            payload: parsed.document,
            content_hash: hash.into_inner(),
            schema_version: form.schema_version,
            notes: form.notes,
            created_by: ctx.actor.clone(),
        };
        let config = db::configuration::insert(&mut *tx, &new_config, version).await?;
        tx.commit().await?;

        tracing::info!(
            config_id = config.id,
            version = config.version,
            "Configuration stored for device {}",
            device_id
        );

        self.audit
            .record(
                AuditEntry::new(config.id, AuditAction::Create, ctx)
                    .with_new(Some(config.snapshot())),
            )
            .await;

        Ok(config)
    }

    pub async fn get(&self, scope: &TenantScope, config_id: i32) -> Result<Configuration, ServiceError> {
        db::configuration::fetch(&self.pool, scope, config_id)
            .await?
            .ok_or_else(ServiceError::config_not_found)
    }

    pub async fn get_active(
        &self,
        scope: &TenantScope,
        device_id: &str,
    ) -> Result<Configuration, ServiceError> {
        db::configuration::fetch_active(&self.pool, scope, device_id)
            .await?
            .ok_or_else(ServiceError::config_not_found)
    }

    /// Like [`get_active`](Self::get_active) but `None` when nothing is active.
    pub async fn find_active(
        &self,
        scope: &TenantScope,
        device_id: &str,
    ) -> Result<Option<Configuration>, ServiceError> {
        Ok(db::configuration::fetch_active(&self.pool, scope, device_id).await?)
    }

    pub async fn list(
        &self,
        scope: &TenantScope,
        filter: &ConfigFilter,
        order: ConfigOrder,
        page: PageRequest,
    ) -> Result<Page<Configuration>, ServiceError> {
        let (items, total) =
            db::configuration::list(&self.pool, scope, filter, order, page).await?;
        Ok(Page::new(items, total, page))
    }

    /// Every version of one device, newest first. Unknown devices and
    /// devices outside the scope are reported as not found.
    pub async fn history(
        &self,
        scope: &TenantScope,
        device_id: &str,
        page: PageRequest,
    ) -> Result<Page<Configuration>, ServiceError> {
        db::device::fetch(&self.pool, scope, device_id)
            .await?
            .ok_or_else(ServiceError::device_not_found)?;

        let filter = ConfigFilter {
            device_id: Some(device_id.to_string()),
            status: None,
        };
        self.list(scope, &filter, ConfigOrder::VersionDesc, page).await
    }

    /// Locks `config_id` of `device_id` inside the caller's transaction.
    pub(crate) async fn lock_version(
        &self,
        conn: &mut PgConnection,
        scope: &TenantScope,
        device_id: &str,
        config_id: i32,
    ) -> Result<Configuration, ServiceError> {
        db::configuration::fetch_for_update(conn, scope, device_id, config_id)
            .await?
            .ok_or_else(ServiceError::config_not_found)
    }

    /// Retires the device's active version, if any, and activates `config_id`.
    /// Returns `(previous, activated)`. The device row must already be locked.
    pub(crate) async fn swap_active(
        &self,
        conn: &mut PgConnection,
        device_id: &str,
        config_id: i32,
        actor: &str,
    ) -> Result<(Option<Configuration>, Configuration), ServiceError> {
        let previous = db::configuration::retire_active(&mut *conn, device_id).await?;
        let activated = db::configuration::activate(&mut *conn, config_id, actor).await?;
        Ok((previous, activated))
    }
}
