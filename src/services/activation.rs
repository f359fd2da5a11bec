use crate::db;
use crate::errors::ServiceError;
use crate::models::{
    AuditAction, AuditContext, AuditEntry, Configuration, Deployment, DeploymentMethod,
    DeploymentStatus, NewDeployment, TenantScope,
};
use crate::services::{AuditLogger, ConfigStore, DeploymentTracker};
use sqlx::PgPool;

/// What an activation changed.
#[derive(Debug, Clone)]
pub struct Activation {
    pub configuration: Configuration,
    pub previous: Option<Configuration>,
    /// Pending deployment opened for the newly active version.
    pub deployment: Deployment,
}

/// Switches which configuration version is active for a device.
#[derive(Clone)]
pub struct ActivationManager {
    pool: PgPool,
    store: ConfigStore,
    tracker: DeploymentTracker,
    audit: AuditLogger,
}

impl ActivationManager {
    pub fn new(
        pool: PgPool,
        store: ConfigStore,
        tracker: DeploymentTracker,
        audit: AuditLogger,
    ) -> Self {
        Self {
            pool,
            store,
            tracker,
            audit,
        }
    }

    /// Makes `config_id` the only active version of `device_id`.
    ///
    /// Retiring the old version, activating the new one and opening its
    /// deployment happen in one transaction under the device row lock, so
    /// no reader ever sees zero or two active versions.
    #[tracing::instrument(name = "Activate configuration", skip(self, scope, change_reason, ctx))]
    pub async fn activate(
        &self,
        scope: &TenantScope,
        device_id: &str,
        config_id: i32,
        change_reason: Option<String>,
        ctx: &AuditContext,
    ) -> Result<Activation, ServiceError> {
        let mut tx = self.pool.begin().await?;
        db::device::lock(&mut *tx, scope, device_id)
            .await?
            .ok_or_else(ServiceError::config_not_found)?;

        let target = self
            .store
            .lock_version(&mut *tx, scope, device_id, config_id)
            .await?;
        if target.is_active() {
            return Err(ServiceError::Conflict(
                "configuration is already active".to_string(),
            ));
        }

        let (previous, mut activated) = self
            .store
            .swap_active(&mut *tx, device_id, config_id, &ctx.actor)
            .await?;
        let deployment = self
            .tracker
            .open(
                &mut *tx,
                NewDeployment::new(
                    config_id,
                    device_id.to_string(),
                    DeploymentMethod::Activation,
                    ctx.actor.clone(),
                ),
            )
            .await?;
        tx.commit().await?;
        activated.deployment_status = Some(DeploymentStatus::Pending);

        tracing::info!(
            config_id,
            version = activated.version,
            previous = previous.as_ref().map(|p| p.version),
            "Configuration activated for device {}",
            device_id
        );

        let reason = change_reason.filter(|r| !r.trim().is_empty());
        self.audit
            .record(
                AuditEntry::new(config_id, AuditAction::Activate, ctx)
                    .with_previous(previous.as_ref().map(Configuration::snapshot))
                    .with_new(Some(activated.snapshot()))
                    .with_reason(reason),
            )
            .await;
        self.audit
            .record(
                AuditEntry::new(config_id, AuditAction::Deploy, ctx)
                    .with_new(Some(deployment.snapshot())),
            )
            .await;

        Ok(Activation {
            configuration: activated,
            previous,
            deployment,
        })
    }
}
