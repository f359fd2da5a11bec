use crate::db;
use crate::errors::ServiceError;
use crate::models::{
    AuditAction, AuditContext, AuditEntry, Deployment, DeploymentMethod, DeploymentStatus,
    NewDeployment, Page, PageRequest, TenantScope,
};
use crate::services::AuditLogger;
use sqlx::{PgConnection, PgPool};

/// Result of applying a status to a deployment.
#[derive(Debug, Clone)]
pub enum StatusChange {
    Applied(Deployment),
    /// The deployment was terminal or already in that state. Nothing was
    /// written.
    Ignored(Deployment),
}

impl StatusChange {
    pub fn deployment(&self) -> &Deployment {
        match self {
            StatusChange::Applied(d) | StatusChange::Ignored(d) => d,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, StatusChange::Applied(_))
    }
}

/// Which deployment a status update targets.
#[derive(Debug, Clone, Copy)]
enum Target<'a> {
    /// Device report: explicit deployment id, or the latest one for the pair.
    Report {
        device_id: &'a str,
        config_id: i32,
        deployment_id: Option<i32>,
    },
    Id(i32),
}

/// Owner of deployment rows and their status lifecycle.
#[derive(Clone)]
pub struct DeploymentTracker {
    pool: PgPool,
    audit: AuditLogger,
}

impl DeploymentTracker {
    pub fn new(pool: PgPool, audit: AuditLogger) -> Self {
        Self { pool, audit }
    }

    /// Starts a manual deployment of `config_id`, or of the active
    /// configuration when no id is given.
    #[tracing::instrument(name = "Initiate deployment", skip(self, scope, ctx))]
    pub async fn initiate(
        &self,
        scope: &TenantScope,
        device_id: &str,
        config_id: Option<i32>,
        ctx: &AuditContext,
    ) -> Result<Deployment, ServiceError> {
        let mut tx = self.pool.begin().await?;
        db::device::lock(&mut *tx, scope, device_id)
            .await?
            .ok_or_else(ServiceError::device_not_found)?;

        let config = match config_id {
            Some(id) => db::configuration::fetch_for_update(&mut *tx, scope, device_id, id)
                .await?
                .ok_or_else(ServiceError::config_not_found)?,
            None => db::configuration::fetch_active(&mut *tx, scope, device_id)
                .await?
                .ok_or_else(|| {
                    ServiceError::Precondition("device has no active configuration".to_string())
                })?,
        };

        let deployment = self
            .open(
                &mut *tx,
                NewDeployment::new(
                    config.id,
                    device_id.to_string(),
                    DeploymentMethod::Manual,
                    ctx.actor.clone(),
                ),
            )
            .await?;
        tx.commit().await?;

        tracing::info!(
            deployment_id = deployment.id,
            config_id = config.id,
            "Deployment initiated for device {}",
            device_id
        );
        self.audit
            .record(
                AuditEntry::new(config.id, AuditAction::Deploy, ctx)
                    .with_new(Some(deployment.snapshot())),
            )
            .await;

        Ok(deployment)
    }

    /// Inserts a pending deployment inside the caller's transaction and
    /// mirrors `pending` onto its configuration.
    pub(crate) async fn open(
        &self,
        conn: &mut PgConnection,
        new_deployment: NewDeployment,
    ) -> Result<Deployment, ServiceError> {
        let deployment = db::deployment::insert(&mut *conn, &new_deployment).await?;
        db::configuration::mirror_deployment_status(
            &mut *conn,
            deployment.config_id,
            deployment.id,
            DeploymentStatus::Pending,
        )
        .await?;
        Ok(deployment)
    }

    /// Status reported by a device about one of its own deployments.
    /// Devices are not tenant users, so the lookup is unscoped.
    pub async fn report_status(
        &self,
        device_id: &str,
        config_id: i32,
        deployment_id: Option<i32>,
        status: DeploymentStatus,
        error: Option<String>,
    ) -> Result<StatusChange, ServiceError> {
        let target = Target::Report {
            device_id,
            config_id,
            deployment_id,
        };
        self.apply(
            &TenantScope::All,
            target,
            status,
            error,
            &AuditContext::device(device_id),
        )
        .await
    }

    /// Admin correction. Follows the same transition rules as device reports.
    pub async fn override_status(
        &self,
        scope: &TenantScope,
        deployment_id: i32,
        status: DeploymentStatus,
        error: Option<String>,
        ctx: &AuditContext,
    ) -> Result<StatusChange, ServiceError> {
        self.apply(scope, Target::Id(deployment_id), status, error, ctx)
            .await
    }

    #[tracing::instrument(name = "Apply deployment status", skip(self, scope, error, ctx))]
    async fn apply(
        &self,
        scope: &TenantScope,
        target: Target<'_>,
        status: DeploymentStatus,
        error: Option<String>,
        ctx: &AuditContext,
    ) -> Result<StatusChange, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let current = match target {
            Target::Report {
                device_id,
                config_id,
                deployment_id,
            } => {
                db::deployment::fetch_for_report(&mut *tx, scope, device_id, config_id, deployment_id)
                    .await?
            }
            Target::Id(id) => db::deployment::fetch_for_update(&mut *tx, scope, id).await?,
        }
        .ok_or_else(ServiceError::deployment_not_found)?;

        if !current.status.accepts(status) {
            tracing::debug!(
                deployment_id = current.id,
                "Ignoring status {} for deployment in state {}",
                status,
                current.status
            );
            tx.rollback().await?;
            return Ok(StatusChange::Ignored(current));
        }

        let error = error.filter(|e| !e.trim().is_empty());
        let updated =
            db::deployment::update_status(&mut *tx, current.id, status, error.as_deref()).await?;
        db::configuration::mirror_deployment_status(&mut *tx, updated.config_id, updated.id, status)
            .await?;
        if status == DeploymentStatus::Success {
            db::configuration::mark_deployed(&mut *tx, updated.config_id).await?;
        }
        tx.commit().await?;

        tracing::info!(
            deployment_id = updated.id,
            "Deployment moved from {} to {}",
            current.status,
            updated.status
        );
        self.audit
            .record(
                AuditEntry::new(updated.config_id, AuditAction::StatusUpdate, ctx)
                    .with_previous(Some(current.snapshot()))
                    .with_new(Some(updated.snapshot())),
            )
            .await;

        Ok(StatusChange::Applied(updated))
    }

    /// Opens a fresh deployment for the same configuration as a failed one.
    #[tracing::instrument(name = "Retry deployment", skip(self, scope, ctx))]
    pub async fn retry(
        &self,
        scope: &TenantScope,
        deployment_id: i32,
        ctx: &AuditContext,
    ) -> Result<Deployment, ServiceError> {
        let mut tx = self.pool.begin().await?;
        let failed = db::deployment::fetch_for_update(&mut *tx, scope, deployment_id)
            .await?
            .ok_or_else(ServiceError::deployment_not_found)?;

        if failed.status != DeploymentStatus::Failed {
            return Err(ServiceError::Conflict(format!(
                "only failed deployments can be retried, this one is {}",
                failed.status
            )));
        }

        let retry = self
            .open(
                &mut *tx,
                NewDeployment::new(
                    failed.config_id,
                    failed.device_id.clone(),
                    DeploymentMethod::Retry,
                    ctx.actor.clone(),
                )
                .with_retry_count(failed.retry_count + 1),
            )
            .await?;
        tx.commit().await?;

        self.audit
            .record(
                AuditEntry::new(retry.config_id, AuditAction::Retry, ctx)
                    .with_previous(Some(failed.snapshot()))
                    .with_new(Some(retry.snapshot())),
            )
            .await;

        Ok(retry)
    }

    pub async fn list(
        &self,
        scope: &TenantScope,
        status: Option<DeploymentStatus>,
        page: PageRequest,
    ) -> Result<Page<Deployment>, ServiceError> {
        let (items, total) = db::deployment::list(&self.pool, scope, status, page).await?;
        Ok(Page::new(items, total, page))
    }
}
