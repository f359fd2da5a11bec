//! Maps an authenticated user to the set of tenants they may act on.

use crate::db;
use crate::errors::ServiceError;
use crate::helpers::TtlCache;
use crate::models::{TenantScope, User};
use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;

/// Resolved scopes keyed by user id.
pub type PermissionCache = TtlCache<TenantScope>;

#[async_trait]
pub trait TenantResolver: Send + Sync {
    async fn resolve(&self, user: &User) -> Result<TenantScope, ServiceError>;

    /// Forgets cached scopes for one user, or for everyone.
    async fn invalidate(&self, _user_id: Option<&str>) {}
}

/// Admin roles see every tenant; everyone else sees the tenants listed
/// for them in `tenant_members`.
pub struct DbTenantResolver {
    pool: PgPool,
    admin_roles: Vec<String>,
    cache: PermissionCache,
}

impl DbTenantResolver {
    pub fn new(pool: PgPool, admin_roles: Vec<String>, ttl: Duration) -> Self {
        Self {
            pool,
            admin_roles: admin_roles
                .into_iter()
                .map(|role| role.trim().to_lowercase())
                .collect(),
            cache: PermissionCache::new(ttl),
        }
    }

    fn is_admin(&self, user: &User) -> bool {
        let role = user.role.trim().to_lowercase();
        self.admin_roles.iter().any(|admin| *admin == role)
    }
}

#[async_trait]
impl TenantResolver for DbTenantResolver {
    async fn resolve(&self, user: &User) -> Result<TenantScope, ServiceError> {
        if self.is_admin(user) {
            return Ok(TenantScope::All);
        }

        if let Some(scope) = self.cache.get(&user.id).await {
            return Ok(scope);
        }

        let tenants = db::tenant::fetch_memberships(&self.pool, &user.id).await?;
        tracing::debug!(user_id = %user.id, tenants = tenants.len(), "Tenant scope resolved");
        let scope = TenantScope::Tenants(tenants);
        self.cache.insert(user.id.clone(), scope.clone()).await;

        Ok(scope)
    }

    async fn invalidate(&self, user_id: Option<&str>) {
        self.cache.invalidate(user_id).await;
    }
}
