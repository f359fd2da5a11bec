/// The set of devices a caller may see or modify, as supplied by access
/// control. Every admin-side query is built from one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantScope {
    /// Administrators see every tenant.
    All,
    Tenants(Vec<String>),
}

impl TenantScope {
    pub fn is_admin(&self) -> bool {
        matches!(self, TenantScope::All)
    }

    pub fn allows(&self, tenant_id: &str) -> bool {
        match self {
            TenantScope::All => true,
            TenantScope::Tenants(ids) => ids.iter().any(|id| id == tenant_id),
        }
    }
}
