use chrono::{DateTime, Utc};
use serde::Serialize;

/// A provisioned device. Only the fields the configuration lifecycle
/// needs; the registry itself lives elsewhere.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Device {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub device_type: Option<String>,
    pub created_at: DateTime<Utc>,
}
