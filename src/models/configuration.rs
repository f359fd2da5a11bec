use crate::models::DeploymentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a configuration version sits in its device's activation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConfigLifecycle {
    /// Stored but never activated.
    Draft,
    Active,
    /// Was active once, superseded by another version.
    Retired,
}

impl ConfigLifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLifecycle::Draft => "draft",
            ConfigLifecycle::Active => "active",
            ConfigLifecycle::Retired => "retired",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ConfigLifecycle::Active)
    }
}

impl std::fmt::Display for ConfigLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable version of a device's settings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Configuration {
    pub id: i32,
    pub device_id: String,
    pub version: i32,
    pub name: String,
    pub payload: Value,
    pub content_hash: String,
    pub schema_version: i32,
    pub lifecycle: ConfigLifecycle,
    pub deployment_status: Option<DeploymentStatus>,
    pub deployed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub activated_by: Option<String>,
    pub activated_at: Option<DateTime<Utc>>,
}

impl Configuration {
    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    pub fn is_deployed(&self) -> bool {
        self.deployed_at.is_some()
    }

    /// Compact representation stored in audit snapshots.
    pub fn snapshot(&self) -> Value {
        serde_json::json!({
            "id": self.id,
            "version": self.version,
            "name": self.name,
            "hash": self.content_hash,
            "schemaVersion": self.schema_version,
            "lifecycle": self.lifecycle,
            "data": self.payload,
        })
    }
}

/// Wire shape of a configuration for the admin API. Lifecycle and
/// deployment state are flattened back into the boolean flags clients expect.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationView {
    pub id: i32,
    pub device_id: String,
    pub version: i32,
    pub name: String,
    pub data: Value,
    pub content_hash: String,
    pub schema_version: i32,
    pub active: bool,
    pub deployed: bool,
    pub deployment_status: Option<DeploymentStatus>,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: Option<DateTime<Utc>>,
    pub activated_by: Option<String>,
    pub activated_at: Option<DateTime<Utc>>,
}

impl From<Configuration> for ConfigurationView {
    fn from(c: Configuration) -> Self {
        Self {
            active: c.is_active(),
            deployed: c.is_deployed(),
            id: c.id,
            device_id: c.device_id,
            version: c.version,
            name: c.name,
            data: c.payload,
            content_hash: c.content_hash,
            schema_version: c.schema_version,
            deployment_status: c.deployment_status,
            notes: c.notes,
            created_by: c.created_by,
            created_at: Some(c.created_at),
            activated_by: c.activated_by,
            activated_at: c.activated_at,
        }
    }
}

/// Values needed to insert a new draft version. The version number is
/// assigned by the store under the device lock.
#[derive(Debug, Clone)]
pub struct NewConfiguration {
    pub device_id: String,
    pub name: String,
    pub payload: Value,
    pub content_hash: String,
    pub schema_version: i32,
    pub notes: Option<String>,
    pub created_by: String,
}

/// Status filter accepted by configuration listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStatusFilter {
    Active,
    /// Anything not currently active, drafts included.
    Inactive,
    Draft,
    Deployment(DeploymentStatus),
}

impl std::str::FromStr for ConfigStatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "draft" => Ok(Self::Draft),
            other => other
                .parse::<DeploymentStatus>()
                .map(Self::Deployment)
                .map_err(|_| format!("unknown status filter '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrder {
    /// Version history, newest version first.
    VersionDesc,
    CreatedDesc,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigFilter {
    pub device_id: Option<String>,
    pub status: Option<ConfigStatusFilter>,
}
