use crate::errors::ServiceError;
use crate::forms::is_valid_device_id;
use crate::models::{Configuration, DeploymentStatus, TenantScope};
use crate::services::{protocol_prefix, ConfigStore, DeploymentTracker, StatusChange};
use serde::Serialize;
use serde_json::Value;

/// Answer to a device's "has my configuration changed" poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionCheck {
    /// Short hash of the active configuration.
    Current(String),
    NoActive,
}

impl std::fmt::Display for VersionCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionCheck::Current(prefix) => f.write_str(prefix),
            VersionCheck::NoActive => f.write_str("none"),
        }
    }
}

/// Configuration document as a device downloads it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConfigDocument {
    pub id: i32,
    pub version: i32,
    pub hash: String,
    pub name: String,
    pub data: Value,
}

impl From<Configuration> for ConfigDocument {
    fn from(config: Configuration) -> Self {
        Self {
            id: config.id,
            version: config.version,
            hash: config.content_hash,
            name: config.name,
            data: config.payload,
        }
    }
}

/// Device-facing read path plus status reporting.
///
/// Devices authenticate by network placement, not as tenant users, so every
/// lookup here runs with an explicit unrestricted scope.
#[derive(Clone)]
pub struct DevicePollingService {
    store: ConfigStore,
    tracker: DeploymentTracker,
}

impl DevicePollingService {
    pub fn new(store: ConfigStore, tracker: DeploymentTracker) -> Self {
        Self { store, tracker }
    }

    pub async fn version_check(&self, device_id: &str) -> Result<VersionCheck, ServiceError> {
        if !is_valid_device_id(device_id) {
            return Ok(VersionCheck::NoActive);
        }

        let active = self.store.find_active(&TenantScope::All, device_id).await?;
        Ok(match active {
            Some(config) => VersionCheck::Current(protocol_prefix(&config.content_hash).to_string()),
            None => VersionCheck::NoActive,
        })
    }

    pub async fn fetch_config(&self, device_id: &str) -> Result<Option<ConfigDocument>, ServiceError> {
        if !is_valid_device_id(device_id) {
            return Ok(None);
        }

        let active = self.store.find_active(&TenantScope::All, device_id).await?;
        Ok(active.map(ConfigDocument::from))
    }

    pub async fn report_status(
        &self,
        device_id: &str,
        config_id: i32,
        deployment_id: Option<i32>,
        status: DeploymentStatus,
        error: Option<String>,
    ) -> Result<StatusChange, ServiceError> {
        if !is_valid_device_id(device_id) {
            return Err(ServiceError::deployment_not_found());
        }

        self.tracker
            .report_status(device_id, config_id, deployment_id, status, error)
            .await
    }
}
