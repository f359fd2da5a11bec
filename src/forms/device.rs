use crate::errors::ValidationError;
use crate::models::DeploymentStatus;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;

lazy_static! {
    static ref DEVICE_ID: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.:\-]{0,127}$").unwrap();
}

/// Device identifiers are opaque but must look like one before they reach
/// the database.
pub fn is_valid_device_id(device_id: &str) -> bool {
    DEVICE_ID.is_match(device_id)
}

/// Deployment outcome posted by a device.
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    #[validate(minimum = 1)]
    pub config_id: i32,
    pub status: String,
    #[validate(max_length = 4000)]
    pub error: Option<String>,
    pub deployment_id: Option<i32>,
}

/// Admin correction of a deployment's status.
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StatusOverride {
    pub status: String,
    #[validate(max_length = 4000)]
    pub error: Option<String>,
}

/// Devices and admins may only move a deployment forward; `pending` is the
/// initial state and is never reported.
pub fn reported_status(raw: &str) -> Result<DeploymentStatus, ValidationError> {
    match raw.parse::<DeploymentStatus>() {
        Ok(DeploymentStatus::Pending) | Err(_) => Err(ValidationError::field(
            "status",
            "expected one of in_progress, success, failed",
        )),
        Ok(status) => Ok(status),
    }
}

impl StatusReport {
    pub fn status(&self) -> Result<DeploymentStatus, ValidationError> {
        reported_status(&self.status)
    }
}

impl StatusOverride {
    pub fn status(&self) -> Result<DeploymentStatus, ValidationError> {
        reported_status(&self.status)
    }
}
