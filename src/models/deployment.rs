use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Outcome of pushing a configuration to its device.
///
/// `pending -> in_progress -> {success | failed}`; a device may also jump
/// straight from `pending` to a terminal state. Terminal states never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Pending,
    InProgress,
    Success,
    Failed,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::InProgress => "in_progress",
            DeploymentStatus::Success => "success",
            DeploymentStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentStatus::Success | DeploymentStatus::Failed)
    }

    /// Whether a deployment currently in `self` should move to `next`.
    /// Repeats and anything after a terminal state are no-ops.
    pub fn accepts(&self, next: DeploymentStatus) -> bool {
        if self.is_terminal() || *self == next {
            return false;
        }
        !matches!(
            (self, next),
            (DeploymentStatus::InProgress, DeploymentStatus::Pending)
        )
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(DeploymentStatus::Pending),
            "in_progress" => Ok(DeploymentStatus::InProgress),
            "success" => Ok(DeploymentStatus::Success),
            "failed" => Ok(DeploymentStatus::Failed),
            other => Err(format!("unknown deployment status '{}'", other)),
        }
    }
}

/// How a deployment record came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeploymentMethod {
    /// Explicit admin deploy request.
    Manual,
    /// Created alongside an activation.
    Activation,
    Retry,
}

impl DeploymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentMethod::Manual => "manual",
            DeploymentMethod::Activation => "activation",
            DeploymentMethod::Retry => "retry",
        }
    }
}

// One attempt to deliver a configuration to its device
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: i32,
    pub config_id: i32,
    pub device_id: String,
    pub status: DeploymentStatus,
    pub method: DeploymentMethod,
    pub initiated_by: String,
    pub initiated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub retry_count: i32,
}

impl Deployment {
    /// Audit snapshot of the row.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "deploymentId": self.id,
            "configId": self.config_id,
            "deviceId": self.device_id,
            "status": self.status,
            "method": self.method,
            "retryCount": self.retry_count,
            "error": self.error_message,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewDeployment {
    pub config_id: i32,
    pub device_id: String,
    pub method: DeploymentMethod,
    pub initiated_by: String,
    pub retry_count: i32,
}

impl NewDeployment {
    pub fn new(config_id: i32, device_id: String, method: DeploymentMethod, initiated_by: String) -> Self {
        Self {
            config_id,
            device_id,
            method,
            initiated_by,
            retry_count: 0,
        }
    }

    pub fn with_retry_count(mut self, retry_count: i32) -> Self {
        self.retry_count = retry_count;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_accepts_every_forward_move() {
        let pending = DeploymentStatus::Pending;
        assert!(pending.accepts(DeploymentStatus::InProgress));
        assert!(pending.accepts(DeploymentStatus::Success));
        assert!(pending.accepts(DeploymentStatus::Failed));
        assert!(!pending.accepts(DeploymentStatus::Pending));
    }

    #[test]
    fn in_progress_cannot_go_back_to_pending() {
        let running = DeploymentStatus::InProgress;
        assert!(!running.accepts(DeploymentStatus::Pending));
        assert!(!running.accepts(DeploymentStatus::InProgress));
        assert!(running.accepts(DeploymentStatus::Success));
        assert!(running.accepts(DeploymentStatus::Failed));
    }

    #[test]
    fn terminal_states_are_frozen() {
        for terminal in [DeploymentStatus::Success, DeploymentStatus::Failed] {
            assert!(terminal.is_terminal());
            for next in [
                DeploymentStatus::Pending,
                DeploymentStatus::InProgress,
                DeploymentStatus::Success,
                DeploymentStatus::Failed,
            ] {
                assert!(!terminal.accepts(next), "{} -> {}", terminal, next);
            }
        }
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!("in_progress".parse(), Ok(DeploymentStatus::InProgress));
        assert_eq!(" SUCCESS ".parse(), Ok(DeploymentStatus::Success));
        assert!("done".parse::<DeploymentStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&DeploymentStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }
}
