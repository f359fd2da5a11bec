use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Activate,
    Deploy,
    StatusUpdate,
    Retry,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Activate => "ACTIVATE",
            AuditAction::Deploy => "DEPLOY",
            AuditAction::StatusUpdate => "STATUS_UPDATE",
            AuditAction::Retry => "RETRY",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one state-changing action on a configuration.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: Uuid,
    pub config_id: i32,
    pub action: AuditAction,
    pub actor_user_id: String,
    pub previous_snapshot: Option<Value>,
    pub new_snapshot: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub change_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(config_id: i32, action: AuditAction, actor: &AuditContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            config_id,
            action,
            actor_user_id: actor.actor.clone(),
            previous_snapshot: None,
            new_snapshot: None,
            ip_address: actor.ip_address.clone(),
            user_agent: actor.user_agent.clone(),
            change_reason: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_previous(mut self, snapshot: Option<Value>) -> Self {
        self.previous_snapshot = snapshot;
        self
    }

    pub fn with_new(mut self, snapshot: Option<Value>) -> Self {
        self.new_snapshot = snapshot;
        self
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.change_reason = reason;
        self
    }
}

/// Who triggered an action and from where.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditContext {
    pub actor: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditContext {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            ..Default::default()
        }
    }

    /// Context for actions a device performs on itself.
    pub fn device(device_id: &str) -> Self {
        Self::new(format!("device:{}", device_id))
    }

    pub fn from_request(actor: impl Into<String>, req: &actix_web::HttpRequest) -> Self {
        let ip_address = req
            .connection_info()
            .realip_remote_addr()
            .map(|addr| addr.to_string());
        let user_agent = req
            .headers()
            .get(actix_web::http::header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(String::from);

        Self {
            actor: actor.into(),
            ip_address,
            user_agent,
        }
    }
}
