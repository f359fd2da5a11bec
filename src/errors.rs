use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;

/// Reasons a configuration payload is rejected before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("unsupported device type: {0}")]
    UnsupportedDeviceType(String),
    #[error("{field}: {reason}")]
    InvalidField { field: String, reason: String },
}

impl ValidationError {
    pub fn field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by the configuration services and the admin API.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Unknown entity or entity outside the caller's tenant. The two are
    /// deliberately indistinguishable.
    #[error("{0} not found or access denied")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Precondition(String),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Precondition(_) => "precondition",
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::Unauthorized(_) => "unauthorized",
            Self::Internal(_) => "internal",
        }
    }

    pub fn device_not_found() -> Self {
        Self::NotFound("device")
    }

    pub fn config_not_found() -> Self {
        Self::NotFound("configuration")
    }

    pub fn deployment_not_found() -> Self {
        Self::NotFound("deployment")
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) | Self::Precondition(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // storage and internal details stay in the logs
        let message = match self {
            Self::StorageUnavailable(_) => "Storage unavailable".to_string(),
            Self::Internal(_) => "Internal error".to_string(),
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "message": message,
            "kind": self.kind(),
        }))
    }
}

const UNDEFINED_TABLE: &str = "42P01";
const INVALID_CATALOG_NAME: &str = "3D000";

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("record"),
            sqlx::Error::Database(ref db_err)
                if matches!(
                    db_err.code().as_deref(),
                    Some(UNDEFINED_TABLE) | Some(INVALID_CATALOG_NAME)
                ) =>
            {
                Self::StorageUnavailable(db_err.message().to_string())
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Migrate(_) => Self::StorageUnavailable(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}
