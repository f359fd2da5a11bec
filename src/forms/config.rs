use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_valid::Validate;

fn default_schema_version() -> i32 {
    1
}

/// Body of `POST /admin/devices/{deviceId}/configs`.
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateConfig {
    #[validate(min_length = 1)]
    #[validate(max_length = 255)]
    pub name: String,
    /// Object, array, or a JSON string holding either.
    pub data: Value,
    #[validate(max_length = 2000)]
    pub notes: Option<String>,
    #[serde(default = "default_schema_version")]
    #[validate(minimum = 1)]
    pub schema_version: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ActivateConfig {
    #[validate(minimum = 1)]
    pub config_id: i32,
    #[validate(max_length = 1000)]
    pub change_reason: Option<String>,
}

/// Body of `POST /admin/devices/{deviceId}/deploy`. Without a config id the
/// active configuration is deployed.
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeployConfig {
    #[validate(minimum = 1)]
    pub config_id: Option<i32>,
}

impl DeployConfig {
    /// An empty body means "deploy the active configuration". Anything else
    /// must parse.
    pub fn from_body(body: &[u8]) -> Result<Self, ValidationError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|err| ValidationError::field("body", err.to_string()))
    }
}
