use crate::errors::ValidationError;
use crate::models::{ConfigFilter, ConfigStatusFilter, DeploymentStatus, PageRequest};
use serde::Deserialize;
use serde_valid::Validate;

/// `?page&limit`
#[derive(Deserialize, Debug, Clone, Default, Validate)]
pub struct PageQuery {
    #[validate(minimum = 1)]
    #[validate(maximum = 1_000_000)]
    pub page: Option<i64>,
    #[validate(minimum = 1)]
    #[validate(maximum = 100)]
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.limit.unwrap_or(PageRequest::DEFAULT_LIMIT),
        )
    }
}

/// `GET /admin/configs?deviceId&status&page&limit`
#[derive(Deserialize, Debug, Clone, Default, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConfigListQuery {
    pub device_id: Option<String>,
    pub status: Option<String>,
    #[validate(minimum = 1)]
    #[validate(maximum = 1_000_000)]
    pub page: Option<i64>,
    #[validate(minimum = 1)]
    #[validate(maximum = 100)]
    pub limit: Option<i64>,
}

impl ConfigListQuery {
    pub fn filter(&self) -> Result<ConfigFilter, ValidationError> {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<ConfigStatusFilter>()
                    .map_err(|msg| ValidationError::field("status", msg))?,
            ),
        };
        Ok(ConfigFilter {
            device_id: self.device_id.clone().filter(|id| !id.trim().is_empty()),
            status,
        })
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.limit.unwrap_or(PageRequest::DEFAULT_LIMIT),
        )
    }
}

/// `GET /admin/deployments?status&page&limit`
#[derive(Deserialize, Debug, Clone, Default, Validate)]
pub struct DeploymentListQuery {
    pub status: Option<String>,
    #[validate(minimum = 1)]
    #[validate(maximum = 1_000_000)]
    pub page: Option<i64>,
    #[validate(minimum = 1)]
    #[validate(maximum = 100)]
    pub limit: Option<i64>,
}

impl DeploymentListQuery {
    pub fn status(&self) -> Result<Option<DeploymentStatus>, ValidationError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<DeploymentStatus>()
                .map(Some)
                .map_err(|msg| ValidationError::field("status", msg)),
        }
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(1),
            self.limit.unwrap_or(PageRequest::DEFAULT_LIMIT),
        )
    }
}
