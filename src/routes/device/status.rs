use crate::errors::{ServiceError, ValidationError};
use crate::forms;
use crate::services::DevicePollingService;
use actix_web::{http::StatusCode, post, web, HttpResponse};
use serde_json::json;
use serde_valid::Validate;

fn rejected(status: StatusCode, error: &str) -> HttpResponse {
    HttpResponse::build(status).json(json!({"success": false, "error": error}))
}

#[tracing::instrument(name = "Device status report", skip(polling, form))]
#[post("/status/{device_id}")]
pub async fn status_handler(
    path: web::Path<(String,)>,
    form: web::Json<forms::StatusReport>,
    polling: web::Data<DevicePollingService>,
) -> HttpResponse {
    let device_id = path.into_inner().0;
    let report = form.into_inner();

    let status = match report.validate() {
        Ok(()) => report.status(),
        Err(errors) => Err(ValidationError::field("body", errors.to_string())),
    };
    let status = match status {
        Ok(status) => status,
        Err(err) => {
            tracing::debug!("Invalid status report from {}: {}", device_id, err);
            return rejected(StatusCode::BAD_REQUEST, "invalid");
        }
    };

    let result = polling
        .report_status(
            &device_id,
            report.config_id,
            report.deployment_id,
            status,
            report.error,
        )
        .await;

    match result {
        Ok(change) => {
            tracing::info!(
                deployment_id = change.deployment().id,
                applied = change.is_applied(),
                "Status report from {} handled",
                device_id
            );
            HttpResponse::Ok().json(json!({"success": true}))
        }
        Err(ServiceError::NotFound(_)) => {
            rejected(StatusCode::NOT_FOUND, "not_found")
        }
        Err(ServiceError::Validation(_)) => {
            rejected(StatusCode::BAD_REQUEST, "invalid")
        }
        Err(err) => {
            tracing::error!("Status report from {} failed: {:?}", device_id, err);
            rejected(StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}
