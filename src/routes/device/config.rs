use crate::services::DevicePollingService;
use actix_web::{get, web, HttpResponse};
use serde_json::json;

#[tracing::instrument(name = "Device config fetch", skip(polling))]
#[get("/config/{device_id}")]
pub async fn config_handler(
    path: web::Path<(String,)>,
    polling: web::Data<DevicePollingService>,
) -> HttpResponse {
    let device_id = path.into_inner().0;
    match polling.fetch_config(&device_id).await {
        Ok(Some(document)) => HttpResponse::Ok().json(document),
        Ok(None) => HttpResponse::NotFound().json(json!({"error": "not_found"})),
        Err(err) => {
            tracing::error!("Config fetch failed for {}: {:?}", device_id, err);
            HttpResponse::ServiceUnavailable().json(json!({"error": "unavailable"}))
        }
    }
}
