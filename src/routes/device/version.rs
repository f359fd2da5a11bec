use crate::services::DevicePollingService;
use actix_web::{get, http::header::ContentType, web, HttpResponse};

#[tracing::instrument(name = "Device version check", skip(polling))]
#[get("/version/{device_id}")]
pub async fn version_handler(
    path: web::Path<(String,)>,
    polling: web::Data<DevicePollingService>,
) -> HttpResponse {
    let device_id = path.into_inner().0;
    match polling.version_check(&device_id).await {
        Ok(check) => HttpResponse::Ok()
            .content_type(ContentType::plaintext())
            .body(check.to_string()),
        Err(err) => {
            tracing::error!("Version check failed for {}: {:?}", device_id, err);
            HttpResponse::ServiceUnavailable()
                .content_type(ContentType::plaintext())
                .body("error")
        }
    }
}
