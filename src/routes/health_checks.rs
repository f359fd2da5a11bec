use crate::health::HealthChecker;
use actix_web::{get, web, HttpResponse};
use std::sync::Arc;

#[get("")]
pub async fn health_check(checker: web::Data<Arc<HealthChecker>>) -> HttpResponse {
    let report = checker.check_all().await;
    if report.is_available() {
        HttpResponse::Ok().json(report)
    } else {
        HttpResponse::ServiceUnavailable().json(report)
    }
}
