use crate::errors::ServiceError;
use crate::forms;
use crate::helpers::JsonResponse;
use crate::models::{AuditContext, TenantScope, User};
use crate::services::DeploymentTracker;
use actix_web::{get, post, web, HttpRequest, Responder, Result};
use std::sync::Arc;

#[tracing::instrument(name = "List deployments", skip(scope, tracker))]
#[get("")]
pub async fn list_handler(
    scope: web::ReqData<Arc<TenantScope>>,
    query: web::Query<forms::DeploymentListQuery>,
    tracker: web::Data<DeploymentTracker>,
) -> Result<impl Responder> {
    forms::check(&*query, "query")?;
    let status = query.status().map_err(ServiceError::from)?;

    let page = tracker.list(&scope, status, query.page_request()).await?;

    Ok(JsonResponse::build().set_page(page).ok("OK"))
}

#[tracing::instrument(name = "Deploy configuration", skip(req, user, scope, body, tracker))]
#[post("/{device_id}/deploy")]
pub async fn deploy_handler(
    req: HttpRequest,
    path: web::Path<(String,)>,
    user: web::ReqData<Arc<User>>,
    scope: web::ReqData<Arc<TenantScope>>,
    body: web::Bytes,
    tracker: web::Data<DeploymentTracker>,
) -> Result<impl Responder> {
    let form = forms::DeployConfig::from_body(&body).map_err(ServiceError::from)?;
    forms::check(&form, "body")?;
    let device_id = path.into_inner().0;
    let ctx = AuditContext::from_request(user.id.clone(), &req);

    let deployment = tracker
        .initiate(&scope, &device_id, form.config_id, &ctx)
        .await?;

    Ok(JsonResponse::build()
        .set_id(deployment.id)
        .set_item(deployment)
        .created("Deployment initiated"))
}

#[tracing::instrument(name = "Retry deployment", skip(req, user, scope, tracker))]
#[post("/{deployment_id}/retry")]
pub async fn retry_handler(
    req: HttpRequest,
    path: web::Path<(i32,)>,
    user: web::ReqData<Arc<User>>,
    scope: web::ReqData<Arc<TenantScope>>,
    tracker: web::Data<DeploymentTracker>,
) -> Result<impl Responder> {
    let deployment_id = path.into_inner().0;
    let ctx = AuditContext::from_request(user.id.clone(), &req);

    let deployment = tracker.retry(&scope, deployment_id, &ctx).await?;

    Ok(JsonResponse::build()
        .set_id(deployment.id)
        .set_item(deployment)
        .created("Deployment retried"))
}

#[tracing::instrument(name = "Override deployment status", skip(req, user, scope, form, tracker))]
#[post("/{deployment_id}/status")]
pub async fn override_handler(
    req: HttpRequest,
    path: web::Path<(i32,)>,
    user: web::ReqData<Arc<User>>,
    scope: web::ReqData<Arc<TenantScope>>,
    form: web::Json<forms::StatusOverride>,
    tracker: web::Data<DeploymentTracker>,
) -> Result<impl Responder> {
    forms::check(&*form, "body")?;
    let status = form.status().map_err(ServiceError::from)?;
    let deployment_id = path.into_inner().0;
    let ctx = AuditContext::from_request(user.id.clone(), &req);
    let form = form.into_inner();

    let change = tracker
        .override_status(&scope, deployment_id, status, form.error, &ctx)
        .await?;
    let message = if change.is_applied() {
        "Deployment status updated"
    } else {
        "Deployment status unchanged"
    };
    let deployment = change.deployment().clone();

    Ok(JsonResponse::build()
        .set_id(deployment.id)
        .set_item(deployment)
        .ok(message))
}
