use crate::errors::ServiceError;
use crate::forms;
use crate::helpers::JsonResponse;
use crate::models::{AuditContext, ConfigOrder, ConfigurationView, TenantScope, User};
use crate::services::{ActivationManager, ConfigStore};
use actix_web::{get, post, web, HttpRequest, Responder, Result};
use std::sync::Arc;

#[tracing::instrument(name = "List configurations", skip(scope, store))]
#[get("")]
pub async fn list_handler(
    scope: web::ReqData<Arc<TenantScope>>,
    query: web::Query<forms::ConfigListQuery>,
    store: web::Data<ConfigStore>,
) -> Result<impl Responder> {
    forms::check(&*query, "query")?;
    let filter = query.filter().map_err(ServiceError::from)?;

    let page = store
        .list(&scope, &filter, ConfigOrder::CreatedDesc, query.page_request())
        .await?;

    Ok(JsonResponse::build()
        .set_page(page.map(ConfigurationView::from))
        .ok("OK"))
}

#[tracing::instrument(name = "Get active configuration", skip(scope, store))]
#[get("/{device_id}")]
pub async fn active_handler(
    path: web::Path<(String,)>,
    scope: web::ReqData<Arc<TenantScope>>,
    store: web::Data<ConfigStore>,
) -> Result<impl Responder> {
    let device_id = path.into_inner().0;
    let config = store.get_active(&scope, &device_id).await?;

    Ok(JsonResponse::build()
        .set_id(config.id)
        .set_item(ConfigurationView::from(config))
        .ok("OK"))
}

#[tracing::instrument(name = "Create configuration", skip(req, user, scope, form, store))]
#[post("/{device_id}")]
pub async fn create_handler(
    req: HttpRequest,
    path: web::Path<(String,)>,
    user: web::ReqData<Arc<User>>,
    scope: web::ReqData<Arc<TenantScope>>,
    form: web::Json<forms::CreateConfig>,
    store: web::Data<ConfigStore>,
) -> Result<impl Responder> {
    forms::check(&*form, "body")?;
    let device_id = path.into_inner().0;
    let ctx = AuditContext::from_request(user.id.clone(), &req);

    let config = store
        .create(&scope, &device_id, form.into_inner(), &ctx)
        .await?;

    Ok(JsonResponse::build()
        .set_id(config.id)
        .set_item(ConfigurationView::from(config))
        .created("Configuration created"))
}

#[tracing::instrument(name = "Activate configuration", skip(req, user, scope, form, activation))]
#[post("/{device_id}/activate")]
pub async fn activate_handler(
    req: HttpRequest,
    path: web::Path<(String,)>,
    user: web::ReqData<Arc<User>>,
    scope: web::ReqData<Arc<TenantScope>>,
    form: web::Json<forms::ActivateConfig>,
    activation: web::Data<ActivationManager>,
) -> Result<impl Responder> {
    forms::check(&*form, "body")?;
    let device_id = path.into_inner().0;
    let ctx = AuditContext::from_request(user.id.clone(), &req);
    let form = form.into_inner();

    let activated = activation
        .activate(&scope, &device_id, form.config_id, form.change_reason, &ctx)
        .await?;

    Ok(JsonResponse::build()
        .set_id(activated.configuration.id)
        .set_item(ConfigurationView::from(activated.configuration))
        .ok("Configuration activated"))
}

#[tracing::instrument(name = "Configuration history", skip(scope, store))]
#[get("/{device_id}/history")]
pub async fn history_handler(
    path: web::Path<(String,)>,
    query: web::Query<forms::PageQuery>,
    scope: web::ReqData<Arc<TenantScope>>,
    store: web::Data<ConfigStore>,
) -> Result<impl Responder> {
    forms::check(&*query, "query")?;
    let device_id = path.into_inner().0;

    let page = store
        .history(&scope, &device_id, query.page_request())
        .await?;

    Ok(JsonResponse::build()
        .set_page(page.map(ConfigurationView::from))
        .ok("OK"))
}
