use crate::forms;
use crate::helpers::JsonResponse;
use crate::models::TenantScope;
use crate::services::{AuditLogger, ConfigStore};
use actix_web::{get, web, Responder, Result};
use std::sync::Arc;

/// Audit trail of one configuration. The configuration must be visible to
/// the caller, otherwise this is a plain not-found.
#[tracing::instrument(name = "Configuration audit trail", skip(scope, store, audit))]
#[get("/{config_id}")]
pub async fn audit_handler(
    path: web::Path<(i32,)>,
    query: web::Query<forms::PageQuery>,
    scope: web::ReqData<Arc<TenantScope>>,
    store: web::Data<ConfigStore>,
    audit: web::Data<AuditLogger>,
) -> Result<impl Responder> {
    forms::check(&*query, "query")?;
    let config_id = path.into_inner().0;
    store.get(&scope, config_id).await?;

    let page = audit
        .history(&scope, config_id, query.page_request())
        .await?;

    Ok(JsonResponse::build().set_page(page).ok("OK"))
}
