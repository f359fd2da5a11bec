use crate::configuration::Settings;
use crate::errors::ServiceError;
use crate::forms;
use crate::helpers::TtlCache;
use crate::middleware::access_control::TenantResolver;
use crate::middleware::authentication::get_header;
use crate::models;
use actix_web::{dev::ServiceRequest, web, HttpMessage};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::sync::Arc;

/// Identity-service answers keyed by bearer token.
pub type UserCache = TtlCache<models::User>;

fn try_extract_token(authorization: String) -> Result<String, ServiceError> {
    let mut parts = authorization.splitn(2, ' ');
    match parts.next() {
        Some("Bearer") => {}
        _ => return Err(ServiceError::Unauthorized("Bearer missing scheme".to_string())),
    }

    match parts.next().map(str::trim) {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => {
            tracing::error!("Bearer token is missing");
            Err(ServiceError::Unauthorized("Authentication required".to_string()))
        }
    }
}

fn app_data<T: ?Sized + 'static>(req: &ServiceRequest) -> Result<web::Data<T>, ServiceError> {
    req.app_data::<web::Data<T>>()
        .cloned()
        .ok_or_else(|| ServiceError::Internal("authentication is not configured".to_string()))
}

/// Resolves the caller behind the `Authorization` header and attaches the
/// user and their tenant scope to the request.
#[tracing::instrument(name = "Authenticate with bearer token", skip(req))]
pub async fn try_oauth(req: &mut ServiceRequest) -> Result<(), ServiceError> {
    let authorization = get_header::<String>(req, "authorization")
        .map_err(ServiceError::Unauthorized)?
        .ok_or_else(|| ServiceError::Unauthorized("Authentication required".to_string()))?;
    let token = try_extract_token(authorization)?;

    let settings = app_data::<Settings>(req)?;
    let http_client = app_data::<reqwest::Client>(req)?;
    let cache = app_data::<UserCache>(req)?;
    let resolver = app_data::<dyn TenantResolver>(req)?;

    let user = match cache.get(&token).await {
        Some(user) => user,
        None => {
            let user = fetch_user(http_client.get_ref(), settings.auth_url.as_str(), &token)
                .await
                .map_err(ServiceError::Unauthorized)?;
            cache.insert(token, user.clone()).await;
            user
        }
    };

    let scope = resolver.resolve(&user).await?;
    tracing::debug!(user_id = %user.id, admin = scope.is_admin(), "Caller authenticated");

    let mut extensions = req.extensions_mut();
    if extensions.insert(Arc::new(user)).is_some() {
        return Err(ServiceError::Internal("user already logged".to_string()));
    }
    extensions.insert(Arc::new(scope));

    Ok(())
}

pub async fn fetch_user(
    client: &reqwest::Client,
    auth_url: &str,
    token: &str,
) -> Result<models::User, String> {
    let resp = client
        .get(auth_url)
        .bearer_auth(token)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCEPT, "application/json")
        .send()
        .await
        .map_err(|err| {
            tracing::error!(target: "auth", error = %err, "OAuth request failed");
            "No response from OAuth server".to_string()
        })?;

    if !resp.status().is_success() {
        return Err("401 Unauthorized".to_string());
    }

    resp.json::<forms::user::UserForm>()
        .await
        .map_err(|_err| "can't parse the response body".to_string())?
        .try_into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(try_extract_token("Bearer abc".into()).unwrap(), "abc");
        assert!(try_extract_token("Basic abc".into()).is_err());
        assert!(try_extract_token("Bearer ".into()).is_err());
    }
}
