//! Endpoints polled by devices. Bodies stay minimal and never carry
//! internal error detail.

mod config;
mod status;
mod version;

pub use config::*;
pub use status::*;
pub use version::*;

use actix_web::{error, web, HttpResponse};
use serde_json::json;

/// Malformed status bodies get the same terse answer as any other invalid
/// report.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::debug!("Rejected device payload: {}", err);
        error::InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(json!({"success": false, "error": "invalid"})),
        )
        .into()
    })
}
