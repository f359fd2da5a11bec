pub mod config;
pub mod device;
pub mod query;
pub mod user;

pub use config::*;
pub use device::*;
pub use query::*;

use crate::errors::{ServiceError, ValidationError};
use serde_valid::Validate;

/// Runs the form's declared rules, reporting the first failure under `what`.
pub fn check<T: Validate>(form: &T, what: &str) -> Result<(), ServiceError> {
    form.validate()
        .map_err(|errors| ValidationError::field(what, errors.to_string()).into())
}
