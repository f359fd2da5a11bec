pub mod admin;
pub mod device;
pub mod health_checks;

pub use health_checks::*;
