mod cache;
pub(crate) mod json;

pub use cache::TtlCache;
pub use json::*;
