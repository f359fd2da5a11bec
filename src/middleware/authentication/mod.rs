mod bearer;
mod bearer_middleware;
mod getheader;
mod method;

pub use bearer::*;
pub use bearer_middleware::*;
pub use getheader::*;
pub use method::*;
