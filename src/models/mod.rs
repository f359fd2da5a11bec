mod audit;
mod configuration;
mod deployment;
mod device;
mod page;
mod tenant;
pub mod user;

pub use audit::*;
pub use configuration::*;
pub use deployment::*;
pub use device::*;
pub use page::*;
pub use tenant::*;
pub use user::User;
