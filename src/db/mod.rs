pub mod audit;
pub mod configuration;
pub mod deployment;
pub mod device;
pub mod scope;
pub mod tenant;
