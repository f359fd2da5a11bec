pub mod audit;
pub mod configs;
pub mod deployments;
