mod activation;
mod audit_logger;
mod config_store;
mod deployment_tracker;
mod hasher;
mod polling;
mod validator;

pub use activation::{Activation, ActivationManager};
pub use audit_logger::AuditLogger;
pub use config_store::ConfigStore;
pub use deployment_tracker::{DeploymentTracker, StatusChange};
pub use hasher::{protocol_prefix, ContentHash, VersionHasher, PROTOCOL_PREFIX_LEN};
pub use polling::{ConfigDocument, DevicePollingService, VersionCheck};
pub use validator::{ConfigValidator, ParsedPayload, DEFAULT_DEVICE_TYPES};
