//! Configuration for the SoftFactory resource-graph compiler.
//!
//! This crate handles:
//! - The typed configuration model and its defaults
//! - Parsing deployment documents (softfactory.kdl, or JSON)
//! - Validation with field paths in every error

pub mod error;
pub mod load;
pub mod model;
pub mod parse;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use load::load_document;
pub use model::{
    ActionConfig, DeliveryConfig, DeploymentDocument, FactoryConfig, NetworkConfig, StageConfig,
    StorageRetention, WorkbenchConfig, WorkersConfig,
};
pub use parse::{parse_document, parse_json_document};
