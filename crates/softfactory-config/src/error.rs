//! Configuration errors.
//!
//! Every variant that stems from document content carries the path of the
//! offending field, e.g. `environments.test.stages[1].actions`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("KDL parse error: {0}")]
    Parse(#[from] kdl::KdlError),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("duplicate definition in {field}: {name}")]
    Duplicate { field: String, name: String },

    #[error("invalid reference in {field}: {message}")]
    InvalidReference { field: String, message: String },

    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Path of the offending field, when the error points at one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::MissingField(field)
            | ConfigError::InvalidValue { field, .. }
            | ConfigError::Duplicate { field, .. }
            | ConfigError::InvalidReference { field, .. } => Some(field),
            _ => None,
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
