//! Synthesis errors.

use softfactory_config::ConfigError;
use softfactory_core::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynthError {
    /// Malformed or incomplete configuration.
    #[error("validation error: {0}")]
    Validation(#[from] ConfigError),

    /// Valid configuration whose sections cannot be satisfied together.
    #[error("configuration error: {field} requires {requires}, which is not configured")]
    UnmetDependency { field: String, requires: String },

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("environment '{environment}': {source}")]
    Environment {
        environment: String,
        #[source]
        source: Box<SynthError>,
    },
}

impl SynthError {
    /// The error with any environment wrapping removed.
    pub fn root(&self) -> &SynthError {
        match self {
            SynthError::Environment { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type SynthResult<T> = std::result::Result<T, SynthError>;
