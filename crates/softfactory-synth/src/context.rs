//! Per-environment synthesis context.

use softfactory_config::FactoryConfig;
use softfactory_core::{NameKind, NamingPolicy};

/// Configuration and naming shared by every builder for one environment.
pub struct SynthContext<'a> {
    pub config: &'a FactoryConfig,
    naming: NamingPolicy,
}

impl<'a> SynthContext<'a> {
    pub fn new(config: &'a FactoryConfig) -> Self {
        Self {
            config,
            naming: NamingPolicy::new(config.target()),
        }
    }

    pub fn name(&self, kind: &NameKind) -> String {
        self.naming.name(kind)
    }

    pub fn environment(&self) -> &str {
        &self.config.environment_name
    }

    pub fn region(&self) -> &str {
        &self.config.region
    }

    /// Field path of a config section, for error messages.
    pub fn field(&self, section: &str) -> String {
        format!("{}.{}", self.config.path(), section)
    }
}
