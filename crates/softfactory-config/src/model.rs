//! Configuration model.

use serde::{Deserialize, Serialize};
use softfactory_core::DeploymentTarget;

/// Default private network address range.
pub const DEFAULT_ADDRESS_RANGE: &str = "10.1.0.0/16";

/// Default commands run by the delivery pipeline's synth step.
pub const DEFAULT_SYNTH_COMMAND: &str = "softfactory synth softfactory.kdl --out graph.json";

/// A project and every environment it is deployed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentDocument {
    pub project: String,
    /// Target environments, in deployment order.
    pub environments: Vec<FactoryConfig>,
    #[serde(default)]
    pub delivery: DeliveryConfig,
}

impl DeploymentDocument {
    pub fn environment(&self, label: &str) -> Option<&FactoryConfig> {
        self.environments
            .iter()
            .find(|e| e.environment_name == label)
    }

    /// Label of the environment hosting the delivery pipeline.
    pub fn delivery_environment(&self) -> Option<&FactoryConfig> {
        match &self.delivery.environment {
            Some(label) => self.environment(label),
            None => self.environments.first(),
        }
    }
}

/// Settings of the pipeline that redeploys all environments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Environment whose account hosts the pipeline. Defaults to the first one.
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default = "default_synth_commands")]
    pub synth: Vec<String>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            environment: None,
            synth: default_synth_commands(),
        }
    }
}

fn default_synth_commands() -> Vec<String> {
    vec![DEFAULT_SYNTH_COMMAND.to_string()]
}

/// Everything needed to compile the resource graph of one environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactoryConfig {
    /// Filled from the enclosing document when loaded from one.
    #[serde(default)]
    pub project_name: String,
    pub environment_name: String,
    pub account: String,
    pub region: String,
    #[serde(default)]
    pub retention: StorageRetention,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub workers: Option<WorkersConfig>,
    #[serde(default)]
    pub workbench: Option<WorkbenchConfig>,
    /// Build stages, in execution order.
    #[serde(default)]
    pub stages: Vec<StageConfig>,
}

impl FactoryConfig {
    pub fn new(
        project_name: impl Into<String>,
        environment_name: impl Into<String>,
        account: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            environment_name: environment_name.into(),
            account: account.into(),
            region: region.into(),
            retention: StorageRetention::default(),
            network: NetworkConfig::default(),
            workers: None,
            workbench: None,
            stages: Vec::new(),
        }
    }

    pub fn target(&self) -> DeploymentTarget {
        DeploymentTarget::new(
            &self.project_name,
            &self.environment_name,
            &self.account,
            &self.region,
        )
    }

    /// Prefix for field paths in errors about this environment.
    pub fn path(&self) -> String {
        format!("environments.{}", self.environment_name)
    }
}

/// "Retain on teardown" flag per object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageRetention {
    pub artifacts: bool,
    pub sourcecode: bool,
    pub cloudtrail: bool,
}

impl Default for StorageRetention {
    fn default() -> Self {
        Self {
            artifacts: true,
            sourcecode: true,
            cloudtrail: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// IPv4 CIDR block of the private network.
    pub address_range: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            address_range: DEFAULT_ADDRESS_RANGE.to_string(),
        }
    }
}

/// Message broker and worker fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    pub broker_instance_type: String,
    pub broker_engine: String,
    pub instance_type: String,
    pub desired_capacity: u32,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            broker_instance_type: "mq.t3.micro".to_string(),
            broker_engine: "rabbitmq".to_string(),
            instance_type: "t3.small".to_string(),
            desired_capacity: 1,
        }
    }
}

/// Interactive workbench. Requires a worker fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbenchConfig {
    pub instance_type: String,
    pub volume_size_gb: u32,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            instance_type: "ml.t3.medium".to_string(),
            volume_size_gb: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    pub name: String,
    pub actions: Vec<ActionConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionConfig {
    pub name: String,
    /// Build instructions file, relative to the `.cb/` directory of the source.
    pub build_instructions: String,
    #[serde(default)]
    pub image_repository: Option<String>,
    #[serde(default)]
    pub image_tag: Option<String>,
}

impl ActionConfig {
    pub fn new(name: impl Into<String>, build_instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            build_instructions: build_instructions.into(),
            image_repository: None,
            image_tag: None,
        }
    }

    /// Repository and tag, when both are configured.
    pub fn custom_image(&self) -> Option<(&str, &str)> {
        match (&self.image_repository, &self.image_tag) {
            (Some(repository), Some(tag)) => Some((repository, tag)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FactoryConfig::new("acme", "test", "123456789012", "us-east-1");
        assert!(config.retention.artifacts);
        assert!(config.retention.sourcecode);
        assert!(config.retention.cloudtrail);
        assert_eq!(config.network.address_range, "10.1.0.0/16");
        assert!(config.workers.is_none());
        assert!(config.workbench.is_none());
    }

    #[test]
    fn test_custom_image_requires_both_parts() {
        let mut action = ActionConfig::new("compile", "compile.yml");
        assert!(action.custom_image().is_none());

        action.image_repository = Some("repo".to_string());
        assert!(action.custom_image().is_none());

        action.image_tag = Some("1.0".to_string());
        assert_eq!(action.custom_image(), Some(("repo", "1.0")));
    }

    #[test]
    fn test_delivery_defaults_to_first_environment() {
        let doc = DeploymentDocument {
            project: "acme".to_string(),
            environments: vec![
                FactoryConfig::new("acme", "test", "123456789012", "us-east-1"),
                FactoryConfig::new("acme", "prod", "210987654321", "eu-west-1"),
            ],
            delivery: DeliveryConfig::default(),
        };
        assert_eq!(
            doc.delivery_environment().map(|e| e.environment_name.as_str()),
            Some("test")
        );
        assert_eq!(doc.delivery.synth, vec![DEFAULT_SYNTH_COMMAND.to_string()]);
    }
}
