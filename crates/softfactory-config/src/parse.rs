//! Deployment document parsing from KDL.
//!
//! ```kdl
//! project "acme"
//!
//! delivery environment="test" {
//!     synth "softfactory synth softfactory.kdl --out graph.json"
//! }
//!
//! environment "test" account="123456789012" region="us-east-1" {
//!     retention artifacts=#false
//!     network "10.1.0.0/16"
//!     workers capacity=2
//!     workbench volume-size=10
//!     stage "build" {
//!         action "compile" buildspec="compile.yml"
//!     }
//! }
//! ```

use crate::model::{
    ActionConfig, DeliveryConfig, DeploymentDocument, FactoryConfig, NetworkConfig, StageConfig,
    StorageRetention, WorkbenchConfig, WorkersConfig,
};
use crate::{ConfigError, ConfigResult};
use kdl::{KdlDocument, KdlNode};

/// Parse and validate a deployment document from KDL text.
pub fn parse_document(kdl: &str) -> ConfigResult<DeploymentDocument> {
    let doc: KdlDocument = kdl.parse()?;

    let mut project = String::new();
    let mut environments = Vec::new();
    let mut delivery = DeliveryConfig::default();

    for node in doc.nodes() {
        match node.name().value() {
            "project" => {
                project = get_first_string_arg(node)
                    .ok_or_else(|| ConfigError::MissingField("project".to_string()))?;
            }
            "environment" => {
                let index = environments.len();
                environments.push(parse_environment(node, index)?);
            }
            "delivery" => {
                delivery = parse_delivery(node)?;
            }
            _ => {} // Ignore unknown nodes
        }
    }

    if project.is_empty() {
        return Err(ConfigError::MissingField("project".to_string()));
    }

    for env in &mut environments {
        env.project_name = project.clone();
    }

    let document = DeploymentDocument {
        project,
        environments,
        delivery,
    };
    document.validate()?;
    Ok(document)
}

/// Parse and validate a deployment document from JSON text.
pub fn parse_json_document(json: &str) -> ConfigResult<DeploymentDocument> {
    let mut document: DeploymentDocument = serde_json::from_str(json)?;
    for env in &mut document.environments {
        if env.project_name.is_empty() {
            env.project_name = document.project.clone();
        }
    }
    document.validate()?;
    Ok(document)
}

fn parse_environment(node: &KdlNode, index: usize) -> ConfigResult<FactoryConfig> {
    let label = get_first_string_arg(node)
        .ok_or_else(|| ConfigError::MissingField(format!("environments[{}].name", index)))?;
    let path = format!("environments.{}", label);

    let account = get_string_prop(node, "account", &format!("{}.account", path))?
        .ok_or_else(|| ConfigError::MissingField(format!("{}.account", path)))?;
    let region = get_string_prop(node, "region", &format!("{}.region", path))?
        .ok_or_else(|| ConfigError::MissingField(format!("{}.region", path)))?;

    let mut config = FactoryConfig::new("", label, account, region);

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "retention" => {
                    config.retention = parse_retention(child, &path)?;
                }
                "network" => {
                    let field = format!("{}.network.address_range", path);
                    let address_range = match get_first_string_arg(child) {
                        Some(range) => range,
                        None => get_string_prop(child, "address-range", &field)?
                            .ok_or_else(|| ConfigError::MissingField(field.clone()))?,
                    };
                    config.network = NetworkConfig { address_range };
                }
                "workers" => {
                    config.workers = Some(parse_workers(child, &path)?);
                }
                "workbench" => {
                    config.workbench = Some(parse_workbench(child, &path)?);
                }
                "stage" => {
                    let index = config.stages.len();
                    config
                        .stages
                        .push(parse_stage(child, &format!("{}.stages[{}]", path, index))?);
                }
                _ => {}
            }
        }
    }

    Ok(config)
}

fn parse_retention(node: &KdlNode, path: &str) -> ConfigResult<StorageRetention> {
    let defaults = StorageRetention::default();
    let flag = |name: &str, default: bool| -> ConfigResult<bool> {
        let field = format!("{}.retention.{}", path, name);
        Ok(get_bool_prop(node, name, &field)?.unwrap_or(default))
    };
    Ok(StorageRetention {
        artifacts: flag("artifacts", defaults.artifacts)?,
        sourcecode: flag("sourcecode", defaults.sourcecode)?,
        cloudtrail: flag("cloudtrail", defaults.cloudtrail)?,
    })
}

fn parse_workers(node: &KdlNode, path: &str) -> ConfigResult<WorkersConfig> {
    let defaults = WorkersConfig::default();
    let field = |name: &str| format!("{}.workers.{}", path, name);
    Ok(WorkersConfig {
        broker_instance_type: get_string_prop(
            node,
            "broker-instance-type",
            &field("broker_instance_type"),
        )?
        .unwrap_or(defaults.broker_instance_type),
        broker_engine: get_string_prop(node, "engine", &field("broker_engine"))?
            .unwrap_or(defaults.broker_engine),
        instance_type: get_string_prop(node, "instance-type", &field("instance_type"))?
            .unwrap_or(defaults.instance_type),
        desired_capacity: get_u32_prop(node, "capacity", &field("desired_capacity"))?
            .unwrap_or(defaults.desired_capacity),
    })
}

fn parse_workbench(node: &KdlNode, path: &str) -> ConfigResult<WorkbenchConfig> {
    let defaults = WorkbenchConfig::default();
    let field = |name: &str| format!("{}.workbench.{}", path, name);
    Ok(WorkbenchConfig {
        instance_type: get_string_prop(node, "instance-type", &field("instance_type"))?
            .unwrap_or(defaults.instance_type),
        volume_size_gb: get_u32_prop(node, "volume-size", &field("volume_size_gb"))?
            .unwrap_or(defaults.volume_size_gb),
    })
}

fn parse_stage(node: &KdlNode, path: &str) -> ConfigResult<StageConfig> {
    let name = get_first_string_arg(node)
        .ok_or_else(|| ConfigError::MissingField(format!("{}.name", path)))?;

    let mut actions = Vec::new();
    if let Some(children) = node.children() {
        for child in children.nodes() {
            if child.name().value() == "action" {
                let action_path = format!("{}.actions[{}]", path, actions.len());
                actions.push(parse_action(child, &action_path)?);
            }
        }
    }

    Ok(StageConfig { name, actions })
}

fn parse_action(node: &KdlNode, path: &str) -> ConfigResult<ActionConfig> {
    let name = get_first_string_arg(node)
        .ok_or_else(|| ConfigError::MissingField(format!("{}.name", path)))?;
    let field = |name: &str| format!("{}.{}", path, name);
    let build_instructions = get_string_prop(node, "buildspec", &field("build_instructions"))?
        .ok_or_else(|| ConfigError::MissingField(field("build_instructions")))?;

    Ok(ActionConfig {
        name,
        build_instructions,
        image_repository: get_string_prop(node, "image-repository", &field("image_repository"))?,
        image_tag: get_string_prop(node, "image-tag", &field("image_tag"))?,
    })
}

fn parse_delivery(node: &KdlNode) -> ConfigResult<DeliveryConfig> {
    let mut delivery = DeliveryConfig {
        environment: get_string_prop(node, "environment", "delivery.environment")?,
        ..DeliveryConfig::default()
    };

    if let Some(children) = node.children() {
        let synth: Vec<String> = children
            .nodes()
            .iter()
            .filter(|child| child.name().value() == "synth")
            .flat_map(get_all_string_args)
            .collect();
        if !synth.is_empty() {
            delivery.synth = synth;
        }
    }

    Ok(delivery)
}

// Helper functions for extracting values from KDL nodes.
// Typed property getters return `None` when the property is absent and an
// error when it is present with the wrong type.

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn get_all_string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}

fn get_string_prop(node: &KdlNode, name: &str, field: &str) -> ConfigResult<Option<String>> {
    match node.get(name) {
        None => Ok(None),
        Some(value) => value
            .as_string()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| ConfigError::invalid(field, format!("{} is not a string", value))),
    }
}

fn get_bool_prop(node: &KdlNode, name: &str, field: &str) -> ConfigResult<Option<bool>> {
    match node.get(name) {
        None => Ok(None),
        Some(value) => value.as_bool().map(Some).ok_or_else(|| {
            ConfigError::invalid(field, format!("{} is not #true or #false", value))
        }),
    }
}

fn get_u32_prop(node: &KdlNode, name: &str, field: &str) -> ConfigResult<Option<u32>> {
    match node.get(name) {
        None => Ok(None),
        Some(value) => value
            .as_integer()
            .and_then(|i| u32::try_from(i).ok())
            .map(Some)
            .ok_or_else(|| ConfigError::invalid(field, format!("{} is not a whole number", value))),
    }
}
