//! Configuration validation.

use regex::Regex;
use softfactory_core::naming::{NameKind, NamingPolicy};
use softfactory_core::pipeline::SOURCE_STAGE;
use softfactory_core::Ipv4Cidr;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::model::{ActionConfig, DeploymentDocument, FactoryConfig, StageConfig};
use crate::{ConfigError, ConfigResult};

// Project and environment names end up in object store names.
static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$").unwrap());

static ACCOUNT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{12}$").unwrap());

static REGION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2}(-[a-z]+)+-[0-9]+$").unwrap());

static STAGE_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9.@_-]{1,100}$").unwrap());

static ACTION_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{0,99}$").unwrap());

/// Longest allowed globally-scoped name.
const MAX_GLOBAL_NAME_LEN: usize = 63;

/// Smallest subnet carved out of the network, one per tier and zone.
const SUBNET_PREFIX: u8 = 24;

const BROKER_ENGINES: &[&str] = &["rabbitmq", "activemq"];

/// Environment label reserved for the delivery pipeline's own name.
const RESERVED_ENVIRONMENT: &str = "infra";

impl DeploymentDocument {
    pub fn validate(&self) -> ConfigResult<()> {
        check_name("project", &self.project)?;

        if self.environments.is_empty() {
            return Err(ConfigError::MissingField("environments".to_string()));
        }

        let mut labels = HashSet::new();
        for env in &self.environments {
            if !labels.insert(env.environment_name.as_str()) {
                return Err(ConfigError::Duplicate {
                    field: "environments".to_string(),
                    name: env.environment_name.clone(),
                });
            }
            if env.environment_name == RESERVED_ENVIRONMENT {
                return Err(ConfigError::invalid(
                    env.path(),
                    format!("'{}' is reserved for the delivery pipeline", RESERVED_ENVIRONMENT),
                ));
            }
            if env.project_name != self.project {
                return Err(ConfigError::invalid(
                    format!("{}.project_name", env.path()),
                    format!(
                        "'{}' does not match document project '{}'",
                        env.project_name, self.project
                    ),
                ));
            }
            env.validate()?;
        }

        if let Some(label) = &self.delivery.environment {
            if self.environment(label).is_none() {
                return Err(ConfigError::InvalidReference {
                    field: "delivery.environment".to_string(),
                    message: format!("unknown environment '{}'", label),
                });
            }
        }
        if self.delivery.synth.is_empty() {
            return Err(ConfigError::MissingField("delivery.synth".to_string()));
        }

        Ok(())
    }
}

impl FactoryConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        let path = self.path();

        check_name(&format!("{}.project_name", path), &self.project_name)?;
        check_name(&format!("{}.environment_name", path), &self.environment_name)?;

        if !ACCOUNT_REGEX.is_match(&self.account) {
            return Err(ConfigError::invalid(
                format!("{}.account", path),
                format!("'{}' is not a 12-digit account id", self.account),
            ));
        }
        if !REGION_REGEX.is_match(&self.region) {
            return Err(ConfigError::invalid(
                format!("{}.region", path),
                format!("'{}' is not a region name", self.region),
            ));
        }

        let field = format!("{}.network.address_range", path);
        let range: Ipv4Cidr = self
            .network
            .address_range
            .parse()
            .map_err(|message| ConfigError::invalid(&field, message))?;
        if range.prefix() >= SUBNET_PREFIX {
            return Err(ConfigError::invalid(
                &field,
                format!(
                    "/{} leaves no room for two /{} subnets",
                    range.prefix(),
                    SUBNET_PREFIX
                ),
            ));
        }

        if let Some(workers) = &self.workers {
            if workers.desired_capacity == 0 {
                return Err(ConfigError::invalid(
                    format!("{}.workers.desired_capacity", path),
                    "must be at least 1",
                ));
            }
            if !BROKER_ENGINES.contains(&workers.broker_engine.as_str()) {
                return Err(ConfigError::invalid(
                    format!("{}.workers.broker_engine", path),
                    format!(
                        "'{}' is not one of {}",
                        workers.broker_engine,
                        BROKER_ENGINES.join(", ")
                    ),
                ));
            }
            check_not_empty(
                &format!("{}.workers.instance_type", path),
                &workers.instance_type,
            )?;
            check_not_empty(
                &format!("{}.workers.broker_instance_type", path),
                &workers.broker_instance_type,
            )?;
        }

        if let Some(workbench) = &self.workbench {
            if !(5..=16384).contains(&workbench.volume_size_gb) {
                return Err(ConfigError::invalid(
                    format!("{}.workbench.volume_size_gb", path),
                    format!("{} is outside 5..=16384", workbench.volume_size_gb),
                ));
            }
            check_not_empty(
                &format!("{}.workbench.instance_type", path),
                &workbench.instance_type,
            )?;
        }

        self.validate_stages(&path)?;
        self.validate_name_lengths(&path)
    }

    fn validate_stages(&self, path: &str) -> ConfigResult<()> {
        if self.stages.is_empty() {
            return Err(ConfigError::MissingField(format!("{}.stages", path)));
        }

        let mut stage_names = HashSet::new();
        let mut action_names = HashSet::new();
        for (i, stage) in self.stages.iter().enumerate() {
            let stage_path = format!("{}.stages[{}]", path, i);
            validate_stage(&stage_path, stage)?;

            if !stage_names.insert(stage.name.as_str()) {
                return Err(ConfigError::Duplicate {
                    field: format!("{}.stages", path),
                    name: stage.name.clone(),
                });
            }

            for (j, action) in stage.actions.iter().enumerate() {
                let action_path = format!("{}.actions[{}]", stage_path, j);
                validate_action(&action_path, action)?;

                // Action names become build project names, which are per environment.
                if !action_names.insert(action.name.as_str()) {
                    return Err(ConfigError::Duplicate {
                        field: format!("{}.name", action_path),
                        name: action.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_name_lengths(&self, path: &str) -> ConfigResult<()> {
        let naming = NamingPolicy::new(self.target());
        for kind in [
            NameKind::ArtifactStore,
            NameKind::SourceArchiveStore,
            NameKind::AuditLogStore,
            NameKind::Broker,
            NameKind::BrokerSecret,
        ] {
            let name = naming.name(&kind);
            if name.len() > MAX_GLOBAL_NAME_LEN {
                return Err(ConfigError::invalid(
                    path,
                    format!(
                        "resource name '{}' is longer than {} characters; shorten the project or environment name",
                        name, MAX_GLOBAL_NAME_LEN
                    ),
                ));
            }
        }
        Ok(())
    }
}

fn validate_stage(path: &str, stage: &StageConfig) -> ConfigResult<()> {
    if stage.name.is_empty() {
        return Err(ConfigError::MissingField(format!("{}.name", path)));
    }
    if !STAGE_NAME_REGEX.is_match(&stage.name) {
        return Err(ConfigError::invalid(
            format!("{}.name", path),
            format!("'{}' contains characters not allowed in stage names", stage.name),
        ));
    }
    if stage.name == SOURCE_STAGE {
        return Err(ConfigError::invalid(
            format!("{}.name", path),
            format!("'{}' is reserved for the source stage", SOURCE_STAGE),
        ));
    }
    if stage.actions.is_empty() {
        return Err(ConfigError::MissingField(format!("{}.actions", path)));
    }
    Ok(())
}

fn validate_action(path: &str, action: &ActionConfig) -> ConfigResult<()> {
    if action.name.is_empty() {
        return Err(ConfigError::MissingField(format!("{}.name", path)));
    }
    if !ACTION_NAME_REGEX.is_match(&action.name) {
        return Err(ConfigError::invalid(
            format!("{}.name", path),
            format!("'{}' contains characters not allowed in action names", action.name),
        ));
    }
    if action.build_instructions.trim().is_empty() {
        return Err(ConfigError::MissingField(format!(
            "{}.build_instructions",
            path
        )));
    }
    if let Some(repository) = &action.image_repository {
        check_not_empty(&format!("{}.image_repository", path), repository)?;
    }
    if let Some(tag) = &action.image_tag {
        check_not_empty(&format!("{}.image_tag", path), tag)?;
    }
    Ok(())
}

fn check_name(field: &str, value: &str) -> ConfigResult<()> {
    if value.is_empty() {
        return Err(ConfigError::MissingField(field.to_string()));
    }
    if !NAME_REGEX.is_match(value) {
        return Err(ConfigError::invalid(
            field,
            format!(
                "'{}' must be lowercase letters, digits and inner hyphens",
                value
            ),
        ));
    }
    Ok(())
}

fn check_not_empty(field: &str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::invalid(field, "must not be empty"));
    }
    Ok(())
}
