//! Multi-environment compilation and the delivery pipeline.

use serde::Serialize;
use softfactory_config::{ConfigError, DeploymentDocument};
use softfactory_core::pipeline::{DeliveryPipelineSpec, DeployStage};
use softfactory_core::{
    DeploymentTarget, GraphError, GraphResult, NameKind, NamingPolicy, ResourceGraph, ResourceId,
    SOURCE_ARCHIVE_KEY,
};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::{SynthError, SynthResult, compile};

/// One environment's compiled graph and where it is deployed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentGraph {
    pub environment: String,
    pub target: DeploymentTarget,
    pub graph: ResourceGraph,
}

/// Every environment of a project plus the pipeline that deploys them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deployment {
    pub project: String,
    /// Environment graphs in document order.
    pub environments: Vec<EnvironmentGraph>,
    pub delivery: DeliveryPipelineSpec,
}

impl Deployment {
    pub fn environment(&self, label: &str) -> Option<&EnvironmentGraph> {
        self.environments.iter().find(|e| e.environment == label)
    }
}

/// Compile every environment of a document.
///
/// Environments are compiled independently, each under its own account and
/// region. The first failure aborts and names the environment it came from.
/// Physical names must also be unique across environments.
pub fn compile_document(document: &DeploymentDocument) -> SynthResult<Deployment> {
    document.validate()?;

    let mut environments = Vec::with_capacity(document.environments.len());
    for config in &document.environments {
        debug!(environment = %config.environment_name, "compiling environment");
        let graph = compile(config).map_err(|source| SynthError::Environment {
            environment: config.environment_name.clone(),
            source: Box::new(source),
        })?;
        environments.push(EnvironmentGraph {
            environment: config.environment_name.clone(),
            target: config.target(),
            graph,
        });
    }
    check_names_across(&environments)?;

    let host = document
        .delivery_environment()
        .ok_or_else(|| ConfigError::MissingField("delivery.environment".to_string()))?;
    let naming = NamingPolicy::new(host.target());

    let delivery = DeliveryPipelineSpec {
        name: naming.name(&NameKind::DeliveryPipeline),
        cross_account_keys: true,
        host_environment: host.environment_name.clone(),
        source_store: naming.name(&NameKind::SourceArchiveStore),
        object_key: SOURCE_ARCHIVE_KEY.to_string(),
        synth_commands: document.delivery.synth.clone(),
        stages: document
            .environments
            .iter()
            .map(|env| DeployStage {
                environment: env.environment_name.clone(),
                account: env.account.clone(),
                region: env.region.clone(),
            })
            .collect(),
    };

    info!(
        project = %document.project,
        environments = environments.len(),
        delivery = %delivery.name,
        host = %delivery.host_environment,
        "compiled deployment"
    );

    Ok(Deployment {
        project: document.project.clone(),
        environments,
        delivery,
    })
}

/// Global names share one scope, all other names are scoped to their
/// account and region.
fn check_names_across(environments: &[EnvironmentGraph]) -> GraphResult<()> {
    type Scope<'a> = Option<(&'a str, &'a str)>;
    let mut seen: HashMap<(Scope<'_>, &str), ResourceId> = HashMap::new();

    for env in environments {
        let regional = Some((env.target.account.as_str(), env.target.region.as_str()));
        for resource in env.graph.resources() {
            let Some(name) = resource.name.as_deref() else {
                continue;
            };
            let scope = if resource.spec.has_global_name() {
                None
            } else {
                regional
            };
            let owner = ResourceId::new(env.environment.as_str()).child(resource.id.as_str());

            if let Some(first) = seen.get(&(scope, name)) {
                return Err(GraphError::NamingCollision {
                    name: name.to_string(),
                    first: first.clone(),
                    second: owner,
                });
            }
            seen.insert((scope, name), owner);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use softfactory_config::{
        ActionConfig, DeliveryConfig, FactoryConfig, StageConfig, WorkbenchConfig,
    };

    fn environment(label: &str, account: &str, region: &str) -> FactoryConfig {
        let mut config = FactoryConfig::new("acme", label, account, region);
        config.stages = vec![StageConfig {
            name: "build".to_string(),
            actions: vec![ActionConfig::new("compile", "build.yml")],
        }];
        config
    }

    fn document() -> DeploymentDocument {
        DeploymentDocument {
            project: "acme".to_string(),
            environments: vec![
                environment("test", "111111111111", "us-east-1"),
                environment("prod", "222222222222", "eu-west-1"),
            ],
            delivery: DeliveryConfig::default(),
        }
    }

    #[test]
    fn test_environments_compiled_in_order() {
        let deployment = compile_document(&document()).unwrap();
        let labels: Vec<_> = deployment
            .environments
            .iter()
            .map(|e| e.environment.as_str())
            .collect();
        assert_eq!(labels, vec!["test", "prod"]);

        let prod = deployment.environment("prod").unwrap();
        assert_eq!(prod.target.account, "222222222222");
        assert_eq!(
            prod.graph.get(&"artifact-store".into()).unwrap().name.as_deref(),
            Some("acme-prod-222222222222-eu-west-1")
        );
    }

    #[test]
    fn test_delivery_pipeline_defaults_to_first_environment() {
        let delivery = compile_document(&document()).unwrap().delivery;

        assert_eq!(delivery.name, "acme-infra");
        assert!(delivery.cross_account_keys);
        assert_eq!(delivery.host_environment, "test");
        assert_eq!(
            delivery.source_store,
            "acme-test-sourcecode-111111111111-us-east-1"
        );
        assert_eq!(delivery.object_key, "working-dir.zip");
        assert_eq!(
            delivery.synth_commands,
            vec!["softfactory synth softfactory.kdl --out graph.json".to_string()]
        );
        let stages: Vec<_> = delivery.stages.iter().map(|s| s.environment.as_str()).collect();
        assert_eq!(stages, vec!["test", "prod"]);
    }

    #[test]
    fn test_delivery_host_override() {
        let mut document = document();
        document.delivery.environment = Some("prod".to_string());
        let delivery = compile_document(&document).unwrap().delivery;
        assert_eq!(delivery.host_environment, "prod");
        assert_eq!(
            delivery.source_store,
            "acme-prod-sourcecode-222222222222-eu-west-1"
        );
    }

    #[test]
    fn test_failure_names_environment() {
        let mut document = document();
        document.environments[1].workbench = Some(WorkbenchConfig::default());

        let err = compile_document(&document).unwrap_err();
        match &err {
            SynthError::Environment { environment, .. } => assert_eq!(environment, "prod"),
            other => panic!("expected environment error, got {}", other),
        }
        assert!(matches!(err.root(), SynthError::UnmetDependency { .. }));
        assert!(err.to_string().starts_with("environment 'prod'"));
    }

    #[test]
    fn test_global_name_clash_across_environments() {
        let document = DeploymentDocument {
            project: "acme".to_string(),
            environments: vec![
                environment("test", "111111111111", "us-east-1"),
                environment("test-sourcecode", "111111111111", "us-east-1"),
            ],
            delivery: DeliveryConfig::default(),
        };

        match compile_document(&document) {
            Err(SynthError::Graph(GraphError::NamingCollision { name, first, second })) => {
                assert_eq!(name, "acme-test-sourcecode-111111111111-us-east-1");
                assert_eq!(first.as_str(), "test/source-archive-store");
                assert_eq!(second.as_str(), "test-sourcecode/artifact-store");
            }
            other => panic!("expected naming collision, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_build_project_clash_in_same_region() {
        let mut test = environment("test", "111111111111", "us-east-1");
        test.stages[0].actions = vec![ActionConfig::new("x-build-y", "build.yml")];
        let mut other = environment("test-build-x", "111111111111", "us-east-1");
        other.stages[0].actions = vec![ActionConfig::new("y", "build.yml")];

        let mut document = DeploymentDocument {
            project: "acme".to_string(),
            environments: vec![test, other],
            delivery: DeliveryConfig::default(),
        };
        assert!(matches!(
            compile_document(&document),
            Err(SynthError::Graph(GraphError::NamingCollision { ref name, .. }))
                if name == "acme-test-build-x-build-y"
        ));

        // Regional names only clash inside one account and region.
        document.environments[1].region = "eu-west-1".to_string();
        compile_document(&document).unwrap();
    }

    #[test]
    fn test_unknown_delivery_environment_rejected() {
        let mut document = document();
        document.delivery.environment = Some("staging".to_string());
        assert!(matches!(
            compile_document(&document),
            Err(SynthError::Validation(ConfigError::InvalidReference { .. }))
        ));
    }
}
