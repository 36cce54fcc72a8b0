//! Single-environment compilation.

use softfactory_config::FactoryConfig;
use softfactory_core::ResourceGraph;
use tracing::info;

use crate::SynthResult;
use crate::context::SynthContext;
use crate::foundation::build_foundation;
use crate::grants::resolve_grants;
use crate::pipeline::assemble_pipeline;
use crate::subsystems::{build_workbench, build_workers};

/// Compile one environment's configuration into its resource graph.
///
/// The configuration is validated first and the finished graph is checked
/// for dangling references, naming collisions and cycles. Either the whole
/// graph is returned or an error, never a partial graph.
pub fn compile(config: &FactoryConfig) -> SynthResult<ResourceGraph> {
    config.validate()?;

    let ctx = SynthContext::new(config);
    let (graph, foundation) = build_foundation(ResourceGraph::new(), &ctx)?;
    let (graph, workers) = build_workers(graph, &ctx, &foundation)?;
    let (graph, workbench) = build_workbench(graph, &ctx, &foundation, workers.as_ref())?;
    let (graph, pipeline) = assemble_pipeline(graph, &ctx, &foundation, workers.as_ref())?;
    let graph = resolve_grants(
        graph,
        &foundation,
        &pipeline,
        workers.as_ref(),
        workbench.as_ref(),
    );

    graph.validate()?;

    info!(
        project = %config.project_name,
        environment = %config.environment_name,
        resources = graph.len(),
        dependencies = graph.dependencies().count(),
        grants = graph.grants().count(),
        "compiled resource graph"
    );

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SynthError;
    use softfactory_config::{
        ActionConfig, ConfigError, StageConfig, WorkbenchConfig, WorkersConfig,
    };
    use softfactory_core::{GraphError, ResourceSpec, TeardownPolicy};

    fn config() -> FactoryConfig {
        let mut config = FactoryConfig::new("acme", "test", "123456789012", "us-east-1");
        config.stages = vec![StageConfig {
            name: "build".to_string(),
            actions: vec![ActionConfig::new("compile", "build.yml")],
        }];
        config
    }

    #[test]
    fn test_minimal_environment() {
        let graph = compile(&config()).unwrap();

        assert_eq!(graph.resources_of_kind("object_store").count(), 3);
        assert_eq!(graph.resources_of_kind("subnet").count(), 2);
        assert_eq!(graph.resources_of_kind("service_endpoint").count(), 2);
        assert_eq!(graph.resources_of_kind("build_project").count(), 1);
        assert_eq!(graph.resources_of_kind("broker").count(), 0);
        assert_eq!(graph.resources_of_kind("workbench").count(), 0);

        let artifact = graph.get(&"artifact-store".into()).unwrap();
        assert_eq!(artifact.name.as_deref(), Some("acme-test-123456789012-us-east-1"));
        assert_eq!(artifact.teardown, TeardownPolicy::Retain);
    }

    #[test]
    fn test_full_environment() {
        let mut config = config();
        config.workers = Some(WorkersConfig::default());
        config.workbench = Some(WorkbenchConfig::default());
        let graph = compile(&config).unwrap();

        assert_eq!(graph.resources_of_kind("broker").count(), 1);
        assert_eq!(graph.resources_of_kind("worker_fleet").count(), 1);
        assert_eq!(graph.resources_of_kind("workbench").count(), 1);
        assert_eq!(graph.resources_of_kind("role").count(), 3);

        let order = graph.creation_order();
        assert_eq!(order.len(), graph.len());
        let position = |id: &str| order.iter().position(|o| o.as_str() == id).unwrap();
        assert!(position("workers/fleet") < position("workbench/instance"));
        assert!(position("workers/broker") < position("build/compile"));
        assert!(position("build/compile") < position("pipeline"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = config();
        config.account = "1234".to_string();
        match compile(&config) {
            Err(SynthError::Validation(ConfigError::InvalidValue { field, .. })) => {
                assert_eq!(field, "environments.test.account");
            }
            other => panic!("expected validation error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_workbench_without_workers() {
        let mut config = config();
        config.workbench = Some(WorkbenchConfig::default());
        let err = compile(&config).unwrap_err();
        assert!(matches!(err, SynthError::UnmetDependency { .. }));
        assert!(err.to_string().contains("environments.test.workers"));
    }

    #[test]
    fn test_build_project_names_must_not_collide() {
        let mut config = config();
        config.stages.push(StageConfig {
            name: "deploy".to_string(),
            actions: vec![ActionConfig::new("publish", "publish.yml")],
        });
        let graph = compile(&config).unwrap();
        let names: Vec<_> = graph
            .resources_of_kind("build_project")
            .filter_map(|r| r.name.clone())
            .collect();
        assert_eq!(
            names,
            vec![
                "acme-test-build-compile".to_string(),
                "acme-test-build-publish".to_string(),
            ]
        );
        assert!(!matches!(
            graph.validate(),
            Err(GraphError::NamingCollision { .. })
        ));
    }

    #[test]
    fn test_pipeline_is_last_resource_created() {
        let graph = compile(&config()).unwrap();
        let order = graph.creation_order();
        let last = graph.get(order[order.len() - 1]).unwrap();
        assert!(matches!(last.spec, ResourceSpec::Pipeline(_)));
    }
}
