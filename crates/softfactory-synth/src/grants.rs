//! Permission grants for every principal present in the graph.
//!
//! Grants are only ever added, and only between resources the earlier
//! builders declared, so resolving never fails.

use softfactory_core::{Access, Grant, ResourceGraph, ServiceCapability};
use tracing::debug;

use crate::foundation::Foundation;
use crate::pipeline::PipelineResources;
use crate::subsystems::{Workbench, WorkerFleet};

pub fn resolve_grants(
    graph: ResourceGraph,
    foundation: &Foundation,
    pipeline: &PipelineResources,
    workers: Option<&WorkerFleet>,
    workbench: Option<&Workbench>,
) -> ResourceGraph {
    let build_role = &pipeline.build_role;
    let mut grants = vec![
        Grant::on_resource(build_role, &foundation.artifact_store, Access::ReadWrite),
        Grant::on_resource(build_role, &foundation.source_archive_store, Access::ReadWrite),
        Grant::on_service(build_role, ServiceCapability::ImagePull, Access::Pull),
    ];

    if let Some(workers) = workers {
        grants.push(Grant::on_service(
            build_role,
            ServiceCapability::BrokerDiscovery,
            Access::List,
        ));
        grants.push(Grant::on_resource(build_role, &workers.secret, Access::Read));
        grants.push(Grant::on_resource(
            &workers.role,
            &foundation.source_archive_store,
            Access::ReadWrite,
        ));
    }

    if let Some(workbench) = workbench {
        grants.push(Grant::on_resource(
            &workbench.role,
            &foundation.source_archive_store,
            Access::ReadWrite,
        ));
    }

    debug!(count = grants.len(), "resolved grants");
    grants.into_iter().fold(graph, ResourceGraph::with_grant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SynthContext;
    use crate::foundation::build_foundation;
    use crate::pipeline::assemble_pipeline;
    use crate::subsystems::{build_workbench, build_workers};
    use softfactory_config::{FactoryConfig, WorkbenchConfig, WorkersConfig};
    use softfactory_core::{GrantTarget, ResourceId};

    fn resolve(config: &FactoryConfig) -> ResourceGraph {
        let ctx = SynthContext::new(config);
        let (graph, foundation) = build_foundation(ResourceGraph::new(), &ctx).unwrap();
        let (graph, workers) = build_workers(graph, &ctx, &foundation).unwrap();
        let (graph, workbench) =
            build_workbench(graph, &ctx, &foundation, workers.as_ref()).unwrap();
        let (graph, pipeline) =
            assemble_pipeline(graph, &ctx, &foundation, workers.as_ref()).unwrap();
        resolve_grants(graph, &foundation, &pipeline, workers.as_ref(), workbench.as_ref())
    }

    fn targets(graph: &ResourceGraph, principal: &str) -> Vec<(GrantTarget, Access)> {
        let principal: ResourceId = principal.into();
        graph
            .grants_for(&principal)
            .map(|g| (g.target.clone(), g.access))
            .collect()
    }

    fn store(id: &str) -> GrantTarget {
        GrantTarget::Resource(id.into())
    }

    #[test]
    fn test_build_role_grants_without_workers() {
        let config = FactoryConfig::new("acme", "test", "123456789012", "us-east-1");
        let graph = resolve(&config);

        let grants = targets(&graph, "build-role");
        assert_eq!(grants.len(), 3);
        assert!(grants.contains(&(store("artifact-store"), Access::ReadWrite)));
        assert!(grants.contains(&(store("source-archive-store"), Access::ReadWrite)));
        assert!(grants.contains(&(
            GrantTarget::Service(ServiceCapability::ImagePull),
            Access::Pull
        )));
        graph.validate().unwrap();
    }

    #[test]
    fn test_worker_and_workbench_grants() {
        let mut config = FactoryConfig::new("acme", "test", "123456789012", "us-east-1");
        config.workers = Some(WorkersConfig::default());
        config.workbench = Some(WorkbenchConfig::default());
        let graph = resolve(&config);

        let build = targets(&graph, "build-role");
        assert!(build.contains(&(
            GrantTarget::Service(ServiceCapability::BrokerDiscovery),
            Access::List
        )));
        assert!(build.contains(&(store("workers/broker-secret"), Access::Read)));

        assert_eq!(
            targets(&graph, "workers/role"),
            vec![(store("source-archive-store"), Access::ReadWrite)]
        );
        assert_eq!(
            targets(&graph, "workbench/role"),
            vec![(store("source-archive-store"), Access::ReadWrite)]
        );
        graph.validate().unwrap();
    }
}
