//! Optional worker fleet and workbench.

use softfactory_core::resource::{
    BrokerSpec, Principal, RoleSpec, SecretSpec, SecurityGroupSpec, WorkbenchSpec,
    WorkerFleetSpec,
};
use softfactory_core::{NameKind, Resource, ResourceGraph, ResourceId, ResourceSpec};
use tracing::{debug, info};

use crate::context::SynthContext;
use crate::foundation::Foundation;
use crate::{SynthError, SynthResult, ids};

/// Handles to the worker fleet resources.
#[derive(Debug, Clone)]
pub struct WorkerFleet {
    pub broker: ResourceId,
    pub broker_name: String,
    pub secret: ResourceId,
    pub secret_name: String,
    pub security_group: ResourceId,
    pub role: ResourceId,
    pub fleet: ResourceId,
}

impl WorkerFleet {
    /// Resources every broker consumer must be created after.
    pub fn broker_dependencies(&self) -> [&ResourceId; 3] {
        [&self.broker, &self.secret, &self.security_group]
    }
}

/// Handles to the workbench resources.
#[derive(Debug, Clone)]
pub struct Workbench {
    pub instance: ResourceId,
    pub role: ResourceId,
}

/// Declare the worker fleet when workers are configured.
pub fn build_workers(
    graph: ResourceGraph,
    ctx: &SynthContext<'_>,
    foundation: &Foundation,
) -> SynthResult<(ResourceGraph, Option<WorkerFleet>)> {
    let Some(config) = &ctx.config.workers else {
        debug!(environment = ctx.environment(), "no workers configured");
        return Ok((graph, None));
    };

    let subnet = foundation.private_subnet();
    let secret = ids::worker("broker-secret");
    let secret_name = ctx.name(&NameKind::BrokerSecret);
    let security_group = ids::worker("security-group");
    let broker = ids::worker("broker");
    let broker_name = ctx.name(&NameKind::Broker);
    let role = ids::worker("role");
    let fleet = ids::worker("fleet");

    let graph = graph
        .with_resource(
            Resource::new(
                secret.clone(),
                ResourceSpec::Secret(SecretSpec {
                    description: format!("Credentials of broker {}", broker_name),
                    generated_keys: vec!["username".to_string(), "password".to_string()],
                }),
            )
            .named(&secret_name),
        )?
        .with_resource(
            Resource::new(
                security_group.clone(),
                ResourceSpec::SecurityGroup(SecurityGroupSpec {
                    network: foundation.network.clone(),
                    description: "Broker, workers and their clients".to_string(),
                    allow_all_outbound: true,
                }),
            )
            .named(ctx.name(&NameKind::WorkerSecurityGroup)),
        )?
        .with_dependency(&security_group, &foundation.network)
        .with_resource(
            Resource::new(
                broker.clone(),
                ResourceSpec::Broker(BrokerSpec {
                    engine: config.broker_engine.clone(),
                    instance_type: config.broker_instance_type.clone(),
                    subnet: subnet.clone(),
                    security_group: security_group.clone(),
                    credentials: secret.clone(),
                    publicly_accessible: false,
                }),
            )
            .named(&broker_name),
        )?
        .with_dependencies(&broker, [subnet, &security_group, &secret])
        .with_resource(Resource::new(
            role.clone(),
            ResourceSpec::Role(RoleSpec {
                assumed_by: Principal::ComputeInstance,
            }),
        ))?
        .with_resource(
            Resource::new(
                fleet.clone(),
                ResourceSpec::WorkerFleet(WorkerFleetSpec {
                    instance_type: config.instance_type.clone(),
                    desired_capacity: config.desired_capacity,
                    role: role.clone(),
                    subnet: subnet.clone(),
                    security_group: security_group.clone(),
                    broker: broker.clone(),
                    credentials: secret.clone(),
                }),
            )
            .named(ctx.name(&NameKind::WorkerFleet)),
        )?
        .with_dependencies(&fleet, [&role, subnet, &security_group, &broker, &secret]);

    info!(
        environment = ctx.environment(),
        broker = %broker_name,
        capacity = config.desired_capacity,
        "declared worker fleet"
    );

    Ok((
        graph,
        Some(WorkerFleet {
            broker,
            broker_name,
            secret,
            secret_name,
            security_group,
            role,
            fleet,
        }),
    ))
}

/// Declare the workbench when configured. It needs the worker fleet to exist.
pub fn build_workbench(
    graph: ResourceGraph,
    ctx: &SynthContext<'_>,
    foundation: &Foundation,
    workers: Option<&WorkerFleet>,
) -> SynthResult<(ResourceGraph, Option<Workbench>)> {
    let Some(config) = &ctx.config.workbench else {
        return Ok((graph, None));
    };
    let Some(workers) = workers else {
        return Err(SynthError::UnmetDependency {
            field: ctx.field("workbench"),
            requires: ctx.field("workers"),
        });
    };

    let role = ids::workbench("role");
    let instance = ids::workbench("instance");
    let subnet = foundation.private_subnet();

    let graph = graph
        .with_resource(Resource::new(
            role.clone(),
            ResourceSpec::Role(RoleSpec {
                assumed_by: Principal::WorkbenchService,
            }),
        ))?
        .with_resource(
            Resource::new(
                instance.clone(),
                ResourceSpec::Workbench(WorkbenchSpec {
                    instance_type: config.instance_type.clone(),
                    volume_size_gb: config.volume_size_gb,
                    role: role.clone(),
                    subnet: subnet.clone(),
                    security_group: workers.security_group.clone(),
                }),
            )
            .named(ctx.name(&NameKind::Workbench)),
        )?
        .with_dependencies(&instance, [&role, subnet, &workers.security_group])
        .with_dependency(&instance, &workers.fleet);

    info!(
        environment = ctx.environment(),
        instance_type = %config.instance_type,
        "declared workbench"
    );

    Ok((graph, Some(Workbench { instance, role })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::build_foundation;
    use softfactory_config::{FactoryConfig, WorkbenchConfig, WorkersConfig};

    fn config() -> FactoryConfig {
        FactoryConfig::new("acme", "test", "123456789012", "us-east-1")
    }

    fn build(
        config: &FactoryConfig,
    ) -> SynthResult<(ResourceGraph, Option<WorkerFleet>, Option<Workbench>)> {
        let ctx = SynthContext::new(config);
        let (graph, foundation) = build_foundation(ResourceGraph::new(), &ctx)?;
        let (graph, workers) = build_workers(graph, &ctx, &foundation)?;
        let (graph, workbench) = build_workbench(graph, &ctx, &foundation, workers.as_ref())?;
        Ok((graph, workers, workbench))
    }

    #[test]
    fn test_no_workers_no_nodes() {
        let (graph, workers, workbench) = build(&config()).unwrap();
        assert!(workers.is_none());
        assert!(workbench.is_none());
        assert_eq!(graph.resources_of_kind("broker").count(), 0);
        assert_eq!(graph.resources_of_kind("secret").count(), 0);
        assert_eq!(graph.resources_of_kind("security_group").count(), 0);
    }

    #[test]
    fn test_worker_fleet_in_private_subnet() {
        let mut config = config();
        config.workers = Some(WorkersConfig::default());
        let (graph, workers, _) = build(&config).unwrap();
        let workers = workers.unwrap();

        assert_eq!(workers.broker_name, "acme-test-broker-123456789012-us-east-1");
        assert_eq!(
            workers.secret_name,
            "acme-test-broker-secret-123456789012-us-east-1"
        );

        match &graph.get(&workers.broker).unwrap().spec {
            ResourceSpec::Broker(b) => {
                assert_eq!(b.subnet.as_str(), "network/private-subnet-1");
                assert_eq!(b.credentials, workers.secret);
                assert!(!b.publicly_accessible);
            }
            other => panic!("expected broker, got {}", other.kind()),
        }
        assert!(graph.depends_on(&workers.broker, &workers.secret));
        assert!(graph.depends_on(&workers.fleet, &workers.broker));
        graph.validate().unwrap();
    }

    #[test]
    fn test_workbench_depends_on_fleet() {
        let mut config = config();
        config.workers = Some(WorkersConfig::default());
        config.workbench = Some(WorkbenchConfig::default());
        let (graph, workers, workbench) = build(&config).unwrap();

        let workbench = workbench.unwrap();
        assert!(graph.depends_on(&workbench.instance, &workers.unwrap().fleet));
        graph.validate().unwrap();
    }

    #[test]
    fn test_workbench_without_workers_fails() {
        let mut config = config();
        config.workbench = Some(WorkbenchConfig::default());
        match build(&config) {
            Err(SynthError::UnmetDependency { field, requires }) => {
                assert_eq!(field, "environments.test.workbench");
                assert_eq!(requires, "environments.test.workers");
            }
            other => panic!("expected unmet dependency, got {:?}", other.map(|_| ())),
        }
    }
}
