//! Object stores, audit trail and private network.
//!
//! These resources exist in every environment regardless of which optional
//! subsystems are configured.

use softfactory_config::ConfigError;
use softfactory_core::resource::{
    AuditTrailSpec, EndpointService, EndpointType, NetworkSpec, ObjectStoreSpec,
    ServiceEndpointSpec, StorePurpose, SubnetSpec, SubnetTier, TrailEvents,
};
use softfactory_core::{
    Ipv4Cidr, NameKind, Resource, ResourceGraph, ResourceId, ResourceSpec, SOURCE_ARCHIVE_KEY,
    TeardownPolicy,
};
use tracing::debug;

use crate::context::SynthContext;
use crate::ids;
use crate::SynthResult;

/// Zones the network spans.
pub const AVAILABILITY_ZONES: u8 = 1;

/// Prefix length of every subnet.
pub const SUBNET_PREFIX: u8 = 24;

/// Handles to the foundational resources.
#[derive(Debug, Clone)]
pub struct Foundation {
    pub artifact_store: ResourceId,
    pub artifact_store_name: String,
    pub source_archive_store: ResourceId,
    pub source_archive_store_name: String,
    pub audit_log_store: ResourceId,
    pub audit_trail: ResourceId,
    pub network: ResourceId,
    pub public_subnets: Vec<ResourceId>,
    pub private_subnets: Vec<ResourceId>,
}

impl Foundation {
    /// Subnet that hosts everything placed inside the network.
    pub fn private_subnet(&self) -> &ResourceId {
        &self.private_subnets[0]
    }
}

pub fn build_foundation(
    graph: ResourceGraph,
    ctx: &SynthContext<'_>,
) -> SynthResult<(ResourceGraph, Foundation)> {
    let retention = ctx.config.retention;

    let artifact_store = ids::id(ids::ARTIFACT_STORE);
    let artifact_store_name = ctx.name(&NameKind::ArtifactStore);
    let source_archive_store = ids::id(ids::SOURCE_ARCHIVE_STORE);
    let source_archive_store_name = ctx.name(&NameKind::SourceArchiveStore);
    let audit_log_store = ids::id(ids::AUDIT_LOG_STORE);

    let graph = graph
        .with_resource(object_store(
            &artifact_store,
            &artifact_store_name,
            StorePurpose::Artifacts,
            false,
            retention.artifacts,
        ))?
        .with_resource(object_store(
            &source_archive_store,
            &source_archive_store_name,
            StorePurpose::SourceArchive,
            true,
            retention.sourcecode,
        ))?
        .with_resource(object_store(
            &audit_log_store,
            &ctx.name(&NameKind::AuditLogStore),
            StorePurpose::AuditLog,
            false,
            retention.cloudtrail,
        ))?;

    let audit_trail = ids::id(ids::AUDIT_TRAIL);
    let graph = graph
        .with_resource(Resource::new(
            audit_trail.clone(),
            ResourceSpec::AuditTrail(AuditTrailSpec {
                log_store: audit_log_store.clone(),
                watched_store: source_archive_store.clone(),
                object_key: SOURCE_ARCHIVE_KEY.to_string(),
                events: TrailEvents::WriteOnly,
            }),
        ))?
        .with_dependency(&audit_trail, &audit_log_store)
        .with_dependency(&audit_trail, &source_archive_store);

    let (graph, network, public_subnets, private_subnets) = build_network(graph, ctx)?;

    debug!(
        environment = ctx.environment(),
        network = %network,
        "declared foundation resources"
    );

    Ok((
        graph,
        Foundation {
            artifact_store,
            artifact_store_name,
            source_archive_store,
            source_archive_store_name,
            audit_log_store,
            audit_trail,
            network,
            public_subnets,
            private_subnets,
        },
    ))
}

fn object_store(
    id: &ResourceId,
    name: &str,
    purpose: StorePurpose,
    versioned: bool,
    retain: bool,
) -> Resource {
    Resource::new(
        id.clone(),
        ResourceSpec::ObjectStore(ObjectStoreSpec { purpose, versioned }),
    )
    .named(name)
    .with_teardown(TeardownPolicy::for_store(retain))
}

type NetworkHandles = (ResourceGraph, ResourceId, Vec<ResourceId>, Vec<ResourceId>);

fn build_network(graph: ResourceGraph, ctx: &SynthContext<'_>) -> SynthResult<NetworkHandles> {
    let field = ctx.field("network.address_range");
    let range: Ipv4Cidr = ctx
        .config
        .network
        .address_range
        .parse()
        .map_err(|message| ConfigError::InvalidValue {
            field: field.clone(),
            message,
        })?;

    let network = ids::id(ids::NETWORK);
    let mut graph = graph.with_resource(Resource::new(
        network.clone(),
        ResourceSpec::Network(NetworkSpec {
            address_range: range.to_string(),
            availability_zones: AVAILABILITY_ZONES,
            nat_gateways: 0,
            dns_support: true,
            dns_hostnames: true,
        }),
    ))?;

    // Public blocks first, then private, one of each per zone.
    let mut public_subnets = Vec::new();
    let mut private_subnets = Vec::new();
    for (tier, offset) in [(SubnetTier::Public, 0u32), (SubnetTier::Private, 1)] {
        for zone in 1..=AVAILABILITY_ZONES {
            let index = offset * u32::from(AVAILABILITY_ZONES) + u32::from(zone - 1);
            let block = range.nth_subnet(SUBNET_PREFIX, index).ok_or_else(|| {
                ConfigError::InvalidValue {
                    field: field.clone(),
                    message: format!("{} has no room for subnet #{}", range, index + 1),
                }
            })?;

            let id = ids::subnet(&tier.to_string(), zone);
            graph = graph
                .with_resource(Resource::new(
                    id.clone(),
                    ResourceSpec::Subnet(SubnetSpec {
                        network: network.clone(),
                        tier,
                        cidr_block: block.to_string(),
                        availability_zone: zone,
                        // No NAT gateway, so private subnets have no way out.
                        internet_egress: tier == SubnetTier::Public,
                    }),
                ))?
                .with_dependency(&id, &network);

            match tier {
                SubnetTier::Public => public_subnets.push(id),
                SubnetTier::Private => private_subnets.push(id),
            }
        }
    }

    for (slug, service, endpoint_type) in [
        ("object-storage", EndpointService::ObjectStorage, EndpointType::Gateway),
        ("remote-logs", EndpointService::RemoteLogs, EndpointType::Interface),
    ] {
        let id = ids::endpoint(slug);
        graph = graph
            .with_resource(Resource::new(
                id.clone(),
                ResourceSpec::ServiceEndpoint(ServiceEndpointSpec {
                    network: network.clone(),
                    service,
                    endpoint_type,
                    subnets: private_subnets.clone(),
                }),
            ))?
            .with_dependency(&id, &network)
            .with_dependencies(&id, &private_subnets);
    }

    Ok((graph, network, public_subnets, private_subnets))
}
