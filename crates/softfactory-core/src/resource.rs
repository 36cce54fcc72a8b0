//! Resource descriptors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::ResourceId;
use crate::pipeline::PipelineSpec;

/// What happens to a resource when its environment is torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeardownPolicy {
    /// Keep the resource. Deleting a non-empty store is rejected.
    Retain,
    /// Delete the resource.
    Destroy,
    /// Delete the store together with everything in it.
    DestroyWithContents,
}

impl TeardownPolicy {
    /// Policy for an object store given its "retain on teardown" flag.
    pub fn for_store(retain: bool) -> Self {
        if retain {
            TeardownPolicy::Retain
        } else {
            TeardownPolicy::DestroyWithContents
        }
    }
}

impl fmt::Display for TeardownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeardownPolicy::Retain => write!(f, "retain"),
            TeardownPolicy::Destroy => write!(f, "destroy"),
            TeardownPolicy::DestroyWithContents => write!(f, "destroy_with_contents"),
        }
    }
}

/// A single resource declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    /// Physical name, for resources that have one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub teardown: TeardownPolicy,
    pub spec: ResourceSpec,
}

impl Resource {
    pub fn new(id: impl Into<ResourceId>, spec: ResourceSpec) -> Self {
        Self {
            id: id.into(),
            name: None,
            teardown: TeardownPolicy::Destroy,
            spec,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_teardown(mut self, teardown: TeardownPolicy) -> Self {
        self.teardown = teardown;
        self
    }
}

/// Kind-specific attributes of a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceSpec {
    ObjectStore(ObjectStoreSpec),
    Network(NetworkSpec),
    Subnet(SubnetSpec),
    ServiceEndpoint(ServiceEndpointSpec),
    AuditTrail(AuditTrailSpec),
    Role(RoleSpec),
    SecurityGroup(SecurityGroupSpec),
    Secret(SecretSpec),
    Broker(BrokerSpec),
    WorkerFleet(WorkerFleetSpec),
    Workbench(WorkbenchSpec),
    BuildProject(BuildProjectSpec),
    Pipeline(PipelineSpec),
}

impl ResourceSpec {
    /// Short kind label used in logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceSpec::ObjectStore(_) => "object_store",
            ResourceSpec::Network(_) => "network",
            ResourceSpec::Subnet(_) => "subnet",
            ResourceSpec::ServiceEndpoint(_) => "service_endpoint",
            ResourceSpec::AuditTrail(_) => "audit_trail",
            ResourceSpec::Role(_) => "role",
            ResourceSpec::SecurityGroup(_) => "security_group",
            ResourceSpec::Secret(_) => "secret",
            ResourceSpec::Broker(_) => "broker",
            ResourceSpec::WorkerFleet(_) => "worker_fleet",
            ResourceSpec::Workbench(_) => "workbench",
            ResourceSpec::BuildProject(_) => "build_project",
            ResourceSpec::Pipeline(_) => "pipeline",
        }
    }

    /// Whether the physical name must be unique across accounts and regions.
    pub fn has_global_name(&self) -> bool {
        matches!(
            self,
            ResourceSpec::ObjectStore(_) | ResourceSpec::Broker(_) | ResourceSpec::Secret(_)
        )
    }

    /// Other resources named in this resource's attributes.
    pub fn references(&self) -> Vec<&ResourceId> {
        match self {
            ResourceSpec::ObjectStore(_)
            | ResourceSpec::Network(_)
            | ResourceSpec::Role(_)
            | ResourceSpec::Secret(_) => Vec::new(),
            ResourceSpec::Subnet(s) => vec![&s.network],
            ResourceSpec::ServiceEndpoint(s) => {
                let mut refs = vec![&s.network];
                refs.extend(s.subnets.iter());
                refs
            }
            ResourceSpec::AuditTrail(s) => vec![&s.log_store, &s.watched_store],
            ResourceSpec::SecurityGroup(s) => vec![&s.network],
            ResourceSpec::Broker(s) => vec![&s.subnet, &s.security_group, &s.credentials],
            ResourceSpec::WorkerFleet(s) => {
                vec![&s.role, &s.subnet, &s.security_group, &s.broker, &s.credentials]
            }
            ResourceSpec::Workbench(s) => vec![&s.role, &s.subnet, &s.security_group],
            ResourceSpec::BuildProject(s) => {
                let mut refs = vec![&s.role];
                if let Some(placement) = &s.placement {
                    refs.push(&placement.network);
                    refs.push(&placement.subnet);
                    refs.extend(placement.security_groups.iter());
                }
                refs
            }
            ResourceSpec::Pipeline(s) => s.references(),
        }
    }
}

/// What an object store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorePurpose {
    Artifacts,
    SourceArchive,
    AuditLog,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectStoreSpec {
    pub purpose: StorePurpose,
    pub versioned: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub address_range: String,
    pub availability_zones: u8,
    pub nat_gateways: u8,
    pub dns_support: bool,
    pub dns_hostnames: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetTier {
    Public,
    Private,
}

impl fmt::Display for SubnetTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubnetTier::Public => write!(f, "public"),
            SubnetTier::Private => write!(f, "private"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubnetSpec {
    pub network: ResourceId,
    pub tier: SubnetTier,
    pub cidr_block: String,
    pub availability_zone: u8,
    /// Whether the subnet has a default route to the internet.
    pub internet_egress: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointService {
    ObjectStorage,
    RemoteLogs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointType {
    /// Route-table entry, no network interface.
    Gateway,
    /// Network interface inside the selected subnets.
    Interface,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEndpointSpec {
    pub network: ResourceId,
    pub service: EndpointService,
    pub endpoint_type: EndpointType,
    pub subnets: Vec<ResourceId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailEvents {
    WriteOnly,
    ReadOnly,
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTrailSpec {
    pub log_store: ResourceId,
    pub watched_store: ResourceId,
    pub object_key: String,
    pub events: TrailEvents,
}

/// Service allowed to assume a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Principal {
    BuildService,
    ComputeInstance,
    WorkbenchService,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSpec {
    pub assumed_by: Principal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityGroupSpec {
    pub network: ResourceId,
    pub description: String,
    pub allow_all_outbound: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretSpec {
    pub description: String,
    /// Keys generated into the secret value at creation time.
    pub generated_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerSpec {
    pub engine: String,
    pub instance_type: String,
    pub subnet: ResourceId,
    pub security_group: ResourceId,
    pub credentials: ResourceId,
    pub publicly_accessible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerFleetSpec {
    pub instance_type: String,
    pub desired_capacity: u32,
    pub role: ResourceId,
    pub subnet: ResourceId,
    pub security_group: ResourceId,
    pub broker: ResourceId,
    pub credentials: ResourceId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkbenchSpec {
    pub instance_type: String,
    pub volume_size_gb: u32,
    pub role: ResourceId,
    pub subnet: ResourceId,
    pub security_group: ResourceId,
}

/// Image a build project runs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum BuildImage {
    /// Managed image provided by the build service.
    Managed { image: String },
    /// Image pulled from a container repository.
    Repository { repository: String, tag: String },
}

impl fmt::Display for BuildImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildImage::Managed { image } => write!(f, "{}", image),
            BuildImage::Repository { repository, tag } => write!(f, "{}:{}", repository, tag),
        }
    }
}

/// Value of an environment variable injected into a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnvValue {
    Plain { value: String },
    /// Output variable of another pipeline action, resolved at run time.
    ActionVariable { action: String, variable: String },
}

impl EnvValue {
    pub fn plain(value: impl Into<String>) -> Self {
        EnvValue::Plain {
            value: value.into(),
        }
    }
}

/// Network placement of a build project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkPlacement {
    pub network: ResourceId,
    pub subnet: ResourceId,
    pub security_groups: Vec<ResourceId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildProjectSpec {
    pub role: ResourceId,
    pub compute_type: String,
    pub image: BuildImage,
    /// Path of the build instructions inside the source archive.
    pub build_instructions: String,
    pub environment: BTreeMap<String, EnvValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<NetworkPlacement>,
}
