//! The resource graph handed to the provisioning engine.
//!
//! A graph is built by threading a value through each builder: every
//! `with_*` method consumes the graph and returns the extended one. Ordered
//! collections keep the serialized form identical for identical input.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::{GraphError, GraphResult, Resource, ResourceId, ResourceSpec};

/// `dependent` cannot be created before (or destroyed after) `on`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub dependent: ResourceId,
    pub on: ResourceId,
}

/// Account-level capabilities that are not tied to a resource in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCapability {
    /// Pulling images from container repositories.
    ImagePull,
    /// Listing brokers to discover their endpoints.
    BrokerDiscovery,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantTarget {
    Resource(ResourceId),
    Service(ServiceCapability),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Read,
    ReadWrite,
    List,
    Pull,
}

/// `principal` may perform `access` on `target`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Grant {
    pub principal: ResourceId,
    pub target: GrantTarget,
    pub access: Access,
}

impl Grant {
    pub fn on_resource(principal: &ResourceId, resource: &ResourceId, access: Access) -> Self {
        Self {
            principal: principal.clone(),
            target: GrantTarget::Resource(resource.clone()),
            access,
        }
    }

    pub fn on_service(principal: &ResourceId, capability: ServiceCapability, access: Access) -> Self {
        Self {
            principal: principal.clone(),
            target: GrantTarget::Service(capability),
            access,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceGraph {
    resources: BTreeMap<ResourceId, Resource>,
    dependencies: BTreeSet<Dependency>,
    grants: BTreeSet<Grant>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource. Identifiers must be unique.
    pub fn with_resource(mut self, resource: Resource) -> GraphResult<Self> {
        if self.resources.contains_key(&resource.id) {
            return Err(GraphError::DuplicateResource(resource.id));
        }
        self.resources.insert(resource.id.clone(), resource);
        Ok(self)
    }

    pub fn with_dependency(mut self, dependent: &ResourceId, on: &ResourceId) -> Self {
        self.dependencies.insert(Dependency {
            dependent: dependent.clone(),
            on: on.clone(),
        });
        self
    }

    pub fn with_dependencies<'a>(
        self,
        dependent: &ResourceId,
        on: impl IntoIterator<Item = &'a ResourceId>,
    ) -> Self {
        on.into_iter()
            .fold(self, |graph, dep| graph.with_dependency(dependent, dep))
    }

    pub fn with_grant(mut self, grant: Grant) -> Self {
        self.grants.insert(grant);
        self
    }

    pub fn get(&self, id: &ResourceId) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.resources.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// Resources whose spec matches the given kind label.
    pub fn resources_of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Resource> {
        self.resources.values().filter(move |r| r.spec.kind() == kind)
    }

    pub fn dependencies(&self) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter()
    }

    pub fn depends_on(&self, dependent: &ResourceId, on: &ResourceId) -> bool {
        self.dependencies.contains(&Dependency {
            dependent: dependent.clone(),
            on: on.clone(),
        })
    }

    pub fn grants(&self) -> impl Iterator<Item = &Grant> {
        self.grants.iter()
    }

    pub fn grants_for<'a>(&'a self, principal: &'a ResourceId) -> impl Iterator<Item = &'a Grant> {
        self.grants.iter().filter(move |g| &g.principal == principal)
    }

    /// The pipeline declared in this graph, if any.
    pub fn pipeline(&self) -> Option<&crate::pipeline::PipelineSpec> {
        self.resources.values().find_map(|r| match &r.spec {
            ResourceSpec::Pipeline(p) => Some(p),
            _ => None,
        })
    }

    /// Check every invariant the provisioning engine relies on.
    pub fn validate(&self) -> GraphResult<()> {
        self.check_references()?;
        self.check_names()?;
        self.check_acyclic()
    }

    fn check_references(&self) -> GraphResult<()> {
        let missing = |owner: &ResourceId, id: &ResourceId| -> GraphResult<()> {
            if self.contains(id) {
                Ok(())
            } else {
                Err(GraphError::DanglingReference {
                    owner: owner.clone(),
                    missing: id.clone(),
                })
            }
        };

        for resource in self.resources.values() {
            for reference in resource.spec.references() {
                missing(&resource.id, reference)?;
            }
        }
        for dep in &self.dependencies {
            missing(&dep.on, &dep.dependent)?;
            missing(&dep.dependent, &dep.on)?;
        }
        for grant in &self.grants {
            missing(&grant.principal, &grant.principal)?;
            if let GrantTarget::Resource(target) = &grant.target {
                missing(&grant.principal, target)?;
            }
        }
        Ok(())
    }

    fn check_names(&self) -> GraphResult<()> {
        let mut seen: HashMap<&str, &ResourceId> = HashMap::new();
        for resource in self.resources.values() {
            if let Some(name) = &resource.name {
                if let Some(first) = seen.insert(name.as_str(), &resource.id) {
                    return Err(GraphError::NamingCollision {
                        name: name.clone(),
                        first: first.clone(),
                        second: resource.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_acyclic(&self) -> GraphResult<()> {
        let mut edges: HashMap<&ResourceId, Vec<&ResourceId>> = HashMap::new();
        for dep in &self.dependencies {
            edges.entry(&dep.dependent).or_default().push(&dep.on);
        }

        let mut visited = HashMap::new();
        let mut rec_stack = HashMap::new();
        for id in self.resources.keys() {
            if !visited.contains_key(id) {
                if let Some(cycle) = dfs_detect_cycle(id, &edges, &mut visited, &mut rec_stack) {
                    return Err(GraphError::CycleDetected(cycle));
                }
            }
        }
        Ok(())
    }

    /// Resource ids ordered so every resource comes after what it depends on.
    pub fn creation_order(&self) -> Vec<&ResourceId> {
        let mut edges: HashMap<&ResourceId, Vec<&ResourceId>> = HashMap::new();
        for dep in &self.dependencies {
            edges.entry(&dep.dependent).or_default().push(&dep.on);
        }

        let mut visited = HashMap::new();
        let mut order = Vec::new();
        for id in self.resources.keys() {
            topo_visit(id, &edges, &mut visited, &mut order);
        }
        order
    }
}

fn dfs_detect_cycle<'a>(
    node: &'a ResourceId,
    edges: &HashMap<&'a ResourceId, Vec<&'a ResourceId>>,
    visited: &mut HashMap<&'a ResourceId, bool>,
    rec_stack: &mut HashMap<&'a ResourceId, bool>,
) -> Option<String> {
    visited.insert(node, true);
    rec_stack.insert(node, true);

    if let Some(deps) = edges.get(node) {
        for &dep in deps {
            if !visited.contains_key(dep) {
                if let Some(cycle) = dfs_detect_cycle(dep, edges, visited, rec_stack) {
                    return Some(cycle);
                }
            } else if rec_stack.get(dep).copied().unwrap_or(false) {
                return Some(format!("{} -> {}", node, dep));
            }
        }
    }

    rec_stack.insert(node, false);
    None
}

fn topo_visit<'a>(
    node: &'a ResourceId,
    edges: &HashMap<&'a ResourceId, Vec<&'a ResourceId>>,
    visited: &mut HashMap<&'a ResourceId, bool>,
    order: &mut Vec<&'a ResourceId>,
) {
    if visited.get(node).copied().unwrap_or(false) {
        return;
    }
    visited.insert(node, true);

    if let Some(deps) = edges.get(node) {
        for &dep in deps {
            topo_visit(dep, edges, visited, order);
        }
    }

    order.push(node);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Principal, RoleSpec, SecretSpec};

    fn role(id: &str) -> Resource {
        Resource::new(
            id,
            ResourceSpec::Role(RoleSpec {
                assumed_by: Principal::BuildService,
            }),
        )
    }

    fn secret(id: &str, name: &str) -> Resource {
        Resource::new(
            id,
            ResourceSpec::Secret(SecretSpec {
                description: "test".to_string(),
                generated_keys: vec![],
            }),
        )
        .named(name)
    }

    #[test]
    fn test_duplicate_resource_rejected() {
        let result = ResourceGraph::new()
            .with_resource(role("a"))
            .and_then(|g| g.with_resource(role("a")));
        assert_eq!(result.unwrap_err(), GraphError::DuplicateResource("a".into()));
    }

    #[test]
    fn test_naming_collision_detected() {
        let graph = ResourceGraph::new()
            .with_resource(secret("a", "same"))
            .and_then(|g| g.with_resource(secret("b", "same")))
            .unwrap();
        assert!(matches!(
            graph.validate().unwrap_err(),
            GraphError::NamingCollision { name, .. } if name == "same"
        ));
    }

    #[test]
    fn test_dangling_dependency_detected() {
        let a: ResourceId = "a".into();
        let graph = ResourceGraph::new()
            .with_resource(role("a"))
            .unwrap()
            .with_dependency(&a, &"missing".into());
        assert!(matches!(
            graph.validate().unwrap_err(),
            GraphError::DanglingReference { missing, .. } if missing.as_str() == "missing"
        ));
    }

    #[test]
    fn test_dangling_grant_detected() {
        let a: ResourceId = "a".into();
        let graph = ResourceGraph::new()
            .with_resource(role("a"))
            .unwrap()
            .with_grant(Grant::on_resource(&a, &"store".into(), Access::ReadWrite));
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_cycle_detected() {
        let (a, b, c): (ResourceId, ResourceId, ResourceId) = ("a".into(), "b".into(), "c".into());
        let graph = ResourceGraph::new()
            .with_resource(role("a"))
            .and_then(|g| g.with_resource(role("b")))
            .and_then(|g| g.with_resource(role("c")))
            .unwrap()
            .with_dependency(&a, &b)
            .with_dependency(&b, &c)
            .with_dependency(&c, &a);
        assert!(matches!(graph.validate().unwrap_err(), GraphError::CycleDetected(_)));
    }

    #[test]
    fn test_creation_order_respects_dependencies() {
        let (a, b, c): (ResourceId, ResourceId, ResourceId) = ("a".into(), "b".into(), "c".into());
        let graph = ResourceGraph::new()
            .with_resource(role("a"))
            .and_then(|g| g.with_resource(role("b")))
            .and_then(|g| g.with_resource(role("c")))
            .unwrap()
            .with_dependency(&a, &c)
            .with_dependency(&c, &b);
        graph.validate().unwrap();

        let order: Vec<&str> = graph.creation_order().iter().map(|id| id.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_grants_are_deduplicated() {
        let a: ResourceId = "a".into();
        let graph = ResourceGraph::new()
            .with_resource(role("a"))
            .unwrap()
            .with_grant(Grant::on_service(&a, ServiceCapability::ImagePull, Access::Pull))
            .with_grant(Grant::on_service(&a, ServiceCapability::ImagePull, Access::Pull));
        assert_eq!(graph.grants_for(&a).count(), 1);
        graph.validate().unwrap();
    }
}
