//! Core domain types for the SoftFactory resource-graph compiler.
//!
//! This crate contains:
//! - Resource identifiers
//! - IPv4 address ranges
//! - The naming policy for physical resource names
//! - Resource descriptors (storage, network, roles, compute, broker)
//! - Pipeline descriptors (stages, actions, build environment)
//! - The `ResourceGraph` value and its invariant checks

pub mod cidr;
pub mod error;
pub mod graph;
pub mod id;
pub mod naming;
pub mod pipeline;
pub mod resource;

pub use cidr::Ipv4Cidr;
pub use error::{GraphError, GraphResult};
pub use graph::{Access, Dependency, Grant, GrantTarget, ResourceGraph, ServiceCapability};
pub use id::ResourceId;
pub use naming::{DeploymentTarget, NameKind, NamingPolicy};
pub use resource::{Resource, ResourceSpec, TeardownPolicy};

/// Object key in the source-archive store whose writes start a pipeline run.
pub const SOURCE_ARCHIVE_KEY: &str = "working-dir.zip";
