//! Physical resource naming.
//!
//! Globally-scoped names (object stores, broker, broker secret) follow
//! `{project}-{environment}[-{suffix}]-{account}-{region}`. Embedding the
//! account and region keeps names unique across every deployment target, and
//! the per-kind suffix keeps kinds apart within one target. Regional names
//! (pipelines, build projects, compute) omit account and region.

use serde::{Deserialize, Serialize};

/// Where a graph is deployed: the naming context shared by every resource in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentTarget {
    pub project: String,
    pub environment: String,
    pub account: String,
    pub region: String,
}

impl DeploymentTarget {
    pub fn new(
        project: impl Into<String>,
        environment: impl Into<String>,
        account: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            environment: environment.into(),
            account: account.into(),
            region: region.into(),
        }
    }
}

/// Kinds of resources that carry a physical name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NameKind {
    ArtifactStore,
    SourceArchiveStore,
    AuditLogStore,
    Broker,
    BrokerSecret,
    WorkerSecurityGroup,
    WorkerFleet,
    Workbench,
    Pipeline,
    /// Build project backing the named pipeline action.
    BuildProject(String),
    /// Pipeline that redeploys every environment of a project.
    DeliveryPipeline,
}

impl NameKind {
    /// Whether the name must be unique across accounts and regions.
    pub fn is_global(&self) -> bool {
        matches!(
            self,
            NameKind::ArtifactStore
                | NameKind::SourceArchiveStore
                | NameKind::AuditLogStore
                | NameKind::Broker
                | NameKind::BrokerSecret
        )
    }

    fn suffix(&self) -> Option<String> {
        match self {
            NameKind::ArtifactStore => None,
            NameKind::SourceArchiveStore => Some("sourcecode".to_string()),
            NameKind::AuditLogStore => Some("cloudtrail".to_string()),
            NameKind::Broker => Some("broker".to_string()),
            NameKind::BrokerSecret => Some("broker-secret".to_string()),
            NameKind::WorkerSecurityGroup => Some("workers-sg".to_string()),
            NameKind::WorkerFleet => Some("workers".to_string()),
            NameKind::Workbench => Some("workbench".to_string()),
            NameKind::Pipeline | NameKind::DeliveryPipeline => None,
            NameKind::BuildProject(action) => Some(format!("build-{}", action)),
        }
    }
}

/// Resolve the physical name of a resource.
pub fn name(kind: &NameKind, project: &str, environment: &str, account: &str, region: &str) -> String {
    if *kind == NameKind::DeliveryPipeline {
        return format!("{}-infra", project);
    }

    let mut parts = vec![project.to_string(), environment.to_string()];
    if let Some(suffix) = kind.suffix() {
        parts.push(suffix);
    }
    if kind.is_global() {
        parts.push(account.to_string());
        parts.push(region.to_string());
    }
    parts.join("-")
}

/// Naming bound to a single deployment target.
#[derive(Debug, Clone)]
pub struct NamingPolicy {
    target: DeploymentTarget,
}

impl NamingPolicy {
    pub fn new(target: DeploymentTarget) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &DeploymentTarget {
        &self.target
    }

    pub fn name(&self, kind: &NameKind) -> String {
        name(
            kind,
            &self.target.project,
            &self.target.environment,
            &self.target.account,
            &self.target.region,
        )
    }
}
