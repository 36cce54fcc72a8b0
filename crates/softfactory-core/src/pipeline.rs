//! Pipeline and stage descriptors.

use serde::{Deserialize, Serialize};

use crate::ResourceId;

/// Name of the stage that every pipeline starts with.
pub const SOURCE_STAGE: &str = "Source";

/// Name of the action inside the source stage.
pub const SOURCE_ACTION: &str = "S3Source";

/// Output variable of the source action carrying the archive version.
pub const VERSION_ID_VARIABLE: &str = "VersionId";

/// A delivery pipeline inside one environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// Pipeline name (e.g., "acme-test").
    pub name: String,
    /// Store used for intermediate pipeline artifacts.
    pub artifact_store: ResourceId,
    /// Whether artifacts are encrypted with keys shareable across accounts.
    pub cross_account_keys: bool,
    /// Stages, executed strictly in order.
    pub stages: Vec<PipelineStage>,
}

impl PipelineSpec {
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn stage(&self, name: &str) -> Option<&PipelineStage> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub(crate) fn references(&self) -> Vec<&ResourceId> {
        let mut refs = vec![&self.artifact_store];
        for stage in &self.stages {
            for action in &stage.actions {
                match action {
                    PipelineAction::Source(source) => refs.push(&source.store),
                    PipelineAction::Build(build) => refs.push(&build.project),
                }
            }
        }
        refs
    }
}

/// A stage in a pipeline.
///
/// Actions inside a stage have no ordering between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStage {
    pub name: String,
    pub actions: Vec<PipelineAction>,
}

/// What starts a source action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTrigger {
    /// Write events recorded by the audit trail.
    Events,
    /// Periodic polling of the object.
    Poll,
}

/// An action inside a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineAction {
    Source(SourceAction),
    Build(BuildAction),
}

impl PipelineAction {
    pub fn name(&self) -> &str {
        match self {
            PipelineAction::Source(a) => &a.name,
            PipelineAction::Build(a) => &a.name,
        }
    }
}

/// Watches a single object in a store and starts a run on every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAction {
    pub name: String,
    pub store: ResourceId,
    pub object_key: String,
    pub trigger: SourceTrigger,
    /// Artifact produced for downstream actions.
    pub output: String,
    /// Variables exposed to downstream actions.
    pub variables: Vec<String>,
}

/// Runs a build project against the source artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildAction {
    pub name: String,
    pub project: ResourceId,
    pub input: String,
}

/// Pipeline that deploys every environment of a project in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPipelineSpec {
    pub name: String,
    pub cross_account_keys: bool,
    /// Environment whose account hosts this pipeline.
    pub host_environment: String,
    /// Physical name of the store holding the source archive.
    pub source_store: String,
    pub object_key: String,
    /// Commands that render the environment graphs from source.
    pub synth_commands: Vec<String>,
    /// Deploy stages, executed strictly in order.
    pub stages: Vec<DeployStage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployStage {
    pub environment: String,
    pub account: String,
    pub region: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> PipelineSpec {
        PipelineSpec {
            name: "acme-test".to_string(),
            artifact_store: "artifact-store".into(),
            cross_account_keys: false,
            stages: vec![
                PipelineStage {
                    name: SOURCE_STAGE.to_string(),
                    actions: vec![PipelineAction::Source(SourceAction {
                        name: SOURCE_ACTION.to_string(),
                        store: "source-archive-store".into(),
                        object_key: "working-dir.zip".to_string(),
                        trigger: SourceTrigger::Events,
                        output: "source".to_string(),
                        variables: vec![VERSION_ID_VARIABLE.to_string()],
                    })],
                },
                PipelineStage {
                    name: "build".to_string(),
                    actions: vec![PipelineAction::Build(BuildAction {
                        name: "compile".to_string(),
                        project: "build/compile".into(),
                        input: "source".to_string(),
                    })],
                },
            ],
        }
    }

    #[test]
    fn test_stage_lookup() {
        let pipeline = pipeline();
        assert_eq!(pipeline.stage_names(), vec!["Source", "build"]);
        assert_eq!(pipeline.stage("build").unwrap().actions[0].name(), "compile");
        assert!(pipeline.stage("deploy").is_none());
    }

    #[test]
    fn test_references_cover_every_action() {
        let pipeline = pipeline();
        let refs: Vec<&str> = pipeline.references().iter().map(|r| r.as_str()).collect();
        assert_eq!(
            refs,
            vec!["artifact-store", "source-archive-store", "build/compile"]
        );
    }
}
