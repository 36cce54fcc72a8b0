//! Pipeline assembly: the source stage followed by the configured build stages.

use std::collections::BTreeMap;

use softfactory_config::ActionConfig;
use softfactory_core::pipeline::{
    BuildAction, PipelineAction, PipelineSpec, PipelineStage, SOURCE_ACTION, SOURCE_STAGE,
    SourceAction, SourceTrigger, VERSION_ID_VARIABLE,
};
use softfactory_core::resource::{
    BuildImage, BuildProjectSpec, EnvValue, NetworkPlacement, Principal, RoleSpec,
};
use softfactory_core::{
    NameKind, Resource, ResourceGraph, ResourceId, ResourceSpec, SOURCE_ARCHIVE_KEY,
};
use tracing::{debug, info, warn};

use crate::context::SynthContext;
use crate::foundation::Foundation;
use crate::subsystems::WorkerFleet;
use crate::{SynthResult, ids};

/// Image used when an action does not name its own repository and tag.
pub const DEFAULT_BUILD_IMAGE: &str = "aws/codebuild/amazonlinux2-x86_64-standard:5.0";

/// Compute size of every build project.
pub const BUILD_COMPUTE_TYPE: &str = "BUILD_GENERAL1_SMALL";

/// Directory inside the source archive holding build instruction files.
pub const BUILD_INSTRUCTIONS_DIR: &str = ".cb";

/// Artifact produced by the source action and consumed by every build.
pub const SOURCE_OUTPUT: &str = "source";

pub const ENV_SOURCE_CODE_BUCKET: &str = "SOURCE_CODE_BUCKET_NAME";
pub const ENV_ARTIFACT_BUCKET: &str = "ARTIFACT_BUCKET_NAME";
pub const ENV_VERSION_ID: &str = "VERSION_ID";
pub const ENV_BROKER_NAME: &str = "WORKER_QUEUE_BROKER_NAME";
pub const ENV_SECRET_NAME: &str = "WORKER_QUEUE_SECRET_NAME";
pub const ENV_SECRET_REGION: &str = "WORKER_QUEUE_SECRET_REGION";

/// Handles to the pipeline and its build resources.
#[derive(Debug, Clone)]
pub struct PipelineResources {
    pub pipeline: ResourceId,
    pub build_role: ResourceId,
    /// Build projects in stage order.
    pub build_projects: Vec<ResourceId>,
}

pub fn assemble_pipeline(
    graph: ResourceGraph,
    ctx: &SynthContext<'_>,
    foundation: &Foundation,
    workers: Option<&WorkerFleet>,
) -> SynthResult<(ResourceGraph, PipelineResources)> {
    let build_role = ids::id(ids::BUILD_ROLE);
    let mut graph = graph.with_resource(Resource::new(
        build_role.clone(),
        ResourceSpec::Role(RoleSpec {
            assumed_by: Principal::BuildService,
        }),
    ))?;

    let mut stages = vec![source_stage(foundation)];
    let mut build_projects = Vec::new();

    for stage in &ctx.config.stages {
        let mut actions = Vec::with_capacity(stage.actions.len());
        for action in &stage.actions {
            let project = ids::build_project(&action.name);
            graph = graph
                .with_resource(
                    Resource::new(
                        project.clone(),
                        ResourceSpec::BuildProject(build_project(
                            ctx, foundation, workers, &build_role, action,
                        )),
                    )
                    .named(ctx.name(&NameKind::BuildProject(action.name.clone()))),
                )?
                .with_dependencies(
                    &project,
                    [
                        &build_role,
                        &foundation.artifact_store,
                        &foundation.source_archive_store,
                    ],
                );

            if let Some(workers) = workers {
                graph = graph
                    .with_dependency(&project, foundation.private_subnet())
                    .with_dependencies(&project, workers.broker_dependencies());
            }

            debug!(
                environment = ctx.environment(),
                stage = %stage.name,
                action = %action.name,
                "declared build project"
            );

            actions.push(PipelineAction::Build(BuildAction {
                name: action.name.clone(),
                project: project.clone(),
                input: SOURCE_OUTPUT.to_string(),
            }));
            build_projects.push(project);
        }
        stages.push(PipelineStage {
            name: stage.name.clone(),
            actions,
        });
    }

    let pipeline = ids::id(ids::PIPELINE);
    let name = ctx.name(&NameKind::Pipeline);
    let spec = PipelineSpec {
        name: name.clone(),
        artifact_store: foundation.artifact_store.clone(),
        cross_account_keys: false,
        stages,
    };

    info!(
        environment = ctx.environment(),
        pipeline = %name,
        stages = ?spec.stage_names(),
        "assembled pipeline"
    );

    let graph = graph
        .with_resource(Resource::new(pipeline.clone(), ResourceSpec::Pipeline(spec)).named(name))?
        .with_dependencies(
            &pipeline,
            [
                &foundation.artifact_store,
                &foundation.source_archive_store,
                &foundation.audit_trail,
            ],
        )
        .with_dependencies(&pipeline, &build_projects);

    Ok((
        graph,
        PipelineResources {
            pipeline,
            build_role,
            build_projects,
        },
    ))
}

fn source_stage(foundation: &Foundation) -> PipelineStage {
    PipelineStage {
        name: SOURCE_STAGE.to_string(),
        actions: vec![PipelineAction::Source(SourceAction {
            name: SOURCE_ACTION.to_string(),
            store: foundation.source_archive_store.clone(),
            object_key: SOURCE_ARCHIVE_KEY.to_string(),
            trigger: SourceTrigger::Events,
            output: SOURCE_OUTPUT.to_string(),
            variables: vec![VERSION_ID_VARIABLE.to_string()],
        })],
    }
}

fn build_project(
    ctx: &SynthContext<'_>,
    foundation: &Foundation,
    workers: Option<&WorkerFleet>,
    build_role: &ResourceId,
    action: &ActionConfig,
) -> BuildProjectSpec {
    let mut environment = BTreeMap::new();
    environment.insert(
        ENV_SOURCE_CODE_BUCKET.to_string(),
        EnvValue::plain(&foundation.source_archive_store_name),
    );
    environment.insert(
        ENV_ARTIFACT_BUCKET.to_string(),
        EnvValue::plain(&foundation.artifact_store_name),
    );
    environment.insert(
        ENV_VERSION_ID.to_string(),
        EnvValue::ActionVariable {
            action: SOURCE_ACTION.to_string(),
            variable: VERSION_ID_VARIABLE.to_string(),
        },
    );

    let placement = workers.map(|workers| {
        environment.insert(
            ENV_BROKER_NAME.to_string(),
            EnvValue::plain(&workers.broker_name),
        );
        environment.insert(
            ENV_SECRET_NAME.to_string(),
            EnvValue::plain(&workers.secret_name),
        );
        environment.insert(ENV_SECRET_REGION.to_string(), EnvValue::plain(ctx.region()));

        NetworkPlacement {
            network: foundation.network.clone(),
            subnet: foundation.private_subnet().clone(),
            security_groups: vec![workers.security_group.clone()],
        }
    });

    BuildProjectSpec {
        role: build_role.clone(),
        compute_type: BUILD_COMPUTE_TYPE.to_string(),
        image: build_image(ctx, action),
        build_instructions: format!("{}/{}", BUILD_INSTRUCTIONS_DIR, action.build_instructions),
        environment,
        placement,
    }
}

fn build_image(ctx: &SynthContext<'_>, action: &ActionConfig) -> BuildImage {
    if let Some((repository, tag)) = action.custom_image() {
        return BuildImage::Repository {
            repository: repository.to_string(),
            tag: tag.to_string(),
        };
    }

    if action.image_repository.is_some() || action.image_tag.is_some() {
        warn!(
            environment = ctx.environment(),
            action = %action.name,
            "image repository and tag must both be set, using the default image"
        );
    }
    BuildImage::Managed {
        image: DEFAULT_BUILD_IMAGE.to_string(),
    }
}
