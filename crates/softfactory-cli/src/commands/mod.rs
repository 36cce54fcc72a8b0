//! CLI command implementations.

pub mod names;
pub mod synth;

use anyhow::{Context, Result};
use softfactory_config::{DeploymentDocument, load_document};
use softfactory_synth::compile_document;
use std::path::Path;

pub(crate) fn load(path: &Path) -> Result<DeploymentDocument> {
    load_document(path).with_context(|| format!("Failed to load config file: {}", path.display()))
}

pub fn validate(path: &Path) -> Result<()> {
    let document = load(path)?;
    let deployment = compile_document(&document)
        .with_context(|| format!("Invalid configuration: {}", path.display()))?;

    println!("Configuration is valid");
    for env in &deployment.environments {
        println!(
            "  {} - {} resources ({}/{})",
            env.environment,
            env.graph.len(),
            env.target.account,
            env.target.region
        );
    }
    println!(
        "  delivery pipeline {} hosted in {}",
        deployment.delivery.name, deployment.delivery.host_environment
    );
    Ok(())
}
