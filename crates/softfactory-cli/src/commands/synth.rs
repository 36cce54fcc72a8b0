//! Graph synthesis command.

use anyhow::{Context, Result};
use serde::Serialize;
use softfactory_synth::{compile, compile_document};
use std::path::Path;
use tracing::info;

use super::load;

/// Compile the configuration and write the resulting JSON.
///
/// With an environment label only that environment's graph is written,
/// otherwise the whole deployment including the delivery pipeline.
pub fn run(path: &Path, env: Option<&str>, out: Option<&Path>, pretty: bool) -> Result<()> {
    let document = load(path)?;

    let json = match env {
        Some(label) => {
            let config = document
                .environment(label)
                .with_context(|| format!("Unknown environment: {}", label))?;
            let graph = compile(config)
                .with_context(|| format!("Failed to compile environment: {}", label))?;
            to_json(&graph, pretty)?
        }
        None => {
            let deployment = compile_document(&document)
                .with_context(|| format!("Failed to compile: {}", path.display()))?;
            to_json(&deployment, pretty)?
        }
    };

    match out {
        Some(out) => {
            std::fs::write(out, json + "\n")
                .with_context(|| format!("Failed to write output file: {}", out.display()))?;
            info!(path = %out.display(), "wrote resource graph");
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
