//! Physical name listing.

use anyhow::{Context, Result};
use softfactory_core::{NameKind, NamingPolicy};
use softfactory_synth::compile;
use std::path::Path;

use super::load;

pub fn run(path: &Path, env: &str) -> Result<()> {
    let document = load(path)?;
    let config = document
        .environment(env)
        .with_context(|| format!("Unknown environment: {}", env))?;
    let graph =
        compile(config).with_context(|| format!("Failed to compile environment: {}", env))?;

    let rows: Vec<(String, &str, &str)> = graph
        .resources()
        .filter_map(|r| r.name.as_deref().map(|name| (r.id.to_string(), r.spec.kind(), name)))
        .collect();
    let width = rows.iter().map(|(id, _, _)| id.len()).max().unwrap_or(0);

    println!("Environment: {} ({}/{})", env, config.account, config.region);
    for (id, kind, name) in &rows {
        println!("  {:<width$}  {:<14}  {}", id, kind, name, width = width);
    }

    let naming = NamingPolicy::new(config.target());
    println!(
        "Delivery pipeline: {}",
        naming.name(&NameKind::DeliveryPipeline)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{CONFIG, config_file};

    #[test]
    fn test_names_for_known_environment() {
        let file = config_file(CONFIG);
        run(file.path(), "prod").unwrap();
    }

    #[test]
    fn test_names_unknown_environment() {
        let file = config_file(CONFIG);
        assert!(run(file.path(), "staging").is_err());
    }
}
