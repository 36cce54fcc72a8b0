//! SoftFactory CLI tool.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "softfactory")]
#[command(about = "Compile SoftFactory configuration into resource graphs", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "SOFTFACTORY_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(env = "SOFTFACTORY_CONFIG", default_value = "softfactory.kdl")]
        path: PathBuf,
    },
    /// Compile a configuration file into resource graphs
    Synth {
        /// Path to the configuration file
        #[arg(env = "SOFTFACTORY_CONFIG", default_value = "softfactory.kdl")]
        path: PathBuf,
        /// Only compile this environment
        #[arg(long)]
        env: Option<String>,
        /// Write the output to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Show the physical names of an environment's resources
    Names {
        /// Path to the configuration file
        #[arg(env = "SOFTFACTORY_CONFIG", default_value = "softfactory.kdl")]
        path: PathBuf,
        /// Environment label
        #[arg(long)]
        env: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so graph output on stdout stays parseable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Validate { path } => {
            commands::validate(&path)?;
        }
        Commands::Synth {
            path,
            env,
            out,
            pretty,
        } => {
            commands::synth::run(&path, env.as_deref(), out.as_deref(), pretty)?;
        }
        Commands::Names { path, env } => {
            commands::names::run(&path, &env)?;
        }
    }

    Ok(())
}
