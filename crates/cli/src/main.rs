//! archgraph command-line interface
//!
//! ## Commands
//!
//! - `build <input>` - Analyze call frequencies, rebuild and persist the graph, print the projection
//! - `analyze <input>` - Print the analyzed files and the merged, filtered call-frequency map
//!
//! `<input>` is a Java file, a source directory, or a git URL (`https://...`,
//! `git@host:repo`) cloned into a temporary directory for the run.
//! - `project` - Print the projection of the persisted graph
//! - `reset` - Clear the persisted graph
//! - `dump` - Print every relationship (diagnostics)

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::fs;
use std::path::Path;

mod cli;
mod config;
mod pipeline;
mod sources;

use cli::{Cli, Command, ProjectionArgs};
use config::AppConfig;
use pipeline::{run_blocking, Pipeline};

fn load_config(cli: &Cli, input: Option<&Path>) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref(), input)?;
    if let Some(store) = &cli.store {
        config.store = store.clone();
    }
    if let Some(percentage) = cli.filter_percentage {
        config.filter_percentage = percentage;
    }
    config.validate()?;
    Ok(config)
}

fn emit<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            fs::write(path, format!("{json}\n"))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let input = match &cli.command {
        Command::Build { input, .. } | Command::Analyze { input } => input.local_path(),
        _ => None,
    };
    let config = load_config(&cli, input)?;
    let limit = config.limit;
    let pipeline = Pipeline::new(config);

    match cli.command {
        Command::Build { input, projection } => {
            let mode = projection.mode(limit);
            let (summary, structure) = run_blocking(move || {
                let summary = pipeline.build(&input)?;
                let structure = pipeline.project(mode)?;
                Ok((summary, structure))
            })
            .await?;
            eprintln!(
                "Ingested {} facts from {} files ({} failed): {} nodes, {} relationships",
                summary.facts,
                summary.files,
                summary.failed_files.len(),
                summary.graph.nodes,
                summary.graph.relationships
            );
            emit(&structure, projection.output.as_deref())
        }
        Command::Analyze { input } => {
            let processed = run_blocking(move || pipeline.analyze(&input)).await?;
            emit(&processed, None)
        }
        Command::Project { projection } => {
            let ProjectionArgs { output, .. } = &projection;
            let mode = projection.mode(limit);
            let structure = run_blocking(move || pipeline.project(mode)).await?;
            emit(&structure, output.as_deref())
        }
        Command::Reset => {
            let store = pipeline.config().store.clone();
            run_blocking(move || pipeline.reset()).await?;
            eprintln!("Cleared {}", store.display());
            Ok(())
        }
        Command::Dump => {
            let rows = run_blocking(move || pipeline.dump()).await?;
            emit(&rows, None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    run(Cli::parse()).await
}
