use crate::sources::SourceInput;
use archgraph_projector::ProjectionMode;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// archgraph: Java structure graphs from call frequencies
#[derive(Parser, Debug)]
#[command(name = "archgraph")]
#[command(version)]
#[command(
    about = "Build a structural graph of a Java codebase and project it to JSON",
    long_about = "archgraph counts how often each method of a Java codebase is called, keeps the\nmost called methods of every class, ingests classes, methods, calls, control flow,\nfields, inheritance and imports into a graph, and projects the most connected\nclasses as JSON.\n\nSettings come from archgraph.toml (next to the input or in the working directory)\nand ARCHGRAPH_* environment variables."
)]
pub struct Cli {
    /// Config file (default: archgraph.toml next to the input, then in the working directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Graph snapshot file
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Share of each class's methods dropped by the significance filter (0.0-1.0)
    #[arg(long, global = true)]
    pub filter_percentage: Option<f64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze, rebuild the graph, persist it and print the projection
    Build {
        /// Java file, source directory or git repository URL
        input: SourceInput,

        #[command(flatten)]
        projection: ProjectionArgs,
    },
    /// Print the filtered call-frequency map
    Analyze {
        /// Java file, source directory or git repository URL
        input: SourceInput,
    },
    /// Print the projection of the persisted graph
    Project {
        #[command(flatten)]
        projection: ProjectionArgs,
    },
    /// Delete every node and relationship of the persisted graph
    Reset,
    /// Print every relationship of the persisted graph
    Dump,
}

#[derive(Args, Debug, Default)]
pub struct ProjectionArgs {
    /// Number of most connected classes to include
    #[arg(long, conflicts_with = "all")]
    pub limit: Option<usize>,

    /// Include every class
    #[arg(long)]
    pub all: bool,

    /// Write the JSON here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl ProjectionArgs {
    pub fn mode(&self, default_limit: usize) -> ProjectionMode {
        if self.all {
            ProjectionMode::All
        } else {
            ProjectionMode::MostSignificant(self.limit.unwrap_or(default_limit))
        }
    }
}
