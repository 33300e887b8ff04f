use crate::config::AppConfig;
use crate::sources::{collect_java_files, source_root, Checkout, SourceInput};
use anyhow::{Context, Result};
use archgraph_analyzer::{CallFrequencyAnalyzer, ProcessedCallCounts};
use archgraph_graph::{GraphCounts, GraphStore, MemoryGraphStore, TraversalRow};
use archgraph_ingest::{Fact, GraphIngestor, IngestMode, IngestReport};
use archgraph_java::{JavaFactProvider, SignificantMethods};
use archgraph_projector::{GraphProjector, ProjectionMode, SystemStructure};
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Summary of a `build` run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSummary {
    pub files: usize,
    pub failed_files: Vec<PathBuf>,
    pub significant_methods: usize,
    pub facts: usize,
    pub nodes_created: usize,
    pub relationships_created: usize,
    pub ingest_failures: usize,
    pub graph: GraphCounts,
}

/// Analyze, ingest and project, against the store named by the config
pub struct Pipeline {
    config: AppConfig,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn open_store(&self) -> Result<Arc<MemoryGraphStore>> {
        let store = MemoryGraphStore::open(&self.config.store)
            .with_context(|| format!("Failed to open graph store {}", self.config.store.display()))?;
        Ok(Arc::new(store))
    }

    fn sources(&self, input: &Path) -> Result<Vec<PathBuf>> {
        let exclude = self.config.exclude_set()?;
        let files = collect_java_files(input, &exclude)?;
        info!("Found {} Java files under {}", files.len(), input.display());
        Ok(files)
    }

    /// Merged and filtered call frequencies of `input`
    pub fn analyze(&self, input: &SourceInput) -> Result<ProcessedCallCounts> {
        let checkout = Checkout::open(input)?;
        let files = self.sources(checkout.path())?;
        self.analyze_files(&files, &source_root(checkout.path()))
    }

    fn analyze_files(&self, files: &[PathBuf], root: &Path) -> Result<ProcessedCallCounts> {
        let analyzer =
            CallFrequencyAnalyzer::new().with_std_prefixes(self.config.std_prefixes.clone());
        let results = analyzer.analyze_files(files, root);
        Ok(self.config.aggregator()?.process(results))
    }

    /// Rebuild the graph from `input` and persist it
    pub fn build(&self, input: &SourceInput) -> Result<BuildSummary> {
        let checkout = Checkout::open(input)?;
        let files = self.sources(checkout.path())?;
        let processed = self.analyze_files(&files, &source_root(checkout.path()))?;
        let significant: SignificantMethods = processed.counts.keys().cloned().collect();
        let significant_methods = significant.len();
        info!("{significant_methods} significant methods");

        let mut provider = JavaFactProvider::new(self.config.extraction)
            .context("Failed to initialize the Java parser")?
            .with_significant_methods(significant);
        let mut facts: Vec<Fact> = Vec::new();
        let mut failed_files = Vec::new();
        for file in &files {
            if let Err(err) = provider.emit_file(file, &mut facts) {
                warn!("Skipping {}: {err}", file.display());
                failed_files.push(file.clone());
            }
        }

        let store = self.open_store()?;
        let ingestor =
            GraphIngestor::new(store.clone()).with_method_keying(self.config.method_keying);
        ingestor.reset().context("Failed to reset graph store")?;
        let report: IngestReport = ingestor
            .ingest_all(&facts, IngestMode::BestEffort)
            .context("Graph store became unavailable during ingestion")?;
        for failure in &report.failures {
            warn!("Not ingested: {} ({})", failure.fact, failure.error);
        }
        store.persist().context("Failed to persist graph store")?;

        Ok(BuildSummary {
            files: files.len(),
            failed_files,
            significant_methods,
            facts: facts.len(),
            nodes_created: report.nodes_created,
            relationships_created: report.relationships_created,
            ingest_failures: report.failures.len(),
            graph: store.counts()?,
        })
    }

    pub fn project(&self, mode: ProjectionMode) -> Result<SystemStructure> {
        let store = self.open_store()?;
        let mut projector = GraphProjector::new(store);
        if let Some(name) = &self.config.system_name {
            projector = projector.with_system_name(name.clone());
        }
        Ok(projector.project(mode)?)
    }

    /// Clear the persisted graph
    pub fn reset(&self) -> Result<()> {
        let store = self.open_store()?;
        GraphIngestor::new(store.clone())
            .reset()
            .context("Failed to reset graph store")?;
        store.persist().context("Failed to persist graph store")?;
        Ok(())
    }

    pub fn dump(&self) -> Result<Vec<TraversalRow>> {
        Ok(self.open_store()?.traverse()?)
    }
}

/// Run blocking pipeline work off the async runtime
pub async fn run_blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .context("Pipeline task panicked")?
}
