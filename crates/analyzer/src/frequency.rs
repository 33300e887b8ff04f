use crate::resolve::{CallResolver, CallScope, Resolution};
use crate::scope::ResolutionScope;
use archgraph_java::{CompilationUnit, JavaParser};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Qualified method signature to call-site count
pub type CallCounts = BTreeMap<String, usize>;

/// Signature prefixes treated as standard library
pub const DEFAULT_STD_PREFIXES: &[&str] = &["java.", "javax."];

/// Call counts of one analyzed file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCallCounts {
    pub path: PathBuf,
    pub counts: CallCounts,
    /// Call sites that could not be resolved
    pub unresolved: usize,
    /// Resolved call sites dropped as standard library
    pub excluded: usize,
    /// Set when the file could not be read or parsed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileCallCounts {
    fn failed(path: &Path, error: String) -> Self {
        Self {
            path: path.to_path_buf(),
            error: Some(error),
            ..Self::default()
        }
    }
}

/// Counts how often each project method is called across a corpus
#[derive(Debug, Clone)]
pub struct CallFrequencyAnalyzer {
    std_prefixes: Vec<String>,
}

impl Default for CallFrequencyAnalyzer {
    fn default() -> Self {
        Self {
            std_prefixes: DEFAULT_STD_PREFIXES.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

struct Worker {
    parser: Option<JavaParser>,
    resolver: CallResolver,
}

impl CallFrequencyAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_std_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.std_prefixes = prefixes;
        self
    }

    #[must_use]
    pub fn std_prefixes(&self) -> &[String] {
        &self.std_prefixes
    }

    fn is_std(&self, signature: &str) -> bool {
        self.std_prefixes.iter().any(|p| signature.starts_with(p))
    }

    /// Corpus-wide counts for `files`, resolved against `root`
    pub fn analyze(&self, files: &[PathBuf], root: &Path) -> CallCounts {
        let mut total = CallCounts::new();
        for file in self.analyze_files(files, root) {
            for (signature, count) in file.counts {
                *total.entry(signature).or_insert(0) += count;
            }
        }
        total
    }

    /// One [`FileCallCounts`] per input file, in input order
    pub fn analyze_files(&self, files: &[PathBuf], root: &Path) -> Vec<FileCallCounts> {
        let scope = ResolutionScope::discover(root, files);
        info!(
            "Analyzing call frequencies in {} files ({} lookup directories)",
            files.len(),
            scope.roots().len()
        );

        let results: Vec<FileCallCounts> = files
            .par_iter()
            .map_init(
                || Worker {
                    parser: JavaParser::new()
                        .map_err(|e| warn!("Java parser unavailable: {e}"))
                        .ok(),
                    resolver: CallResolver::for_scope(&scope),
                },
                |worker, path| self.analyze_file(worker, path),
            )
            .collect();

        let failed = results.iter().filter(|r| r.error.is_some()).count();
        let unresolved: usize = results.iter().map(|r| r.unresolved).sum();
        info!(
            "Call frequency analysis done: {} files, {} failed, {} unresolved call sites",
            results.len(),
            failed,
            unresolved
        );
        results
    }

    fn analyze_file(&self, worker: &mut Worker, path: &Path) -> FileCallCounts {
        let Some(parser) = worker.parser.as_mut() else {
            return FileCallCounts::failed(path, "Java parser unavailable".to_string());
        };
        let unit = match parser.parse_file(path) {
            Ok(unit) => Arc::new(unit),
            Err(err) => {
                warn!("Skipping {}: {err}", path.display());
                return FileCallCounts::failed(path, err.to_string());
            }
        };
        self.count_unit(&mut worker.resolver, &unit, path)
    }

    /// Count the resolved call sites of an already parsed unit
    pub fn count_unit(
        &self,
        resolver: &mut CallResolver,
        unit: &Arc<CompilationUnit>,
        path: &Path,
    ) -> FileCallCounts {
        let mut result = FileCallCounts {
            path: path.to_path_buf(),
            ..FileCallCounts::default()
        };

        for (index, decl) in unit.types.iter().enumerate() {
            for method in decl.bodies() {
                let scope = CallScope {
                    unit,
                    index,
                    method,
                };
                for call in &method.calls {
                    match resolver.resolve(scope, call) {
                        Resolution::Resolved(signature) if self.is_std(&signature) => {
                            result.excluded += 1;
                        }
                        Resolution::Resolved(signature) => {
                            *result.counts.entry(signature).or_insert(0) += 1;
                        }
                        Resolution::Unresolved(reason) => {
                            debug!(
                                "Failed to resolve {}.{}() at {}:{} - {reason}",
                                decl.name,
                                call.name,
                                path.display(),
                                call.line
                            );
                            result.unresolved += 1;
                        }
                    }
                }
            }
        }
        result
    }
}
