use crate::error::{AnalyzerError, Result};
use crate::frequency::{CallCounts, FileCallCounts};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Default share of each class's methods that is dropped
pub const DEFAULT_FILTER_PERCENTAGE: f64 = 0.5;

/// Merged and filtered counts of a whole corpus
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedCallCounts {
    /// Every input file, including the ones that failed
    pub files: Vec<PathBuf>,
    pub counts: CallCounts,
}

/// Merges per-file counts and keeps each class's most called methods
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultAggregator {
    filter_percentage: f64,
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self {
            filter_percentage: DEFAULT_FILTER_PERCENTAGE,
        }
    }
}

impl ResultAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter_percentage(mut self, percentage: f64) -> Result<Self> {
        self.set_filter_percentage(percentage)?;
        Ok(self)
    }

    /// Rejects NaN and anything outside `[0.0, 1.0]`
    pub fn set_filter_percentage(&mut self, percentage: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&percentage) {
            return Err(AnalyzerError::InvalidFilterPercentage(percentage));
        }
        self.filter_percentage = percentage;
        Ok(())
    }

    #[must_use]
    pub const fn filter_percentage(&self) -> f64 {
        self.filter_percentage
    }

    /// Merge every file's counts, then filter the result
    #[must_use]
    pub fn process(&self, results: Vec<FileCallCounts>) -> ProcessedCallCounts {
        let mut files = Vec::with_capacity(results.len());
        let mut maps = Vec::with_capacity(results.len());
        for result in results {
            files.push(result.path);
            maps.push(result.counts);
        }

        let merged = Self::merge(maps);
        let counts = self.filter(merged);
        info!(
            "Aggregated {} files into {} significant methods",
            files.len(),
            counts.len()
        );
        ProcessedCallCounts { files, counts }
    }

    /// Sum counts of identical signatures
    #[must_use]
    pub fn merge<I>(maps: I) -> CallCounts
    where
        I: IntoIterator<Item = CallCounts>,
    {
        let mut merged = CallCounts::new();
        for map in maps {
            for (signature, count) in map {
                *merged.entry(signature).or_insert(0) += count;
            }
        }
        merged
    }

    /// Keep `max(1, ceil(N * (1 - p)))` methods per declaring class
    #[must_use]
    pub fn filter(&self, counts: CallCounts) -> CallCounts {
        if self.filter_percentage <= 0.0 {
            return counts;
        }

        let mut by_class: BTreeMap<String, Vec<(String, usize)>> = BTreeMap::new();
        for (signature, count) in counts {
            by_class
                .entry(declaring_class(&signature).to_string())
                .or_default()
                .push((signature, count));
        }

        let mut kept = CallCounts::new();
        for (class, mut methods) in by_class {
            let keep = keep_count(methods.len(), self.filter_percentage);
            methods.sort_by(|(sig_a, count_a), (sig_b, count_b)| {
                count_b.cmp(count_a).then_with(|| sig_a.cmp(sig_b))
            });
            debug!("{class}: keeping {keep} of {} methods", methods.len());
            kept.extend(methods.into_iter().take(keep));
        }
        kept
    }
}

fn keep_count(total: usize, percentage: f64) -> usize {
    // Epsilon absorbs float noise such as 10 * 0.7 = 7.000000000000001
    let raw = (total as f64 * (1.0 - percentage) - 1e-9).ceil();
    (raw.max(0.0) as usize).clamp(1, total.max(1))
}

/// `com.a.B.m(int)` belongs to `com.a.B`
#[must_use]
pub fn declaring_class(signature: &str) -> &str {
    let head = signature.split_once('(').map_or(signature, |(head, _)| head);
    head.rsplit_once('.').map_or("", |(class, _)| class)
}
