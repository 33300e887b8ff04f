use archgraph_analyzer::{ResultAggregator, DEFAULT_FILTER_PERCENTAGE, DEFAULT_STD_PREFIXES};
use archgraph_ingest::MethodKeying;
use archgraph_java::ExtractionConfig;
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "archgraph.toml";
pub const DEFAULT_STORE_PATH: &str = ".archgraph/graph.json";
pub const DEFAULT_LIMIT: usize = 10;

pub const ENV_FILTER_PERCENTAGE: &str = "ARCHGRAPH_FILTER_PERCENTAGE";
pub const ENV_STORE: &str = "ARCHGRAPH_STORE";
pub const ENV_LIMIT: &str = "ARCHGRAPH_LIMIT";
pub const ENV_SYSTEM_NAME: &str = "ARCHGRAPH_SYSTEM_NAME";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {name}: {value:?}")]
    Env { name: &'static str, value: String },

    #[error("filter_percentage must be within [0.0, 1.0], got {0}")]
    FilterPercentage(f64),

    #[error("Invalid exclude pattern {pattern:?}: {source}")]
    Exclude {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Settings shared by every subcommand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Share of each class's methods dropped by the significance filter
    pub filter_percentage: f64,
    /// Graph snapshot file
    pub store: PathBuf,
    /// Classes in a `project` or `build` projection
    pub limit: usize,
    pub system_name: Option<String>,
    pub method_keying: MethodKeying,
    /// Signature prefixes excluded from call counting
    pub std_prefixes: Vec<String>,
    /// Globs, relative to the input directory, of sources to skip
    pub exclude: Vec<String>,
    pub extraction: ExtractionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            filter_percentage: DEFAULT_FILTER_PERCENTAGE,
            store: PathBuf::from(DEFAULT_STORE_PATH),
            limit: DEFAULT_LIMIT,
            system_name: None,
            method_keying: MethodKeying::default(),
            std_prefixes: DEFAULT_STD_PREFIXES.iter().map(|p| (*p).to_string()).collect(),
            exclude: Vec::new(),
            extraction: ExtractionConfig::default(),
        }
    }
}

impl AppConfig {
    /// Build the effective config: file (explicit, or found next to the input,
    /// or in the working directory), then `ARCHGRAPH_*` overrides, then validation.
    pub fn load(explicit: Option<&Path>, input: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => discover(input),
        };
        let mut config = match &path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded config from {}", path.display());
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_FILTER_PERCENTAGE) {
            self.filter_percentage = parse_env(ENV_FILTER_PERCENTAGE, value)?;
        }
        if let Some(value) = lookup(ENV_STORE).filter(|v| !v.trim().is_empty()) {
            self.store = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_LIMIT) {
            self.limit = parse_env(ENV_LIMIT, value)?;
        }
        if let Some(value) = lookup(ENV_SYSTEM_NAME) {
            self.system_name = Some(value).filter(|v| !v.trim().is_empty());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.aggregator()?;
        self.exclude_set()?;
        Ok(())
    }

    /// Aggregator configured with this filter percentage
    pub fn aggregator(&self) -> Result<ResultAggregator, ConfigError> {
        ResultAggregator::new()
            .with_filter_percentage(self.filter_percentage)
            .map_err(|_| ConfigError::FilterPercentage(self.filter_percentage))
    }

    pub fn exclude_set(&self) -> Result<GlobSet, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude {
            let glob = Glob::new(pattern).map_err(|source| ConfigError::Exclude {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|source| ConfigError::Exclude {
            pattern: self.exclude.join(", "),
            source,
        })
    }
}

fn discover(input: Option<&Path>) -> Option<PathBuf> {
    let input_dir = input.map(|input| {
        if input.is_dir() {
            input.to_path_buf()
        } else {
            input.parent().map(Path::to_path_buf).unwrap_or_default()
        }
    });
    input_dir
        .into_iter()
        .chain(std::env::current_dir().ok())
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { name, value })
}
