use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, JavaError>;

#[derive(Error, Debug)]
pub enum JavaError {
    #[error("Failed to load Java grammar: {0}")]
    Language(String),

    #[error("Failed to parse {origin}: {reason}")]
    Parse { origin: String, reason: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Fact sink rejected {fact}: {reason}")]
    Sink { fact: String, reason: String },
}
