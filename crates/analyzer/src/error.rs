use archgraph_java::JavaError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Filter percentage must be within [0.0, 1.0], got {0}")]
    InvalidFilterPercentage(f64),

    #[error("Java front end error: {0}")]
    Java(#[from] JavaError),
}
