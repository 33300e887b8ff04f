use archgraph_graph::GraphError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProjectorError>;

#[derive(Error, Debug)]
pub enum ProjectorError {
    #[error("Graph store error: {0}")]
    Store(#[from] GraphError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
