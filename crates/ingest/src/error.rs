use crate::facts::Fact;
use archgraph_graph::GraphError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to write {fact}: {source}")]
    Write {
        fact: Box<Fact>,
        #[source]
        source: GraphError,
    },

    #[error("Graph store unavailable: {0}")]
    Connectivity(#[source] GraphError),
}

impl IngestError {
    /// Classify a store error raised while writing `fact`
    pub(crate) fn from_store(fact: &Fact, source: GraphError) -> Self {
        if source.is_connectivity() {
            Self::Connectivity(source)
        } else {
            Self::Write {
                fact: Box::new(fact.clone()),
                source,
            }
        }
    }

    /// Whether the run must stop
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }

    #[must_use]
    pub fn fact(&self) -> Option<&Fact> {
        match self {
            Self::Write { fact, .. } => Some(fact),
            Self::Connectivity(_) => None,
        }
    }
}
