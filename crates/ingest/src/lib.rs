//! # archgraph ingest
//!
//! Consumes structural facts (classes, methods, calls, control flow,
//! inheritance, fields, imports) and writes them to a [`GraphStore`] as
//! idempotent create-if-absent transactions.
//!
//! ```text
//! Fact ──> GraphIngestor::ingest ──> WriteTx ──> GraphStore::apply
//!                                     ├─ merge endpoint nodes
//!                                     └─ merge relationship
//! ```
//!
//! [`GraphStore`]: archgraph_graph::GraphStore

mod error;
mod facts;
mod ingestor;

pub use error::{IngestError, Result};
pub use facts::{Fact, FactSink};
pub use ingestor::{GraphIngestor, IngestFailure, IngestMode, IngestReport, MethodKeying};
