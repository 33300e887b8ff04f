//! # archgraph analyzer
//!
//! Counts how often each project method is called and keeps the most called
//! methods of every class.
//!
//! ```text
//! .java files ──> CallFrequencyAnalyzer ──(rayon, one CallResolver per worker)──> FileCallCounts*
//!                        │                                                           │
//!                 ResolutionScope                                              ResultAggregator
//!          (SourceDirContext per dir + builtins)                           merge ──> per-class filter
//!                                                                                    │
//!                                                                           ProcessedCallCounts
//! ```

mod aggregate;
mod context;
mod error;
mod frequency;
mod resolve;
mod scope;

pub use aggregate::{
    declaring_class, ProcessedCallCounts, ResultAggregator, DEFAULT_FILTER_PERCENTAGE,
};
pub use context::{
    BuiltinContext, BuiltinMethod, BuiltinType, ResolutionContext, SourceDirContext, TypeInfo,
};
pub use error::{AnalyzerError, Result};
pub use frequency::{CallCounts, CallFrequencyAnalyzer, FileCallCounts, DEFAULT_STD_PREFIXES};
pub use resolve::{CallResolver, CallScope, Resolution};
pub use scope::ResolutionScope;
