//! # archgraph java
//!
//! Java structure extraction with tree-sitter.
//!
//! ```text
//! source ──> JavaParser ──> CompilationUnit (types, methods, call sites, control flow)
//!                               │
//!                               ├──> JavaFactProvider ──> Fact stream ──> FactSink
//!                               └──> signature::method_signature (shared with the analyzer)
//! ```

mod config;
mod error;
mod model;
mod parser;
mod provider;
pub mod signature;

pub use config::ExtractionConfig;
pub use error::{JavaError, Result};
pub use model::{
    ArgType, CallSite, CompilationUnit, ControlFlowEntry, FieldDecl, Import, LocalVar, MethodDecl,
    Param, Receiver, TypeDecl, TypeKind, Visibility,
};
pub use parser::JavaParser;
pub use provider::{JavaFactProvider, SignificantMethods};
