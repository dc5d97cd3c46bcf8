//! pxdgen: Cython `.pxd` declarations from C/C++ headers.
//!
//! The pipeline lives in the workspace crates; this crate re-exports them
//! under one name and owns process-wide logging setup.

// Diagnostics, locations, generator options and limits
pub use pxdgen_common as common;
pub use pxdgen_common::{Diagnostic, DiagnosticCategory, GeneratorFlags, GeneratorOptions};

// Phase 1 - node streams, declaration graph, packages and output files
pub use pxdgen_model as model;
pub use pxdgen_model::{DeclarationGraph, GraphBuilder, NodeStream, OutputLayout, Partition};

// Phase 2 - type resolution, imports and .pxd text
pub use pxdgen_emitter as emitter;
pub use pxdgen_emitter::{EmitOptions, EmittedFile, emit_file};

// Tracing subscriber setup (PXDGEN_LOG / PXDGEN_LOG_FORMAT / -v)
pub mod tracing_config;
