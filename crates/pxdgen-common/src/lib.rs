//! Common types and utilities for pxdgen.
//!
//! This crate provides foundational types used across all pxdgen crates:
//! - Diagnostics (`Diagnostic`, `DiagnosticCategory`, diagnostic codes)
//! - Source locations reported by the external header parser
//! - Generator options (the closed set of `-f` flags)
//! - Generator limits and thresholds

// Diagnostics - file-scoped warnings and errors collected during a batch
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticRelatedInformation};

// Centralized limits and thresholds
pub mod limits;

// Generator options - enumerated flags, unknown keys are rejected
pub mod options;
pub use options::{GeneratorFlags, GeneratorOptions, UnknownOptionError};

// Position types for line/column source locations
pub mod position;
pub use position::SourceLocation;
