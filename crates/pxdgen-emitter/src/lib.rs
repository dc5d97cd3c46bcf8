//! Phase 2 of a run: resolve and print one output file at a time.
//!
//! Every function here reads the finished [`DeclarationGraph`] and
//! [`Partition`] and keeps its own state, so files can be emitted in
//! parallel and in any order with identical results.

use std::path::PathBuf;

use pxdgen_common::{Diagnostic, GeneratorOptions};
use pxdgen_model::{DeclarationGraph, FileId, Partition};
use tracing::debug;

pub mod declaration_emitter;
pub use declaration_emitter::{DeclarationEmitter, IMPORT_SECTION_MARKER, STUB_SECTION_MARKER};

pub mod imports;
pub use imports::{ImportEdge, ImportResolver, NameCollisionError};

mod order;

pub mod resolver;
pub use resolver::{
    FileResolution, Resolution, ResolvedType, SlotPosition, StubKind, StubPlaceholder,
    TypeResolver, TypeSlot,
};

pub mod std_types;

pub mod type_printer;

#[derive(Debug, Clone, Default)]
pub struct EmitOptions {
    pub generator: GeneratorOptions,
    /// Directories origin headers are labelled relative to, in order.
    pub include_roots: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct EmittedFile {
    pub file: FileId,
    /// Relative to the output root.
    pub path: PathBuf,
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolve and print `file`.
///
/// Fails only when an alias cannot be made unique; every other problem is
/// reported as a diagnostic next to best-effort output.
pub fn emit_file(
    graph: &DeclarationGraph,
    partition: &Partition,
    file: FileId,
    options: &EmitOptions,
) -> Result<EmittedFile, NameCollisionError> {
    let resolution = TypeResolver::new(graph, partition, file, options.generator).resolve_file()?;
    let (text, emitter_diagnostics) =
        DeclarationEmitter::new(graph, partition, &resolution, options).emit(file);

    let mut diagnostics = resolution.diagnostics.clone();
    diagnostics.extend(emitter_diagnostics);

    let output = partition.file(file);
    debug!(path = %output.path.display(), bytes = text.len(), "emitted output file");
    Ok(EmittedFile {
        file,
        path: output.path.clone(),
        text,
        diagnostics,
    })
}
