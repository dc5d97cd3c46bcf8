//! Batch driver.
//!
//! Phase 1 parses every input and builds one declaration graph, then
//! partitions it into output files. Phase 2 emits the files in parallel
//! against the finished graph and writes them out. A failing input only
//! removes its own output; the batch always runs to the end.

use anyhow::{Context, Result};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, debug_span, warn};

use pxdgen_common::diagnostics::{DiagnosticMessage, diagnostic_messages};
use pxdgen_common::{Diagnostic, SourceLocation};
use pxdgen_emitter::{EmitOptions, EmittedFile, emit_file};
use pxdgen_model::{GraphBuilder, NodeStream, OutputLayout, Partition};

use crate::config::{InputMode, RunConfig};
use crate::fs::{discover_headers, origin_policy};
use crate::parser::{HeaderParser, ParseError, ParserBackend};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchInput {
    pub path: PathBuf,
    /// Directory mode only: the output path, relative to the output root.
    pub target: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub diagnostics: Vec<Diagnostic>,
    pub written: Vec<PathBuf>,
    /// Inputs that produced no declarations because they failed to parse.
    pub failed_inputs: Vec<PathBuf>,
    /// Rendered output when no output path was given.
    pub stdout: Option<String>,
}

impl BatchOutcome {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|diag| diag.is_error())
    }
}

pub fn collect_inputs(config: &RunConfig) -> Vec<BatchInput> {
    match &config.mode {
        InputMode::SingleFile { header } => vec![BatchInput {
            path: header.clone(),
            target: None,
        }],
        InputMode::Directory { root, pattern } => discover_headers(root, pattern)
            .into_iter()
            .map(|header| BatchInput {
                path: header.path,
                target: Some(header.relative.with_extension("pxd")),
            })
            .collect(),
    }
}

/// Run the batch with the parser backend the inputs need.
pub fn run(config: &RunConfig) -> Result<BatchOutcome> {
    let inputs = collect_inputs(config);
    let paths: Vec<PathBuf> = inputs.iter().map(|input| input.path.clone()).collect();
    let parser = ParserBackend::for_inputs(&config.parser, &paths)?;
    run_with_parser(config, &inputs, &parser)
}

pub fn run_with_parser(
    config: &RunConfig,
    inputs: &[BatchInput],
    parser: &dyn HeaderParser,
) -> Result<BatchOutcome> {
    let _span = debug_span!("batch", inputs = inputs.len()).entered();
    let mut outcome = BatchOutcome::default();

    // Phase 1: parse, build, partition.
    let parsed: Vec<Result<NodeStream, ParseError>> = inputs
        .par_iter()
        .map(|input| parser.parse(&input.path))
        .collect();

    let policy = origin_policy(&config.selection);
    let single_target = config
        .output
        .as_deref()
        .filter(|_| !config.is_directory_mode())
        .and_then(Path::file_name)
        .map(PathBuf::from);
    let mut builder = GraphBuilder::new();
    let mut targets = FxHashMap::default();

    for (input, result) in inputs.iter().zip(parsed) {
        let stream = match result {
            Ok(stream) => stream,
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                warn!(path = %input.path.display(), error = %err, "input failed to parse");
                outcome.diagnostics.push(input_diagnostic(
                    &input.path,
                    &diagnostic_messages::PARSE_ERROR,
                    &err.to_string(),
                ));
                outcome.failed_inputs.push(input.path.clone());
                continue;
            }
        };

        match builder.add_unit(stream, &*policy) {
            Ok(unit) => {
                if let Some(target) = input.target.clone().or_else(|| single_target.clone()) {
                    targets.insert(unit, target);
                }
            }
            Err(err) => {
                warn!(path = %input.path.display(), error = %err, "node stream rejected");
                outcome.diagnostics.push(input_diagnostic(
                    &input.path,
                    &diagnostic_messages::MALFORMED_NODE_STREAM,
                    &err.to_string(),
                ));
                outcome.failed_inputs.push(input.path.clone());
            }
        }
    }

    let graph = builder.finish();
    for unit in graph.units() {
        outcome
            .diagnostics
            .extend(graph.diagnostics_for(unit.id).cloned());
    }

    let layout = if config.is_directory_mode() {
        OutputLayout::PerHeader
    } else {
        OutputLayout::PerNamespace
    };
    let partition = Partition::build(&graph, layout, &targets);
    debug!(
        units = graph.units().len(),
        files = partition.files().len(),
        "phase 1 complete"
    );

    // Phase 2: emit every file against the read-only graph.
    let options = EmitOptions {
        generator: config.generator,
        include_roots: config.label_roots(),
    };
    let emitted: Vec<_> = partition
        .files()
        .par_iter()
        .map(|file| emit_file(&graph, &partition, file.id, &options))
        .collect();

    let mut files: Vec<EmittedFile> = Vec::with_capacity(emitted.len());
    for (file, result) in partition.files().iter().zip(emitted) {
        match result {
            Ok(emitted) => {
                outcome.diagnostics.extend(emitted.diagnostics.iter().cloned());
                files.push(emitted);
            }
            Err(err) => {
                let header = &graph.unit(file.unit).main_header;
                outcome.diagnostics.push(Diagnostic::from_message(
                    &SourceLocation::file_only(header.as_str()),
                    &diagnostic_messages::NAME_COLLISION,
                    &[err.to_string().as_str()],
                ));
            }
        }
    }

    match &config.output {
        None => outcome.stdout = Some(render_stdout(&files)),
        Some(output) => {
            let root = output_root(config, output);
            for file in &files {
                let path = root.join(&file.path);
                match write_output(&path, &file.text) {
                    Ok(()) => outcome.written.push(path),
                    Err(err) => outcome.diagnostics.push(Diagnostic::from_message(
                        &SourceLocation::file_only(path.display().to_string()),
                        &diagnostic_messages::OUTPUT_WRITE_FAILED,
                        &[
                            path.display().to_string().as_str(),
                            err.root_cause().to_string().as_str(),
                        ],
                    )),
                }
            }
        }
    }

    debug!(
        written = outcome.written.len(),
        failed = outcome.failed_inputs.len(),
        diagnostics = outcome.diagnostics.len(),
        "batch complete"
    );
    Ok(outcome)
}

/// Directory mode writes under `-o`; single-file mode next to the `-o` file.
fn output_root(config: &RunConfig, output: &Path) -> PathBuf {
    if config.is_directory_mode() {
        return output.to_path_buf();
    }
    output
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

fn write_output(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// A lone file is printed as is; several are each preceded by `# <path>`.
fn render_stdout(files: &[EmittedFile]) -> String {
    if let [file] = files {
        return file.text.clone();
    }
    files
        .iter()
        .map(|file| format!("# {}\n{}", file.path.display(), file.text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn input_diagnostic(path: &Path, message: &DiagnosticMessage, reason: &str) -> Diagnostic {
    let file = path.display().to_string();
    Diagnostic::from_message(&SourceLocation::file_only(file.as_str()), message, &[file.as_str(), reason])
}
