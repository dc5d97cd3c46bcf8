//! Tracing configuration for following a run.
//!
//! Supports three output formats controlled by `PXDGEN_LOG_FORMAT`:
//!
//! - `text` (default): Standard `tracing-subscriber` flat output
//! - `tree`: Hierarchical indented output via `tracing-tree`, handy for
//!   seeing which unit or output file an event belongs to
//! - `json`: One JSON object per span/event
//!
//! ## Quick start
//!
//! ```bash
//! # Phase summaries
//! pxdgen -v include/cxmem.h
//!
//! # Every resolved type, as a tree
//! PXDGEN_LOG=trace PXDGEN_LOG_FORMAT=tree pxdgen include/cxmem.h
//!
//! # Fine-grained filtering
//! PXDGEN_LOG="pxdgen_emitter=trace,pxdgen_model=debug" pxdgen -D include -o pxd
//! ```
//!
//! The subscriber is only initialised when `PXDGEN_LOG` (or `RUST_LOG`) is set
//! or `-v` is passed, so a quiet run pays nothing for logging.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Standard flat text lines (default).
    Text,
    /// Hierarchical indented tree via `tracing-tree`.
    Tree,
    /// Newline-delimited JSON objects.
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Parse from the `PXDGEN_LOG_FORMAT` environment variable.
    fn from_env() -> Self {
        Self::parse(&std::env::var("PXDGEN_LOG_FORMAT").unwrap_or_default())
    }
}

/// Filter directive implied by the number of `-v` flags.
pub fn verbosity_directive(verbosity: u8) -> Option<&'static str> {
    match verbosity {
        0 => None,
        1 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Build an `EnvFilter` from `PXDGEN_LOG`, then `RUST_LOG`, then `-v`.
fn build_filter(verbosity: u8) -> Option<EnvFilter> {
    if let Ok(val) = std::env::var("PXDGEN_LOG") {
        return Some(EnvFilter::builder().parse_lossy(val));
    }
    if std::env::var("RUST_LOG").is_ok() {
        return Some(EnvFilter::from_default_env());
    }
    verbosity_directive(verbosity).map(EnvFilter::new)
}

/// Initialise the global tracing subscriber.
///
/// Does nothing when neither variable is set and `verbosity` is zero. All
/// output goes to stderr so it never mixes with `.pxd` text on stdout.
pub fn init_tracing(verbosity: u8) {
    let Some(filter) = build_filter(verbosity) else {
        return;
    };

    match LogFormat::from_env() {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_span_retrace(true)
                .with_targets(true);

            Registry::default().with(filter).with(tree_layer).init();
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);

            Registry::default().with(filter).with(json_layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

#[cfg(test)]
#[path = "tests/tracing_config.rs"]
mod tests;
