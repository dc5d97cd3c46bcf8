use std::fmt;

use crate::node::NODE_STREAM_VERSION;

/// A node stream that cannot be turned into declarations. Scoped to the one
/// translation unit that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    UnsupportedVersion { found: u32 },
    DanglingParent { node: u32, parent: u32 },
    MissingType { node: u32, name: String },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::UnsupportedVersion { found } => write!(
                f,
                "node stream version {found} is not supported (expected {NODE_STREAM_VERSION})"
            ),
            ModelError::DanglingParent { node, parent } => {
                write!(f, "node {node} refers to unknown parent {parent}")
            }
            ModelError::MissingType { node, name } => {
                write!(f, "node {node} ('{name}') has no type descriptor")
            }
        }
    }
}

impl std::error::Error for ModelError {}
