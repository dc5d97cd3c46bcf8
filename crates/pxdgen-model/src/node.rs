//! Node stream schema.
//!
//! The external parser reports one translation unit as a flat, depth-first
//! list of nodes. Parents always precede their children; `parent` links a
//! node to its enclosing scope (absent for the translation unit itself).
//!
//! ```json
//! {
//!   "version": 1,
//!   "translation_unit": "include/cplusplus.hpp",
//!   "nodes": [
//!     { "id": 1, "kind": "namespace", "name": "Foo" },
//!     { "id": 2, "kind": "struct", "name": "B", "parent": 1 },
//!     { "id": 3, "kind": "typedef", "name": "Dataset", "parent": 2,
//!       "ty": { "base": { "named": { "name": "std::vector", "args": ["int"] } } } }
//!   ]
//! }
//! ```

use pxdgen_common::SourceLocation;
use serde::Deserialize;

use crate::types::TypeRef;

/// Schema version this crate understands.
pub const NODE_STREAM_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    C,
    Cpp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeStream {
    pub version: u32,
    pub translation_unit: String,
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub nodes: Vec<RawNode>,
}

impl NodeStream {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Language of the unit: as reported, or C++ when any C++-only node kind
    /// is present.
    pub fn detected_language(&self) -> Language {
        if let Some(language) = self.language {
            return language;
        }
        let cpp = self.nodes.iter().any(|node| {
            matches!(
                node.kind,
                NodeKind::Namespace
                    | NodeKind::Class
                    | NodeKind::ClassTemplate
                    | NodeKind::Method
                    | NodeKind::Constructor
            )
        });
        if cpp { Language::Cpp } else { Language::C }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Namespace,
    Struct,
    Class,
    ClassTemplate,
    Union,
    Enum,
    EnumConstant,
    Typedef,
    Function,
    Method,
    Constructor,
    Field,
    Variable,
    Parameter,
    Macro,
    /// Anything the parser reports that pxdgen has no use for.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Public,
    Protected,
    Private,
    #[default]
    None,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawNode {
    pub id: u32,
    pub kind: NodeKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent: Option<u32>,
    /// Field/variable type, typedef target, or function return type.
    #[serde(default)]
    pub ty: Option<TypeRef>,
    #[serde(default)]
    pub location: SourceLocation,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub template_params: Vec<String>,
    /// Enum constant value, present only when written in source.
    #[serde(default)]
    pub value: Option<i64>,
    #[serde(default = "default_true")]
    pub is_definition: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_const: bool,
    #[serde(default)]
    pub is_variadic: bool,
    #[serde(default)]
    pub throws: bool,
    #[serde(default)]
    pub has_default: bool,
    #[serde(default)]
    pub is_function_like: bool,
    /// Macro replacement text.
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_system: bool,
}
