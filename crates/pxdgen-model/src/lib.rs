//! Declaration model for pxdgen.
//!
//! Phase 1 of a run lives here: node streams from the external parser are
//! built into one [`DeclarationGraph`], indexed, and partitioned into
//! packages and output files. Everything this crate hands out is read-only
//! once [`GraphBuilder::finish`] returns.

pub mod builder;
pub use builder::{GraphBuilder, OriginFilter, OriginPolicy};

pub mod decl;
pub use decl::{
    DeclDetail, DeclFlags, DeclId, DeclKind, Declaration, EnumConstant, FunctionRole, FunctionSig,
    MacroValue, Namespace, NamespaceId, Parameter, UnitId,
};

pub mod error;
pub use error::ModelError;

pub mod graph;
pub use graph::{DeclarationGraph, UnitInfo};

pub mod index;
pub use index::SymbolIndex;

pub mod node;
pub use node::{Access, Language, NODE_STREAM_VERSION, NodeKind, NodeStream, RawNode};

pub mod partition;
pub use partition::{FileId, OutputFile, OutputLayout, Package, PackageId, Partition};

pub mod types;
pub use types::{
    BaseType, FunctionType, NameSegment, NamedType, Qualifier, QualifierChain, TagKind,
    TemplateArg, TypeRef,
};
