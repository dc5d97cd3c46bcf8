//! Declarations of the graph.

use bitflags::bitflags;
use pxdgen_common::SourceLocation;

use crate::node::Access;
use crate::types::TypeRef;

/// Index of a declaration in [`crate::DeclarationGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

impl DeclId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a namespace in [`crate::DeclarationGraph`]. `GLOBAL` is the
/// unnamed namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(pub u32);

impl NamespaceId {
    pub const GLOBAL: NamespaceId = NamespaceId(0);
}

/// One parsed translation unit (an input header).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Struct,
    Union,
    Enum,
    Class,
    /// A class template. Its parameters live in `Declaration::template_params`.
    Template,
    Typedef,
    Function,
    Variable,
    Macro,
}

impl DeclKind {
    pub fn is_aggregate(self) -> bool {
        matches!(
            self,
            DeclKind::Struct | DeclKind::Union | DeclKind::Enum | DeclKind::Class | DeclKind::Template
        )
    }

    /// Kinds that can be named by a type reference.
    pub fn is_type(self) -> bool {
        self.is_aggregate() || self == DeclKind::Typedef
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeclKind::Struct => "struct",
            DeclKind::Union => "union",
            DeclKind::Enum => "enum",
            DeclKind::Class => "class",
            DeclKind::Template => "class template",
            DeclKind::Typedef => "typedef",
            DeclKind::Function => "function",
            DeclKind::Variable => "variable",
            DeclKind::Macro => "macro",
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DeclFlags: u16 {
        /// Declaration has a body (not a forward declaration).
        const DEFINITION = 1 << 0;
        /// Name was synthesized for an anonymous aggregate.
        const ANONYMOUS = 1 << 1;
        /// Aggregate absorbed a typedef naming it; emitted with `ctypedef`.
        const TYPEDEF_NAME = 1 << 2;
        /// Static member function or static data member.
        const STATIC = 1 << 3;
        /// Struct that has to be emitted as a C++ class (methods, nested
        /// types or template parameters).
        const CPP_CLASS = 1 << 4;
        /// Origin is a system header.
        const SYSTEM = 1 << 5;
        /// Const member function.
        const CONST_METHOD = 1 << 6;
        /// Function may throw (not `noexcept`).
        const THROWS = 1 << 7;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionRole {
    Free,
    Method,
    Constructor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeRef,
    pub has_default: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSig {
    pub role: FunctionRole,
    pub ret: Option<TypeRef>,
    pub params: Vec<Parameter>,
    pub variadic: bool,
}

impl FunctionSig {
    /// Index of the first parameter with a default value, or the parameter
    /// count when there is none.
    pub fn first_default(&self) -> usize {
        self.params
            .iter()
            .position(|p| p.has_default)
            .unwrap_or(self.params.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumConstant {
    pub name: String,
    pub value: i64,
    /// Whether the value was written in source.
    pub explicit: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MacroValue {
    Integer,
    Float,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclDetail {
    /// Struct, union, class or class template.
    Aggregate,
    Enum { constants: Vec<EnumConstant> },
    Typedef { target: TypeRef },
    Function(FunctionSig),
    Variable { ty: TypeRef },
    Macro { value: MacroValue, function_like: bool },
}

#[derive(Debug, Clone)]
pub struct Declaration {
    pub id: DeclId,
    pub kind: DeclKind,
    /// Simple name. Synthetic for anonymous aggregates.
    pub name: String,
    /// Enclosing declaration (class or struct), if any.
    pub parent: Option<DeclId>,
    /// Innermost enclosing namespace. Class nesting does not change it.
    pub namespace: NamespaceId,
    /// Translation unit that first reported this declaration.
    pub unit: UnitId,
    pub access: Access,
    pub location: SourceLocation,
    pub children: Vec<DeclId>,
    pub template_params: Vec<String>,
    pub flags: DeclFlags,
    pub detail: DeclDetail,
}

impl Declaration {
    pub fn is_definition(&self) -> bool {
        self.flags.contains(DeclFlags::DEFINITION)
    }

    pub fn is_anonymous(&self) -> bool {
        self.flags.contains(DeclFlags::ANONYMOUS)
    }

    pub fn is_private(&self) -> bool {
        self.access == Access::Private
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(DeclFlags::STATIC)
    }

    pub fn function(&self) -> Option<&FunctionSig> {
        match &self.detail {
            DeclDetail::Function(sig) => Some(sig),
            _ => None,
        }
    }

    /// Whether members declared inside this declaration stay nested in the
    /// output. C structs and unions cannot nest declarations, so their inner
    /// types are hoisted next to them instead.
    pub fn nests_children(&self) -> bool {
        match self.kind {
            DeclKind::Class | DeclKind::Template => true,
            DeclKind::Struct => self.flags.contains(DeclFlags::CPP_CLASS),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Namespace {
    pub id: NamespaceId,
    /// Path segments, empty for the global namespace.
    pub path: Vec<String>,
    pub parent: Option<NamespaceId>,
}

impl Namespace {
    pub fn qualified_name(&self) -> String {
        self.path.join("::")
    }

    pub fn is_global(&self) -> bool {
        self.path.is_empty()
    }
}
