//! Structured type descriptors.
//!
//! A [`TypeRef`] is a base type plus a qualifier chain. The chain is stored
//! innermost-first: `const char**` is base `char` (const) with chain
//! `[Pointer, Pointer]`, and `int* arr[3]` is base `int` with chain
//! `[Pointer, Array(3)]`. Function-pointer types keep their whole signature
//! in a single [`FunctionType`] base, so `int (**f)(double)` is base
//! `Function { ret: int, params: [double] }` with chain `[Pointer, Pointer]`.
//!
//! Descriptors are deserialized from the node stream. Besides the full
//! object form, a plain string is accepted as shorthand for simple named
//! types (`"const char*"`, `"Foo::B::Dataset"`, `"size_t&"`).

use serde::Deserialize;
use smallvec::SmallVec;

use crate::decl::DeclId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qualifier {
    Pointer {
        #[serde(default)]
        is_const: bool,
    },
    LvalueRef,
    RvalueRef,
    /// Array with an optional fixed length (`int[]` has none).
    Array(Option<u64>),
}

impl Qualifier {
    pub const POINTER: Qualifier = Qualifier::Pointer { is_const: false };

    pub fn is_pointer(self) -> bool {
        matches!(self, Qualifier::Pointer { .. })
    }
}

pub type QualifierChain = SmallVec<[Qualifier; 2]>;

/// Elaborated tag written before a type name (`struct foo`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    Struct,
    Class,
    Union,
    Enum,
}

impl TagKind {
    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "struct" => Some(TagKind::Struct),
            "class" => Some(TagKind::Class),
            "union" => Some(TagKind::Union),
            "enum" => Some(TagKind::Enum),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TemplateArg {
    Type(TypeRef),
    Value(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NameSegment {
    pub name: String,
    pub args: Vec<TemplateArg>,
}

impl NameSegment {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }
}

/// A reference to a named type: builtin, library, declared in the graph, or
/// unknown.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "NamedTypeRepr")]
pub struct NamedType {
    pub segments: Vec<NameSegment>,
    /// Node id of the declaration as reported by the parser, if it saw one.
    pub decl: Option<u32>,
    /// Declaration in the graph this name is bound to. Filled by the builder.
    pub target: Option<DeclId>,
    /// Size in bytes, used for opaque placeholders.
    pub size: Option<u64>,
    pub tag: Option<TagKind>,
}

impl NamedType {
    pub fn from_path(path: &str) -> Self {
        NamedTypeRepr {
            name: TypeNameRepr::Text(path.to_string()),
            args: Vec::new(),
            decl: None,
            size: None,
            tag: None,
        }
        .into()
    }

    /// `Foo::B::Dataset`, without template arguments.
    pub fn qualified_name(&self) -> String {
        let names: Vec<&str> = self.segments.iter().map(|s| s.name.as_str()).collect();
        names.join("::")
    }

    pub fn last_name(&self) -> &str {
        self.segments.last().map(|s| s.name.as_str()).unwrap_or("")
    }

    pub fn is_single(&self) -> bool {
        self.segments.len() == 1 && self.segments[0].args.is_empty()
    }
}

#[derive(Deserialize)]
struct NamedTypeRepr {
    name: TypeNameRepr,
    #[serde(default)]
    args: Vec<TemplateArg>,
    #[serde(default)]
    decl: Option<u32>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    tag: Option<TagKind>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TypeNameRepr {
    Text(String),
    Segments(Vec<SegmentRepr>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SegmentRepr {
    Text(String),
    Full {
        name: String,
        #[serde(default)]
        args: Vec<TemplateArg>,
    },
}

impl From<NamedTypeRepr> for NamedType {
    fn from(repr: NamedTypeRepr) -> Self {
        let mut tag = repr.tag;
        let mut segments: Vec<NameSegment> = match repr.name {
            TypeNameRepr::Text(text) => {
                let mut text = text.trim();
                if let Some((keyword, rest)) = text.split_once(' ') {
                    if let Some(kind) = TagKind::from_keyword(keyword) {
                        tag = tag.or(Some(kind));
                        text = rest.trim();
                    } else if keyword == "typename" {
                        text = rest.trim();
                    }
                }
                text.trim_start_matches("::")
                    .split("::")
                    .map(NameSegment::plain)
                    .collect()
            }
            TypeNameRepr::Segments(parts) => parts
                .into_iter()
                .map(|part| match part {
                    SegmentRepr::Text(name) => NameSegment::plain(name),
                    SegmentRepr::Full { name, args } => NameSegment { name, args },
                })
                .collect(),
        };
        if !repr.args.is_empty() {
            if let Some(last) = segments.last_mut() {
                if last.args.is_empty() {
                    last.args = repr.args;
                }
            }
        }
        NamedType {
            segments,
            decl: repr.decl,
            target: None,
            size: repr.size,
            tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FunctionType {
    pub ret: TypeRef,
    #[serde(default)]
    pub params: Vec<TypeRef>,
    #[serde(default)]
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseType {
    Named(NamedType),
    Function(Box<FunctionType>),
    /// A name that matched an enclosing template parameter. Emitted verbatim.
    TemplateParam(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "TypeRefRepr")]
pub struct TypeRef {
    pub base: BaseType,
    /// Const-ness of the base type itself.
    pub is_const: bool,
    /// Innermost-first qualifier chain.
    pub chain: QualifierChain,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TypeRefRepr {
    Spelled(String),
    Full {
        base: BaseType,
        #[serde(default)]
        is_const: bool,
        #[serde(default)]
        chain: QualifierChain,
    },
}

impl From<TypeRefRepr> for TypeRef {
    fn from(repr: TypeRefRepr) -> Self {
        match repr {
            TypeRefRepr::Spelled(text) => TypeRef::spelled(&text),
            TypeRefRepr::Full {
                base,
                is_const,
                chain,
            } => TypeRef {
                base,
                is_const,
                chain,
            },
        }
    }
}

/// `* const * &`-style suffix, innermost first. `None` on anything else.
fn parse_qualifiers(suffix: &str) -> Option<QualifierChain> {
    let mut chain = QualifierChain::new();
    let mut rest = suffix.trim_start();
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("&&") {
            chain.push(Qualifier::RvalueRef);
            rest = after;
        } else if let Some(after) = rest.strip_prefix('&') {
            chain.push(Qualifier::LvalueRef);
            rest = after;
        } else if let Some(after) = rest.strip_prefix('*') {
            chain.push(Qualifier::POINTER);
            rest = after;
        } else if let Some(after) = rest.strip_prefix("const") {
            if !after.is_empty() && !after.starts_with([' ', '*', '&']) {
                return None;
            }
            match chain.last_mut() {
                Some(Qualifier::Pointer { is_const }) if !*is_const => *is_const = true,
                _ => return None,
            }
            rest = after;
        } else {
            return None;
        }
        rest = rest.trim_start();
    }
    Some(chain)
}

impl TypeRef {
    pub fn named(path: &str) -> Self {
        TypeRef {
            base: BaseType::Named(NamedType::from_path(path)),
            is_const: false,
            chain: QualifierChain::new(),
        }
    }

    /// Parse the shorthand spelling: optional leading `const`, a name, then
    /// any run of trailing `*`, `* const`, `&` or `&&`. A suffix that is not
    /// made of those keeps the whole spelling as the name.
    pub fn spelled(text: &str) -> Self {
        let mut rest = text.trim();
        let mut is_const = false;
        if let Some(stripped) = rest.strip_prefix("const ") {
            is_const = true;
            rest = stripped.trim_start();
        }

        let name_end = rest
            .find(|c: char| c == '*' || c == '&')
            .unwrap_or(rest.len());
        let (name, suffix) = rest.split_at(name_end);

        let (name, chain) = match parse_qualifiers(suffix) {
            Some(chain) => (name.trim(), chain),
            None => (rest, QualifierChain::new()),
        };
        let mut ty = TypeRef::named(name);
        ty.is_const = is_const;
        ty.chain = chain;
        ty
    }

    pub fn as_named(&self) -> Option<&NamedType> {
        match &self.base {
            BaseType::Named(named) => Some(named),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionType> {
        match &self.base {
            BaseType::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Whether the qualifier closest to the base is a pointer.
    pub fn innermost_is_pointer(&self) -> bool {
        self.chain.first().is_some_and(|q| q.is_pointer())
    }

    /// Whether this type, or any type nested in it, uses an rvalue reference.
    pub fn has_rvalue_ref(&self) -> bool {
        let mut found = false;
        self.visit(&mut |ty| {
            found |= ty.chain.contains(&Qualifier::RvalueRef);
        });
        found
    }

    /// Visit this type and every type nested in template arguments or
    /// function signatures, outermost first.
    pub fn visit(&self, f: &mut dyn FnMut(&TypeRef)) {
        f(self);
        match &self.base {
            BaseType::Named(named) => {
                for segment in &named.segments {
                    for arg in &segment.args {
                        if let TemplateArg::Type(ty) = arg {
                            ty.visit(f);
                        }
                    }
                }
            }
            BaseType::Function(function) => {
                function.ret.visit(f);
                for param in &function.params {
                    param.visit(f);
                }
            }
            BaseType::TemplateParam(_) => {}
        }
    }

    /// Mutable counterpart of [`TypeRef::visit`]. Nested types are visited
    /// before the type containing them.
    pub fn visit_mut(&mut self, f: &mut dyn FnMut(&mut TypeRef)) {
        match &mut self.base {
            BaseType::Named(named) => {
                for segment in &mut named.segments {
                    for arg in &mut segment.args {
                        if let TemplateArg::Type(ty) = arg {
                            ty.visit_mut(f);
                        }
                    }
                }
            }
            BaseType::Function(function) => {
                function.ret.visit_mut(f);
                for param in &mut function.params {
                    param.visit_mut(f);
                }
            }
            BaseType::TemplateParam(_) => {}
        }
        f(self);
    }
}

#[cfg(test)]
#[path = "tests/types.rs"]
mod tests;
