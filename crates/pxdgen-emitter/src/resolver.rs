//! Type Resolver & Stub Generator.
//!
//! Resolves every type reference of one output file, in print order:
//!
//! 1. template parameters and built-ins pass through,
//! 2. library types become imports from Cython's bundled declarations,
//! 3. declarations in the same file are referenced by their dotted path,
//!    declarations in other files through an import alias,
//! 4. anything else becomes a stub placeholder (`autodefine`) or an opaque
//!    placeholder with an `UnresolvedTypeError` warning.
//!
//! Qualifier chains are carried over untouched; only the base is resolved.

use indexmap::IndexMap;
use pxdgen_common::diagnostics::diagnostic_messages;
use pxdgen_common::limits::MAX_TYPE_NESTING_DEPTH;
use pxdgen_common::{Diagnostic, GeneratorOptions};
use pxdgen_model::{
    BaseType, DeclDetail, DeclId, DeclarationGraph, FileId, NamedType, Partition, Qualifier,
    QualifierChain, TagKind, TemplateArg, TypeRef,
};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, debug_span, trace};

use crate::imports::{ImportEdge, ImportResolver, NameCollisionError};
use crate::order::{emission_ancestors, is_emitted, origin_groups, visit_in_emission_order};
use crate::std_types::{BUILTIN_VA_LIST, builtin, library};

/// Where a type reference sits in its declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotPosition {
    /// Field, variable or typedef target.
    Value,
    Return,
    Param(u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeSlot {
    pub decl: DeclId,
    pub position: SlotPosition,
}

impl TypeSlot {
    pub fn new(decl: DeclId, position: SlotPosition) -> Self {
        Self { decl, position }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Builtin,
    TemplateParam,
    /// Declared in the same output file.
    Direct(DeclId),
    /// Declared in another output file and imported under `alias`.
    CrossPackage { target: DeclId, alias: String },
    Library { alias: String },
    Stub { name: String },
    Opaque,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedArg {
    Type(ResolvedType),
    Value(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSegment {
    pub name: String,
    pub args: Vec<ResolvedArg>,
}

impl ResolvedSegment {
    fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedBase {
    /// Printed as the segments joined with `.`.
    Named {
        resolution: Resolution,
        path: Vec<ResolvedSegment>,
    },
    Function {
        ret: Box<ResolvedType>,
        params: Vec<ResolvedType>,
        variadic: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedType {
    pub base: ResolvedBase,
    pub is_const: bool,
    /// Innermost-first, as in [`TypeRef`].
    pub chain: QualifierChain,
}

impl ResolvedType {
    fn named(source: &TypeRef, resolution: Resolution, path: Vec<ResolvedSegment>) -> Self {
        Self {
            base: ResolvedBase::Named { resolution, path },
            is_const: source.is_const,
            chain: source.chain.clone(),
        }
    }

    pub fn resolution(&self) -> Option<&Resolution> {
        match &self.base {
            ResolvedBase::Named { resolution, .. } => Some(resolution),
            ResolvedBase::Function { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubKind {
    Struct,
    Union,
    Enum,
    Class { params: usize },
}

/// Opaque declaration standing in for a type the graph does not contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubPlaceholder {
    pub name: String,
    /// C/C++ spelling of the missing type.
    pub cname: String,
    pub kind: StubKind,
    /// Qualified name of the first declaration that needed it.
    pub first_user: String,
}

/// Resolved types, stubs and imports of one output file.
#[derive(Debug, Default)]
pub struct FileResolution {
    pub stubs: Vec<StubPlaceholder>,
    pub imports: Vec<ImportEdge>,
    pub diagnostics: Vec<Diagnostic>,
    types: FxHashMap<TypeSlot, ResolvedType>,
}

impl FileResolution {
    pub fn get(&self, slot: TypeSlot) -> Option<&ResolvedType> {
        self.types.get(&slot)
    }
}

pub struct TypeResolver<'a> {
    graph: &'a DeclarationGraph,
    partition: &'a Partition,
    file: FileId,
    options: GeneratorOptions,
    imports: ImportResolver,
    stubs: IndexMap<String, StubPlaceholder>,
    types: FxHashMap<TypeSlot, ResolvedType>,
    diagnostics: Vec<Diagnostic>,
    reported: FxHashSet<String>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(
        graph: &'a DeclarationGraph,
        partition: &'a Partition,
        file: FileId,
        options: GeneratorOptions,
    ) -> Self {
        let mut resolver = Self {
            graph,
            partition,
            file,
            options,
            imports: ImportResolver::default(),
            stubs: IndexMap::new(),
            types: FxHashMap::default(),
            diagnostics: Vec::new(),
            reported: FxHashSet::default(),
        };
        let reserved: Vec<String> = resolver
            .emission_sequence()
            .into_iter()
            .filter(|&id| emission_ancestors(graph, id).is_empty())
            .map(|id| resolver.name_in_file(id).to_string())
            .collect();
        resolver.imports = ImportResolver::new(reserved);
        resolver
    }

    pub fn resolve_file(mut self) -> Result<FileResolution, NameCollisionError> {
        let partition = self.partition;
        let module = &partition.file(self.file).module;
        let _span = debug_span!("resolve_file", module = %module).entered();

        for id in self.emission_sequence() {
            self.resolve_decl(id)?;
        }

        debug!(
            stubs = self.stubs.len(),
            imports = self.imports.edges().len(),
            "resolved output file"
        );
        Ok(FileResolution {
            stubs: self.stubs.into_values().collect(),
            imports: self.imports.edges(),
            diagnostics: self.diagnostics,
            types: self.types,
        })
    }

    fn emission_sequence(&self) -> Vec<DeclId> {
        let mut sequence = Vec::new();
        for &package in &self.partition.file(self.file).packages {
            let package = self.partition.package(package);
            for group in origin_groups(self.graph, self.partition, &self.options, package) {
                for id in group.decls {
                    visit_in_emission_order(
                        self.graph,
                        self.partition,
                        &self.options,
                        id,
                        &mut |d| sequence.push(d),
                    );
                }
            }
        }
        sequence
    }

    /// Name `id` is declared under at its level of the file.
    fn name_in_file(&self, id: DeclId) -> &'a str {
        let decl = self.graph.decl(id);
        if decl.parent.is_none() {
            self.partition.local_name(self.graph, id)
        } else {
            decl.name.as_str()
        }
    }

    fn resolve_decl(&mut self, id: DeclId) -> Result<(), NameCollisionError> {
        let graph = self.graph;
        match &graph.decl(id).detail {
            DeclDetail::Typedef { target } => self.resolve_slot(id, SlotPosition::Value, target),
            DeclDetail::Variable { ty } => self.resolve_slot(id, SlotPosition::Value, ty),
            DeclDetail::Function(sig) => {
                if let Some(ret) = &sig.ret {
                    self.resolve_slot(id, SlotPosition::Return, ret)?;
                }
                for (i, param) in sig.params.iter().enumerate() {
                    self.resolve_slot(id, SlotPosition::Param(i as u32), &param.ty)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn resolve_slot(
        &mut self,
        id: DeclId,
        position: SlotPosition,
        ty: &TypeRef,
    ) -> Result<(), NameCollisionError> {
        let resolved = self.resolve(ty, id, 0)?;
        self.types.insert(TypeSlot::new(id, position), resolved);
        Ok(())
    }

    fn resolve(
        &mut self,
        ty: &TypeRef,
        context: DeclId,
        depth: u32,
    ) -> Result<ResolvedType, NameCollisionError> {
        if depth > MAX_TYPE_NESTING_DEPTH {
            trace!(context = context.0, "type nesting too deep");
            return Ok(opaque(ty, None));
        }
        match &ty.base {
            BaseType::TemplateParam(name) => Ok(ResolvedType::named(
                ty,
                Resolution::TemplateParam,
                vec![ResolvedSegment::plain(name.clone())],
            )),
            BaseType::Function(function) => {
                let ret = self.resolve(&function.ret, context, depth + 1)?;
                let params = function
                    .params
                    .iter()
                    .map(|param| self.resolve(param, context, depth + 1))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ResolvedType {
                    base: ResolvedBase::Function {
                        ret: Box::new(ret),
                        params,
                        variadic: function.variadic,
                    },
                    is_const: ty.is_const,
                    chain: ty.chain.clone(),
                })
            }
            BaseType::Named(named) => self.resolve_named(ty, named, context, depth),
        }
    }

    fn resolve_named(
        &mut self,
        ty: &TypeRef,
        named: &NamedType,
        context: DeclId,
        depth: u32,
    ) -> Result<ResolvedType, NameCollisionError> {
        if named.qualified_name() == BUILTIN_VA_LIST {
            let mut chain = QualifierChain::new();
            chain.push(Qualifier::POINTER);
            chain.extend(ty.chain.iter().copied());
            return Ok(ResolvedType {
                base: ResolvedBase::Named {
                    resolution: Resolution::Builtin,
                    path: vec![ResolvedSegment::plain("void")],
                },
                is_const: false,
                chain,
            });
        }

        if let Some(spelling) = builtin(named) {
            return Ok(ResolvedType::named(
                ty,
                Resolution::Builtin,
                vec![ResolvedSegment::plain(spelling)],
            ));
        }

        if let Some((entry, index)) = library(named) {
            let alias = self.imports.request(entry.module, entry.name, entry.alias)?;
            let mut path = Vec::with_capacity(named.segments.len() - index);
            for (i, segment) in named.segments[index..].iter().enumerate() {
                let name = if i == 0 { alias.clone() } else { segment.name.clone() };
                path.push(ResolvedSegment {
                    name,
                    args: self.resolve_args(&segment.args, context, depth)?,
                });
            }
            return Ok(ResolvedType::named(ty, Resolution::Library { alias }, path));
        }

        if let Some(target) = self.graph.resolve_named(named, context) {
            if let Some(resolved) = self.reference(ty, named, target, context, depth)? {
                return Ok(resolved);
            }
        }

        if self.options.autodefine() {
            return self.stub(ty, named, context, depth);
        }

        let qualified = named.qualified_name();
        if self.reported.insert(qualified.clone()) {
            let decl = self.graph.decl(context);
            self.diagnostics.push(Diagnostic::from_message(
                &decl.location,
                &diagnostic_messages::UNRESOLVED_TYPE,
                &[qualified.as_str(), self.graph.qualified_name(context)],
            ));
        }
        Ok(opaque(ty, named.size))
    }

    /// Reference to a declaration of the graph, or `None` when it is not
    /// printed anywhere.
    fn reference(
        &mut self,
        ty: &TypeRef,
        named: &NamedType,
        target: DeclId,
        context: DeclId,
        depth: u32,
    ) -> Result<Option<ResolvedType>, NameCollisionError> {
        let Some(target_file) = self.partition.file_of(target) else {
            return Ok(None);
        };
        let mut chain = emission_ancestors(self.graph, target);
        chain.push(target);
        if chain
            .iter()
            .any(|&id| !is_emitted(self.graph, self.partition, &self.options, id))
        {
            return Ok(None);
        }

        // Template arguments line up with the rightmost spelled segments.
        let mut args = Vec::with_capacity(chain.len());
        for i in 0..chain.len() {
            let from_end = chain.len() - i;
            let segment_args = match named.segments.len().checked_sub(from_end) {
                Some(index) => self.resolve_args(&named.segments[index].args, context, depth)?,
                None => Vec::new(),
            };
            args.push(segment_args);
        }

        if target_file == self.file {
            let scope = emission_ancestors(self.graph, context);
            let mut skip = 0;
            while skip + 1 < chain.len() && scope.contains(&chain[skip]) {
                skip += 1;
            }
            let path = chain[skip..]
                .iter()
                .zip(args.drain(skip..))
                .enumerate()
                .map(|(i, (&id, args))| ResolvedSegment {
                    name: if i == 0 {
                        self.name_in_file(id).to_string()
                    } else {
                        self.graph.decl(id).name.clone()
                    },
                    args,
                })
                .collect();
            return Ok(Some(ResolvedType::named(ty, Resolution::Direct(target), path)));
        }

        let top = self.graph.decl(chain[0]);
        let module = self.partition.file(target_file).module.clone();
        let symbol = if top.parent.is_none() {
            self.partition.local_name(self.graph, top.id)
        } else {
            top.name.as_str()
        };
        let mut preferred = self.graph.namespace(top.namespace).path.clone();
        preferred.push(top.name.clone());
        let alias = self.imports.request(&module, symbol, &preferred.join("_"))?;

        let path = chain
            .iter()
            .zip(args)
            .enumerate()
            .map(|(i, (&id, args))| ResolvedSegment {
                name: if i == 0 {
                    alias.clone()
                } else {
                    self.graph.decl(id).name.clone()
                },
                args,
            })
            .collect();
        Ok(Some(ResolvedType::named(
            ty,
            Resolution::CrossPackage { target, alias },
            path,
        )))
    }

    fn stub(
        &mut self,
        ty: &TypeRef,
        named: &NamedType,
        context: DeclId,
        depth: u32,
    ) -> Result<ResolvedType, NameCollisionError> {
        let cname = named.qualified_name();
        let last_args = named
            .segments
            .last()
            .map(|s| s.args.as_slice())
            .unwrap_or(&[]);

        let name = match self.stubs.get(&cname) {
            Some(existing) => existing.name.clone(),
            None => {
                let preferred: Vec<&str> = named.segments.iter().map(|s| s.name.as_str()).collect();
                let name = self.imports.claim(&preferred.join("_"))?;
                let kind = match named.tag {
                    _ if !last_args.is_empty() => StubKind::Class {
                        params: last_args.len(),
                    },
                    Some(TagKind::Union) => StubKind::Union,
                    Some(TagKind::Enum) => StubKind::Enum,
                    Some(TagKind::Class) => StubKind::Class { params: 0 },
                    Some(TagKind::Struct) | None => StubKind::Struct,
                };
                let first_user = self.graph.qualified_name(context).to_string();
                self.diagnostics.push(Diagnostic::from_message(
                    &self.graph.decl(context).location,
                    &diagnostic_messages::AUTO_DEFINED_TYPE,
                    &[cname.as_str(), first_user.as_str(), name.as_str()],
                ));
                trace!(cname = %cname, name = %name, "stub placeholder created");
                self.stubs.insert(
                    cname.clone(),
                    StubPlaceholder {
                        name: name.clone(),
                        cname,
                        kind,
                        first_user,
                    },
                );
                name
            }
        };

        let args = self.resolve_args(last_args, context, depth)?;
        Ok(ResolvedType::named(
            ty,
            Resolution::Stub { name: name.clone() },
            vec![ResolvedSegment { name, args }],
        ))
    }

    fn resolve_args(
        &mut self,
        args: &[TemplateArg],
        context: DeclId,
        depth: u32,
    ) -> Result<Vec<ResolvedArg>, NameCollisionError> {
        args.iter()
            .map(|arg| match arg {
                TemplateArg::Type(ty) => Ok(ResolvedArg::Type(self.resolve(ty, context, depth + 1)?)),
                TemplateArg::Value(value) => Ok(ResolvedArg::Value(*value)),
            })
            .collect()
    }
}

/// Placeholder for a type nobody declares: `void` behind a pointer, else a
/// byte array of the type's size.
fn opaque(ty: &TypeRef, size: Option<u64>) -> ResolvedType {
    let void_pointer = ty.innermost_is_pointer();
    let chain = if void_pointer {
        ty.chain.clone()
    } else {
        let mut chain = QualifierChain::new();
        chain.push(Qualifier::Array(Some(size.unwrap_or(1).max(1))));
        chain.extend(ty.chain.iter().copied());
        chain
    };
    ResolvedType {
        base: ResolvedBase::Named {
            resolution: Resolution::Opaque,
            path: vec![ResolvedSegment::plain(if void_pointer { "void" } else { "char" })],
        },
        is_const: ty.is_const,
        chain,
    }
}

#[cfg(test)]
#[path = "tests/resolver.rs"]
mod tests;
