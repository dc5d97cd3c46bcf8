//! Declaration Model Builder.
//!
//! Consumes node streams, one translation unit at a time, into a single
//! [`DeclarationGraph`]. All units of a batch are added before `finish` is
//! called, so cross-unit name binding and ownership do not depend on the
//! order the units were parsed in.

use pxdgen_common::diagnostics::diagnostic_messages;
use pxdgen_common::limits::ANONYMOUS_PREFIX;
use pxdgen_common::{Diagnostic, SourceLocation};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace, warn};

use crate::decl::{
    DeclDetail, DeclFlags, DeclId, DeclKind, Declaration, EnumConstant, FunctionRole, FunctionSig,
    MacroValue, Namespace, NamespaceId, Parameter, UnitId,
};
use crate::error::ModelError;
use crate::graph::{DeclarationGraph, UnitInfo};
use crate::index::SymbolIndex;
use crate::node::{Language, NODE_STREAM_VERSION, NodeKind, NodeStream, RawNode};
use crate::types::{BaseType, TypeRef};

/// Decides which declarations of a unit are admitted into the graph, by the
/// header they were read from. Only namespace-level declarations are
/// filtered; members follow their enclosing declaration.
pub trait OriginPolicy {
    fn admits(&self, main_header: &str, origin: &SourceLocation, is_system: bool) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginFilter {
    /// Only declarations read from the unit's own header.
    MainHeader,
    /// Declarations from every non-system header the unit includes.
    AllHeaders,
}

impl OriginPolicy for OriginFilter {
    fn admits(&self, main_header: &str, origin: &SourceLocation, is_system: bool) -> bool {
        match self {
            OriginFilter::MainHeader => origin.file == main_header,
            OriginFilter::AllHeaders => origin.file == main_header || !is_system,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scope {
    Namespace(NamespaceId),
    Decl(DeclId),
    /// Declaration already added by an earlier unit; its members are known.
    Reused(DeclId),
    Skipped,
}

pub struct GraphBuilder {
    decls: Vec<Declaration>,
    namespaces: Vec<Namespace>,
    namespace_lookup: FxHashMap<Vec<String>, NamespaceId>,
    units: Vec<UnitInfo>,
    /// (kind, file, line, column, name) of every declaration, for dropping
    /// declarations a later unit reports again through an include.
    seen: FxHashMap<(DeclKind, SourceLocation, String), DeclId>,
    diagnostics: Vec<(UnitId, Diagnostic)>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        let global = Namespace {
            id: NamespaceId::GLOBAL,
            path: Vec::new(),
            parent: None,
        };
        let mut namespace_lookup = FxHashMap::default();
        namespace_lookup.insert(Vec::new(), NamespaceId::GLOBAL);
        GraphBuilder {
            decls: Vec::new(),
            namespaces: vec![global],
            namespace_lookup,
            units: Vec::new(),
            seen: FxHashMap::default(),
            diagnostics: Vec::new(),
        }
    }

    /// Add one translation unit. On error nothing from the unit is kept.
    pub fn add_unit(
        &mut self,
        stream: NodeStream,
        policy: &dyn OriginPolicy,
    ) -> Result<UnitId, ModelError> {
        if stream.version != NODE_STREAM_VERSION {
            return Err(ModelError::UnsupportedVersion {
                found: stream.version,
            });
        }

        let checkpoint = self.checkpoint();
        let unit = UnitId(self.units.len() as u32);
        let language = stream.detected_language();
        self.units.push(UnitInfo {
            id: unit,
            main_header: stream.translation_unit.clone(),
            language,
        });

        let _span = tracing::debug_span!("add_unit", unit = unit.0, header = %stream.translation_unit).entered();
        let mut state = UnitState {
            unit,
            main_header: stream.translation_unit,
            language,
            scopes: FxHashMap::default(),
            node_decls: FxHashMap::default(),
            added: Vec::new(),
        };

        for mut node in stream.nodes {
            if !node.location.is_known() {
                node.location.file = state.main_header.clone();
            }
            if let Err(err) = self.add_node(&mut state, node, policy) {
                self.rollback(checkpoint);
                return Err(err);
            }
        }

        self.bind_types(&state);
        self.mark_cpp_classes(&state);
        debug!(
            declarations = state.added.len(),
            "unit added to declaration graph"
        );
        Ok(unit)
    }

    pub fn finish(mut self) -> DeclarationGraph {
        self.assign_owners();
        self.name_anonymous();
        self.check_anonymous_members();
        let index = SymbolIndex::build(&self.decls, &self.namespaces);
        DeclarationGraph {
            decls: self.decls,
            namespaces: self.namespaces,
            units: self.units,
            index,
            diagnostics: self.diagnostics,
        }
    }

    fn add_node(
        &mut self,
        state: &mut UnitState,
        node: RawNode,
        policy: &dyn OriginPolicy,
    ) -> Result<(), ModelError> {
        let node_id = node.id;
        let parent_scope = match node.parent {
            None => Scope::Namespace(NamespaceId::GLOBAL),
            Some(parent) => *state.scopes.get(&parent).ok_or(ModelError::DanglingParent {
                node: node_id,
                parent,
            })?,
        };

        let scope = match (node.kind, parent_scope) {
            (_, Scope::Skipped) => Scope::Skipped,
            (NodeKind::Unknown, _) => {
                trace!(node = node_id, "skipping node of unknown kind");
                Scope::Skipped
            }
            (NodeKind::Namespace, Scope::Namespace(ns)) => {
                if node.name.is_empty() {
                    Scope::Namespace(ns)
                } else {
                    Scope::Namespace(self.intern_namespace(ns, &node.name))
                }
            }
            (NodeKind::Namespace, _) => Scope::Skipped,
            (NodeKind::Parameter, Scope::Decl(owner)) => {
                self.add_parameter(owner, node)?;
                Scope::Skipped
            }
            (NodeKind::EnumConstant, Scope::Decl(owner)) => {
                self.add_enum_constant(owner, &node);
                Scope::Skipped
            }
            (NodeKind::Parameter | NodeKind::EnumConstant, _) => Scope::Skipped,
            (_, Scope::Reused(owner)) => {
                // The earlier unit already holds this member.
                let key = (decl_kind(node.kind), node.location, node.name);
                match self.seen.get(&key) {
                    Some(&existing) => {
                        state.node_decls.insert(node_id, existing);
                        Scope::Reused(existing)
                    }
                    None => {
                        trace!(node = node_id, owner = owner.0, "member missing from reused declaration");
                        Scope::Skipped
                    }
                }
            }
            (_, Scope::Decl(parent)) if self.decls[parent.index()].kind == DeclKind::Function => {
                Scope::Skipped
            }
            (_, parent_scope) => self.add_declaration(state, node, parent_scope, policy)?,
        };

        state.scopes.insert(node_id, scope);
        Ok(())
    }

    fn add_declaration(
        &mut self,
        state: &mut UnitState,
        node: RawNode,
        parent_scope: Scope,
        policy: &dyn OriginPolicy,
    ) -> Result<Scope, ModelError> {
        let node_id = node.id;
        let (namespace, parent) = match parent_scope {
            Scope::Namespace(ns) => (ns, None),
            Scope::Decl(parent) => (self.decls[parent.index()].namespace, Some(parent)),
            Scope::Reused(_) | Scope::Skipped => return Ok(Scope::Skipped),
        };

        if parent.is_none() && !policy.admits(&state.main_header, &node.location, node.is_system) {
            trace!(name = %node.name, origin = %node.location, "declaration filtered by origin");
            return Ok(Scope::Skipped);
        }

        let kind = decl_kind(node.kind);
        if kind == DeclKind::Macro && parent.is_some() {
            return Ok(Scope::Skipped);
        }

        let key = (kind, node.location.clone(), node.name.clone());
        if let Some(&existing) = self.seen.get(&key) {
            if self.decls[existing.index()].unit != state.unit {
                trace!(name = %node.name, "declaration already reported by an earlier unit");
                state.node_decls.insert(node_id, existing);
                return Ok(Scope::Reused(existing));
            }
        }

        if kind == DeclKind::Typedef {
            if let Some(folded) = self.fold_typedef(state, &node, namespace, parent) {
                state.node_decls.insert(node_id, folded);
                self.seen.insert(key, folded);
                return Ok(Scope::Decl(folded));
            }
        }

        let Some(detail) = self.detail_for(&node)? else {
            return Ok(Scope::Skipped);
        };

        let mut flags = DeclFlags::empty();
        flags.set(DeclFlags::DEFINITION, node.is_definition);
        flags.set(DeclFlags::STATIC, node.is_static);
        flags.set(DeclFlags::SYSTEM, node.is_system);
        flags.set(DeclFlags::CONST_METHOD, node.is_const && kind == DeclKind::Function);
        flags.set(DeclFlags::THROWS, node.throws);
        flags.set(
            DeclFlags::ANONYMOUS,
            node.name.is_empty() && kind.is_aggregate(),
        );
        if node.name.is_empty() && !kind.is_aggregate() {
            trace!(node = node_id, "skipping unnamed non-aggregate declaration");
            return Ok(Scope::Skipped);
        }

        let id = DeclId(self.decls.len() as u32);
        self.decls.push(Declaration {
            id,
            kind,
            name: node.name.clone(),
            parent,
            namespace,
            unit: state.unit,
            access: node.access,
            location: node.location.clone(),
            children: Vec::new(),
            template_params: node.template_params,
            flags,
            detail,
        });
        if let Some(parent) = parent {
            self.decls[parent.index()].children.push(id);
        }
        self.seen.insert(key, id);
        state.node_decls.insert(node_id, id);
        state.added.push(id);
        Ok(Scope::Decl(id))
    }

    /// `typedef struct { ... } C;` and `typedef struct C { ... } C;` name the
    /// aggregate itself instead of producing a second declaration.
    fn fold_typedef(
        &mut self,
        state: &UnitState,
        node: &RawNode,
        namespace: NamespaceId,
        parent: Option<DeclId>,
    ) -> Option<DeclId> {
        let ty = node.ty.as_ref()?;
        if !ty.chain.is_empty() || ty.is_const {
            return None;
        }
        let named = ty.as_named()?;
        let target = *state.node_decls.get(&named.decl?)?;
        let decl = &mut self.decls[target.index()];
        let same_scope = decl.parent == parent && decl.namespace == namespace;
        let foldable = decl.kind.is_aggregate()
            && decl.kind != DeclKind::Template
            && decl.unit == state.unit
            && !decl.flags.contains(DeclFlags::TYPEDEF_NAME)
            && (decl.is_anonymous() || decl.name == node.name);
        if !same_scope || !foldable {
            return None;
        }
        decl.name = node.name.clone();
        decl.flags.remove(DeclFlags::ANONYMOUS);
        decl.flags.insert(DeclFlags::TYPEDEF_NAME);
        trace!(name = %node.name, "typedef folded into aggregate");
        Some(target)
    }

    fn detail_for(&self, node: &RawNode) -> Result<Option<DeclDetail>, ModelError> {
        let required_type = || {
            node.ty.clone().ok_or_else(|| ModelError::MissingType {
                node: node.id,
                name: node.name.clone(),
            })
        };
        let detail = match node.kind {
            NodeKind::Struct | NodeKind::Class | NodeKind::ClassTemplate | NodeKind::Union => {
                DeclDetail::Aggregate
            }
            NodeKind::Enum => DeclDetail::Enum {
                constants: Vec::new(),
            },
            NodeKind::Typedef => DeclDetail::Typedef {
                target: required_type()?,
            },
            NodeKind::Field | NodeKind::Variable => DeclDetail::Variable {
                ty: required_type()?,
            },
            NodeKind::Function | NodeKind::Method | NodeKind::Constructor => {
                let role = match node.kind {
                    NodeKind::Method => FunctionRole::Method,
                    NodeKind::Constructor => FunctionRole::Constructor,
                    _ => FunctionRole::Free,
                };
                let ret = match role {
                    FunctionRole::Constructor => None,
                    _ => Some(node.ty.clone().unwrap_or_else(|| TypeRef::named("void"))),
                };
                DeclDetail::Function(FunctionSig {
                    role,
                    ret,
                    params: Vec::new(),
                    variadic: node.is_variadic,
                })
            }
            NodeKind::Macro => {
                let body = node.body.as_deref().unwrap_or("").trim();
                if body.is_empty() && !node.is_function_like {
                    return Ok(None);
                }
                DeclDetail::Macro {
                    value: classify_macro(body),
                    function_like: node.is_function_like,
                }
            }
            NodeKind::Namespace
            | NodeKind::EnumConstant
            | NodeKind::Parameter
            | NodeKind::Unknown => return Ok(None),
        };
        Ok(Some(detail))
    }

    fn add_parameter(&mut self, owner: DeclId, node: RawNode) -> Result<(), ModelError> {
        let ty = node.ty.ok_or_else(|| ModelError::MissingType {
            node: node.id,
            name: node.name.clone(),
        })?;
        if let DeclDetail::Function(sig) = &mut self.decls[owner.index()].detail {
            sig.params.push(Parameter {
                name: node.name,
                ty,
                has_default: node.has_default,
            });
        }
        Ok(())
    }

    fn add_enum_constant(&mut self, owner: DeclId, node: &RawNode) {
        if let DeclDetail::Enum { constants } = &mut self.decls[owner.index()].detail {
            // Implicit values continue from the previous constant, not from
            // the position in the list.
            let value = match node.value {
                Some(value) => value,
                None => constants.last().map(|c| c.value + 1).unwrap_or(0),
            };
            constants.push(EnumConstant {
                name: node.name.clone(),
                value,
                explicit: node.value.is_some(),
            });
        }
    }

    fn intern_namespace(&mut self, parent: NamespaceId, name: &str) -> NamespaceId {
        let mut path = self.namespaces[parent.0 as usize].path.clone();
        path.push(name.to_string());
        if let Some(&id) = self.namespace_lookup.get(&path) {
            return id;
        }
        let id = NamespaceId(self.namespaces.len() as u32);
        self.namespaces.push(Namespace {
            id,
            path: path.clone(),
            parent: Some(parent),
        });
        self.namespace_lookup.insert(path, id);
        id
    }

    /// Bind named types to the declarations the parser linked them to, and
    /// tag names matching an enclosing template parameter.
    fn bind_types(&mut self, state: &UnitState) {
        for &id in &state.added {
            let params = self.template_params_in_scope(id);
            let decl = &mut self.decls[id.index()];
            let mut bind = |ty: &mut TypeRef| bind_type(ty, &state.node_decls, &params);
            match &mut decl.detail {
                DeclDetail::Typedef { target } => target.visit_mut(&mut bind),
                DeclDetail::Variable { ty } => ty.visit_mut(&mut bind),
                DeclDetail::Function(sig) => {
                    if let Some(ret) = &mut sig.ret {
                        ret.visit_mut(&mut bind);
                    }
                    for param in &mut sig.params {
                        param.ty.visit_mut(&mut bind);
                    }
                }
                DeclDetail::Aggregate | DeclDetail::Enum { .. } | DeclDetail::Macro { .. } => {}
            }
        }
    }

    fn template_params_in_scope(&self, id: DeclId) -> Vec<String> {
        let mut params = Vec::new();
        let mut current = Some(id);
        while let Some(decl_id) = current {
            let decl = &self.decls[decl_id.index()];
            params.extend(decl.template_params.iter().cloned());
            current = decl.parent;
        }
        params
    }

    fn mark_cpp_classes(&mut self, state: &UnitState) {
        if state.language != Language::Cpp {
            return;
        }
        for &id in &state.added {
            let decl = &self.decls[id.index()];
            if decl.kind != DeclKind::Struct {
                continue;
            }
            let has_cpp_members = decl.children.iter().any(|&child| {
                let kind = self.decls[child.index()].kind;
                kind == DeclKind::Function || kind.is_type()
            });
            if has_cpp_members || !decl.template_params.is_empty() {
                self.decls[id.index()].flags.insert(DeclFlags::CPP_CLASS);
            }
        }
    }

    /// A declaration read from another input header of the batch belongs to
    /// that header's unit, whichever unit reported it first.
    fn assign_owners(&mut self) {
        let by_main: FxHashMap<&str, UnitId> = self
            .units
            .iter()
            .map(|unit| (unit.main_header.as_str(), unit.id))
            .collect();
        let mut owners = Vec::with_capacity(self.decls.len());
        for decl in &self.decls {
            let owner = match decl.parent {
                Some(parent) => owners[parent.index()],
                None => by_main
                    .get(decl.location.file.as_str())
                    .copied()
                    .unwrap_or(decl.unit),
            };
            owners.push(owner);
        }
        for (decl, owner) in self.decls.iter_mut().zip(owners) {
            decl.unit = owner;
        }
    }

    fn name_anonymous(&mut self) {
        let mut ordinals: FxHashMap<UnitId, u32> = FxHashMap::default();
        for decl in &mut self.decls {
            if !decl.is_anonymous() {
                continue;
            }
            let ordinal = ordinals.entry(decl.unit).or_insert(0);
            decl.name = format!("{ANONYMOUS_PREFIX}{ordinal}");
            *ordinal += 1;
        }
    }

    /// Anonymous members are not merged into their parent; warn when nothing
    /// in the parent names them, since their fields are then only reachable
    /// through the synthetic declaration.
    fn check_anonymous_members(&mut self) {
        let mut referenced: FxHashSet<DeclId> = FxHashSet::default();
        for decl in &self.decls {
            if let DeclDetail::Variable { ty } = &decl.detail {
                ty.visit(&mut |ty| {
                    if let Some(target) = ty.as_named().and_then(|n| n.target) {
                        referenced.insert(target);
                    }
                });
            }
        }
        for decl in &self.decls {
            let Some(parent) = decl.parent else {
                continue;
            };
            if !decl.is_anonymous() || referenced.contains(&decl.id) {
                continue;
            }
            let parent = &self.decls[parent.index()];
            warn!(name = %decl.name, parent = %parent.name, "anonymous member kept as separate declaration");
            self.diagnostics.push((
                decl.unit,
                Diagnostic::from_message(
                    &decl.location,
                    &diagnostic_messages::ANONYMOUS_MEMBER,
                    &[decl.name.as_str(), parent.name.as_str()],
                )
                .with_related(&parent.location, format!("'{}' is declared here", parent.name)),
            ));
        }
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            decls: self.decls.len(),
            namespaces: self.namespaces.len(),
            units: self.units.len(),
        }
    }

    fn rollback(&mut self, checkpoint: Checkpoint) {
        let first_new = checkpoint.decls as u32;
        self.decls.truncate(checkpoint.decls);
        for decl in &mut self.decls {
            decl.children.retain(|child| child.0 < first_new);
        }
        for path in self.namespaces.drain(checkpoint.namespaces..).map(|ns| ns.path) {
            self.namespace_lookup.remove(&path);
        }
        self.units.truncate(checkpoint.units);
        self.seen.retain(|_, id| id.0 < first_new);
    }
}

struct Checkpoint {
    decls: usize,
    namespaces: usize,
    units: usize,
}

struct UnitState {
    unit: UnitId,
    main_header: String,
    language: Language,
    scopes: FxHashMap<u32, Scope>,
    /// Parser node id to declaration, including folded typedefs and
    /// declarations reused from earlier units.
    node_decls: FxHashMap<u32, DeclId>,
    added: Vec<DeclId>,
}

fn decl_kind(kind: NodeKind) -> DeclKind {
    match kind {
        NodeKind::Struct => DeclKind::Struct,
        NodeKind::Class => DeclKind::Class,
        NodeKind::ClassTemplate => DeclKind::Template,
        NodeKind::Union => DeclKind::Union,
        NodeKind::Enum => DeclKind::Enum,
        NodeKind::Typedef => DeclKind::Typedef,
        NodeKind::Function | NodeKind::Method | NodeKind::Constructor => DeclKind::Function,
        NodeKind::Macro => DeclKind::Macro,
        NodeKind::Field
        | NodeKind::Variable
        | NodeKind::Namespace
        | NodeKind::EnumConstant
        | NodeKind::Parameter
        | NodeKind::Unknown => DeclKind::Variable,
    }
}

fn bind_type(ty: &mut TypeRef, node_decls: &FxHashMap<u32, DeclId>, template_params: &[String]) {
    let BaseType::Named(named) = &mut ty.base else {
        return;
    };
    if let Some(node) = named.decl {
        named.target = node_decls.get(&node).copied();
    }
    if named.target.is_none() && named.is_single() {
        let name = named.last_name();
        if template_params.iter().any(|p| p == name) {
            ty.base = BaseType::TemplateParam(name.to_string());
        }
    }
}

/// Classify a macro replacement text by the literal it expands to.
fn classify_macro(body: &str) -> MacroValue {
    let mut text = body.trim();
    while let Some(inner) = text.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        text = inner.trim();
    }
    let text = text.strip_prefix(['-', '+']).unwrap_or(text).trim_start();
    if is_integer_literal(text) {
        MacroValue::Integer
    } else if is_float_literal(text) {
        MacroValue::Float
    } else {
        MacroValue::Other
    }
}

fn is_integer_literal(text: &str) -> bool {
    let digits = text.trim_end_matches(['u', 'U', 'l', 'L']);
    if digits.is_empty() {
        return false;
    }
    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        return !bin.is_empty() && bin.chars().all(|c| c == '0' || c == '1');
    }
    digits.chars().all(|c| c.is_ascii_digit())
}

fn is_float_literal(text: &str) -> bool {
    let body = text.trim_end_matches(['f', 'F', 'l', 'L']);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(at) => (&body[..at], Some(&body[at + 1..])),
        None => (body, None),
    };
    let mantissa_ok = {
        let mut parts = mantissa.splitn(2, '.');
        let whole = parts.next().unwrap_or("");
        let fraction = parts.next();
        let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        match fraction {
            Some(fraction) => {
                digits(whole) && digits(fraction) && !(whole.is_empty() && fraction.is_empty())
            }
            None => !whole.is_empty() && digits(whole) && exponent.is_some(),
        }
    };
    let exponent_ok = match exponent {
        Some(exp) => {
            let exp = exp.strip_prefix(['-', '+']).unwrap_or(exp);
            !exp.is_empty() && exp.chars().all(|c| c.is_ascii_digit())
        }
        None => true,
    };
    mantissa_ok && exponent_ok
}

#[cfg(test)]
#[path = "tests/builder.rs"]
mod tests;
