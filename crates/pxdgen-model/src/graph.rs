//! The finished declaration graph.
//!
//! Produced by [`crate::GraphBuilder::finish`] at the end of Phase 1 and
//! immutable afterwards.

use pxdgen_common::Diagnostic;

use crate::decl::{DeclId, Declaration, Namespace, NamespaceId, UnitId};
use crate::index::SymbolIndex;
use crate::node::Language;
use crate::types::NamedType;

#[derive(Debug, Clone)]
pub struct UnitInfo {
    pub id: UnitId,
    /// Header the unit was parsed from, as spelled by the parser.
    pub main_header: String,
    pub language: Language,
}

#[derive(Debug)]
pub struct DeclarationGraph {
    pub(crate) decls: Vec<Declaration>,
    pub(crate) namespaces: Vec<Namespace>,
    pub(crate) units: Vec<UnitInfo>,
    pub(crate) index: SymbolIndex,
    pub(crate) diagnostics: Vec<(UnitId, Diagnostic)>,
}

impl DeclarationGraph {
    pub fn decl(&self, id: DeclId) -> &Declaration {
        &self.decls[id.index()]
    }

    pub fn decls(&self) -> &[Declaration] {
        &self.decls
    }

    pub fn namespace(&self, id: NamespaceId) -> &Namespace {
        &self.namespaces[id.0 as usize]
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn units(&self) -> &[UnitInfo] {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> &UnitInfo {
        &self.units[id.0 as usize]
    }

    pub fn index(&self) -> &SymbolIndex {
        &self.index
    }

    /// Warnings recorded while building the declarations owned by `unit`.
    pub fn diagnostics_for(&self, unit: UnitId) -> impl Iterator<Item = &Diagnostic> + '_ {
        self.diagnostics
            .iter()
            .filter(move |(owner, _)| *owner == unit)
            .map(|(_, diagnostic)| diagnostic)
    }

    pub fn qualified_name(&self, id: DeclId) -> &str {
        self.index.qualified_name(id)
    }

    /// Enclosing declarations of `id`, outermost first.
    pub fn ancestors(&self, id: DeclId) -> Vec<DeclId> {
        let mut chain = Vec::new();
        let mut current = self.decl(id).parent;
        while let Some(parent) = current {
            chain.push(parent);
            current = self.decl(parent).parent;
        }
        chain.reverse();
        chain
    }

    /// Scope names lookups from `context` start in: its namespace path
    /// followed by its enclosing declarations.
    pub fn scope_path(&self, context: DeclId) -> Vec<&str> {
        let decl = self.decl(context);
        let mut path: Vec<&str> = self
            .namespace(decl.namespace)
            .path
            .iter()
            .map(String::as_str)
            .collect();
        for ancestor in self.ancestors(context) {
            path.push(self.decl(ancestor).name.as_str());
        }
        path
    }

    /// The declaration a named type refers to: the parser's binding when it
    /// made one, otherwise scoped lookup from `context`.
    pub fn resolve_named(&self, named: &NamedType, context: DeclId) -> Option<DeclId> {
        if let Some(target) = named.target {
            // Prefer the definition over the forward declaration bound here.
            let best = self.index.candidates(self.qualified_name(target)).first();
            return Some(best.copied().unwrap_or(target));
        }
        let scope = self.scope_path(context);
        self.index.lookup(&scope, &named.qualified_name())
    }
}
