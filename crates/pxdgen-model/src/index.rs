//! Symbol index.
//!
//! Built once from the finished graph and read-only afterwards, so the
//! resolve/emit phase can share it across threads.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::decl::{DeclId, Declaration, Namespace};

#[derive(Debug, Default)]
pub struct SymbolIndex {
    /// `Foo::B::Dataset` for every declaration, by `DeclId`.
    qualified: Vec<String>,
    /// Type declarations by qualified name. Definitions come before forward
    /// declarations, then discovery order.
    types: FxHashMap<String, SmallVec<[DeclId; 2]>>,
}

impl SymbolIndex {
    pub(crate) fn build(decls: &[Declaration], namespaces: &[Namespace]) -> Self {
        let mut qualified: Vec<String> = Vec::with_capacity(decls.len());
        let mut types: FxHashMap<String, SmallVec<[DeclId; 2]>> = FxHashMap::default();

        for decl in decls {
            let scope = match decl.parent {
                Some(parent) => qualified[parent.index()].clone(),
                None => namespaces[decl.namespace.0 as usize].qualified_name(),
            };
            let name = if scope.is_empty() {
                decl.name.clone()
            } else {
                format!("{scope}::{}", decl.name)
            };
            if decl.kind.is_type() {
                types.entry(name.clone()).or_default().push(decl.id);
            }
            qualified.push(name);
        }

        for candidates in types.values_mut() {
            candidates.sort_by_key(|&id| (!decls[id.index()].is_definition(), id));
        }

        SymbolIndex { qualified, types }
    }

    pub fn qualified_name(&self, id: DeclId) -> &str {
        self.qualified
            .get(id.index())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Look `name` up the way C++ name lookup walks enclosing scopes: first
    /// inside the innermost scope of `scope`, then each enclosing one, then
    /// the global namespace.
    pub fn lookup(&self, scope: &[&str], name: &str) -> Option<DeclId> {
        let name = name.trim_start_matches("::");
        for depth in (0..=scope.len()).rev() {
            let key = if depth == 0 {
                name.to_string()
            } else {
                format!("{}::{name}", scope[..depth].join("::"))
            };
            if let Some(found) = self.types.get(&key).and_then(|c| c.first()) {
                return Some(*found);
            }
        }
        None
    }

    /// All type declarations sharing a qualified name, best candidate first.
    pub fn candidates(&self, qualified_name: &str) -> &[DeclId] {
        self.types
            .get(qualified_name)
            .map(|c| c.as_slice())
            .unwrap_or(&[])
    }
}
