//! Emission order shared by the resolver and the emitter.
//!
//! The resolver walks declarations in exactly the order they are printed so
//! that stubs and imports come out in first-use order.

use pxdgen_common::GeneratorOptions;
use pxdgen_model::{DeclId, DeclKind, DeclarationGraph, DeclFlags, Package, Partition};

/// Declarations of one package read from the same header.
#[derive(Debug, Clone)]
pub(crate) struct OriginGroup {
    pub origin: String,
    pub system: bool,
    pub decls: Vec<DeclId>,
}

pub(crate) fn is_emitted(
    graph: &DeclarationGraph,
    partition: &Partition,
    options: &GeneratorOptions,
    id: DeclId,
) -> bool {
    let decl = graph.decl(id);
    if decl.is_private() || partition.is_redundant_forward(id) {
        return false;
    }
    decl.kind != DeclKind::Macro || options.emit_defines()
}

/// Whether `id` is printed next to its parent rather than inside it.
pub(crate) fn is_hoisted(graph: &DeclarationGraph, id: DeclId) -> bool {
    let decl = graph.decl(id);
    match decl.parent {
        Some(parent) => decl.kind.is_type() && !graph.decl(parent).nests_children(),
        None => false,
    }
}

/// Enclosing declarations `id` is printed inside of, outermost first.
pub(crate) fn emission_ancestors(graph: &DeclarationGraph, id: DeclId) -> Vec<DeclId> {
    graph
        .ancestors(id)
        .into_iter()
        .filter(|&ancestor| graph.decl(ancestor).nests_children())
        .collect()
}

pub(crate) fn origin_groups(
    graph: &DeclarationGraph,
    partition: &Partition,
    options: &GeneratorOptions,
    package: &Package,
) -> Vec<OriginGroup> {
    let mut groups: Vec<OriginGroup> = Vec::new();
    for &id in &package.decls {
        if !is_emitted(graph, partition, options, id) {
            continue;
        }
        let decl = graph.decl(id);
        let origin = &decl.location.file;
        match groups.iter_mut().find(|g| &g.origin == origin) {
            Some(group) => group.decls.push(id),
            None => groups.push(OriginGroup {
                origin: origin.clone(),
                system: decl.flags.contains(DeclFlags::SYSTEM),
                decls: vec![id],
            }),
        }
    }
    groups
}

/// Calls `f` for `id` and everything printed with it, in print order:
/// hoisted inner types first, then the declaration, then its members.
pub(crate) fn visit_in_emission_order(
    graph: &DeclarationGraph,
    partition: &Partition,
    options: &GeneratorOptions,
    id: DeclId,
    f: &mut dyn FnMut(DeclId),
) {
    if !is_emitted(graph, partition, options, id) {
        return;
    }
    let decl = graph.decl(id);
    for &child in &decl.children {
        if is_hoisted(graph, child) {
            visit_in_emission_order(graph, partition, options, child, f);
        }
    }
    f(id);
    for &child in &decl.children {
        if !is_hoisted(graph, child) {
            visit_in_emission_order(graph, partition, options, child, f);
        }
    }
}
