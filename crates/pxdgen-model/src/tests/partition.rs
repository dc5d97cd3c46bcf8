use super::*;
use crate::{GraphBuilder, NodeStream, OriginFilter};
use serde_json::{Value, json};

fn unit(builder: &mut GraphBuilder, header: &str, nodes: Value) -> UnitId {
    let stream: NodeStream = serde_json::from_value(json!({
        "version": 1,
        "translation_unit": header,
        "nodes": nodes,
    }))
    .unwrap();
    builder.add_unit(stream, &OriginFilter::MainHeader).unwrap()
}

fn two_namespaces() -> Value {
    json!([
        { "id": 1, "kind": "struct", "name": "Global" },
        { "id": 2, "kind": "namespace", "name": "Foo" },
        { "id": 3, "kind": "class", "name": "A", "parent": 2 },
        { "id": 4, "kind": "class", "name": "Inner", "parent": 3, "access": "public" },
        { "id": 5, "kind": "namespace", "name": "Bar", "parent": 2 },
        { "id": 6, "kind": "class", "name": "A", "parent": 5 },
        { "id": 7, "kind": "struct", "name": "Late" }
    ])
}

#[test]
fn test_one_package_per_namespace() {
    let mut builder = GraphBuilder::new();
    unit(&mut builder, "cplusplus.hpp", two_namespaces());
    let graph = builder.finish();
    let partition = Partition::build(&graph, OutputLayout::PerNamespace, &FxHashMap::default());

    let namespaces: Vec<String> = partition
        .packages()
        .iter()
        .map(|p| graph.namespace(p.namespace).qualified_name())
        .collect();
    assert_eq!(namespaces, vec!["", "Foo", "Foo::Bar"]);

    // Global package keeps discovery order; nested classes are not packaged.
    let global = &partition.packages()[0];
    let names: Vec<&str> = global.decls.iter().map(|&d| graph.decl(d).name.as_str()).collect();
    assert_eq!(names, vec!["Global", "Late"]);

    let inner = graph
        .decls()
        .iter()
        .find(|d| d.name == "Inner")
        .unwrap();
    assert_eq!(partition.package_of(inner.id), Some(partition.packages()[1].id));
}

#[test]
fn test_per_namespace_files_and_modules() {
    let mut builder = GraphBuilder::new();
    let id = unit(&mut builder, "include/cplusplus.hpp", two_namespaces());
    let graph = builder.finish();
    let mut targets = FxHashMap::default();
    targets.insert(id, PathBuf::from("cplusplus.pxd"));
    let partition = Partition::build(&graph, OutputLayout::PerNamespace, &targets);

    let files: Vec<(String, String)> = partition
        .files()
        .iter()
        .map(|f| (f.path.display().to_string(), f.module.clone()))
        .collect();
    assert_eq!(
        files,
        vec![
            ("cplusplus.pxd".to_string(), "cplusplus".to_string()),
            ("Foo.pxd".to_string(), "Foo".to_string()),
            ("Foo_Bar.pxd".to_string(), "Foo_Bar".to_string()),
        ]
    );
    assert!(!partition.is_renamed(graph.decls()[2].id));
}

#[test]
fn test_per_header_renames_colliding_names() {
    let mut builder = GraphBuilder::new();
    let id = unit(&mut builder, "core/cxmem.h", two_namespaces());
    let graph = builder.finish();
    let mut targets = FxHashMap::default();
    targets.insert(id, PathBuf::from("core/cxmem.pxd"));
    let partition = Partition::build(&graph, OutputLayout::PerHeader, &targets);

    assert_eq!(partition.files().len(), 1);
    assert_eq!(partition.files()[0].module, "core.cxmem");
    assert_eq!(partition.files()[0].packages.len(), 3);

    let bar_a = graph
        .decls()
        .iter()
        .find(|d| graph.qualified_name(d.id) == "Foo::Bar::A")
        .unwrap();
    assert_eq!(partition.local_name(&graph, bar_a.id), "Foo_Bar_A");
    let foo_a = graph
        .decls()
        .iter()
        .find(|d| graph.qualified_name(d.id) == "Foo::A")
        .unwrap();
    assert_eq!(partition.local_name(&graph, foo_a.id), "A");
}

#[test]
fn test_forward_declaration_with_local_definition_is_redundant() {
    let mut builder = GraphBuilder::new();
    unit(
        &mut builder,
        "fwd.h",
        json!([
            { "id": 1, "kind": "struct", "name": "node", "is_definition": false },
            { "id": 2, "kind": "struct", "name": "list" },
            { "id": 3, "kind": "struct", "name": "node" },
            { "id": 4, "kind": "struct", "name": "opaque", "is_definition": false }
        ]),
    );
    let graph = builder.finish();
    let partition = Partition::build(&graph, OutputLayout::PerHeader, &FxHashMap::default());

    assert!(partition.is_redundant_forward(graph.decls()[0].id));
    assert!(!partition.is_redundant_forward(graph.decls()[3].id));
    assert_eq!(partition.files()[0].path, PathBuf::from("fwd.pxd"));
}

#[test]
fn test_module_name_from_path() {
    assert_eq!(module_name(Path::new("core/cxmem.pxd")), "core.cxmem");
    assert_eq!(module_name(Path::new("Foo.pxd")), "Foo");
    assert_eq!(default_target("a/b/sax.hpp"), PathBuf::from("sax.pxd"));
}
