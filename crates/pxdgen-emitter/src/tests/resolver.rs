use super::*;
use crate::type_printer::{print_declaration, print_type};
use pxdgen_common::GeneratorFlags;
use pxdgen_model::{GraphBuilder, NodeStream, OriginFilter, OutputLayout};
use serde_json::{Value, json};

fn graph(header: &str, nodes: Value) -> DeclarationGraph {
    let stream: NodeStream = serde_json::from_value(json!({
        "version": 1,
        "translation_unit": header,
        "nodes": nodes,
    }))
    .unwrap();
    let mut builder = GraphBuilder::new();
    builder.add_unit(stream, &OriginFilter::MainHeader).unwrap();
    builder.finish()
}

fn resolve(graph: &DeclarationGraph, flags: GeneratorFlags) -> FileResolution {
    let partition = Partition::build(graph, OutputLayout::PerHeader, &Default::default());
    let options = GeneratorOptions { flags };
    TypeResolver::new(graph, &partition, FileId(0), options)
        .resolve_file()
        .unwrap()
}

fn slot(resolution: &FileResolution, decl: u32, position: SlotPosition) -> &ResolvedType {
    resolution
        .get(TypeSlot::new(DeclId(decl), position))
        .unwrap_or_else(|| panic!("decl {decl} has no resolved {position:?} slot"))
}

#[test]
fn test_template_parameters_are_never_looked_up() {
    let graph = graph(
        "box.hpp",
        json!([
            { "id": 1, "kind": "class_template", "name": "Box", "template_params": ["T"] },
            { "id": 2, "kind": "field", "name": "value", "parent": 1, "access": "public", "ty": "T" },
            { "id": 3, "kind": "field", "name": "items", "parent": 1, "access": "public",
              "ty": { "base": { "named": { "name": "std::vector", "args": ["T"] } } } }
        ]),
    );
    let resolution = resolve(&graph, GeneratorFlags::empty());

    let value = slot(&resolution, 1, SlotPosition::Value);
    assert_eq!(value.resolution(), Some(&Resolution::TemplateParam));

    let items = slot(&resolution, 2, SlotPosition::Value);
    assert_eq!(
        items.resolution(),
        Some(&Resolution::Library {
            alias: "std_vector".to_string()
        })
    );
    assert_eq!(print_type(items), "std_vector[T]");
    assert_eq!(resolution.imports.len(), 1);
    assert_eq!(resolution.imports[0].module, "libcpp.vector");
}

#[test]
fn test_nested_types_are_referenced_relative_to_the_context() {
    let graph = graph(
        "outer.hpp",
        json!([
            { "id": 1, "kind": "class", "name": "Outer" },
            { "id": 2, "kind": "class", "name": "Inner", "parent": 1, "access": "public" },
            { "id": 3, "kind": "field", "name": "a", "parent": 1, "access": "public",
              "ty": { "base": { "named": { "name": "Inner", "decl": 2 } } } },
            { "id": 4, "kind": "function", "name": "make",
              "ty": { "base": { "named": { "name": "Outer::Inner", "decl": 2 } } } }
        ]),
    );
    let resolution = resolve(&graph, GeneratorFlags::empty());

    let field = slot(&resolution, 2, SlotPosition::Value);
    assert_eq!(field.resolution(), Some(&Resolution::Direct(DeclId(1))));
    assert_eq!(print_type(field), "Inner");

    let ret = slot(&resolution, 3, SlotPosition::Return);
    assert_eq!(print_type(ret), "Outer.Inner");
    assert!(resolution.imports.is_empty());
}

#[test]
fn test_unresolved_types_become_opaque_placeholders() {
    let graph = graph(
        "opaque.h",
        json!([
            { "id": 1, "kind": "struct", "name": "S" },
            { "id": 2, "kind": "field", "name": "blob", "parent": 1,
              "ty": { "base": { "named": { "name": "Missing", "size": 8 } } } },
            { "id": 3, "kind": "field", "name": "p", "parent": 1, "ty": "Missing*" }
        ]),
    );
    let resolution = resolve(&graph, GeneratorFlags::empty());

    assert_eq!(print_declaration(slot(&resolution, 1, SlotPosition::Value), "blob"), "char blob[8]");
    assert_eq!(print_declaration(slot(&resolution, 2, SlotPosition::Value), "p"), "void* p");
    assert_eq!(
        slot(&resolution, 2, SlotPosition::Value).resolution(),
        Some(&Resolution::Opaque)
    );

    // One warning per missing name, not per use.
    assert_eq!(resolution.diagnostics.len(), 1);
    assert_eq!(resolution.diagnostics[0].code, 2001);
    assert!(resolution.diagnostics[0].message_text.contains("'S::blob'"));
    assert!(resolution.stubs.is_empty());
}

#[test]
fn test_autodefine_creates_one_stub_per_name() {
    let graph = graph(
        "opaque.h",
        json!([
            { "id": 1, "kind": "struct", "name": "S" },
            { "id": 2, "kind": "field", "name": "blob", "parent": 1, "ty": "Missing" },
            { "id": 3, "kind": "field", "name": "p", "parent": 1, "ty": "Missing*" },
            { "id": 4, "kind": "field", "name": "q", "parent": 1, "ty": "lib::Handle*" }
        ]),
    );
    let resolution = resolve(&graph, GeneratorFlags::AUTODEFINE);

    let names: Vec<(&str, &str)> = resolution
        .stubs
        .iter()
        .map(|s| (s.name.as_str(), s.cname.as_str()))
        .collect();
    assert_eq!(names, vec![("Missing", "Missing"), ("lib_Handle", "lib::Handle")]);
    assert_eq!(resolution.stubs[0].kind, StubKind::Struct);
    assert_eq!(resolution.stubs[0].first_user, "S::blob");

    assert_eq!(
        slot(&resolution, 2, SlotPosition::Value).resolution(),
        Some(&Resolution::Stub {
            name: "Missing".to_string()
        })
    );
    assert_eq!(print_declaration(slot(&resolution, 3, SlotPosition::Value), "q"), "lib_Handle* q");
    assert!(resolution.diagnostics.iter().all(|d| d.code == 2003));
}

#[test]
fn test_stub_names_avoid_local_declarations() {
    let graph = graph(
        "clash.h",
        json!([
            { "id": 1, "kind": "struct", "name": "ns_Thing" },
            { "id": 2, "kind": "field", "name": "t", "parent": 1, "ty": "ns::Thing*" }
        ]),
    );
    let resolution = resolve(&graph, GeneratorFlags::AUTODEFINE);
    assert_eq!(resolution.stubs[0].name, "ns_Thing_1");
    assert_eq!(resolution.stubs[0].cname, "ns::Thing");
}

#[test]
fn test_builtin_va_list_becomes_void_pointer() {
    let graph = graph(
        "log.h",
        json!([
            { "id": 1, "kind": "function", "name": "vlog", "ty": "void" },
            { "id": 2, "kind": "parameter", "name": "fmt", "parent": 1, "ty": "const char*" },
            { "id": 3, "kind": "parameter", "name": "args", "parent": 1, "ty": "__builtin_va_list" }
        ]),
    );
    let resolution = resolve(&graph, GeneratorFlags::empty());
    assert_eq!(print_type(slot(&resolution, 0, SlotPosition::Param(1))), "void*");
    assert_eq!(print_type(slot(&resolution, 0, SlotPosition::Param(0))), "const char*");
    assert!(resolution.diagnostics.is_empty());
}
