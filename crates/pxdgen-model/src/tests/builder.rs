use super::*;
use crate::DeclarationGraph;
use serde_json::{Value, json};

fn stream(header: &str, nodes: Value) -> NodeStream {
    serde_json::from_value(json!({
        "version": 1,
        "translation_unit": header,
        "nodes": nodes,
    }))
    .unwrap()
}

fn build(nodes: Value) -> DeclarationGraph {
    let mut builder = GraphBuilder::new();
    builder
        .add_unit(stream("test.hpp", nodes), &OriginFilter::MainHeader)
        .unwrap();
    builder.finish()
}

fn find<'g>(graph: &'g DeclarationGraph, qualified: &str) -> &'g Declaration {
    graph
        .decls()
        .iter()
        .find(|d| graph.qualified_name(d.id) == qualified)
        .unwrap_or_else(|| panic!("no declaration named {qualified}"))
}

#[test]
fn test_enum_implicit_values_continue_from_previous() {
    let graph = build(json!([
        { "id": 1, "kind": "enum", "name": "" },
        { "id": 2, "kind": "enum_constant", "name": "FOO", "parent": 1, "value": 10 },
        { "id": 3, "kind": "enum_constant", "name": "BAR", "parent": 1, "value": 1 },
        { "id": 4, "kind": "enum_constant", "name": "BAZ", "parent": 1 },
        { "id": 5, "kind": "typedef", "name": "D",
          "ty": { "base": { "named": { "name": "D", "decl": 1 } } } }
    ]));

    let decl = find(&graph, "D");
    assert_eq!(decl.kind, DeclKind::Enum);
    assert!(decl.flags.contains(DeclFlags::TYPEDEF_NAME));
    let DeclDetail::Enum { constants } = &decl.detail else {
        panic!("expected enum detail");
    };
    let values: Vec<(&str, i64, bool)> = constants
        .iter()
        .map(|c| (c.name.as_str(), c.value, c.explicit))
        .collect();
    assert_eq!(
        values,
        vec![("FOO", 10, true), ("BAR", 1, true), ("BAZ", 2, false)]
    );
    // The typedef was folded, not added as a second declaration.
    assert_eq!(graph.decls().len(), 1);
}

#[test]
fn test_anonymous_aggregates_get_ordinal_names() {
    let graph = build(json!([
        { "id": 1, "kind": "struct", "name": "Outer",
          "location": { "file": "test.hpp", "line": 3, "column": 8 } },
        { "id": 2, "kind": "union", "name": "", "parent": 1,
          "location": { "file": "test.hpp", "line": 4, "column": 5 } },
        { "id": 3, "kind": "field", "name": "as_int", "parent": 2, "ty": "int" },
        { "id": 4, "kind": "struct", "name": "" },
        { "id": 5, "kind": "field", "name": "x", "parent": 4, "ty": "int" }
    ]));

    let names: Vec<&str> = graph
        .decls()
        .iter()
        .filter(|d| d.is_anonymous())
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(names, vec!["pxdgen_anon_0", "pxdgen_anon_1"]);

    // The union inside Outer is not named by any field.
    let warnings: Vec<_> = graph.diagnostics_for(UnitId(0)).collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message_text.contains("pxdgen_anon_0"));
    assert_eq!(warnings[0].line, 4);
    let related = &warnings[0].related_information;
    assert_eq!(related.len(), 1);
    assert_eq!((related[0].file.as_str(), related[0].line), ("test.hpp", 3));
    assert_eq!(related[0].message_text, "'Outer' is declared here");
}

#[test]
fn test_nesting_and_namespaces() {
    let graph = build(json!([
        { "id": 1, "kind": "namespace", "name": "Foo" },
        { "id": 2, "kind": "struct", "name": "B", "parent": 1 },
        { "id": 3, "kind": "typedef", "name": "Dataset", "parent": 2,
          "ty": { "base": { "named": { "name": "std::vector", "args": ["int"] } } } },
        { "id": 4, "kind": "field", "name": "local_dataset", "parent": 2,
          "ty": { "base": { "named": { "name": "Dataset", "decl": 3 } } } },
        { "id": 5, "kind": "namespace", "name": "Bar", "parent": 1 },
        { "id": 6, "kind": "namespace", "name": "", "parent": 5 },
        { "id": 7, "kind": "variable", "name": "counter", "parent": 6, "ty": "int" }
    ]));

    let dataset = find(&graph, "Foo::B::Dataset");
    let b = find(&graph, "Foo::B");
    assert_eq!(dataset.parent, Some(b.id));
    assert_eq!(graph.namespace(dataset.namespace).qualified_name(), "Foo");
    // Nested typedef makes B a C++ class.
    assert!(b.nests_children());

    let field = find(&graph, "Foo::B::local_dataset");
    let DeclDetail::Variable { ty } = &field.detail else {
        panic!("expected variable");
    };
    assert_eq!(ty.as_named().unwrap().target, Some(dataset.id));

    // Anonymous namespaces are transparent.
    let counter = find(&graph, "Foo::Bar::counter");
    assert_eq!(graph.namespace(counter.namespace).qualified_name(), "Foo::Bar");
}

#[test]
fn test_template_parameters_are_tagged() {
    let graph = build(json!([
        { "id": 1, "kind": "class_template", "name": "A", "template_params": ["T"] },
        { "id": 2, "kind": "method", "name": "get", "parent": 1, "access": "public",
          "ty": "T&" },
        { "id": 3, "kind": "parameter", "name": "other", "parent": 2,
          "ty": { "base": { "named": { "name": "std::vector", "args": ["T"] } } } }
    ]));

    let get = find(&graph, "A::get");
    let sig = get.function().unwrap();
    assert_eq!(
        sig.ret.as_ref().unwrap().base,
        BaseType::TemplateParam("T".to_string())
    );
    let mut tagged = 0;
    sig.params[0].ty.visit(&mut |t| {
        if matches!(t.base, BaseType::TemplateParam(_)) {
            tagged += 1;
        }
    });
    assert_eq!(tagged, 1);
}

#[test]
fn test_function_parameters_and_defaults() {
    let graph = build(json!([
        { "id": 1, "kind": "function", "name": "open", "ty": "int" },
        { "id": 2, "kind": "parameter", "name": "path", "parent": 1, "ty": "const char*" },
        { "id": 3, "kind": "parameter", "name": "flags", "parent": 1, "ty": "int", "has_default": true },
        { "id": 4, "kind": "struct", "name": "local", "parent": 1 }
    ]));

    let open = find(&graph, "open");
    let sig = open.function().unwrap();
    assert_eq!(sig.params.len(), 2);
    assert_eq!(sig.first_default(), 1);
    assert!(open.children.is_empty());
    assert_eq!(graph.decls().len(), 1);
}

#[test]
fn test_origin_filter_drops_included_declarations() {
    let graph = build(json!([
        { "id": 1, "kind": "struct", "name": "Mine", "location": { "file": "test.hpp", "line": 1, "column": 1 } },
        { "id": 2, "kind": "struct", "name": "Theirs", "location": { "file": "other.h", "line": 1, "column": 1 } },
        { "id": 3, "kind": "field", "name": "x", "parent": 2, "ty": "int" }
    ]));

    assert_eq!(graph.decls().len(), 1);
    assert_eq!(graph.decls()[0].name, "Mine");
}

#[test]
fn test_units_share_declarations_reported_twice() {
    let included = json!({ "file": "b.h", "line": 3, "column": 1 });
    let mut builder = GraphBuilder::new();
    builder
        .add_unit(
            stream(
                "a.h",
                json!([
                    { "id": 1, "kind": "struct", "name": "Shared", "location": included.clone() },
                    { "id": 2, "kind": "field", "name": "x", "parent": 1, "ty": "int",
                      "location": { "file": "b.h", "line": 4, "column": 5 } },
                    { "id": 3, "kind": "variable", "name": "a_var",
                      "ty": { "base": { "named": { "name": "Shared", "decl": 1 } } } }
                ]),
            ),
            &OriginFilter::AllHeaders,
        )
        .unwrap();
    builder
        .add_unit(
            stream(
                "b.h",
                json!([
                    { "id": 10, "kind": "struct", "name": "Shared", "location": included },
                    { "id": 11, "kind": "field", "name": "x", "parent": 10, "ty": "int",
                      "location": { "file": "b.h", "line": 4, "column": 5 } }
                ]),
            ),
            &OriginFilter::MainHeader,
        )
        .unwrap();
    let graph = builder.finish();

    let shared: Vec<_> = graph.decls().iter().filter(|d| d.name == "Shared").collect();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].children.len(), 1);
    // Owned by the unit whose own header declares it.
    assert_eq!(shared[0].unit, UnitId(1));
    assert_eq!(find(&graph, "a_var").unit, UnitId(0));
}

#[test]
fn test_failed_unit_leaves_graph_untouched() {
    let mut builder = GraphBuilder::new();
    let err = builder
        .add_unit(
            stream(
                "bad.h",
                json!([
                    { "id": 1, "kind": "namespace", "name": "Lost" },
                    { "id": 2, "kind": "struct", "name": "S", "parent": 1 },
                    { "id": 3, "kind": "field", "name": "x", "parent": 99, "ty": "int" }
                ]),
            ),
            &OriginFilter::MainHeader,
        )
        .unwrap_err();
    assert_eq!(err, ModelError::DanglingParent { node: 3, parent: 99 });

    let graph = builder.finish();
    assert!(graph.decls().is_empty());
    assert!(graph.units().is_empty());
    assert_eq!(graph.namespaces().len(), 1);
}

#[test]
fn test_unsupported_version_is_rejected() {
    let mut builder = GraphBuilder::new();
    let mut bad = stream("v.h", json!([]));
    bad.version = 7;
    assert_eq!(
        builder.add_unit(bad, &OriginFilter::MainHeader).unwrap_err(),
        ModelError::UnsupportedVersion { found: 7 }
    );
}

#[test]
fn test_macro_classification() {
    assert_eq!(classify_macro("42"), MacroValue::Integer);
    assert_eq!(classify_macro("(0x1Fu)"), MacroValue::Integer);
    assert_eq!(classify_macro("-7L"), MacroValue::Integer);
    assert_eq!(classify_macro("3.14f"), MacroValue::Float);
    assert_eq!(classify_macro("1e-3"), MacroValue::Float);
    assert_eq!(classify_macro("\"text\""), MacroValue::Other);
    assert_eq!(classify_macro("FOO | BAR"), MacroValue::Other);
}

#[test]
fn test_empty_macros_are_skipped() {
    let graph = build(json!([
        { "id": 1, "kind": "macro", "name": "TEST_HPP", "body": "" },
        { "id": 2, "kind": "macro", "name": "LIMIT", "body": "128" },
        { "id": 3, "kind": "macro", "name": "MAX", "body": "((a) > (b) ? (a) : (b))", "is_function_like": true }
    ]));
    let names: Vec<&str> = graph.decls().iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["LIMIT", "MAX"]);
}
