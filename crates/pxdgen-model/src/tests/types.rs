use super::*;
use serde_json::json;

#[test]
fn test_spelled_shorthand_splits_qualifiers() {
    let ty = TypeRef::spelled("const char**");
    assert!(ty.is_const);
    assert_eq!(ty.chain.as_slice(), &[Qualifier::POINTER, Qualifier::POINTER]);
    assert_eq!(ty.as_named().unwrap().qualified_name(), "char");

    let reference = TypeRef::spelled("size_t&");
    assert_eq!(reference.chain.as_slice(), &[Qualifier::LvalueRef]);

    let rvalue = TypeRef::spelled("T&&");
    assert_eq!(rvalue.chain.as_slice(), &[Qualifier::RvalueRef]);
    assert!(rvalue.has_rvalue_ref());

    let const_pointer = TypeRef::spelled("char* const");
    assert_eq!(const_pointer.chain.as_slice(), &[Qualifier::Pointer { is_const: true }]);
    assert_eq!(const_pointer.as_named().unwrap().qualified_name(), "char");

    let table = TypeRef::spelled("const char * const *");
    assert!(table.is_const);
    assert_eq!(
        table.chain.as_slice(),
        &[Qualifier::Pointer { is_const: true }, Qualifier::POINTER]
    );

    // Trailing text that is not a qualifier never turns into one.
    let odd = TypeRef::spelled("char* volatile");
    assert!(odd.chain.is_empty());
    assert_eq!(odd.as_named().unwrap().last_name(), "char* volatile");
}

#[test]
fn test_multiword_builtin_is_one_segment() {
    let ty = TypeRef::spelled("unsigned long long");
    let named = ty.as_named().unwrap();
    assert!(named.is_single());
    assert_eq!(named.last_name(), "unsigned long long");
}

#[test]
fn test_elaborated_keyword_becomes_tag() {
    let ty: TypeRef = serde_json::from_value(json!({
        "base": { "named": { "name": "struct timeval" } },
        "chain": [ { "pointer": {} } ]
    }))
    .unwrap();
    let named = ty.as_named().unwrap();
    assert_eq!(named.qualified_name(), "timeval");
    assert_eq!(named.tag, Some(TagKind::Struct));
    assert!(ty.innermost_is_pointer());
}

#[test]
fn test_nested_function_pointer_descriptor() {
    // int (**foobar)(std::vector<std::vector<const char*>>)
    let ty: TypeRef = serde_json::from_value(json!({
        "base": { "function": {
            "ret": "int",
            "params": [ { "base": { "named": {
                "name": "std::vector",
                "args": [ { "base": { "named": {
                    "name": "std::vector",
                    "args": [ "const char*" ]
                } } } ]
            } } } ]
        } },
        "chain": [ { "pointer": {} }, { "pointer": {} } ]
    }))
    .unwrap();

    let function = ty.as_function().unwrap();
    assert_eq!(function.params.len(), 1);
    assert_eq!(ty.chain.len(), 2);

    let mut names = Vec::new();
    ty.visit(&mut |t| {
        if let Some(named) = t.as_named() {
            names.push(named.qualified_name());
        }
    });
    assert_eq!(names, vec!["int", "std::vector", "std::vector", "char"]);
}

#[test]
fn test_segment_arguments_and_values() {
    let ty: TypeRef = serde_json::from_value(json!({
        "base": { "named": { "name": [
            "Foo",
            { "name": "A", "args": [ "int", 4 ] },
            "Inner"
        ] } }
    }))
    .unwrap();
    let named = ty.as_named().unwrap();
    assert_eq!(named.qualified_name(), "Foo::A::Inner");
    assert_eq!(named.segments[1].args.len(), 2);
    assert_eq!(named.segments[1].args[1], TemplateArg::Value(4));
}

#[test]
fn test_visit_mut_reaches_template_arguments() {
    let mut ty: TypeRef = serde_json::from_value(json!({
        "base": { "named": { "name": "std::vector", "args": [ "T" ] } }
    }))
    .unwrap();
    ty.visit_mut(&mut |t| {
        if t.as_named().is_some_and(|n| n.last_name() == "T") {
            t.base = BaseType::TemplateParam("T".to_string());
        }
    });
    let named = ty.as_named().unwrap();
    assert_eq!(
        named.segments[1].args[0],
        TemplateArg::Type(TypeRef {
            base: BaseType::TemplateParam("T".to_string()),
            is_const: false,
            chain: QualifierChain::new(),
        })
    );
}
