use super::*;

#[test]
fn test_known_keys_combine() {
    let options = GeneratorOptions::from_keys(["autodefine", "DEFINES"]).unwrap();
    assert!(options.autodefine());
    assert!(options.emit_defines());
    assert!(options.emit_imports());
}

#[test]
fn test_noimport_disables_imports() {
    let options = GeneratorOptions::from_keys(["noimport"]).unwrap();
    assert!(!options.emit_imports());
    assert!(!options.autodefine());
}

#[test]
fn test_unknown_key_is_rejected() {
    let err = GeneratorOptions::from_keys(["autodefine", "turbo"]).unwrap_err();
    assert_eq!(err.key, "turbo");
    assert!(err.to_string().contains("autodefine, noimport, defines"));
}

#[test]
fn test_default_has_no_flags() {
    assert_eq!(GeneratorOptions::default().flags, GeneratorFlags::empty());
}
