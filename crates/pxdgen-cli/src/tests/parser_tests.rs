use std::path::{Path, PathBuf};

use super::args::SourceLanguage;
use super::config::ParserSettings;
use super::parser::{DumpParser, HeaderParser, ParseError, ParserBackend, is_node_stream_dump};
use pxdgen_model::Language;

const DUMP: &str = r#"{
    "version": 1,
    "translation_unit": "point.h",
    "nodes": [
        { "id": 1, "kind": "struct", "name": "Point" },
        { "id": 2, "kind": "field", "name": "x", "parent": 1, "ty": "int" }
    ]
}"#;

fn settings(program: &Path) -> ParserSettings {
    ParserSettings {
        program: program.to_path_buf(),
        language: None,
        include_dirs: Vec::new(),
    }
}

#[test]
fn recognises_dump_inputs() {
    assert!(is_node_stream_dump(Path::new("dumps/point.json")));
    assert!(is_node_stream_dump(Path::new("POINT.JSON")));
    assert!(!is_node_stream_dump(Path::new("point.h")));
    assert!(!is_node_stream_dump(Path::new("json")));
}

#[test]
fn dump_parser_reads_streams_and_overrides_language() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("point.json");
    std::fs::write(&path, DUMP).unwrap();

    let stream = DumpParser::default().parse(&path).expect("dump should parse");
    assert_eq!(stream.translation_unit, "point.h");
    assert_eq!(stream.nodes.len(), 2);
    assert_eq!(stream.language, None);

    let forced = DumpParser {
        language: Some(SourceLanguage::Cpp),
    };
    assert_eq!(forced.parse(&path).unwrap().language, Some(Language::Cpp));
}

#[test]
fn broken_dumps_are_file_scoped_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ \"version\": 1, ").unwrap();

    let err = DumpParser::default().parse(&path).unwrap_err();
    assert!(matches!(err, ParseError::Malformed { .. }));
    assert!(!err.is_fatal());
    assert_eq!(err.code(), 1001);

    let err = DumpParser::default()
        .parse(&dir.path().join("missing.json"))
        .unwrap_err();
    assert!(matches!(err, ParseError::Io { .. }));
}

#[test]
fn dumps_only_batches_never_probe_the_parser() {
    let backend = ParserBackend::for_inputs(
        &settings(Path::new("/nonexistent/pxdgen-clang-dump")),
        &[PathBuf::from("a.json"), PathBuf::from("b.json")],
    );
    assert!(backend.is_ok());
}

#[test]
fn missing_parser_is_fatal() {
    let err = ParserBackend::for_inputs(
        &settings(Path::new("/nonexistent/pxdgen-clang-dump")),
        &[PathBuf::from("point.h")],
    )
    .unwrap_err();
    assert!(matches!(err, ParseError::Unavailable { .. }));
    assert!(err.is_fatal());
    assert_eq!(err.code(), 9002);
}

#[cfg(unix)]
fn script(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-parser");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut permissions = std::fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).unwrap();
    path
}

#[cfg(unix)]
#[test]
fn external_parser_is_probed_then_invoked_per_header() {
    let dir = tempfile::tempdir().unwrap();
    let dump = dir.path().join("stream.json");
    std::fs::write(&dump, DUMP).unwrap();
    let args_log = dir.path().join("args.log");
    let program = script(
        dir.path(),
        &format!(
            "if [ \"$1\" = \"--node-stream-version\" ]; then echo 1; exit 0; fi\n\
             echo \"$@\" > '{}'\n\
             cat '{}'",
            args_log.display(),
            dump.display()
        ),
    );

    let settings = ParserSettings {
        program,
        language: Some(SourceLanguage::Cpp),
        include_dirs: vec![PathBuf::from("inc")],
    };
    let backend = ParserBackend::for_inputs(&settings, &[PathBuf::from("point.h")])
        .expect("probe should succeed");
    let stream = backend.parse(Path::new("point.h")).expect("parser output should load");
    assert_eq!(stream.translation_unit, "point.h");

    let invoked = std::fs::read_to_string(&args_log).unwrap();
    assert_eq!(invoked.trim(), "-x c++ -I inc point.h");
}

#[cfg(unix)]
#[test]
fn incompatible_parser_version_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let program = script(dir.path(), "echo 7");

    let err = ParserBackend::for_inputs(&settings(&program), &[PathBuf::from("point.h")])
        .unwrap_err();
    assert!(matches!(err, ParseError::IncompatibleVersion { found: 7, .. }));
    assert!(err.is_fatal());
}

#[cfg(unix)]
#[test]
fn parser_failure_only_fails_that_header() {
    let dir = tempfile::tempdir().unwrap();
    let program = script(
        dir.path(),
        "if [ \"$1\" = \"--node-stream-version\" ]; then echo 1; exit 0; fi\n\
         echo \"$1: fatal error: 'missing.h' file not found\" >&2\n\
         exit 1",
    );

    let backend = ParserBackend::for_inputs(&settings(&program), &[PathBuf::from("bad.h")]).unwrap();
    let err = backend.parse(Path::new("bad.h")).unwrap_err();
    assert!(matches!(err, ParseError::Failed { status: Some(1), .. }));
    assert!(!err.is_fatal());
    assert!(err.to_string().contains("'missing.h' file not found"));
}
