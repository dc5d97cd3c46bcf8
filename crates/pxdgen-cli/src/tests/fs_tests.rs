use std::path::{Path, PathBuf};

use super::config::{HeaderSelection, build_glob};
use super::fs::{GlobOriginPolicy, discover_headers, origin_policy};
use pxdgen_common::SourceLocation;
use pxdgen_model::OriginPolicy;

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, "").unwrap();
}

#[test]
fn discovery_matches_relative_paths_in_sorted_order() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "zeta.h");
    touch(dir.path(), "core/mem.hpp");
    touch(dir.path(), "core/mem.cpp");
    touch(dir.path(), "alpha.h");
    touch(dir.path(), "docs/readme.md");

    let pattern = build_glob("**/*.{h,hpp}").unwrap();
    let found = discover_headers(dir.path(), &pattern);
    let relative: Vec<PathBuf> = found.iter().map(|h| h.relative.clone()).collect();
    assert_eq!(
        relative,
        vec![
            PathBuf::from("alpha.h"),
            PathBuf::from("core/mem.hpp"),
            PathBuf::from("zeta.h"),
        ]
    );
    assert_eq!(found[1].path, dir.path().join("core/mem.hpp"));
}

#[test]
fn discovery_of_an_empty_tree_finds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = build_glob("**/*.h").unwrap();
    assert!(discover_headers(dir.path(), &pattern).is_empty());
}

#[test]
fn glob_policy_admits_main_header_and_matching_includes() {
    let pattern = build_glob("cx*.h").unwrap();
    let policy = GlobOriginPolicy::new(&pattern);
    let origin = |file: &str| SourceLocation::new(file, 1, 1);

    assert!(policy.admits("include/cxmem.h", &origin("include/cxmem.h"), false));
    // Matched by file name when the spelled path has directories.
    assert!(policy.admits("include/cxmem.h", &origin("include/cxutil.h"), false));
    assert!(!policy.admits("include/cxmem.h", &origin("include/other.h"), false));
    // System headers never come along.
    assert!(!policy.admits("include/cxmem.h", &origin("/usr/include/cxsys.h"), true));
}

#[test]
fn selections_map_to_origin_policies() {
    let origin = SourceLocation::new("other.h", 3, 1);

    let main_only = origin_policy(&HeaderSelection::MainHeader);
    assert!(!main_only.admits("main.h", &origin, false));

    let all = origin_policy(&HeaderSelection::AllHeaders);
    assert!(all.admits("main.h", &origin, false));
    assert!(!all.admits("main.h", &origin, true));

    let matching = HeaderSelection::Matching(build_glob("other.h").unwrap());
    assert!(origin_policy(&matching).admits("main.h", &origin, false));
}
