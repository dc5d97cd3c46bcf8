use globset::GlobSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use pxdgen_common::SourceLocation;
use pxdgen_model::{OriginFilter, OriginPolicy};

use crate::config::HeaderSelection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredHeader {
    pub path: PathBuf,
    /// Relative to the discovery root; mirrored under the output directory.
    pub relative: PathBuf,
}

/// Files under `root` whose relative path matches `pattern`, sorted so the
/// batch sees the same order on every platform.
pub fn discover_headers(root: &Path, pattern: &GlobSet) -> Vec<DiscoveredHeader> {
    let mut headers: Vec<DiscoveredHeader> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(root).ok()?.to_path_buf();
            pattern.is_match(&relative).then(|| DiscoveredHeader {
                path: entry.path().to_path_buf(),
                relative,
            })
        })
        .collect();
    headers.sort_by(|a, b| a.relative.cmp(&b.relative));
    headers
}

/// Admits the unit's own header plus non-system headers matching a glob,
/// by spelled path or by file name.
pub struct GlobOriginPolicy<'a> {
    pattern: &'a GlobSet,
}

impl<'a> GlobOriginPolicy<'a> {
    pub fn new(pattern: &'a GlobSet) -> Self {
        GlobOriginPolicy { pattern }
    }
}

impl OriginPolicy for GlobOriginPolicy<'_> {
    fn admits(&self, main_header: &str, origin: &SourceLocation, is_system: bool) -> bool {
        if origin.file == main_header {
            return true;
        }
        if is_system {
            return false;
        }
        let path = Path::new(&origin.file);
        self.pattern.is_match(path)
            || path
                .file_name()
                .is_some_and(|name| self.pattern.is_match(Path::new(name)))
    }
}

/// The origin policy a header selection stands for.
pub fn origin_policy(selection: &HeaderSelection) -> Box<dyn OriginPolicy + '_> {
    match selection {
        HeaderSelection::MainHeader => Box::new(OriginFilter::MainHeader),
        HeaderSelection::AllHeaders => Box::new(OriginFilter::AllHeaders),
        HeaderSelection::Matching(pattern) => Box::new(GlobOriginPolicy::new(pattern)),
    }
}
