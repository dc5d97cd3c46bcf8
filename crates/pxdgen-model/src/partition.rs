//! Namespace/Package Partitioner.
//!
//! Groups namespace-level declarations by `(owning unit, innermost
//! namespace)` into packages, then maps packages onto output files.
//! Declarations nested in classes stay inside their outer declaration and so
//! inside its package.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::decl::{DeclId, NamespaceId, UnitId};
use crate::graph::DeclarationGraph;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// Every namespace package gets its own file next to the unit's file,
    /// which holds the global package.
    PerNamespace,
    /// All packages of a unit share the unit's file.
    PerHeader,
}

#[derive(Debug, Clone)]
pub struct Package {
    pub id: PackageId,
    pub unit: UnitId,
    pub namespace: NamespaceId,
    /// Namespace-level declarations in discovery order.
    pub decls: Vec<DeclId>,
    pub file: FileId,
}

#[derive(Debug, Clone)]
pub struct OutputFile {
    pub id: FileId,
    pub unit: UnitId,
    /// Path relative to the output root.
    pub path: PathBuf,
    /// Dotted module name other files import from.
    pub module: String,
    pub packages: Vec<PackageId>,
}

#[derive(Debug)]
pub struct Partition {
    packages: Vec<Package>,
    files: Vec<OutputFile>,
    /// Package of every declaration, by `DeclId`.
    decl_package: Vec<Option<PackageId>>,
    /// Names that differ from the declaration's own name because another
    /// package in the same file already uses it.
    renamed: FxHashMap<DeclId, String>,
    /// Forward declarations whose definition is emitted into the same file.
    redundant_forwards: FxHashSet<DeclId>,
}

impl Partition {
    /// `targets` gives each unit's file path relative to the output root.
    /// Units without a target use their header's stem.
    pub fn build(
        graph: &DeclarationGraph,
        layout: OutputLayout,
        targets: &FxHashMap<UnitId, PathBuf>,
    ) -> Self {
        let mut keyed: IndexMap<(UnitId, NamespaceId), Vec<DeclId>> = IndexMap::new();
        for decl in graph.decls() {
            if decl.parent.is_none() {
                keyed.entry((decl.unit, decl.namespace)).or_default().push(decl.id);
            }
        }

        let mut partition = Partition {
            packages: Vec::with_capacity(keyed.len()),
            files: Vec::new(),
            decl_package: vec![None; graph.decls().len()],
            renamed: FxHashMap::default(),
            redundant_forwards: FxHashSet::default(),
        };
        let mut file_lookup: FxHashMap<PathBuf, FileId> = FxHashMap::default();
        let mut modules: FxHashSet<String> = FxHashSet::default();

        for ((unit, namespace), decls) in keyed {
            let unit_path = targets
                .get(&unit)
                .cloned()
                .unwrap_or_else(|| default_target(&graph.unit(unit).main_header));
            let path = match layout {
                OutputLayout::PerHeader => unit_path,
                OutputLayout::PerNamespace => {
                    let ns = graph.namespace(namespace);
                    if ns.is_global() {
                        unit_path
                    } else {
                        unit_path.with_file_name(format!("{}.pxd", ns.path.join("_")))
                    }
                }
            };

            let file = match file_lookup.get(&path) {
                Some(&file) => file,
                None => {
                    let file = FileId(partition.files.len() as u32);
                    let module = unique_module(module_name(&path), &mut modules);
                    partition.files.push(OutputFile {
                        id: file,
                        unit,
                        path: path.clone(),
                        module,
                        packages: Vec::new(),
                    });
                    file_lookup.insert(path, file);
                    file
                }
            };

            let id = PackageId(partition.packages.len() as u32);
            partition.files[file.index()].packages.push(id);
            partition.packages.push(Package {
                id,
                unit,
                namespace,
                decls,
                file,
            });
        }

        partition.assign_decl_packages(graph);
        partition.find_redundant_forwards(graph);
        partition.rename_file_collisions(graph);
        debug!(
            packages = partition.packages.len(),
            files = partition.files.len(),
            "partitioned declaration graph"
        );
        partition
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.0 as usize]
    }

    pub fn files(&self) -> &[OutputFile] {
        &self.files
    }

    pub fn file(&self, id: FileId) -> &OutputFile {
        &self.files[id.index()]
    }

    pub fn package_of(&self, decl: DeclId) -> Option<PackageId> {
        self.decl_package.get(decl.index()).copied().flatten()
    }

    pub fn file_of(&self, decl: DeclId) -> Option<FileId> {
        self.package_of(decl).map(|package| self.package(package).file)
    }

    /// Name a declaration is emitted under in its file.
    pub fn local_name<'g>(&'g self, graph: &'g DeclarationGraph, decl: DeclId) -> &'g str {
        self.renamed
            .get(&decl)
            .map(String::as_str)
            .unwrap_or_else(|| graph.decl(decl).name.as_str())
    }

    pub fn is_renamed(&self, decl: DeclId) -> bool {
        self.renamed.contains_key(&decl)
    }

    pub fn is_redundant_forward(&self, decl: DeclId) -> bool {
        self.redundant_forwards.contains(&decl)
    }

    fn assign_decl_packages(&mut self, graph: &DeclarationGraph) {
        for package in &self.packages {
            for &decl in &package.decls {
                self.decl_package[decl.index()] = Some(package.id);
            }
        }
        // Parents precede children, so one forward pass covers nesting.
        for decl in graph.decls() {
            if let Some(parent) = decl.parent {
                self.decl_package[decl.id.index()] = self.decl_package[parent.index()];
            }
        }
    }

    fn find_redundant_forwards(&mut self, graph: &DeclarationGraph) {
        for decl in graph.decls() {
            if decl.is_definition() || !decl.kind.is_aggregate() {
                continue;
            }
            let file = self.file_of(decl.id);
            let defined_here = graph
                .index()
                .candidates(graph.qualified_name(decl.id))
                .iter()
                .any(|&other| {
                    other != decl.id && graph.decl(other).is_definition() && self.file_of(other) == file
                });
            if defined_here {
                self.redundant_forwards.insert(decl.id);
            }
        }
    }

    fn rename_file_collisions(&mut self, graph: &DeclarationGraph) {
        for file in &self.files {
            let mut owners: FxHashMap<&str, PackageId> = FxHashMap::default();
            for &package_id in &file.packages {
                let package = &self.packages[package_id.0 as usize];
                for &decl_id in &package.decls {
                    if self.redundant_forwards.contains(&decl_id) {
                        continue;
                    }
                    let name = graph.decl(decl_id).name.as_str();
                    match owners.get(name) {
                        None => {
                            owners.insert(name, package_id);
                        }
                        Some(&owner) if owner == package_id => {}
                        Some(_) => {
                            let ns = graph.namespace(package.namespace);
                            let mut parts = ns.path.clone();
                            parts.push(name.to_string());
                            self.renamed.insert(decl_id, parts.join("_"));
                        }
                    }
                }
            }
        }
    }
}

/// `core/cxmem.h` becomes `core/cxmem.pxd`.
pub fn default_target(header: &str) -> PathBuf {
    let path = Path::new(header);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("pxdgen");
    PathBuf::from(format!("{stem}.pxd"))
}

/// `core/cxmem.pxd` becomes `core.cxmem`.
pub fn module_name(path: &Path) -> String {
    let without_ext = path.with_extension("");
    let parts: Vec<String> = without_ext
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => part.to_str().map(str::to_string),
            _ => None,
        })
        .collect();
    parts.join(".")
}

fn unique_module(base: String, taken: &mut FxHashSet<String>) -> String {
    let mut candidate = base.clone();
    let mut n = 1;
    while taken.contains(&candidate) {
        candidate = format!("{base}_{n}");
        n += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

#[cfg(test)]
#[path = "tests/partition.rs"]
mod tests;
