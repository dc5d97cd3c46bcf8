//! Cross-file import resolution.
//!
//! Every name an output file introduces lives in one flat scope: its own
//! top-level declarations, stub placeholders, and import aliases. The
//! resolver hands out aliases in first-use order and appends `_1`, `_2`, ...
//! when the preferred spelling is already taken.

use std::fmt;

use indexmap::IndexMap;
use pxdgen_common::limits::MAX_ALIAS_SUFFIX;
use rustc_hash::FxHashSet;
use tracing::trace;

/// One `from <module> cimport <symbol> as <alias>` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEdge {
    pub module: String,
    pub symbol: String,
    pub alias: String,
}

impl ImportEdge {
    pub fn to_line(&self) -> String {
        if self.alias == self.symbol {
            format!("from {} cimport {}", self.module, self.symbol)
        } else {
            format!("from {} cimport {} as {}", self.module, self.symbol, self.alias)
        }
    }
}

/// The suffix space for an alias ran out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCollisionError {
    pub name: String,
}

impl fmt::Display for NameCollisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no unique name left for '{}' after {} suffixes",
            self.name, MAX_ALIAS_SUFFIX
        )
    }
}

impl std::error::Error for NameCollisionError {}

#[derive(Debug, Default)]
pub struct ImportResolver {
    taken: FxHashSet<String>,
    edges: IndexMap<(String, String), String>,
}

impl ImportResolver {
    /// `reserved` are the names the file declares itself.
    pub fn new<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            taken: reserved.into_iter().map(Into::into).collect(),
            edges: IndexMap::new(),
        }
    }

    /// Alias under which `symbol` from `module` is visible in this file.
    /// Repeated requests return the alias handed out first.
    pub fn request(
        &mut self,
        module: &str,
        symbol: &str,
        preferred: &str,
    ) -> Result<String, NameCollisionError> {
        let key = (module.to_string(), symbol.to_string());
        if let Some(alias) = self.edges.get(&key) {
            return Ok(alias.clone());
        }
        let alias = self.claim(preferred)?;
        trace!(module, symbol, alias = %alias, "import requested");
        self.edges.insert(key, alias.clone());
        Ok(alias)
    }

    /// Reserve a fresh name, suffixing `preferred` if it is already in use.
    pub fn claim(&mut self, preferred: &str) -> Result<String, NameCollisionError> {
        if self.taken.insert(preferred.to_string()) {
            return Ok(preferred.to_string());
        }
        for n in 1..=MAX_ALIAS_SUFFIX {
            let candidate = format!("{preferred}_{n}");
            if self.taken.insert(candidate.clone()) {
                return Ok(candidate);
            }
        }
        Err(NameCollisionError {
            name: preferred.to_string(),
        })
    }

    /// Import lines in first-use order.
    pub fn edges(&self) -> Vec<ImportEdge> {
        self.edges
            .iter()
            .map(|((module, symbol), alias)| ImportEdge {
                module: module.clone(),
                symbol: symbol.clone(),
                alias: alias.clone(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/imports.rs"]
mod tests;
