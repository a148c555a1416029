//! Build contexts: units of shared analysis state scoped to a
//! (location, language) pair.

mod locks;
mod resolver;

pub use locks::ContextLocks;
pub use resolver::{ContextResolver, ContextScope};

use crate::language::LanguageId;
use crate::message::SourceRegion;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId {
    pub location: PathBuf,
    pub language: LanguageId,
}

impl ContextId {
    pub fn new(location: impl Into<PathBuf>, language: LanguageId) -> Self {
        Self {
            location: location.into(),
            language,
        }
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.language, self.location.display())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub region: SourceRegion,
}

/// Names defined per file within one context.
#[derive(Debug, Default)]
pub struct SymbolIndex {
    by_file: BTreeMap<PathBuf, Vec<Symbol>>,
}

impl SymbolIndex {
    /// Replaces everything previously recorded for `file`.
    pub fn replace(&mut self, file: &Path, symbols: Vec<Symbol>) {
        self.by_file.insert(file.to_path_buf(), symbols);
    }

    pub fn remove(&mut self, file: &Path) {
        self.by_file.remove(file);
    }

    pub fn count(&self, name: &str) -> usize {
        self.by_file
            .values()
            .flatten()
            .filter(|symbol| symbol.name == name)
            .count()
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.count(name) > 0
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.by_file.keys().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.by_file.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared, mutable analysis state for one context. Analysis and transform
/// on a context must run under its lock in [`ContextLocks`].
#[derive(Debug)]
pub struct BuildContext {
    id: ContextId,
    output_dir: PathBuf,
    symbols: Mutex<SymbolIndex>,
}

impl BuildContext {
    pub fn new(id: ContextId, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            id,
            output_dir: output_dir.into(),
            symbols: Mutex::new(SymbolIndex::default()),
        }
    }

    pub fn id(&self) -> &ContextId {
        &self.id
    }

    pub fn location(&self) -> &Path {
        &self.id.location
    }

    pub fn language(&self) -> &LanguageId {
        &self.id.language
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn symbols(&self) -> MutexGuard<'_, SymbolIndex> {
        self.symbols.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
