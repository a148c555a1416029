//! Grouping expanded files by the language that owns them.

use super::expand::expand;
use super::BuildError;
use crate::fs::FileSystem;
use crate::language::{LanguageId, LanguageRegistry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// A source or include root as given by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceRoot {
    /// Files below the path already belong to `language` (name or full id).
    Pinned { language: String, path: PathBuf },
    /// Every file below the path is classified independently.
    Path(PathBuf),
}

impl SourceRoot {
    pub fn path(&self) -> &Path {
        match self {
            SourceRoot::Pinned { path, .. } | SourceRoot::Path(path) => path,
        }
    }

    /// Resolves a relative root against `base`.
    pub fn resolve(&self, base: &Path) -> SourceRoot {
        match self {
            SourceRoot::Pinned { language, path } => SourceRoot::Pinned {
                language: language.clone(),
                path: base.join(path),
            },
            SourceRoot::Path(path) => SourceRoot::Path(base.join(path)),
        }
    }
}

impl From<PathBuf> for SourceRoot {
    fn from(path: PathBuf) -> Self {
        SourceRoot::Path(path)
    }
}

/// Files keyed by owning language. A file belongs to at most one language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSet {
    files: BTreeMap<LanguageId, BTreeSet<PathBuf>>,
    owners: BTreeMap<PathBuf, LanguageId>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expands every root and classifies the files. Unclaimed files are
    /// silently dropped; pinned roots keep only the files their language
    /// claims.
    pub fn from_roots(
        fs: &dyn FileSystem,
        registry: &LanguageRegistry,
        roots: &[SourceRoot],
    ) -> Result<Self, BuildError> {
        let mut set = Self::new();
        for root in roots {
            match root {
                SourceRoot::Path(path) => set.add_classified(fs, registry, path)?,
                SourceRoot::Pinned { language, path } => {
                    let id = pinned_language(registry, language)?;
                    set.add_pinned(fs, registry, &id, path)?;
                }
            }
        }
        Ok(set)
    }

    pub fn add_classified(
        &mut self,
        fs: &dyn FileSystem,
        registry: &LanguageRegistry,
        root: &Path,
    ) -> Result<(), BuildError> {
        for file in expand(fs, root)? {
            match registry.identify(&file) {
                Some(language) => {
                    self.insert(language.id().clone(), file);
                }
                None => trace!(file = %file.display(), "No language claims file"),
            }
        }
        Ok(())
    }

    pub fn add_pinned(
        &mut self,
        fs: &dyn FileSystem,
        registry: &LanguageRegistry,
        language: &LanguageId,
        root: &Path,
    ) -> Result<(), BuildError> {
        if !registry.contains(language) {
            return Err(BuildError::UnknownLanguage(language.to_string()));
        }
        for file in expand(fs, root)? {
            if registry.identifies(&file, language) {
                self.insert(language.clone(), file);
            } else {
                debug!(
                    file = %file.display(),
                    language = %language,
                    "Dropping file not claimed by its pinned language"
                );
            }
        }
        Ok(())
    }

    /// Returns false when the file is already owned by a language.
    pub fn insert(&mut self, language: LanguageId, file: PathBuf) -> bool {
        if let Some(owner) = self.owners.get(&file) {
            if owner != &language {
                debug!(
                    file = %file.display(),
                    owner = %owner,
                    ignored = %language,
                    "File already assigned to another language"
                );
            }
            return false;
        }
        self.owners.insert(file.clone(), language.clone());
        self.files.entry(language).or_default().insert(file)
    }

    pub fn languages(&self) -> impl Iterator<Item = &LanguageId> {
        self.files.keys()
    }

    pub fn files(&self, language: &LanguageId) -> impl Iterator<Item = &PathBuf> {
        self.files.get(language).into_iter().flatten()
    }

    pub fn contains(&self, file: &Path) -> bool {
        self.owners.contains_key(file)
    }

    pub fn language_of(&self, file: &Path) -> Option<&LanguageId> {
        self.owners.get(file)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

fn pinned_language(registry: &LanguageRegistry, spec: &str) -> Result<LanguageId, BuildError> {
    let mut matches = registry.find(spec);
    match matches.len() {
        0 => Err(BuildError::UnknownLanguage(spec.to_string())),
        1 => Ok(matches.remove(0).id().clone()),
        _ => Err(BuildError::AmbiguousLanguage {
            spec: spec.to_string(),
            candidates: matches.iter().map(|l| l.id().to_string()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;
    use crate::language::{Language, MockLanguage};
    use std::sync::Arc;

    fn registry() -> LanguageRegistry {
        LanguageRegistry::with_languages([
            Arc::new(MockLanguage::new("entity", "ent")) as Arc<dyn Language>,
            Arc::new(MockLanguage::new("query", "qry")) as Arc<dyn Language>,
        ])
    }

    fn entity() -> LanguageId {
        LanguageId::new("org.example", "entity", "1.0.0")
    }

    fn query() -> LanguageId {
        LanguageId::new("org.example", "query", "1.0.0")
    }

    fn fs() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("src/a.ent", "");
        fs.add_file("src/b.ent", "");
        fs.add_file("src/q.qry", "");
        fs.add_file("src/readme.md", "");
        fs
    }

    #[test]
    fn test_classify_groups_by_language_and_drops_unknown() {
        let set = SourceSet::from_roots(
            &fs(),
            &registry(),
            &[SourceRoot::Path(PathBuf::from("/mock/src"))],
        )
        .unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(set.files(&entity()).count(), 2);
        assert_eq!(set.files(&query()).count(), 1);
        assert!(!set.contains(Path::new("/mock/src/readme.md")));
    }

    #[test]
    fn test_pinned_drops_files_of_other_languages() {
        let set = SourceSet::from_roots(
            &fs(),
            &registry(),
            &[SourceRoot::Pinned {
                language: "entity".to_string(),
                path: PathBuf::from("/mock/src"),
            }],
        )
        .unwrap();

        assert_eq!(set.languages().collect::<Vec<_>>(), vec![&entity()]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_pinned_unknown_language() {
        let err = SourceSet::from_roots(
            &fs(),
            &registry(),
            &[SourceRoot::Pinned {
                language: "missing".to_string(),
                path: PathBuf::from("/mock/src"),
            }],
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::UnknownLanguage(spec) if spec == "missing"));
    }

    #[test]
    fn test_pinned_ambiguous_language() {
        let registry = registry();
        registry.register(Arc::new(MockLanguage::new("entity", "ent").with_version("2.0.0")));

        let err = SourceSet::from_roots(
            &fs(),
            &registry,
            &[SourceRoot::Pinned {
                language: "entity".to_string(),
                path: PathBuf::from("/mock/src"),
            }],
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::AmbiguousLanguage { .. }));
    }

    #[test]
    fn test_missing_root_contributes_nothing() {
        let set = SourceSet::from_roots(
            &fs(),
            &registry(),
            &[SourceRoot::Path(PathBuf::from("/mock/not-there"))],
        )
        .unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_file_owned_by_first_language() {
        let mut set = SourceSet::new();
        let file = PathBuf::from("/mock/src/a.ent");
        assert!(set.insert(entity(), file.clone()));
        assert!(!set.insert(query(), file.clone()));
        assert_eq!(set.language_of(&file), Some(&entity()));
        assert_eq!(set.files(&query()).count(), 0);
    }

    #[test]
    fn test_source_root_yaml_shapes() {
        let roots: Vec<SourceRoot> =
            serde_yaml::from_str("- src\n- { language: entity, path: model }\n").unwrap();
        assert_eq!(roots[0], SourceRoot::Path(PathBuf::from("src")));
        assert_eq!(
            roots[1].resolve(Path::new("/p")),
            SourceRoot::Pinned {
                language: "entity".to_string(),
                path: PathBuf::from("/p/model"),
            }
        );
    }
}
