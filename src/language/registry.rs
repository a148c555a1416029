use super::{Language, LanguageId};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::warn;

/// Owns every loaded language for the lifetime of the process. Constructed
/// once and handed to whoever needs it.
pub struct LanguageRegistry {
    languages: RwLock<BTreeMap<LanguageId, Arc<dyn Language>>>,
}

impl LanguageRegistry {
    pub fn new() -> Self {
        Self {
            languages: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn with_languages(languages: impl IntoIterator<Item = Arc<dyn Language>>) -> Self {
        let registry = Self::new();
        for language in languages {
            registry.register(language);
        }
        registry
    }

    /// Returns false when a language with the same id is already loaded; the
    /// existing one is kept.
    pub fn register(&self, language: Arc<dyn Language>) -> bool {
        let mut languages = self.languages.write().unwrap_or_else(PoisonError::into_inner);
        if languages.contains_key(language.id()) {
            return false;
        }
        languages.insert(language.id().clone(), language);
        true
    }

    pub fn get(&self, id: &LanguageId) -> Option<Arc<dyn Language>> {
        self.languages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn contains(&self, id: &LanguageId) -> bool {
        self.languages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// All languages in id order.
    pub fn languages(&self) -> Vec<Arc<dyn Language>> {
        self.languages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Languages whose id matches `spec` (full id or bare name).
    pub fn find(&self, spec: &str) -> Vec<Arc<dyn Language>> {
        self.languages()
            .into_iter()
            .filter(|l| l.id().matches_spec(spec))
            .collect()
    }

    /// The single language that claims `path`. Nothing is returned when no
    /// language or more than one language claims it.
    pub fn identify(&self, path: &Path) -> Option<Arc<dyn Language>> {
        let mut candidates: Vec<_> = self
            .languages()
            .into_iter()
            .filter(|l| l.identifies(path))
            .collect();

        match candidates.len() {
            0 => None,
            1 => candidates.pop(),
            _ => {
                let ids: Vec<String> = candidates.iter().map(|l| l.id().to_string()).collect();
                warn!(
                    file = %path.display(),
                    candidates = %ids.join(", "),
                    "File is claimed by more than one language, ignoring it"
                );
                None
            }
        }
    }

    /// Whether the language `id` is loaded and claims `path`.
    pub fn identifies(&self, path: &Path, id: &LanguageId) -> bool {
        self.get(id).map(|l| l.identifies(path)).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.languages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}
