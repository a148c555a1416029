use crate::language::LanguageId;
use std::collections::BTreeSet;

/// Languages whose analysis errors are logged instead of failing the build.
/// Entries are either a full `group:name:version` id or a bare language name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PardonedSet {
    specs: BTreeSet<String>,
}

impl PardonedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, spec: impl Into<String>) {
        let spec = spec.into();
        let spec = spec.trim();
        if !spec.is_empty() {
            self.specs.insert(spec.to_string());
        }
    }

    pub fn contains(&self, language: &LanguageId) -> bool {
        self.specs.iter().any(|spec| language.matches_spec(spec))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for PardonedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for spec in iter {
            set.insert(spec);
        }
        set
    }
}

impl<S: Into<String>> Extend<S> for PardonedSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for spec in iter {
            self.insert(spec);
        }
    }
}
