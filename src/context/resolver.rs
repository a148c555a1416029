use super::{BuildContext, ContextId};
use crate::language::LanguageId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::trace;

/// How files are grouped into shared analysis state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextScope {
    /// One context per language for the whole project.
    #[default]
    Project,
    /// One context per language per containing directory.
    Directory,
}

impl FromStr for ContextScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "project" => Ok(Self::Project),
            "directory" | "dir" => Ok(Self::Directory),
            other => Err(format!(
                "unknown context scope '{}', expected project or directory",
                other
            )),
        }
    }
}

impl fmt::Display for ContextScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextScope::Project => write!(f, "project"),
            ContextScope::Directory => write!(f, "directory"),
        }
    }
}

/// Maps (file, language) to a cached [`BuildContext`]. Inputs that share a
/// scope always yield the same instance.
pub struct ContextResolver {
    project_root: PathBuf,
    output_dir: PathBuf,
    scope: ContextScope,
    contexts: Mutex<HashMap<ContextId, Arc<BuildContext>>>,
}

impl ContextResolver {
    pub fn new(
        project_root: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        scope: ContextScope,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            output_dir: output_dir.into(),
            scope,
            contexts: Mutex::new(HashMap::new()),
        }
    }

    pub fn scope(&self) -> ContextScope {
        self.scope
    }

    pub fn context_for(&self, file: &Path, language: &LanguageId) -> Arc<BuildContext> {
        let location = self.location_for(file);
        let id = ContextId::new(location, language.clone());

        let mut contexts = self.contexts.lock().unwrap_or_else(PoisonError::into_inner);
        contexts
            .entry(id.clone())
            .or_insert_with(|| {
                let output_dir = self.output_dir_for(&id.location);
                trace!(context = %id, output = %output_dir.display(), "Created build context");
                Arc::new(BuildContext::new(id, output_dir))
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn location_for(&self, file: &Path) -> PathBuf {
        let parent = file.parent().unwrap_or(Path::new("")).to_path_buf();
        match self.scope {
            ContextScope::Project if file.starts_with(&self.project_root) => {
                self.project_root.clone()
            }
            _ => parent,
        }
    }

    fn output_dir_for(&self, location: &Path) -> PathBuf {
        match location.strip_prefix(&self.project_root) {
            Ok(relative) => self.output_dir.join(relative),
            Err(_) => self.output_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> LanguageId {
        LanguageId::new("org.example", "entity", "1.0.0")
    }

    fn query() -> LanguageId {
        LanguageId::new("org.example", "query", "1.0.0")
    }

    #[test]
    fn test_project_scope_shares_one_context() {
        let resolver = ContextResolver::new("/p", "/p/gen", ContextScope::Project);
        let a = resolver.context_for(Path::new("/p/src/a.ent"), &entity());
        let b = resolver.context_for(Path::new("/p/src/nested/b.ent"), &entity());

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.location(), Path::new("/p"));
        assert_eq!(a.output_dir(), Path::new("/p/gen"));
        assert_eq!(resolver.len(), 1);
    }

    #[test]
    fn test_context_is_per_language() {
        let resolver = ContextResolver::new("/p", "/p/gen", ContextScope::Project);
        let a = resolver.context_for(Path::new("/p/a.ent"), &entity());
        let b = resolver.context_for(Path::new("/p/b.qry"), &query());

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(resolver.len(), 2);
    }

    #[test]
    fn test_directory_scope() {
        let resolver = ContextResolver::new("/p", "/p/gen", ContextScope::Directory);
        let a = resolver.context_for(Path::new("/p/src/a.ent"), &entity());
        let b = resolver.context_for(Path::new("/p/src/b.ent"), &entity());
        let c = resolver.context_for(Path::new("/p/src/nested/c.ent"), &entity());

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(c.location(), Path::new("/p/src/nested"));
        assert_eq!(c.output_dir(), Path::new("/p/gen/src/nested"));
    }

    #[test]
    fn test_file_outside_project_uses_parent_directory() {
        let resolver = ContextResolver::new("/p", "/p/gen", ContextScope::Project);
        let context = resolver.context_for(Path::new("/shared/lib/x.ent"), &entity());

        assert_eq!(context.location(), Path::new("/shared/lib"));
        assert_eq!(context.output_dir(), Path::new("/p/gen"));
    }

    #[test]
    fn test_scope_from_str() {
        assert_eq!("project".parse::<ContextScope>(), Ok(ContextScope::Project));
        assert_eq!("Directory".parse::<ContextScope>(), Ok(ContextScope::Directory));
        assert!("module".parse::<ContextScope>().is_err());
    }
}
