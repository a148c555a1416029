//! Resolution of the language artifacts a project depends on.

use crate::fs::FileSystem;
use crate::language::LanguageId;
use crate::project::ProjectManifest;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A language artifact: an identity plus the location of its definition
/// (a directory or a `.tar.gz` archive). `path` is relative to the manifest
/// that declares it until resolved.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Artifact {
    pub group: String,
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Artifact {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        path: Option<PathBuf>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
            path,
        }
    }

    pub fn id(&self) -> LanguageId {
        LanguageId::new(&self.group, &self.name, &self.version)
    }

    fn resolved_against(&self, base: &Path) -> Artifact {
        Artifact {
            path: self.path.as_ref().map(|p| normalize(&base.join(p))),
            ..self.clone()
        }
    }
}

/// Removes `.` and folds `..` without touching the file system.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

pub trait DependencyResolver: Send + Sync {
    /// Every artifact the project needs, with absolute paths.
    fn resolve(&self, project_dir: &Path, manifest: &ProjectManifest) -> Result<Vec<Artifact>>;
}

/// Resolves the manifest's `languages` entries. An artifact whose path is a
/// directory with its own manifest pulls in that manifest's languages too.
pub struct ManifestDependencyResolver {
    fs: Arc<dyn FileSystem>,
    manifest_name: PathBuf,
}

impl ManifestDependencyResolver {
    pub fn new(fs: Arc<dyn FileSystem>, manifest_name: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            manifest_name: manifest_name.into(),
        }
    }
}

impl DependencyResolver for ManifestDependencyResolver {
    fn resolve(&self, project_dir: &Path, manifest: &ProjectManifest) -> Result<Vec<Artifact>> {
        let own = manifest.artifact_id();
        let mut seen: BTreeSet<(LanguageId, Option<PathBuf>)> = BTreeSet::new();
        let mut resolved = Vec::new();

        let mut queue: VecDeque<Artifact> = manifest
            .languages
            .iter()
            .map(|a| a.resolved_against(project_dir))
            .collect();

        while let Some(artifact) = queue.pop_front() {
            if !seen.insert((artifact.id(), artifact.path.clone())) {
                continue;
            }

            if let Some(dir) = artifact.path.as_deref().filter(|p| self.fs.is_dir(p)) {
                let nested = dir.join(&self.manifest_name);
                if self.fs.is_file(&nested) {
                    let child = ProjectManifest::load(self.fs.as_ref(), &nested)
                        .with_context(|| format!("Failed to resolve dependencies of {}", artifact.id()))?;
                    debug!(
                        artifact = %artifact.id(),
                        languages = child.languages.len(),
                        "Following nested manifest"
                    );
                    queue.extend(child.languages.iter().map(|a| a.resolved_against(dir)));
                }
            }

            if artifact.id() != own {
                resolved.push(artifact);
            }
        }

        Ok(resolved)
    }
}
