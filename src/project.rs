//! The project manifest (`dslforge.yaml`).
//!
//! ```yaml
//! group: org.example
//! name: entity
//! version: 1.0.0
//! sources: [src, { language: query, path: queries }]
//! includes: [lib]
//! languages:
//!   - { group: org.example, name: base, version: 1.0.0, path: ../base }
//! pardoned: [legacy]
//! goals: { compile: compile, post_compile: pretty }
//! output_dir: target/generated
//! build_dir: target
//! package:
//!   resources:
//!     - { directory: docs, target: docs, includes: ["**/*.md"] }
//! ```

use crate::build::SourceRoot;
use crate::fs::FileSystem;
use crate::language::{LanguageId, TransformGoal};
use crate::package::PackageRule;
use crate::resolve::Artifact;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_sources() -> Vec<SourceRoot> {
    vec![SourceRoot::Path(PathBuf::from("src"))]
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("target/generated")
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("target")
}

fn default_compile_goal() -> TransformGoal {
    TransformGoal::compile()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goals {
    #[serde(default = "default_compile_goal")]
    pub compile: TransformGoal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_compile: Option<TransformGoal>,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            compile: default_compile_goal(),
            post_compile: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageSpec {
    #[serde(default)]
    pub resources: Vec<PackageRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub group: String,
    pub name: String,
    pub version: String,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceRoot>,
    #[serde(default)]
    pub includes: Vec<SourceRoot>,
    /// Language artifacts this project is built with
    #[serde(default)]
    pub languages: Vec<Artifact>,
    #[serde(default)]
    pub pardoned: Vec<String>,
    #[serde(default)]
    pub goals: Goals,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
    #[serde(default)]
    pub package: PackageSpec,
}

impl ProjectManifest {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse project manifest")
    }

    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let yaml = fs
            .read_to_string(path)
            .with_context(|| format!("Failed to read project manifest {}", path.display()))?;
        let manifest = Self::from_yaml(&yaml).with_context(|| format!("Invalid manifest {}", path.display()))?;
        manifest
            .validate()
            .with_context(|| format!("Invalid manifest {}", path.display()))?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [("group", &self.group), ("name", &self.name), ("version", &self.version)] {
            if value.trim().is_empty() {
                anyhow::bail!("Project {} cannot be empty", field);
            }
            if value.contains(':') {
                anyhow::bail!("Project {} '{}' must not contain ':'", field, value);
            }
        }

        if self.goals.compile.name().trim().is_empty() {
            anyhow::bail!("Compile goal cannot be empty");
        }
        if self.output_dir.as_os_str().is_empty() {
            anyhow::bail!("Output directory cannot be empty");
        }
        if self.build_dir.as_os_str().is_empty() {
            anyhow::bail!("Build directory cannot be empty");
        }

        for artifact in &self.languages {
            if artifact.group.is_empty() || artifact.name.is_empty() || artifact.version.is_empty() {
                anyhow::bail!(
                    "Language entry '{}' needs group, name and version",
                    artifact.id()
                );
            }
        }

        Ok(())
    }

    /// Identity of the language this project itself produces.
    pub fn artifact_id(&self) -> LanguageId {
        LanguageId::new(&self.group, &self.name, &self.version)
    }

    /// File name of the package archive.
    pub fn package_name(&self) -> String {
        format!("{}-{}.tar.gz", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    const FULL: &str = r#"
group: org.example
name: entity
version: 1.0.0
sources:
  - src
  - { language: query, path: queries }
includes: [lib]
languages:
  - { group: org.example, name: base, version: 1.0.0, path: ../base }
pardoned: [legacy]
goals: { compile: compile, post_compile: pretty }
output_dir: out/gen
build_dir: out
package:
  resources:
    - { directory: docs, target: docs, includes: ["**/*.md"] }
"#;

    #[test]
    fn test_parse_full_manifest() {
        let manifest = ProjectManifest::from_yaml(FULL).unwrap();

        assert_eq!(manifest.artifact_id().to_string(), "org.example:entity:1.0.0");
        assert_eq!(manifest.sources.len(), 2);
        assert_eq!(
            manifest.sources[1],
            SourceRoot::Pinned {
                language: "query".to_string(),
                path: PathBuf::from("queries"),
            }
        );
        assert_eq!(manifest.includes, vec![SourceRoot::Path(PathBuf::from("lib"))]);
        assert_eq!(manifest.languages[0].path, Some(PathBuf::from("../base")));
        assert_eq!(manifest.goals.post_compile, Some(TransformGoal::new("pretty")));
        assert_eq!(manifest.package.resources[0].includes, vec!["**/*.md"]);
        assert_eq!(manifest.package_name(), "entity-1.0.0.tar.gz");
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let manifest = ProjectManifest::from_yaml("group: g\nname: n\nversion: '1'\n").unwrap();

        assert_eq!(manifest.sources, default_sources());
        assert!(manifest.includes.is_empty());
        assert_eq!(manifest.goals.compile, TransformGoal::compile());
        assert_eq!(manifest.goals.post_compile, None);
        assert_eq!(manifest.output_dir, PathBuf::from("target/generated"));
        assert_eq!(manifest.build_dir, PathBuf::from("target"));
    }

    #[test]
    fn test_validate_rejects_bad_identity() {
        let mut manifest = ProjectManifest::from_yaml("group: g\nname: n\nversion: '1'\n").unwrap();
        manifest.name = "a:b".to_string();
        assert!(manifest.validate().is_err());

        manifest.name = " ".to_string();
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_load_reports_path() {
        let fs = MockFileSystem::new();
        fs.add_file("/mock/dslforge.yaml", "group: g\nname: n\n");

        let err = ProjectManifest::load(&fs, Path::new("/mock/dslforge.yaml")).unwrap_err();
        assert!(format!("{:#}", err).contains("/mock/dslforge.yaml"));

        let missing = ProjectManifest::load(&fs, Path::new("/mock/other.yaml")).unwrap_err();
        assert!(missing.to_string().contains("Failed to read project manifest"));
    }
}
