//! State shared by the lifecycle phases

use crate::build::{Builder, BuildSummary, PardonedSet};
use crate::config::DslforgeConfig;
use crate::context::{ContextLocks, ContextResolver};
use crate::fs::{FileSystem, RealFileSystem};
use crate::language::{DeclarativeDiscovery, LanguageDiscovery, LanguageRegistry};
use crate::package::PackageReport;
use crate::project::ProjectManifest;
use crate::resolve::{DependencyResolver, ManifestDependencyResolver};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Owns the long-lived services and everything the phases produce.
pub struct LifecycleContext {
    pub project_dir: PathBuf,

    pub config: DslforgeConfig,

    pub file_system: Arc<dyn FileSystem>,

    pub registry: Arc<LanguageRegistry>,

    pub discovery: Arc<dyn LanguageDiscovery>,

    pub dependency_resolver: Arc<dyn DependencyResolver>,

    pub locks: Arc<ContextLocks>,

    /// Loaded on first use
    pub manifest: Option<ProjectManifest>,

    /// Set once discovery has completed; discovery never runs twice.
    pub discovered: bool,

    /// Summaries of the compile and post-compile builds, in order
    pub summaries: Vec<BuildSummary>,

    pub package: Option<PackageReport>,

    contexts: Option<Arc<ContextResolver>>,
}

impl LifecycleContext {
    /// Real file system, declarative discovery and manifest-based resolution.
    pub fn new(project_dir: impl Into<PathBuf>, config: DslforgeConfig) -> Self {
        let file_system: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let dependency_resolver = Arc::new(ManifestDependencyResolver::new(
            file_system.clone(),
            config.manifest.clone(),
        ));

        Self {
            project_dir: project_dir.into(),
            config,
            file_system,
            registry: Arc::new(LanguageRegistry::new()),
            discovery: Arc::new(DeclarativeDiscovery::new()),
            dependency_resolver,
            locks: Arc::new(ContextLocks::new()),
            manifest: None,
            discovered: false,
            summaries: Vec::new(),
            package: None,
            contexts: None,
        }
    }

    /// Also rebuilds the manifest-based dependency resolver on top of `file_system`.
    pub fn with_file_system(mut self, file_system: Arc<dyn FileSystem>) -> Self {
        self.dependency_resolver = Arc::new(ManifestDependencyResolver::new(
            file_system.clone(),
            self.config.manifest.clone(),
        ));
        self.file_system = file_system;
        self
    }

    pub fn with_registry(mut self, registry: Arc<LanguageRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_discovery(mut self, discovery: Arc<dyn LanguageDiscovery>) -> Self {
        self.discovery = discovery;
        self
    }

    pub fn with_dependency_resolver(mut self, resolver: Arc<dyn DependencyResolver>) -> Self {
        self.dependency_resolver = resolver;
        self
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.project_dir.join(&self.config.manifest)
    }

    /// Loads and validates the manifest unless that already happened.
    pub fn ensure_manifest(&mut self) -> Result<&ProjectManifest> {
        if self.manifest.is_none() {
            let path = self.manifest_path();
            let manifest = ProjectManifest::load(self.file_system.as_ref(), &path)?;
            debug!(project = %manifest.artifact_id(), "Loaded project manifest");
            self.manifest = Some(manifest);
        }
        match &self.manifest {
            Some(manifest) => Ok(manifest),
            None => anyhow::bail!("Project manifest not loaded"),
        }
    }

    pub fn output_dir(&self, manifest: &ProjectManifest) -> PathBuf {
        self.project_dir.join(&manifest.output_dir)
    }

    pub fn build_dir(&self, manifest: &ProjectManifest) -> PathBuf {
        self.project_dir.join(&manifest.build_dir)
    }

    /// Pardons from the manifest plus those from the configuration.
    pub fn pardoned(&self, manifest: &ProjectManifest) -> PardonedSet {
        manifest
            .pardoned
            .iter()
            .chain(self.config.pardoned.iter())
            .cloned()
            .collect()
    }

    /// A builder whose build contexts are shared by every build in this lifecycle.
    pub fn builder(&mut self, manifest: &ProjectManifest) -> Builder {
        let output_dir = self.output_dir(manifest);
        let scope = self.config.context_scope;
        let project_dir = self.project_dir.clone();
        let contexts = self
            .contexts
            .get_or_insert_with(|| Arc::new(ContextResolver::new(project_dir, output_dir, scope)))
            .clone();

        Builder::new(
            self.registry.clone(),
            contexts,
            self.locks.clone(),
            self.file_system.clone(),
        )
    }
}
