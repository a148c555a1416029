use crate::config::SkipFlags;
use crate::fs::FileSystem;
use crate::language::{LanguageDiscovery, LanguageRegistry};
use crate::lifecycle::context::LifecycleContext;
use crate::lifecycle::phase_trait::LifecyclePhase;
use crate::resolve::Artifact;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, error, info};

/// Resolves the project's language artifacts and registers every language
/// they define. Runs at most once per lifecycle context.
pub struct DiscoverPhase;

/// Loads every artifact not yet registered. Errors are logged and discovery
/// moves on to the next artifact; returns whether any artifact failed.
fn load_artifacts(
    artifacts: &[Artifact],
    registry: &LanguageRegistry,
    discovery: &dyn LanguageDiscovery,
    fs: &dyn FileSystem,
) -> bool {
    let mut failed = false;
    for artifact in artifacts {
        let id = artifact.id();
        if registry.contains(&id) {
            debug!(language = %id, "Already loaded");
            continue;
        }

        let Some(location) = artifact.path.as_deref() else {
            error!("Artifact {} has no file", id);
            failed = true;
            continue;
        };
        if !fs.exists(location) {
            error!("Artifact {} location {} does not exist", id, location.display());
            failed = true;
            continue;
        }

        let languages = match discovery.discover(location) {
            Ok(languages) => languages,
            Err(e) => {
                error!(
                    "Error while discovering languages in {}: {:#}",
                    id,
                    anyhow::Error::from(e)
                );
                failed = true;
                continue;
            }
        };
        if languages.is_empty() {
            error!("No languages were discovered in {}", id);
            failed = true;
            continue;
        }

        for language in languages {
            let loaded = language.id().clone();
            if registry.register(language) {
                info!("Loaded {}", loaded);
            }
        }
    }
    failed
}

#[async_trait]
impl LifecyclePhase for DiscoverPhase {
    fn name(&self) -> &'static str {
        "discover"
    }

    fn is_skipped(&self, skip: &SkipFlags) -> bool {
        skip.discovery
    }

    async fn execute(&self, context: &mut LifecycleContext) -> Result<()> {
        if context.discovered {
            debug!("Languages already discovered");
            return Ok(());
        }

        let manifest = context.ensure_manifest()?.clone();
        let artifacts = context
            .dependency_resolver
            .resolve(&context.project_dir, &manifest)?;

        let registry = context.registry.clone();
        let discovery = context.discovery.clone();
        let fs = context.file_system.clone();
        let failed = tokio::task::spawn_blocking(move || {
            load_artifacts(&artifacts, &registry, discovery.as_ref(), fs.as_ref())
        })
        .await
        .context("Discovery worker failed")?;

        if failed {
            anyhow::bail!("Error(s) occurred while discovering languages");
        }

        context.discovered = true;
        Ok(())
    }
}
