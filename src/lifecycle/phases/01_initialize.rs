use crate::config::SkipFlags;
use crate::lifecycle::context::LifecycleContext;
use crate::lifecycle::phase_trait::LifecyclePhase;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

/// Loads the manifest and prepares the build and output directories.
pub struct InitializePhase;

#[async_trait]
impl LifecyclePhase for InitializePhase {
    fn name(&self) -> &'static str {
        "initialize"
    }

    fn is_skipped(&self, skip: &SkipFlags) -> bool {
        skip.initialize
    }

    async fn execute(&self, context: &mut LifecycleContext) -> Result<()> {
        let manifest = context.ensure_manifest()?.clone();
        info!(
            project = %manifest.artifact_id(),
            sources = manifest.sources.len(),
            languages = manifest.languages.len(),
            "Initializing project"
        );

        for dir in [context.build_dir(&manifest), context.output_dir(&manifest)] {
            context
                .file_system
                .create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        Ok(())
    }
}
