use super::compile::run_build;
use crate::config::SkipFlags;
use crate::lifecycle::context::LifecycleContext;
use crate::lifecycle::phase_trait::LifecyclePhase;
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Runs the optional post-compile goal over the same sources.
pub struct PostCompilePhase;

#[async_trait]
impl LifecyclePhase for PostCompilePhase {
    fn name(&self) -> &'static str {
        "post-compile"
    }

    fn is_skipped(&self, skip: &SkipFlags) -> bool {
        skip.post_compile
    }

    async fn execute(&self, context: &mut LifecycleContext) -> Result<()> {
        let Some(goal) = context.ensure_manifest()?.goals.post_compile.clone() else {
            debug!("No post-compile goal configured");
            return Ok(());
        };
        run_build(context, goal).await?;
        Ok(())
    }
}
