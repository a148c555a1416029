use crate::build::{BuildSummary, SourceRoot};
use crate::config::SkipFlags;
use crate::language::TransformGoal;
use crate::lifecycle::context::LifecycleContext;
use crate::lifecycle::phase_trait::LifecyclePhase;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

/// Builds the manifest's sources and includes for `goal` on a blocking
/// worker and records the summary.
pub(super) async fn run_build(context: &mut LifecycleContext, goal: TransformGoal) -> Result<BuildSummary> {
    let manifest = context.ensure_manifest()?.clone();
    let sources: Vec<SourceRoot> = manifest
        .sources
        .iter()
        .map(|r| r.resolve(&context.project_dir))
        .collect();
    let includes: Vec<SourceRoot> = manifest
        .includes
        .iter()
        .map(|r| r.resolve(&context.project_dir))
        .collect();
    let pardoned = context.pardoned(&manifest);
    let builder = context.builder(&manifest);

    let summary = tokio::task::spawn_blocking(move || {
        builder.build_roots(&goal, &sources, &includes, &pardoned)
    })
    .await
    .context("Build worker failed")??;

    info!(
        goal = %summary.goal,
        contexts = summary.contexts.len(),
        transformed = summary.transformed(),
        warnings = summary.warnings(),
        "Build finished"
    );
    context.summaries.push(summary.clone());
    Ok(summary)
}

pub struct CompilePhase;

#[async_trait]
impl LifecyclePhase for CompilePhase {
    fn name(&self) -> &'static str {
        "compile"
    }

    fn is_skipped(&self, skip: &SkipFlags) -> bool {
        skip.compile
    }

    async fn execute(&self, context: &mut LifecycleContext) -> Result<()> {
        let goal = context.ensure_manifest()?.goals.compile.clone();
        run_build(context, goal).await?;
        Ok(())
    }
}
