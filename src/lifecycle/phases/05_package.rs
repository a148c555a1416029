use crate::config::SkipFlags;
use crate::language::DEFINITION_FILE;
use crate::lifecycle::context::LifecycleContext;
use crate::lifecycle::phase_trait::LifecyclePhase;
use crate::package::{PackageRule, Packager};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

/// Archives the generated output, the project's own language definition and
/// the configured resources into `<build_dir>/<name>-<version>.tar.gz`.
pub struct PackagePhase;

#[async_trait]
impl LifecyclePhase for PackagePhase {
    fn name(&self) -> &'static str {
        "package"
    }

    fn is_skipped(&self, skip: &SkipFlags) -> bool {
        skip.package
    }

    async fn execute(&self, context: &mut LifecycleContext) -> Result<()> {
        let manifest = context.ensure_manifest()?.clone();
        let output_dir = context.output_dir(&manifest);
        let dest = context.build_dir(&manifest).join(manifest.package_name());

        let mut packager = Packager::new();
        let output_target = output_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        packager.add_rule(PackageRule::new(&output_dir, output_target));
        packager.add_rule(PackageRule::new(&context.project_dir, "").include(DEFINITION_FILE));
        for rule in &manifest.package.resources {
            packager.add_rule(rule.resolved_against(&context.project_dir));
        }

        let target = dest.clone();
        let report = tokio::task::spawn_blocking(move || packager.create(&target))
            .await
            .context("Package worker failed")?
            .with_context(|| format!("Failed to package {}", dest.display()))?;

        info!("Packaged {} files into {}", report.entries.len(), report.path.display());
        context.package = Some(report);
        Ok(())
    }
}
