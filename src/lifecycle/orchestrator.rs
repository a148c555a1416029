use super::context::LifecycleContext;
use super::phase_trait::LifecyclePhase;
use super::phases::{CompilePhase, DiscoverPhase, InitializePhase, PackagePhase, PostCompilePhase};
use anyhow::{Context, Result};
use std::time::Instant;
use tracing::{debug, info};

pub struct LifecycleOrchestrator {
    phases: Vec<Box<dyn LifecyclePhase>>,
}

impl Default for LifecycleOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleOrchestrator {
    /// The full lifecycle: initialize, discover, compile, post-compile, package.
    pub fn new() -> Self {
        Self::with_phases(vec![
            Box::new(InitializePhase),
            Box::new(DiscoverPhase),
            Box::new(CompilePhase),
            Box::new(PostCompilePhase),
            Box::new(PackagePhase),
        ])
    }

    /// Only loads the manifest and discovers languages.
    pub fn discovery_only() -> Self {
        Self::with_phases(vec![Box::new(DiscoverPhase)])
    }

    pub fn with_phases(phases: Vec<Box<dyn LifecyclePhase>>) -> Self {
        Self { phases }
    }

    pub fn phase_names(&self) -> Vec<&'static str> {
        self.phases.iter().map(|p| p.name()).collect()
    }

    pub async fn execute(&self, context: &mut LifecycleContext) -> Result<()> {
        if context.config.skip.all {
            info!("Skipping execution");
            return Ok(());
        }

        let start = Instant::now();
        info!("Starting lifecycle for: {}", context.project_dir.display());

        for phase in &self.phases {
            let phase_name = phase.name();
            if phase.is_skipped(&context.config.skip) {
                info!("Skipping phase {}", phase_name);
                continue;
            }

            info!("Phase: {}", phase_name);
            let phase_start = Instant::now();
            phase
                .execute(context)
                .await
                .with_context(|| format!("Phase {} failed", phase_name))?;

            debug!(
                "Phase {} complete in {:.2}s",
                phase_name,
                phase_start.elapsed().as_secs_f64()
            );
        }

        info!(
            "Lifecycle complete in {:.2}s",
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }
}
