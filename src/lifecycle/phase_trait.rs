use super::context::LifecycleContext;
use crate::config::SkipFlags;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait LifecyclePhase: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the per-phase skip flag for this phase is set.
    fn is_skipped(&self, skip: &SkipFlags) -> bool;

    async fn execute(&self, context: &mut LifecycleContext) -> Result<()>;
}
