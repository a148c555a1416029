//! The project lifecycle: initialize, discover, compile, post-compile and
//! package, run in that order over one [`LifecycleContext`].

pub mod context;
pub mod orchestrator;
pub mod phase_trait;
pub mod phases;

pub use context::LifecycleContext;
pub use orchestrator::LifecycleOrchestrator;
pub use phase_trait::LifecyclePhase;
