//! The per-language build orchestrator.
//!
//! Source and include roots are expanded to files, classified by language and
//! grouped by build context. Languages are processed in dependency order; each
//! context is parsed, analyzed and transformed in turn. Parse errors always
//! abort the build, analysis errors abort unless the language is pardoned and
//! any transform failure aborts.

mod builder;
mod classify;
mod error;
mod expand;
mod order;
mod pardon;
mod report;

pub use builder::Builder;
pub use classify::{SourceRoot, SourceSet};
pub use error::BuildError;
pub use expand::expand;
pub use order::build_order;
pub use pardon::PardonedSet;
pub use report::{log_message, BuildSummary, ContextPhase, ContextReport};
