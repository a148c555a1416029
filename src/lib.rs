//! dslforge - build orchestration for language-workbench DSL projects
//!
//! A project declares the languages it is written in (as artifacts holding
//! `language.yaml` definitions) and the roots of its sources. dslforge loads
//! those languages, classifies every source file by language, and drives each
//! language through parse, analysis and transformation in dependency order.
//! Files of one language that share a scope share one build context, so
//! analysis can resolve names across them.
//!
//! # Example Usage
//!
//! ```ignore
//! use dslforge::{Builder, ContextLocks, ContextResolver, ContextScope, LanguageRegistry,
//!                PardonedSet, RealFileSystem, SourceRoot, TransformGoal};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(LanguageRegistry::new());
//! let resolver = Arc::new(ContextResolver::new("/project", "/project/gen", ContextScope::Project));
//! let builder = Builder::new(registry, resolver, Arc::new(ContextLocks::new()), Arc::new(RealFileSystem));
//!
//! let summary = builder.build_roots(
//!     &TransformGoal::compile(),
//!     &[SourceRoot::Path("/project/src".into())],
//!     &[],
//!     &PardonedSet::new(),
//! )?;
//! println!("{} files transformed", summary.transformed());
//! ```
//!
//! # Project Structure
//!
//! - [`language`]: the language capability interface, registry and discovery
//! - [`build`]: classification, build order and the per-context build loop
//! - [`context`]: build contexts and their scoping
//! - [`lifecycle`]: the initialize, discover, compile, post-compile and package phases

pub mod build;
pub mod cli;
pub mod config;
pub mod context;
pub mod fs;
pub mod language;
pub mod lifecycle;
pub mod message;
pub mod package;
pub mod project;
pub mod resolve;
pub mod util;

pub use build::{BuildError, BuildSummary, Builder, ContextPhase, PardonedSet, SourceRoot, SourceSet};
pub use config::{ConfigError, DslforgeConfig, SkipFlags};
pub use context::{BuildContext, ContextId, ContextLocks, ContextResolver, ContextScope};
pub use fs::{FileSystem, MockFileSystem, RealFileSystem};
pub use language::{
    DeclarativeDiscovery, DeclarativeLanguage, Language, LanguageDiscovery, LanguageError,
    LanguageId, LanguageRegistry, TransformGoal,
};
pub use lifecycle::{LifecycleContext, LifecycleOrchestrator};
pub use message::{Message, Severity, SourceRegion};
pub use package::{PackageError, PackageRule, Packager};
pub use project::ProjectManifest;
pub use resolve::{Artifact, DependencyResolver, ManifestDependencyResolver};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_dslforge() {
        assert_eq!(NAME, "dslforge");
    }
}
