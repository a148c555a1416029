// Lifecycle phases, in execution order.

#[path = "01_initialize.rs"]
pub mod initialize;
#[path = "02_discover.rs"]
pub mod discover;
#[path = "03_compile.rs"]
pub mod compile;
#[path = "04_post_compile.rs"]
pub mod post_compile;
#[path = "05_package.rs"]
pub mod package;

pub use compile::CompilePhase;
pub use discover::DiscoverPhase;
pub use initialize::InitializePhase;
pub use package::PackagePhase;
pub use post_compile::PostCompilePhase;
