pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{BuildArgs, CliArgs, Commands, LanguagesArgs, OutputFormatArg};
pub use handlers::{handle_build, handle_languages};
pub use output::{LanguageEntry, OutputFormat, OutputFormatter};
