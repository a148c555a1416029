use crate::config::SkipFlags;
use crate::context::ContextScope;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Build orchestration for language-workbench DSL projects
#[derive(Parser, Debug)]
#[command(
    name = "dslforge",
    about = "Build orchestration for language-workbench DSL projects",
    version,
    author,
    long_about = "dslforge loads the languages a project depends on, then parses, analyzes \
                  and transforms the project's sources language by language in dependency \
                  order, and packages the result."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Run the project lifecycle",
        long_about = "Runs initialize, discover, compile, post-compile and package for the \
                      project described by dslforge.yaml.\n\n\
                      Examples:\n  \
                      dslforge build\n  \
                      dslforge build /path/to/project\n  \
                      dslforge build --skip-package --pardon legacy\n  \
                      dslforge build --scope directory --format json"
    )]
    Build(BuildArgs),

    #[command(
        about = "List the languages a project loads",
        long_about = "Resolves and discovers the project's language artifacts without \
                      building anything.\n\n\
                      Examples:\n  \
                      dslforge languages\n  \
                      dslforge languages /path/to/project --format json"
    )]
    Languages(LanguagesArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    #[arg(value_name = "PATH", help = "Project directory (defaults to current directory)")]
    pub project_path: Option<PathBuf>,

    #[arg(long, help = "Skip every phase")]
    pub skip: bool,

    #[arg(long, help = "Skip the initialize phase")]
    pub skip_initialize: bool,

    #[arg(long, help = "Skip language discovery")]
    pub skip_discovery: bool,

    #[arg(long, help = "Skip the compile phase")]
    pub skip_compile: bool,

    #[arg(long, help = "Skip the post-compile phase")]
    pub skip_post_compile: bool,

    #[arg(long, help = "Skip packaging")]
    pub skip_package: bool,

    #[arg(
        long = "pardon",
        value_name = "LANGUAGE",
        help = "Downgrade analysis errors of a language (name or group:name:version) to warnings"
    )]
    pub pardon: Vec<String>,

    #[arg(long, value_parser = parse_scope, help = "Context scope: project or directory")]
    pub scope: Option<ContextScope>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

impl BuildArgs {
    pub fn skip_flags(&self) -> SkipFlags {
        SkipFlags {
            all: self.skip,
            initialize: self.skip_initialize,
            discovery: self.skip_discovery,
            compile: self.skip_compile,
            post_compile: self.skip_post_compile,
            package: self.skip_package,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct LanguagesArgs {
    #[arg(value_name = "PATH", help = "Project directory (defaults to current directory)")]
    pub project_path: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

fn parse_scope(s: &str) -> Result<ContextScope, String> {
    s.parse()
}
