use dslforge::cli::commands::{CliArgs, Commands};
use dslforge::cli::handlers::{handle_build, handle_languages};
use dslforge::util::logging::{init_logging, LoggingConfig};
use dslforge::VERSION;

use clap::Parser;
use tracing::debug;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging(LoggingConfig::from_args(
        args.log_level.as_deref(),
        args.verbose,
        args.quiet,
    ));

    debug!("dslforge v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Build(build_args) => handle_build(build_args, args.quiet).await,
        Commands::Languages(languages_args) => handle_languages(languages_args).await,
    };

    std::process::exit(exit_code);
}
