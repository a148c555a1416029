//! Command handlers. Each returns the process exit code.

use super::commands::{BuildArgs, LanguagesArgs};
use super::output::OutputFormatter;
use crate::config::DslforgeConfig;
use crate::lifecycle::{LifecycleContext, LifecycleOrchestrator};
use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

fn project_dir(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(env::current_dir()?),
    }
}

/// Environment configuration with the CLI flags layered on top.
fn load_config() -> Result<DslforgeConfig> {
    let config = DslforgeConfig::from_env()?;
    config.validate()?;
    Ok(config)
}

fn apply_build_args(mut config: DslforgeConfig, args: &BuildArgs) -> DslforgeConfig {
    config.skip = config.skip.merge(args.skip_flags());
    config.pardoned.extend(args.pardon.iter().cloned());
    if let Some(scope) = args.scope {
        config.context_scope = scope;
    }
    config
}

async fn run_build(args: &BuildArgs, quiet: bool) -> Result<()> {
    let config = apply_build_args(load_config()?, args);
    debug!("Configuration:\n{}", config);

    let mut context = LifecycleContext::new(project_dir(args.project_path.as_deref())?, config);
    LifecycleOrchestrator::new().execute(&mut context).await?;

    if !quiet {
        let formatter = OutputFormatter::new(args.format.into());
        print!(
            "{}",
            formatter.format_build(&context.summaries, context.package.as_ref())?
        );
    }
    Ok(())
}

pub async fn handle_build(args: &BuildArgs, quiet: bool) -> i32 {
    match run_build(args, quiet).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

async fn run_languages(args: &LanguagesArgs) -> Result<()> {
    let config = load_config()?;
    let mut context = LifecycleContext::new(project_dir(args.project_path.as_deref())?, config);
    LifecycleOrchestrator::discovery_only()
        .execute(&mut context)
        .await?;

    let formatter = OutputFormatter::new(args.format.into());
    print!("{}", formatter.format_languages(&context.registry.languages())?);
    Ok(())
}

pub async fn handle_languages(args: &LanguagesArgs) -> i32 {
    match run_languages(args).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::{CliArgs, Commands};
    use crate::context::ContextScope;
    use clap::Parser;

    fn build_args(argv: &[&str]) -> BuildArgs {
        match CliArgs::parse_from(argv).command {
            Commands::Build(args) => args,
            _ => panic!("Expected Build command"),
        }
    }

    fn base_config() -> DslforgeConfig {
        DslforgeConfig {
            log_level: "info".to_string(),
            log_json: false,
            manifest: PathBuf::from("dslforge.yaml"),
            skip: Default::default(),
            pardoned: vec!["legacy".to_string()],
            context_scope: ContextScope::Project,
        }
    }

    #[test]
    fn test_cli_flags_override_environment() {
        let args = build_args(&[
            "dslforge",
            "build",
            "--skip-package",
            "--pardon",
            "query",
            "--scope",
            "dir",
        ]);
        let config = apply_build_args(base_config(), &args);

        assert!(config.skip.package);
        assert_eq!(config.pardoned, vec!["legacy", "query"]);
        assert_eq!(config.context_scope, ContextScope::Directory);
    }

    #[test]
    fn test_environment_kept_without_flags() {
        let mut base = base_config();
        base.skip.compile = true;
        let config = apply_build_args(base, &build_args(&["dslforge", "build"]));

        assert!(config.skip.compile);
        assert_eq!(config.context_scope, ContextScope::Project);
    }

    #[test]
    fn test_project_dir_defaults_to_cwd() {
        assert_eq!(project_dir(None).unwrap(), env::current_dir().unwrap());
        assert_eq!(
            project_dir(Some(Path::new("/tmp/p"))).unwrap(),
            PathBuf::from("/tmp/p")
        );
    }
}
