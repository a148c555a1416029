//! Configuration management for dslforge
//!
//! Settings are loaded from environment variables with defaults. CLI flags
//! are applied on top by the command handlers.
//!
//! # Environment Variables
//!
//! - `DSLFORGE_LOG_LEVEL`: Logging level - default: "info"
//! - `DSLFORGE_LOG_JSON`: JSON log output (true|false) - default: "false"
//! - `DSLFORGE_MANIFEST`: Project manifest file name - default: "dslforge.yaml"
//! - `DSLFORGE_SKIP`: Skip every lifecycle phase - default: "false"
//! - `DSLFORGE_SKIP_INITIALIZE`, `DSLFORGE_SKIP_DISCOVERY`, `DSLFORGE_SKIP_COMPILE`,
//!   `DSLFORGE_SKIP_POST_COMPILE`, `DSLFORGE_SKIP_PACKAGE`: skip one phase
//! - `DSLFORGE_PARDONED`: Comma separated languages whose analysis errors are
//!   downgraded to warnings
//! - `DSLFORGE_CONTEXT_SCOPE`: project|directory - default: "project"
//!
//! # Example
//!
//! ```no_run
//! use dslforge::DslforgeConfig;
//!
//! let config = DslforgeConfig::from_env().expect("Invalid configuration");
//! config.validate().expect("Invalid configuration");
//! println!("{}", config);
//! ```

use crate::context::ContextScope;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_MANIFEST: &str = "dslforge.yaml";

const SKIP_VARS: [&str; 6] = [
    "DSLFORGE_SKIP",
    "DSLFORGE_SKIP_INITIALIZE",
    "DSLFORGE_SKIP_DISCOVERY",
    "DSLFORGE_SKIP_COMPILE",
    "DSLFORGE_SKIP_POST_COMPILE",
    "DSLFORGE_SKIP_PACKAGE",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// Failed to parse configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

/// Which lifecycle phases to skip. `all` short-circuits every phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipFlags {
    pub all: bool,
    pub initialize: bool,
    pub discovery: bool,
    pub compile: bool,
    pub post_compile: bool,
    pub package: bool,
}

impl SkipFlags {
    /// OR-combines two flag sets, used to layer CLI flags over the environment.
    pub fn merge(self, other: SkipFlags) -> SkipFlags {
        SkipFlags {
            all: self.all || other.all,
            initialize: self.initialize || other.initialize,
            discovery: self.discovery || other.discovery,
            compile: self.compile || other.compile,
            post_compile: self.post_compile || other.post_compile,
            package: self.package || other.package,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DslforgeConfig {
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    pub log_json: bool,

    /// Manifest file name, relative to the project directory
    pub manifest: PathBuf,

    pub skip: SkipFlags,

    /// Language specs (name or group:name:version) added to the manifest's pardoned list
    pub pardoned: Vec<String>,

    pub context_scope: ContextScope,
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false)
}

impl Default for DslforgeConfig {
    /// Loads from `DSLFORGE_*` variables; unparsable values fall back to defaults.
    fn default() -> Self {
        let log_level = env::var("DSLFORGE_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        let manifest = env::var("DSLFORGE_MANIFEST")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_MANIFEST));

        let skip = SkipFlags {
            all: env_flag("DSLFORGE_SKIP"),
            initialize: env_flag("DSLFORGE_SKIP_INITIALIZE"),
            discovery: env_flag("DSLFORGE_SKIP_DISCOVERY"),
            compile: env_flag("DSLFORGE_SKIP_COMPILE"),
            post_compile: env_flag("DSLFORGE_SKIP_POST_COMPILE"),
            package: env_flag("DSLFORGE_SKIP_PACKAGE"),
        };

        let pardoned = env::var("DSLFORGE_PARDONED")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let context_scope = env::var("DSLFORGE_CONTEXT_SCOPE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        Self {
            log_level,
            log_json: env_flag("DSLFORGE_LOG_JSON"),
            manifest,
            skip,
            pardoned,
            context_scope,
        }
    }
}

impl DslforgeConfig {
    /// Like `Default`, but rejects values that cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        for key in SKIP_VARS.iter().chain(std::iter::once(&"DSLFORGE_LOG_JSON")) {
            if let Ok(value) = env::var(key) {
                value.parse::<bool>().map_err(|e| ConfigError::ParseError {
                    field: key.to_string(),
                    error: format!("'{}': {}", value, e),
                })?;
            }
        }

        if let Ok(value) = env::var("DSLFORGE_CONTEXT_SCOPE") {
            value
                .parse::<ContextScope>()
                .map_err(|error| ConfigError::ParseError {
                    field: "DSLFORGE_CONTEXT_SCOPE".to_string(),
                    error,
                })?;
        }

        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        if self.manifest.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Manifest file name must not be empty".to_string(),
            ));
        }

        if let Some(spec) = self.pardoned.iter().find(|s| s.split(':').count() == 2) {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid pardoned language '{}', expected a name or group:name:version",
                spec
            )));
        }

        Ok(())
    }

    pub fn to_display_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert("log_level".to_string(), self.log_level.clone());
        map.insert("log_json".to_string(), self.log_json.to_string());
        map.insert("manifest".to_string(), self.manifest.display().to_string());
        map.insert("skip".to_string(), self.skip.all.to_string());
        map.insert("pardoned".to_string(), self.pardoned.join(","));
        map.insert("context_scope".to_string(), self.context_scope.to_string());

        map
    }
}

impl fmt::Display for DslforgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dslforge Configuration:")?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(f, "  Log JSON: {}", self.log_json)?;
        writeln!(f, "  Manifest: {}", self.manifest.display())?;
        writeln!(f, "  Skip: {:?}", self.skip)?;
        if !self.pardoned.is_empty() {
            writeln!(f, "  Pardoned: {}", self.pardoned.join(", "))?;
        }
        writeln!(f, "  Context Scope: {}", self.context_scope)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    fn clear_env() -> Vec<EnvGuard> {
        SKIP_VARS
            .iter()
            .chain(
                [
                    "DSLFORGE_LOG_LEVEL",
                    "DSLFORGE_LOG_JSON",
                    "DSLFORGE_MANIFEST",
                    "DSLFORGE_PARDONED",
                    "DSLFORGE_CONTEXT_SCOPE",
                ]
                .iter(),
            )
            .map(|key| EnvGuard::unset(key))
            .collect()
    }

    #[test]
    #[serial]
    fn test_default_configuration() {
        let _guards = clear_env();

        let config = DslforgeConfig::default();

        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert!(!config.log_json);
        assert_eq!(config.manifest, PathBuf::from(DEFAULT_MANIFEST));
        assert_eq!(config.skip, SkipFlags::default());
        assert!(config.pardoned.is_empty());
        assert_eq!(config.context_scope, ContextScope::Project);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _guards = clear_env();
        let _set = vec![
            EnvGuard::set("DSLFORGE_LOG_LEVEL", "DEBUG"),
            EnvGuard::set("DSLFORGE_MANIFEST", "build.yaml"),
            EnvGuard::set("DSLFORGE_SKIP_PACKAGE", "true"),
            EnvGuard::set("DSLFORGE_PARDONED", "legacy, org.example:query:1.0.0,"),
            EnvGuard::set("DSLFORGE_CONTEXT_SCOPE", "directory"),
        ];

        let config = DslforgeConfig::from_env().unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.manifest, PathBuf::from("build.yaml"));
        assert!(config.skip.package);
        assert!(!config.skip.compile);
        assert_eq!(config.pardoned, vec!["legacy", "org.example:query:1.0.0"]);
        assert_eq!(config.context_scope, ContextScope::Directory);
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_flag() {
        let _guards = clear_env();
        let _set = EnvGuard::set("DSLFORGE_SKIP_COMPILE", "yes please");

        let err = DslforgeConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { ref field, .. } if field == "DSLFORGE_SKIP_COMPILE"));

        // The lenient loader falls back instead.
        assert!(!DslforgeConfig::default().skip.compile);
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_scope() {
        let _guards = clear_env();
        let _set = EnvGuard::set("DSLFORGE_CONTEXT_SCOPE", "galaxy");
        assert!(DslforgeConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_configuration_validation_invalid_log_level() {
        let _guards = clear_env();
        let mut config = DslforgeConfig::default();
        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_configuration_validation_invalid_pardon() {
        let _guards = clear_env();
        let mut config = DslforgeConfig::default();
        config.pardoned = vec!["org.example:query".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_skip_flags_merge() {
        let env = SkipFlags {
            compile: true,
            ..Default::default()
        };
        let cli = SkipFlags {
            package: true,
            ..Default::default()
        };
        let merged = env.merge(cli);
        assert!(merged.compile && merged.package);
        assert!(!merged.all);
    }

    #[test]
    #[serial]
    fn test_config_display() {
        let _guards = clear_env();
        let config = DslforgeConfig::default();
        let display = format!("{}", config);
        assert!(display.contains("Dslforge Configuration:"));
        assert!(display.contains("Context Scope: project"));
        assert_eq!(config.to_display_map()["manifest"], "dslforge.yaml");
    }
}
