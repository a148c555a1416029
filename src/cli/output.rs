//! Output formatting for build results and language listings
//!
//! Results go to stdout in one of three formats; logs go to stderr.
//!
//! # Example
//!
//! ```ignore
//! use dslforge::cli::output::{OutputFormat, OutputFormatter};
//!
//! let formatter = OutputFormatter::new(OutputFormat::Json);
//! let output = formatter.format_languages(&registry.languages())?;
//! println!("{}", output);
//! ```

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt::Write;
use std::sync::Arc;

use crate::build::BuildSummary;
use crate::language::Language;
use crate::package::PackageReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    Yaml,
    /// Human-readable formatted text
    Human,
}

/// Serializable view of a loaded language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageEntry {
    pub id: String,
    pub name: String,
    pub dependencies: Vec<String>,
}

impl LanguageEntry {
    pub fn from_language(language: &dyn Language) -> Self {
        Self {
            id: language.id().to_string(),
            name: language.name().to_string(),
            dependencies: language.dependencies().iter().map(|d| d.to_string()).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BuildReport<'a> {
    builds: &'a [BuildSummary],
    #[serde(skip_serializing_if = "Option::is_none")]
    package: Option<&'a PackageReport>,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_languages(&self, languages: &[Arc<dyn Language>]) -> Result<String> {
        let entries: Vec<LanguageEntry> = languages
            .iter()
            .map(|l| LanguageEntry::from_language(l.as_ref()))
            .collect();

        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&entries)
                .context("Failed to serialize languages to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(&entries).context("Failed to serialize languages to YAML")
            }
            OutputFormat::Human => Ok(Self::languages_human(&entries)),
        }
    }

    pub fn format_build(
        &self,
        builds: &[BuildSummary],
        package: Option<&PackageReport>,
    ) -> Result<String> {
        let report = BuildReport { builds, package };
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&report)
                .context("Failed to serialize build report to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(&report).context("Failed to serialize build report to YAML")
            }
            OutputFormat::Human => Ok(Self::build_human(builds, package)),
        }
    }

    fn languages_human(entries: &[LanguageEntry]) -> String {
        if entries.is_empty() {
            return "No languages loaded\n".to_string();
        }

        let mut output = String::new();
        for entry in entries {
            let _ = write!(output, "{}", entry.id);
            if !entry.dependencies.is_empty() {
                let _ = write!(output, " (depends on {})", entry.dependencies.join(", "));
            }
            output.push('\n');
        }
        output
    }

    fn build_human(builds: &[BuildSummary], package: Option<&PackageReport>) -> String {
        let mut output = String::new();

        for build in builds {
            let _ = writeln!(output, "Goal: {}", build.goal);
            for context in &build.contexts {
                let _ = writeln!(
                    output,
                    "  {} @ {}: {} ({} sources, {} includes, {} transformed, {} warnings{})",
                    context.language,
                    context.location.display(),
                    context.phase,
                    context.sources,
                    context.includes,
                    context.transformed,
                    context.warnings,
                    if context.pardoned_errors > 0 {
                        format!(", {} pardoned errors", context.pardoned_errors)
                    } else {
                        String::new()
                    }
                );
            }
        }

        if let Some(package) = package {
            let _ = writeln!(
                output,
                "Package: {} ({} files)",
                package.path.display(),
                package.entries.len()
            );
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{ContextPhase, ContextReport};
    use crate::context::ContextId;
    use crate::language::{LanguageId, MockLanguage};
    use std::path::PathBuf;

    fn languages() -> Vec<Arc<dyn Language>> {
        vec![
            Arc::new(MockLanguage::new("base", "b")) as Arc<dyn Language>,
            Arc::new(
                MockLanguage::new("entity", "ent")
                    .depends_on(LanguageId::new("org.example", "base", "1.0.0")),
            ),
        ]
    }

    fn summary() -> BuildSummary {
        let id = ContextId::new("/p", LanguageId::new("org.example", "entity", "1.0.0"));
        let mut report = ContextReport::new(&id, 2, 1);
        report.phase = ContextPhase::Done;
        report.transformed = 2;
        report.pardoned_errors = 1;
        BuildSummary {
            goal: "compile".to_string(),
            order: vec![id.language.clone()],
            contexts: vec![report],
        }
    }

    #[test]
    fn test_languages_human() {
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_languages(&languages())
            .unwrap();
        assert_eq!(
            output,
            "org.example:base:1.0.0\norg.example:entity:1.0.0 (depends on org.example:base:1.0.0)\n"
        );
    }

    #[test]
    fn test_languages_json() {
        let output = OutputFormatter::new(OutputFormat::Json)
            .format_languages(&languages())
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[1]["name"], "entity");
        assert_eq!(parsed[1]["dependencies"][0], "org.example:base:1.0.0");
    }

    #[test]
    fn test_empty_languages_human() {
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_languages(&[])
            .unwrap();
        assert_eq!(output, "No languages loaded\n");
    }

    #[test]
    fn test_build_human() {
        let package = PackageReport {
            path: PathBuf::from("/p/target/app-1.tar.gz"),
            entries: vec!["language.yaml".to_string()],
        };
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_build(&[summary()], Some(&package))
            .unwrap();

        assert!(output.starts_with("Goal: compile\n"));
        assert!(output.contains("org.example:entity:1.0.0 @ /p: done"));
        assert!(output.contains("2 transformed, 0 warnings, 1 pardoned errors"));
        assert!(output.ends_with("Package: /p/target/app-1.tar.gz (1 files)\n"));
    }

    #[test]
    fn test_build_yaml() {
        let output = OutputFormatter::new(OutputFormat::Yaml)
            .format_build(&[summary()], None)
            .unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&output).unwrap();
        assert_eq!(parsed["builds"][0]["goal"].as_str(), Some("compile"));
        assert!(parsed.get("package").is_none());
    }
}
