//! Packaging of build outputs and resources into a gzip-compressed tar archive.
//!
//! Files are selected per rule with Ant-style globs over `/`-separated paths
//! relative to the rule's directory: `**` spans any number of segments, `*`
//! stays within one segment and `?` matches a single character.

use flate2::write::GzEncoder;
use flate2::Compression;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tar::Builder;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid pattern '{pattern}'")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> PackageError + '_ {
    move |source| PackageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Files under `directory` matching `includes` but none of `excludes`,
/// placed under `target` in the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRule {
    pub directory: PathBuf,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
}

impl PackageRule {
    pub fn new(directory: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            target: target.into(),
            includes: Vec::new(),
            excludes: Vec::new(),
        }
    }

    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.includes.push(pattern.into());
        self
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }

    pub fn resolved_against(&self, base: &Path) -> PackageRule {
        PackageRule {
            directory: base.join(&self.directory),
            ..self.clone()
        }
    }

    /// Archive prefix: empty, or the target with exactly one trailing `/`.
    fn prefix(&self) -> String {
        let target = self.target.trim_matches('/');
        if target.is_empty() {
            String::new()
        } else {
            format!("{}/", target)
        }
    }
}

/// Compiles an Ant-style pattern to an anchored regex.
pub fn glob_to_regex(pattern: &str) -> Result<Regex, PackageError> {
    let mut normalized = pattern.replace('\\', "/");
    if normalized.ends_with('/') {
        normalized.push_str("**");
    }

    let chars: Vec<char> = normalized.trim_start_matches('/').chars().collect();
    let mut out = String::from("^");
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
                continue;
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            c => out.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }
    out.push('$');

    Regex::new(&out).map_err(|source| PackageError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

struct RuleMatcher {
    includes: Vec<Regex>,
    excludes: Vec<Regex>,
}

impl RuleMatcher {
    fn compile(rule: &PackageRule) -> Result<Self, PackageError> {
        let includes = if rule.includes.is_empty() {
            vec![glob_to_regex("**")?]
        } else {
            rule.includes
                .iter()
                .map(|p| glob_to_regex(p))
                .collect::<Result<_, _>>()?
        };
        let excludes = rule
            .excludes
            .iter()
            .map(|p| glob_to_regex(p))
            .collect::<Result<_, _>>()?;
        Ok(Self { includes, excludes })
    }

    fn matches(&self, relative: &str) -> bool {
        self.includes.iter().any(|r| r.is_match(relative))
            && !self.excludes.iter().any(|r| r.is_match(relative))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageReport {
    pub path: PathBuf,
    /// Archive entry names, in the order written.
    pub entries: Vec<String>,
}

#[derive(Debug, Default)]
pub struct Packager {
    rules: Vec<PackageRule>,
}

impl Packager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, rule: PackageRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[PackageRule] {
        &self.rules
    }

    fn collect(&self) -> Result<BTreeMap<String, PathBuf>, PackageError> {
        let mut entries = BTreeMap::new();

        for rule in &self.rules {
            let matcher = RuleMatcher::compile(rule)?;
            if !rule.directory.is_dir() {
                info!("Ignored non-existing {}", rule.directory.display());
                continue;
            }

            let prefix = rule.prefix();
            for entry in WalkDir::new(&rule.directory).sort_by_file_name() {
                let entry = entry.map_err(|e| PackageError::Io {
                    path: rule.directory.clone(),
                    source: e.into(),
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }

                let Ok(relative) = entry.path().strip_prefix(&rule.directory) else {
                    continue;
                };
                let relative = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");

                if matcher.matches(&relative) {
                    entries.insert(format!("{}{}", prefix, relative), entry.into_path());
                }
            }
        }

        Ok(entries)
    }

    /// Writes the archive to `dest`, creating its parent directory.
    pub fn create(&self, dest: &Path) -> Result<PackageReport, PackageError> {
        let entries = self.collect()?;

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(io_error(parent))?;
        }

        let file = File::create(dest).map_err(io_error(dest))?;
        let mut archive = Builder::new(GzEncoder::new(file, Compression::default()));

        for (name, source) in &entries {
            let content = std::fs::read(source).map_err(io_error(source))?;
            add_file_to_tar(&mut archive, name, &content).map_err(io_error(dest))?;
            debug!(entry = %name, "Packaged");
        }

        let encoder = archive.into_inner().map_err(io_error(dest))?;
        encoder.finish().map_err(io_error(dest))?;

        Ok(PackageReport {
            path: dest.to_path_buf(),
            entries: entries.into_keys().collect(),
        })
    }
}

fn add_file_to_tar<W: Write>(archive: &mut Builder<W>, name: &str, content: &[u8]) -> io::Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_cksum();
    archive.append_data(&mut header, name, content)
}
