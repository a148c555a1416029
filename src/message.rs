//! Diagnostic messages produced by parsing and analysis.
//!
//! Rows and columns are stored zero-based and rendered one-based, so a message
//! at the very first character of `a.ent` displays as `a.ent[1,1]: text`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// Zero-based source region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceRegion {
    pub start_row: usize,
    pub start_column: usize,
    pub end_row: usize,
    pub end_column: usize,
}

impl SourceRegion {
    pub fn new(start_row: usize, start_column: usize, end_row: usize, end_column: usize) -> Self {
        Self {
            start_row,
            start_column,
            end_row,
            end_column,
        }
    }

    pub fn point(row: usize, column: usize) -> Self {
        Self::new(row, column, row, column)
    }
}

impl fmt::Display for SourceRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.start_row + 1, self.start_column + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub severity: Severity,
    pub source: PathBuf,
    pub region: SourceRegion,
    pub text: String,
}

impl Message {
    pub fn new(
        severity: Severity,
        source: impl Into<PathBuf>,
        region: SourceRegion,
        text: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            source: source.into(),
            region,
            text: text.into(),
        }
    }

    pub fn error(source: impl Into<PathBuf>, region: SourceRegion, text: impl Into<String>) -> Self {
        Self::new(Severity::Error, source, region, text)
    }

    pub fn warning(
        source: impl Into<PathBuf>,
        region: SourceRegion,
        text: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, source, region, text)
    }

    pub fn note(source: impl Into<PathBuf>, region: SourceRegion, text: impl Into<String>) -> Self {
        Self::new(Severity::Note, source, region, text)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.source.display(), self.region, self.text)
    }
}
