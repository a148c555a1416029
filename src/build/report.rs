//! Diagnostic logging and the per-build summary.

use crate::context::ContextId;
use crate::language::LanguageId;
use crate::message::{Message, Severity};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Logs one diagnostic on the channel matching its severity.
pub fn log_message(message: &Message) {
    match message.severity {
        Severity::Error => error!("{}", message),
        Severity::Warning => warn!("{}", message),
        Severity::Note => info!("{}", message),
    }
}

/// Logs an error that does not fail the build because its language is pardoned.
pub fn log_pardoned(message: &Message) {
    warn!("{} (pardoned)", message);
}

/// Where a context got to during one build invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContextPhase {
    Pending,
    Parsing,
    Parsed,
    ParseFailed,
    Analyzing,
    Analyzed,
    AnalysisFailed,
    Transforming,
    TransformFailed,
    Done,
}

impl ContextPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ContextPhase::ParseFailed
                | ContextPhase::AnalysisFailed
                | ContextPhase::TransformFailed
                | ContextPhase::Done
        )
    }
}

impl fmt::Display for ContextPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContextPhase::Pending => "pending",
            ContextPhase::Parsing => "parsing",
            ContextPhase::Parsed => "parsed",
            ContextPhase::ParseFailed => "parse-failed",
            ContextPhase::Analyzing => "analyzing",
            ContextPhase::Analyzed => "analyzed",
            ContextPhase::AnalysisFailed => "analysis-failed",
            ContextPhase::Transforming => "transforming",
            ContextPhase::TransformFailed => "transform-failed",
            ContextPhase::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextReport {
    pub language: LanguageId,
    pub location: PathBuf,
    pub phase: ContextPhase,
    pub sources: usize,
    pub includes: usize,
    pub parsed: usize,
    pub analyzed: usize,
    pub transformed: usize,
    pub warnings: usize,
    pub pardoned_errors: usize,
    pub transform_available: bool,
}

impl ContextReport {
    pub fn new(id: &ContextId, sources: usize, includes: usize) -> Self {
        Self {
            language: id.language.clone(),
            location: id.location.clone(),
            phase: ContextPhase::Pending,
            sources,
            includes,
            parsed: 0,
            analyzed: 0,
            transformed: 0,
            warnings: 0,
            pardoned_errors: 0,
            transform_available: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildSummary {
    pub goal: String,
    pub order: Vec<LanguageId>,
    pub contexts: Vec<ContextReport>,
}

impl BuildSummary {
    pub fn transformed(&self) -> usize {
        self.contexts.iter().map(|c| c.transformed).sum()
    }

    pub fn warnings(&self) -> usize {
        self.contexts.iter().map(|c| c.warnings).sum()
    }

    pub fn pardoned_errors(&self) -> usize {
        self.contexts.iter().map(|c| c.pardoned_errors).sum()
    }

    pub fn contexts_for(&self, language: &LanguageId) -> impl Iterator<Item = &ContextReport> {
        let language = language.clone();
        self.contexts.iter().filter(move |c| c.language == language)
    }
}
