use super::report::ContextPhase;
use crate::context::ContextId;
use crate::language::{LanguageError, LanguageId};
use crate::message::Message;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Failed to expand {path}")]
    Expand {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Unknown language '{0}'")]
    UnknownLanguage(String),

    #[error("Language '{spec}' is ambiguous, it matches {}", .candidates.join(", "))]
    AmbiguousLanguage {
        spec: String,
        candidates: Vec<String>,
    },

    #[error("Cyclic dependency between languages {}", join_ids(.languages))]
    DependencyCycle { languages: Vec<LanguageId> },

    #[error("Parsing {file} failed")]
    ParseFailed {
        file: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Parse failed:\n{}", render(.messages))]
    ParseErrors { messages: Vec<Message> },

    #[error("Analysis of {context} failed")]
    AnalysisFailed {
        context: ContextId,
        #[source]
        source: LanguageError,
    },

    #[error("Analysis failed for {language}:\n{}", render(.messages))]
    AnalysisErrors {
        language: LanguageId,
        messages: Vec<Message>,
    },

    #[error("Transformation of {file} failed")]
    TransformFailed {
        file: PathBuf,
        #[source]
        source: LanguageError,
    },
}

impl BuildError {
    /// The terminal context phase this error corresponds to, if it was raised
    /// while processing a context.
    pub fn failed_phase(&self) -> Option<ContextPhase> {
        match self {
            BuildError::ParseFailed { .. } | BuildError::ParseErrors { .. } => {
                Some(ContextPhase::ParseFailed)
            }
            BuildError::AnalysisFailed { .. } | BuildError::AnalysisErrors { .. } => {
                Some(ContextPhase::AnalysisFailed)
            }
            BuildError::TransformFailed { .. } => Some(ContextPhase::TransformFailed),
            _ => None,
        }
    }

    /// Diagnostics carried by the error, if any.
    pub fn messages(&self) -> &[Message] {
        match self {
            BuildError::ParseErrors { messages } | BuildError::AnalysisErrors { messages, .. } => {
                messages
            }
            _ => &[],
        }
    }
}

fn render(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("  {}", m))
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_ids(ids: &[LanguageId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
