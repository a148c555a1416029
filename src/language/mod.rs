//! Language definitions, the capability interface the build orchestrator
//! drives, and the registry that owns loaded languages.

mod declarative;
mod discovery;
mod mock;
mod registry;
pub mod term;

pub use declarative::{
    AnalysisSpec, DeclarativeLanguage, ForbiddenSpec, LanguageSpec, OutputFormat, TransformSpec,
};
pub use discovery::{DeclarativeDiscovery, DiscoveryError, LanguageDiscovery, DEFINITION_FILE};
pub use mock::{MockCall, MockJournal, MockLanguage};
pub use registry::LanguageRegistry;
pub use term::{Term, TermKind};

use crate::context::BuildContext;
use crate::fs::FileSystem;
use crate::message::Message;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Identity of a language component: `group:name:version`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageId {
    pub group: String,
    pub name: String,
    pub version: String,
}

impl LanguageId {
    pub fn new(group: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    /// A spec matches either the full `group:name:version` or the bare name.
    pub fn matches_spec(&self, spec: &str) -> bool {
        let spec = spec.trim();
        spec == self.name || spec == self.to_string()
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

impl FromStr for LanguageId {
    type Err = LanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        match parts.as_slice() {
            [group, name, version] if parts.iter().all(|p| !p.is_empty()) => {
                Ok(Self::new(*group, *name, *version))
            }
            _ => Err(LanguageError::Definition(format!(
                "invalid language identifier '{}', expected group:name:version",
                s
            ))),
        }
    }
}

impl TryFrom<String> for LanguageId {
    type Error = LanguageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LanguageId> for String {
    fn from(id: LanguageId) -> Self {
        id.to_string()
    }
}

/// Which generated artifact the transform stage should produce.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformGoal(String);

impl TransformGoal {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn compile() -> Self {
        Self::new("compile")
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransformGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct ParseResult {
    pub source: PathBuf,
    pub ast: Option<Term>,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone)]
pub struct FileResult {
    pub source: PathBuf,
    pub ast: Option<Term>,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    pub file_results: Vec<FileResult>,
}

impl AnalysisResult {
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.file_results.iter().flat_map(|r| r.messages.iter())
    }
}

#[derive(Debug, Error)]
pub enum LanguageError {
    #[error("Invalid language definition: {0}")]
    Definition(String),

    #[error("Parser failed for {file}: {message}")]
    Syntax { file: PathBuf, message: String },

    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Analysis failed: {0}")]
    Analysis(String),

    #[error("Goal '{goal}' is not supported by {language}")]
    UnsupportedGoal { goal: String, language: LanguageId },

    #[error("Could not generate output for {file}")]
    Transform {
        file: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// Capabilities of one language: identify, parse, analyze and transform.
pub trait Language: Send + Sync {
    fn id(&self) -> &LanguageId;

    fn name(&self) -> &str {
        &self.id().name
    }

    /// Languages that must be built before this one.
    fn dependencies(&self) -> &[LanguageId] {
        &[]
    }

    /// Whether `path` belongs to this language.
    fn identifies(&self, path: &Path) -> bool;

    fn parse(&self, text: &str, source: &Path) -> Result<ParseResult, LanguageError>;

    fn analyze(
        &self,
        parse_results: &[ParseResult],
        context: &BuildContext,
    ) -> Result<AnalysisResult, LanguageError>;

    fn transform_available(&self, goal: &TransformGoal, context: &BuildContext) -> bool;

    fn transform(
        &self,
        result: &FileResult,
        context: &BuildContext,
        goal: &TransformGoal,
        fs: &dyn FileSystem,
    ) -> Result<(), LanguageError>;
}

impl fmt::Debug for dyn Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Language({})", self.id())
    }
}
