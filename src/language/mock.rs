use super::{
    AnalysisResult, FileResult, Language, LanguageError, LanguageId, ParseResult, Term,
    TransformGoal,
};
use crate::context::BuildContext;
use crate::fs::FileSystem;
use crate::message::{Message, Severity, SourceRegion};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Every call a [`MockLanguage`] receives, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Parse {
        language: String,
        file: PathBuf,
    },
    Analyze {
        language: String,
        context: PathBuf,
        files: Vec<PathBuf>,
    },
    Transform {
        language: String,
        file: PathBuf,
        goal: String,
    },
}

impl MockCall {
    pub fn language(&self) -> &str {
        match self {
            MockCall::Parse { language, .. }
            | MockCall::Analyze { language, .. }
            | MockCall::Transform { language, .. } => language,
        }
    }
}

/// Call log that can be shared between several mock languages to observe
/// cross-language ordering.
pub type MockJournal = Arc<Mutex<Vec<MockCall>>>;

type ScriptedMessages = HashMap<String, Vec<(Severity, SourceRegion, String)>>;

/// Scripted language for tests. Files are identified by extension; messages
/// and failures are keyed by file name.
pub struct MockLanguage {
    id: LanguageId,
    extension: String,
    dependencies: Vec<LanguageId>,
    goals: HashSet<String>,
    parse_messages: ScriptedMessages,
    analysis_messages: ScriptedMessages,
    failing_parses: HashSet<String>,
    failing_transforms: HashSet<String>,
    journal: MockJournal,
}

impl MockLanguage {
    pub fn new(name: &str, extension: &str) -> Self {
        Self {
            id: LanguageId::new("org.example", name, "1.0.0"),
            extension: extension.to_string(),
            dependencies: Vec::new(),
            goals: HashSet::new(),
            parse_messages: HashMap::new(),
            analysis_messages: HashMap::new(),
            failing_parses: HashSet::new(),
            failing_transforms: HashSet::new(),
            journal: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.id.version = version.to_string();
        self
    }

    pub fn with_journal(mut self, journal: MockJournal) -> Self {
        self.journal = journal;
        self
    }

    pub fn depends_on(mut self, id: LanguageId) -> Self {
        self.dependencies.push(id);
        self
    }

    pub fn with_goal(mut self, goal: &str) -> Self {
        self.goals.insert(goal.to_string());
        self
    }

    pub fn with_parse_message(
        mut self,
        file_name: &str,
        severity: Severity,
        region: SourceRegion,
        text: &str,
    ) -> Self {
        self.parse_messages
            .entry(file_name.to_string())
            .or_default()
            .push((severity, region, text.to_string()));
        self
    }

    pub fn with_analysis_message(
        mut self,
        file_name: &str,
        severity: Severity,
        region: SourceRegion,
        text: &str,
    ) -> Self {
        self.analysis_messages
            .entry(file_name.to_string())
            .or_default()
            .push((severity, region, text.to_string()));
        self
    }

    /// The parser itself fails (as opposed to reporting diagnostics).
    pub fn failing_parse(mut self, file_name: &str) -> Self {
        self.failing_parses.insert(file_name.to_string());
        self
    }

    pub fn failing_transform(mut self, file_name: &str) -> Self {
        self.failing_transforms.insert(file_name.to_string());
        self
    }

    pub fn journal(&self) -> MockJournal {
        Arc::clone(&self.journal)
    }

    /// Calls made to this language only.
    pub fn calls(&self) -> Vec<MockCall> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|call| call.language() == self.id.name)
            .cloned()
            .collect()
    }

    pub fn transformed_files(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Transform { file, .. } => Some(file),
                _ => None,
            })
            .collect()
    }

    pub fn analyzed_files(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Analyze { files, .. } => Some(files),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn record(&self, call: MockCall) {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn scripted(messages: &ScriptedMessages, source: &Path) -> Vec<Message> {
        let name = file_name(source);
        messages
            .get(&name)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(severity, region, text)| {
                        Message::new(*severity, source, *region, text.clone())
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

impl Language for MockLanguage {
    fn id(&self) -> &LanguageId {
        &self.id
    }

    fn dependencies(&self) -> &[LanguageId] {
        &self.dependencies
    }

    fn identifies(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str())
    }

    fn parse(&self, text: &str, source: &Path) -> Result<ParseResult, LanguageError> {
        self.record(MockCall::Parse {
            language: self.id.name.clone(),
            file: source.to_path_buf(),
        });

        if self.failing_parses.contains(&file_name(source)) {
            return Err(LanguageError::Syntax {
                file: source.to_path_buf(),
                message: "mock parser crashed".to_string(),
            });
        }

        Ok(ParseResult {
            source: source.to_path_buf(),
            ast: Some(Term::appl("File", vec![Term::string(text)])),
            messages: Self::scripted(&self.parse_messages, source),
        })
    }

    fn analyze(
        &self,
        parse_results: &[ParseResult],
        context: &BuildContext,
    ) -> Result<AnalysisResult, LanguageError> {
        self.record(MockCall::Analyze {
            language: self.id.name.clone(),
            context: context.location().to_path_buf(),
            files: parse_results.iter().map(|r| r.source.clone()).collect(),
        });

        let file_results = parse_results
            .iter()
            .map(|r| FileResult {
                source: r.source.clone(),
                ast: r.ast.clone(),
                messages: Self::scripted(&self.analysis_messages, &r.source),
            })
            .collect();
        Ok(AnalysisResult { file_results })
    }

    fn transform_available(&self, goal: &TransformGoal, _context: &BuildContext) -> bool {
        self.goals.contains(goal.name())
    }

    fn transform(
        &self,
        result: &FileResult,
        _context: &BuildContext,
        goal: &TransformGoal,
        _fs: &dyn FileSystem,
    ) -> Result<(), LanguageError> {
        self.record(MockCall::Transform {
            language: self.id.name.clone(),
            file: result.source.clone(),
            goal: goal.to_string(),
        });

        if self.failing_transforms.contains(&file_name(&result.source)) {
            return Err(LanguageError::Transform {
                file: result.source.clone(),
                source: anyhow::anyhow!("mock transform failure"),
            });
        }
        Ok(())
    }
}
