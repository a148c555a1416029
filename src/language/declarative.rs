//! Languages defined by a `language.yaml` file instead of code.

use super::term::parse_aterm;
use super::{
    AnalysisResult, FileResult, Language, LanguageError, LanguageId, ParseResult, Term,
    TransformGoal,
};
use crate::context::{BuildContext, Symbol};
use crate::fs::FileSystem;
use crate::message::{Message, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageSpec {
    pub group: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<LanguageId>,
    #[serde(default)]
    pub analysis: AnalysisSpec,
    #[serde(default)]
    pub transforms: BTreeMap<String, TransformSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSpec {
    /// Constructors whose first string child defines a name.
    pub definitions: Vec<String>,
    /// Constructors whose first string child refers to a name.
    pub references: Vec<String>,
    pub unresolved: Severity,
    pub duplicates: Severity,
    pub forbidden: Vec<ForbiddenSpec>,
}

impl Default for AnalysisSpec {
    fn default() -> Self {
        Self {
            definitions: Vec::new(),
            references: Vec::new(),
            unresolved: Severity::Error,
            duplicates: Severity::Warning,
            forbidden: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForbiddenSpec {
    pub constructor: String,
    #[serde(default = "default_forbidden_severity")]
    pub severity: Severity,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_forbidden_severity() -> Severity {
    Severity::Error
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Aterm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformSpec {
    pub format: OutputFormat,
    pub extension: String,
}

pub struct DeclarativeLanguage {
    id: LanguageId,
    spec: LanguageSpec,
}

impl DeclarativeLanguage {
    pub fn from_yaml(content: &str) -> Result<Self, LanguageError> {
        let spec: LanguageSpec = serde_yaml::from_str(content)
            .map_err(|e| LanguageError::Definition(e.to_string()))?;
        Self::from_spec(spec)
    }

    pub fn from_spec(spec: LanguageSpec) -> Result<Self, LanguageError> {
        for (field, value) in [
            ("group", &spec.group),
            ("name", &spec.name),
            ("version", &spec.version),
        ] {
            if value.trim().is_empty() || value.contains(':') {
                return Err(LanguageError::Definition(format!(
                    "{} must be non-empty and must not contain ':'",
                    field
                )));
            }
        }
        if spec.extensions.is_empty() {
            return Err(LanguageError::Definition(format!(
                "{} declares no file extensions",
                spec.name
            )));
        }
        if let Some(ext) = spec.extensions.iter().find(|e| e.starts_with('.') || e.is_empty()) {
            return Err(LanguageError::Definition(format!(
                "invalid extension '{}', expected an extension without the leading dot",
                ext
            )));
        }
        if let Some((goal, _)) = spec.transforms.iter().find(|(_, t)| t.extension.is_empty()) {
            return Err(LanguageError::Definition(format!(
                "transform '{}' has an empty output extension",
                goal
            )));
        }

        let id = LanguageId::new(&spec.group, &spec.name, &spec.version);
        Ok(Self { id, spec })
    }

    pub fn spec(&self) -> &LanguageSpec {
        &self.spec
    }

    fn definitions<'a>(&self, tree: &'a Term) -> Vec<(&'a str, &'a Term)> {
        self.named_nodes(tree, &self.spec.analysis.definitions)
    }

    fn named_nodes<'a>(&self, tree: &'a Term, constructors: &[String]) -> Vec<(&'a str, &'a Term)> {
        let mut found = Vec::new();
        tree.walk(&mut |node| {
            if let (Some(cons), Some(name)) = (node.constructor(), node.first_string()) {
                if constructors.iter().any(|c| c == cons) {
                    found.push((name, node));
                }
            }
        });
        found
    }

    fn check_file(&self, source: &Path, tree: &Term, context: &BuildContext) -> Vec<Message> {
        let analysis = &self.spec.analysis;
        let symbols = context.symbols();
        let mut messages = Vec::new();

        for (name, node) in self.definitions(tree) {
            if symbols.count(name) > 1 {
                messages.push(Message::new(
                    analysis.duplicates,
                    source,
                    node.region,
                    format!("Duplicate definition of '{}'", name),
                ));
            }
        }

        for (name, node) in self.named_nodes(tree, &analysis.references) {
            if !symbols.is_defined(name) {
                messages.push(Message::new(
                    analysis.unresolved,
                    source,
                    node.region,
                    format!("Unresolved reference '{}'", name),
                ));
            }
        }

        tree.walk(&mut |node| {
            let Some(cons) = node.constructor() else {
                return;
            };
            for rule in analysis.forbidden.iter().filter(|r| r.constructor == cons) {
                let text = rule
                    .message
                    .clone()
                    .unwrap_or_else(|| format!("'{}' is not allowed", cons));
                messages.push(Message::new(rule.severity, source, node.region, text));
            }
        });

        messages
    }

    fn target_path(&self, source: &Path, context: &BuildContext, extension: &str) -> PathBuf {
        let relative = source
            .strip_prefix(context.location())
            .ok()
            .map(Path::to_path_buf)
            .or_else(|| source.file_name().map(PathBuf::from))
            .unwrap_or_default();
        context.output_dir().join(relative).with_extension(extension)
    }
}

impl Language for DeclarativeLanguage {
    fn id(&self) -> &LanguageId {
        &self.id
    }

    fn dependencies(&self) -> &[LanguageId] {
        &self.spec.dependencies
    }

    fn identifies(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.spec.extensions.iter().any(|e| e == ext))
            .unwrap_or(false)
    }

    fn parse(&self, text: &str, source: &Path) -> Result<ParseResult, LanguageError> {
        match parse_aterm(text) {
            Ok(tree) => Ok(ParseResult {
                source: source.to_path_buf(),
                ast: Some(tree),
                messages: Vec::new(),
            }),
            Err(e) => Ok(ParseResult {
                source: source.to_path_buf(),
                ast: None,
                messages: vec![Message::error(source, e.region, e.message)],
            }),
        }
    }

    fn analyze(
        &self,
        parse_results: &[ParseResult],
        context: &BuildContext,
    ) -> Result<AnalysisResult, LanguageError> {
        {
            let mut symbols = context.symbols();
            for result in parse_results {
                let Some(tree) = &result.ast else {
                    symbols.remove(&result.source);
                    continue;
                };
                let defined = self
                    .definitions(tree)
                    .into_iter()
                    .map(|(name, node)| Symbol {
                        name: name.to_string(),
                        region: node.region,
                    })
                    .collect();
                symbols.replace(&result.source, defined);
            }
            debug!(context = %context.id(), symbols = symbols.len(), "Updated symbol index");
        }

        let file_results = parse_results
            .iter()
            .map(|result| FileResult {
                source: result.source.clone(),
                ast: result.ast.clone(),
                messages: match &result.ast {
                    Some(tree) => self.check_file(&result.source, tree, context),
                    None => Vec::new(),
                },
            })
            .collect();

        Ok(AnalysisResult { file_results })
    }

    fn transform_available(&self, goal: &TransformGoal, _context: &BuildContext) -> bool {
        self.spec.transforms.contains_key(goal.name())
    }

    fn transform(
        &self,
        result: &FileResult,
        context: &BuildContext,
        goal: &TransformGoal,
        fs: &dyn FileSystem,
    ) -> Result<(), LanguageError> {
        let spec = self
            .spec
            .transforms
            .get(goal.name())
            .ok_or_else(|| LanguageError::UnsupportedGoal {
                goal: goal.to_string(),
                language: self.id.clone(),
            })?;
        let tree = result.ast.as_ref().ok_or_else(|| LanguageError::Transform {
            file: result.source.clone(),
            source: anyhow::anyhow!("no term tree to transform"),
        })?;

        let content = match spec.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(tree).map_err(|e| LanguageError::Transform {
                    file: result.source.clone(),
                    source: e.into(),
                })?
            }
            OutputFormat::Aterm => format!("{}\n", tree),
        };

        let target = self.target_path(&result.source, context, &spec.extension);
        fs.write(&target, &content)
            .map_err(|source| LanguageError::Transform {
                file: result.source.clone(),
                source,
            })?;

        debug!(
            file = %result.source.display(),
            target = %target.display(),
            goal = %goal,
            "Wrote transform output"
        );
        Ok(())
    }
}
