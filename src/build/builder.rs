use super::classify::{SourceRoot, SourceSet};
use super::order::build_order;
use super::pardon::PardonedSet;
use super::report::{log_message, log_pardoned, BuildSummary, ContextPhase, ContextReport};
use super::BuildError;
use crate::context::{BuildContext, ContextId, ContextLocks, ContextResolver};
use crate::fs::FileSystem;
use crate::language::{AnalysisResult, Language, LanguageRegistry, ParseResult, TransformGoal};
use crate::message::Message;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Files routed to one context.
struct ContextFiles {
    context: Arc<BuildContext>,
    /// Transform candidates.
    sources: BTreeSet<PathBuf>,
    /// Analysis candidates: sources plus includes.
    candidates: BTreeSet<PathBuf>,
}

/// Drives parse, analyze and transform over classified source sets, one
/// language at a time in dependency order.
pub struct Builder {
    registry: Arc<LanguageRegistry>,
    resolver: Arc<ContextResolver>,
    locks: Arc<ContextLocks>,
    fs: Arc<dyn FileSystem>,
}

impl Builder {
    pub fn new(
        registry: Arc<LanguageRegistry>,
        resolver: Arc<ContextResolver>,
        locks: Arc<ContextLocks>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            registry,
            resolver,
            locks,
            fs,
        }
    }

    pub fn registry(&self) -> &Arc<LanguageRegistry> {
        &self.registry
    }

    /// Expands and classifies the roots, then builds.
    pub fn build_roots(
        &self,
        goal: &TransformGoal,
        sources: &[SourceRoot],
        includes: &[SourceRoot],
        pardoned: &PardonedSet,
    ) -> Result<BuildSummary, BuildError> {
        let sources = SourceSet::from_roots(self.fs.as_ref(), &self.registry, sources)?;
        let includes = SourceSet::from_roots(self.fs.as_ref(), &self.registry, includes)?;
        self.build(goal, &sources, &includes, pardoned)
    }

    pub fn build(
        &self,
        goal: &TransformGoal,
        sources: &SourceSet,
        includes: &SourceSet,
        pardoned: &PardonedSet,
    ) -> Result<BuildSummary, BuildError> {
        let languages = sources
            .languages()
            .map(|id| {
                self.registry
                    .get(id)
                    .ok_or_else(|| BuildError::UnknownLanguage(id.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let order = build_order(&languages)?;

        let mut summary = BuildSummary {
            goal: goal.to_string(),
            order: order.iter().map(|l| l.id().clone()).collect(),
            contexts: Vec::new(),
        };
        debug!(
            goal = %goal,
            order = ?summary.order.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "Computed build order"
        );

        for language in &order {
            let groups = self.group_by_context(language.as_ref(), sources, includes);
            for files in groups.into_values() {
                let mut report = ContextReport::new(
                    files.context.id(),
                    files.sources.len(),
                    files.candidates.len() - files.sources.len(),
                );
                if files.sources.is_empty() {
                    trace!(context = %files.context.id(), "Context has only include files, skipping");
                } else if let Err(e) =
                    self.build_context(language.as_ref(), &files, goal, pardoned, &mut report)
                {
                    if let Some(phase) = e.failed_phase() {
                        debug!(
                            language = %report.language,
                            context = %report.location.display(),
                            phase = %phase,
                            "Context failed"
                        );
                    }
                    return Err(e);
                }
                summary.contexts.push(report);
            }
        }

        Ok(summary)
    }

    fn group_by_context(
        &self,
        language: &dyn Language,
        sources: &SourceSet,
        includes: &SourceSet,
    ) -> BTreeMap<ContextId, ContextFiles> {
        let mut groups: BTreeMap<ContextId, ContextFiles> = BTreeMap::new();

        let mut route = |file: &PathBuf, is_source: bool| {
            let context = self.resolver.context_for(file, language.id());
            let entry = groups
                .entry(context.id().clone())
                .or_insert_with(|| ContextFiles {
                    context,
                    sources: BTreeSet::new(),
                    candidates: BTreeSet::new(),
                });
            if is_source {
                entry.sources.insert(file.clone());
            }
            entry.candidates.insert(file.clone());
        };

        for file in sources.files(language.id()) {
            route(file, true);
        }
        for file in includes.files(language.id()) {
            route(file, false);
        }

        groups
    }

    fn build_context(
        &self,
        language: &dyn Language,
        files: &ContextFiles,
        goal: &TransformGoal,
        pardoned: &PardonedSet,
        report: &mut ContextReport,
    ) -> Result<(), BuildError> {
        let context = files.context.as_ref();
        info!(
            "Processing {} {} files in {}",
            files.candidates.len(),
            language.name(),
            context.location().display()
        );

        advance(report, ContextPhase::Parsing);
        let parse_results = self.parse_all(language, files)?;
        report.parsed = parse_results.len();
        advance(report, ContextPhase::Parsed);

        if parse_results.is_empty() {
            return Ok(());
        }

        advance(report, ContextPhase::Analyzing);
        let analysis = self.analyze(language, context, &parse_results)?;
        report.analyzed = analysis.file_results.len();
        self.check_analysis(language, &analysis, pardoned, report)?;
        advance(report, ContextPhase::Analyzed);

        if !language.transform_available(goal, context) {
            debug!(
                language = %language.id(),
                context = %context.location().display(),
                goal = %goal,
                "No transformer available, skipping"
            );
            advance(report, ContextPhase::Done);
            return Ok(());
        }
        report.transform_available = true;

        advance(report, ContextPhase::Transforming);
        report.transformed = self.transform(language, context, &analysis, &files.sources, goal)?;
        advance(report, ContextPhase::Done);
        Ok(())
    }

    fn parse_all(
        &self,
        language: &dyn Language,
        files: &ContextFiles,
    ) -> Result<Vec<ParseResult>, BuildError> {
        let mut results = Vec::with_capacity(files.candidates.len());
        for file in &files.candidates {
            debug!(file = %file.display(), "Parsing");
            let text = self
                .fs
                .read_to_string(file)
                .map_err(|source| BuildError::ParseFailed {
                    file: file.clone(),
                    source,
                })?;
            let result = language
                .parse(&text, file)
                .map_err(|e| BuildError::ParseFailed {
                    file: file.clone(),
                    source: e.into(),
                })?;
            results.push(result);
        }

        let messages: Vec<&Message> = results.iter().flat_map(|r| r.messages.iter()).collect();
        for message in &messages {
            log_message(message);
        }

        let errors: Vec<Message> = messages
            .into_iter()
            .filter(|m| m.is_error())
            .cloned()
            .collect();
        if !errors.is_empty() {
            return Err(BuildError::ParseErrors { messages: errors });
        }

        Ok(results)
    }

    fn analyze(
        &self,
        language: &dyn Language,
        context: &BuildContext,
        parse_results: &[ParseResult],
    ) -> Result<AnalysisResult, BuildError> {
        debug!(
            context = %context.id(),
            files = parse_results.len(),
            "Analyzing"
        );
        self.locks
            .with(context.id(), || language.analyze(parse_results, context))
            .map_err(|source| BuildError::AnalysisFailed {
                context: context.id().clone(),
                source,
            })
    }

    fn check_analysis(
        &self,
        language: &dyn Language,
        analysis: &AnalysisResult,
        pardoned: &PardonedSet,
        report: &mut ContextReport,
    ) -> Result<(), BuildError> {
        let is_pardoned = pardoned.contains(language.id());
        let mut errors = Vec::new();

        for message in analysis.messages() {
            if message.is_error() {
                errors.push(message.clone());
                if is_pardoned {
                    log_pardoned(message);
                } else {
                    log_message(message);
                }
            } else {
                report.warnings += 1;
                log_message(message);
            }
        }

        if errors.is_empty() {
            return Ok(());
        }
        if !is_pardoned {
            return Err(BuildError::AnalysisErrors {
                language: language.id().clone(),
                messages: errors,
            });
        }

        warn!(
            language = %language.id(),
            errors = errors.len(),
            "Analysis produced errors, continuing because the language is pardoned"
        );
        report.pardoned_errors = errors.len();
        Ok(())
    }

    fn transform(
        &self,
        language: &dyn Language,
        context: &BuildContext,
        analysis: &AnalysisResult,
        sources: &BTreeSet<PathBuf>,
        goal: &TransformGoal,
    ) -> Result<usize, BuildError> {
        self.locks.with(context.id(), || {
            let mut transformed = 0;
            for result in analysis
                .file_results
                .iter()
                .filter(|r| sources.contains(&r.source))
            {
                debug!(file = %result.source.display(), goal = %goal, "Transforming");
                language
                    .transform(result, context, goal, self.fs.as_ref())
                    .map_err(|source| BuildError::TransformFailed {
                        file: result.source.clone(),
                        source,
                    })?;
                transformed += 1;
            }
            Ok(transformed)
        })
    }
}

fn advance(report: &mut ContextReport, phase: ContextPhase) {
    trace!(
        language = %report.language,
        context = %report.location.display(),
        from = %report.phase,
        to = %phase,
        "Context phase"
    );
    report.phase = phase;
}
