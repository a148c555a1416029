//! End-to-end builds of declarative languages loaded from disk.

use dslforge::language::DEFINITION_FILE;
use dslforge::{
    BuildError, Builder, ContextLocks, ContextPhase, ContextResolver, ContextScope,
    DeclarativeDiscovery, LanguageDiscovery, LanguageId, LanguageRegistry, PackageRule, Packager,
    PardonedSet, RealFileSystem, SourceRoot, TransformGoal,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const ENTITY: &str = r#"
group: org.example
name: entity
version: 1.0.0
extensions: [ent]
analysis:
  definitions: [Entity]
  references: [Ref]
  forbidden:
    - { constructor: Legacy, severity: warning, message: "legacy construct" }
transforms:
  compile: { format: json, extension: json }
  pretty: { format: aterm, extension: aterm }
"#;

const QUERY: &str = r#"
group: org.example
name: query
version: 1.0.0
extensions: [qry]
dependencies: ["org.example:entity:1.0.0"]
transforms:
  compile: { format: aterm, extension: aterm }
"#;

struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let project = Self {
            dir: TempDir::new().unwrap(),
        };
        project.write("langs/entity/language.yaml", ENTITY);
        project.write("langs/query/language.yaml", QUERY);
        project
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn registry(&self) -> Arc<LanguageRegistry> {
        let languages = DeclarativeDiscovery::new()
            .discover(&self.path("langs"))
            .unwrap();
        Arc::new(LanguageRegistry::with_languages(languages))
    }

    fn builder(&self, scope: ContextScope) -> Builder {
        Builder::new(
            self.registry(),
            Arc::new(ContextResolver::new(self.root(), self.path("gen"), scope)),
            Arc::new(ContextLocks::new()),
            Arc::new(RealFileSystem),
        )
    }

    fn build(&self, pardoned: &[&str]) -> Result<dslforge::BuildSummary, BuildError> {
        self.builder(ContextScope::Project).build_roots(
            &TransformGoal::compile(),
            &[SourceRoot::Path(self.path("src"))],
            &[SourceRoot::Path(self.path("lib"))],
            &pardoned.iter().copied().collect::<PardonedSet>(),
        )
    }
}

fn entity() -> LanguageId {
    LanguageId::new("org.example", "entity", "1.0.0")
}

fn query() -> LanguageId {
    LanguageId::new("org.example", "query", "1.0.0")
}

#[test]
fn test_compile_writes_outputs_in_dependency_order() {
    let project = Project::new();
    project.write(
        "src/model.ent",
        "Module([\n  Entity(\"Person\", [Ref(\"Address\")]),\n  Entity(\"Address\", [])\n])",
    );
    project.write("src/find.qry", "Query(\"Person\", 10)");

    let summary = project.build(&[]).unwrap();

    assert_eq!(summary.order, vec![entity(), query()]);
    assert_eq!(summary.transformed(), 2);
    assert!(summary.contexts.iter().all(|c| c.phase == ContextPhase::Done));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(project.path("gen/src/model.json")).unwrap())
            .unwrap();
    assert_eq!(json["constructor"], "Module");

    let aterm = fs::read_to_string(project.path("gen/src/find.aterm")).unwrap();
    assert_eq!(aterm, "Query(\"Person\",10)\n");
}

#[test]
fn test_names_resolve_across_files_and_includes() {
    let project = Project::new();
    project.write("src/a.ent", "Entity(\"Person\", [Ref(\"Address\"), Ref(\"Country\")])");
    project.write("src/b.ent", "Entity(\"Address\", [])");
    project.write("lib/base.ent", "Entity(\"Country\", [])");

    let summary = project.build(&[]).unwrap();

    let report = summary.contexts_for(&entity()).next().unwrap();
    assert_eq!(report.sources, 2);
    assert_eq!(report.includes, 1);
    assert_eq!(report.analyzed, 3);
    assert_eq!(report.transformed, 2);
    assert!(project.path("gen/src/a.json").exists());
    assert!(!project.path("gen/lib/base.json").exists());
}

#[test]
fn test_unresolved_reference_fails_analysis() {
    let project = Project::new();
    project.write("src/model.ent", "Entity(\"Person\", [Ref(\"Nope\")])");

    let err = project.build(&[]).unwrap_err();

    assert!(matches!(err, BuildError::AnalysisErrors { ref language, .. } if *language == entity()));
    let rendered = err.to_string();
    assert!(rendered.starts_with("Analysis failed for org.example:entity:1.0.0:"));
    assert!(rendered.contains("model.ent[1,"));
    assert!(rendered.contains("Unresolved reference 'Nope'"));
    assert!(!project.path("gen/src/model.json").exists());
}

#[test]
fn test_pardoned_language_still_transforms() {
    let project = Project::new();
    project.write("src/model.ent", "Entity(\"Person\", [Ref(\"Nope\"), Legacy()])");

    let summary = project.build(&["entity"]).unwrap();

    assert_eq!(summary.pardoned_errors(), 1);
    assert_eq!(summary.warnings(), 1);
    assert!(project.path("gen/src/model.json").exists());
}

#[test]
fn test_syntax_error_fails_even_when_pardoned() {
    let project = Project::new();
    project.write("src/ok.ent", "Entity(\"A\", [])");
    project.write("src/bad.ent", "Entity(\"A\"\n  [)");

    let err = project.build(&["entity"]).unwrap_err();

    assert!(matches!(err, BuildError::ParseErrors { .. }));
    assert!(err.to_string().contains("bad.ent[2,"));
    assert!(!project.path("gen/src/ok.json").exists());
}

#[test]
fn test_directory_scope_separates_contexts() {
    let project = Project::new();
    project.write("src/one/a.ent", "Entity(\"A\", [])");
    project.write("src/two/b.ent", "Entity(\"B\", [Ref(\"A\")])");

    let err = project
        .builder(ContextScope::Directory)
        .build_roots(
            &TransformGoal::compile(),
            &[SourceRoot::Path(project.path("src"))],
            &[],
            &PardonedSet::new(),
        )
        .unwrap_err();

    assert!(err.to_string().contains("Unresolved reference 'A'"));
}

#[test]
fn test_pinned_root_keeps_only_matching_files() {
    let project = Project::new();
    project.write("models/a.ent", "Entity(\"A\", [])");
    project.write("models/stray.qry", "Query(\"A\")");

    let summary = project
        .builder(ContextScope::Project)
        .build_roots(
            &TransformGoal::compile(),
            &[SourceRoot::Pinned {
                language: "entity".to_string(),
                path: project.path("models"),
            }],
            &[],
            &PardonedSet::new(),
        )
        .unwrap();

    assert_eq!(summary.transformed(), 1);
    assert!(project.path("gen/models/a.json").exists());
    assert!(!project.path("gen/models/stray.aterm").exists());
}

#[test]
fn test_languages_discovered_from_package_archive() {
    let project = Project::new();
    let mut packager = Packager::new();
    packager.add_rule(PackageRule::new(project.path("langs/entity"), "").include(DEFINITION_FILE));
    let archive = project.path("dist/entity-1.0.0.tar.gz");
    packager.create(&archive).unwrap();

    let languages = DeclarativeDiscovery::new().discover(&archive).unwrap();

    assert_eq!(languages.len(), 1);
    assert_eq!(*languages[0].id(), entity());
}
