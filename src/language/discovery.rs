//! Turning a filesystem location into loaded language components.

use super::{DeclarativeLanguage, Language, LanguageError};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

pub const DEFINITION_FILE: &str = "language.yaml";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Location {0} does not exist")]
    NotFound(PathBuf),

    #[error("Failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read archive {path}")]
    Archive {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to load {path}")]
    Definition {
        path: String,
        #[source]
        source: LanguageError,
    },
}

pub trait LanguageDiscovery: Send + Sync {
    /// Every language component found at `location`; empty when there are none.
    fn discover(&self, location: &Path) -> Result<Vec<Arc<dyn Language>>, DiscoveryError>;
}

/// Finds `language.yaml` definitions in directories and `.tar.gz` archives.
#[derive(Debug, Default)]
pub struct DeclarativeDiscovery;

impl DeclarativeDiscovery {
    pub fn new() -> Self {
        Self
    }

    fn is_archive(path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        name.ends_with(".tar.gz") || name.ends_with(".tgz")
    }

    fn is_definition(path: &Path) -> bool {
        path.file_name().and_then(|n| n.to_str()) == Some(DEFINITION_FILE)
    }

    fn load(content: &str, origin: String) -> Result<Arc<dyn Language>, DiscoveryError> {
        let language = DeclarativeLanguage::from_yaml(content).map_err(|source| {
            DiscoveryError::Definition {
                path: origin.clone(),
                source,
            }
        })?;
        debug!(origin = %origin, language = %language.id(), "Found language definition");
        Ok(Arc::new(language))
    }

    fn discover_directory(&self, root: &Path) -> Result<Vec<Arc<dyn Language>>, DiscoveryError> {
        let mut definitions = Vec::new();
        for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(|e| DiscoveryError::Io {
                path: root.to_path_buf(),
                source: e.into(),
            })?;
            if entry.file_type().is_file() && Self::is_definition(entry.path()) {
                definitions.push(entry.into_path());
            }
        }

        definitions
            .into_iter()
            .map(|path| {
                let content = std::fs::read_to_string(&path).map_err(|source| {
                    DiscoveryError::Io {
                        path: path.clone(),
                        source,
                    }
                })?;
                Self::load(&content, path.display().to_string())
            })
            .collect()
    }

    fn discover_archive(&self, archive: &Path) -> Result<Vec<Arc<dyn Language>>, DiscoveryError> {
        let archive_error = |source: io::Error| DiscoveryError::Archive {
            path: archive.to_path_buf(),
            source,
        };

        let file = File::open(archive).map_err(archive_error)?;
        let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(file));
        let mut found = Vec::new();

        for entry in tar.entries().map_err(archive_error)? {
            let mut entry = entry.map_err(archive_error)?;
            let path = entry.path().map_err(archive_error)?.into_owned();
            if !entry.header().entry_type().is_file() || !Self::is_definition(&path) {
                continue;
            }

            let mut content = String::new();
            entry.read_to_string(&mut content).map_err(archive_error)?;
            found.push(Self::load(
                &content,
                format!("{}!{}", archive.display(), path.display()),
            )?);
        }

        Ok(found)
    }
}

impl LanguageDiscovery for DeclarativeDiscovery {
    fn discover(&self, location: &Path) -> Result<Vec<Arc<dyn Language>>, DiscoveryError> {
        if !location.exists() {
            return Err(DiscoveryError::NotFound(location.to_path_buf()));
        }

        if location.is_dir() {
            self.discover_directory(location)
        } else if Self::is_archive(location) {
            self.discover_archive(location)
        } else if Self::is_definition(location) {
            let content =
                std::fs::read_to_string(location).map_err(|source| DiscoveryError::Io {
                    path: location.to_path_buf(),
                    source,
                })?;
            Ok(vec![Self::load(&content, location.display().to_string())?])
        } else {
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::fs;
    use tempfile::TempDir;

    fn definition(name: &str, extension: &str) -> String {
        format!(
            "group: org.example\nname: {}\nversion: 1.0.0\nextensions: [{}]\n",
            name, extension
        )
    }

    fn write_archive(path: &Path, files: &[(&str, String)]) {
        let encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_entry_type(tar::EntryType::Regular);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    fn names(languages: &[Arc<dyn Language>]) -> Vec<String> {
        languages.iter().map(|l| l.name().to_string()).collect()
    }

    #[test]
    fn test_discover_directory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("entity")).unwrap();
        fs::create_dir_all(temp.path().join("query/nested")).unwrap();
        fs::write(temp.path().join("entity/language.yaml"), definition("entity", "ent")).unwrap();
        fs::write(
            temp.path().join("query/nested/language.yaml"),
            definition("query", "qry"),
        )
        .unwrap();
        fs::write(temp.path().join("entity/other.yaml"), "not: a language").unwrap();

        let languages = DeclarativeDiscovery::new().discover(temp.path()).unwrap();
        assert_eq!(names(&languages), vec!["entity", "query"]);
    }

    #[test]
    fn test_discover_empty_directory() {
        let temp = TempDir::new().unwrap();
        let languages = DeclarativeDiscovery::new().discover(temp.path()).unwrap();
        assert!(languages.is_empty());
    }

    #[test]
    fn test_discover_archive() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("entity-1.0.0.tar.gz");
        write_archive(
            &archive,
            &[
                ("language.yaml", definition("entity", "ent")),
                ("gen/a.json", "{}".to_string()),
            ],
        );

        let languages = DeclarativeDiscovery::new().discover(&archive).unwrap();
        assert_eq!(names(&languages), vec!["entity"]);
    }

    #[test]
    fn test_discover_single_definition_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("language.yaml");
        fs::write(&file, definition("entity", "ent")).unwrap();

        let languages = DeclarativeDiscovery::new().discover(&file).unwrap();
        assert_eq!(languages.len(), 1);
    }

    #[test]
    fn test_missing_location() {
        let temp = TempDir::new().unwrap();
        let err = DeclarativeDiscovery::new()
            .discover(&temp.path().join("missing"))
            .err()
            .unwrap();
        assert!(matches!(err, DiscoveryError::NotFound(_)));
    }

    #[test]
    fn test_invalid_definition_names_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("language.yaml"), "group: [").unwrap();

        let err = DeclarativeDiscovery::new()
            .discover(temp.path())
            .err()
            .unwrap();
        assert!(matches!(err, DiscoveryError::Definition { .. }));
        assert!(err.to_string().contains("language.yaml"));
        let chain = format!("{:#}", anyhow::Error::from(err));
        assert_eq!(chain.matches("Invalid language definition").count(), 1);
    }

    #[test]
    fn test_corrupt_archive() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.tgz");
        fs::write(&archive, "definitely not gzip").unwrap();

        let err = DeclarativeDiscovery::new().discover(&archive).err().unwrap();
        assert!(matches!(err, DiscoveryError::Archive { .. }));
    }
}
