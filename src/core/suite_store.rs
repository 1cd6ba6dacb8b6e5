/*
 * Reads and writes test suite files. A suite file lists its test cases by title and
 * file; test case files inside the suite's directory are stored relative to it so a
 * suite directory can be moved as a whole. In memory every entry file is absolute.
 *
 * The `SuiteStorageOperations` trait lets the controller be tested without a file
 * system; `CoreSuiteStorage` is the JSON implementation.
 */
use super::models::{SuiteEntry, TestSuite};
use super::path_utils;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

pub const SUITE_FILE_EXTENSION: &str = "json";

#[derive(Debug)]
pub enum SuiteError {
    Io(io::Error),
    Serde(serde_json::Error),
    NotFound(PathBuf),
}

impl SuiteError {
    pub fn is_not_found(&self) -> bool {
        match self {
            SuiteError::NotFound(_) => true,
            SuiteError::Io(e) => e.kind() == io::ErrorKind::NotFound,
            SuiteError::Serde(_) => false,
        }
    }
}

impl From<io::Error> for SuiteError {
    fn from(err: io::Error) -> Self {
        SuiteError::Io(err)
    }
}

impl From<serde_json::Error> for SuiteError {
    fn from(err: serde_json::Error) -> Self {
        SuiteError::Serde(err)
    }
}

impl std::fmt::Display for SuiteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuiteError::Io(e) => write!(f, "I/O error: {e}"),
            SuiteError::Serde(e) => write!(f, "Suite parse error: {e}"),
            SuiteError::NotFound(path) => write!(f, "Suite file not found: {}", path.display()),
        }
    }
}

impl std::error::Error for SuiteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SuiteError::Io(e) => Some(e),
            SuiteError::Serde(e) => Some(e),
            SuiteError::NotFound(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SuiteError>;

pub trait SuiteStorageOperations: Send + Sync {
    fn load_suite(&self, path: &Path) -> Result<TestSuite>;
    fn save_suite(&self, suite: &TestSuite, path: &Path) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct SuiteDocument {
    tests: Vec<SuiteDocumentEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SuiteDocumentEntry {
    title: String,
    file: PathBuf,
    // Set on entries imported from another suite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    origin: Option<String>,
}

pub struct CoreSuiteStorage {}

impl CoreSuiteStorage {
    pub fn new() -> Self {
        CoreSuiteStorage {}
    }
}

impl Default for CoreSuiteStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SuiteStorageOperations for CoreSuiteStorage {
    fn load_suite(&self, path: &Path) -> Result<TestSuite> {
        log::trace!("CoreSuiteStorage: Loading suite from {path:?}");
        if !path.exists() {
            return Err(SuiteError::NotFound(path.to_path_buf()));
        }
        let reader = BufReader::new(File::open(path)?);
        let document: SuiteDocument = serde_json::from_reader(reader)?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let entries = document
            .tests
            .into_iter()
            .map(|test| {
                let mut entry = SuiteEntry::from_file(
                    &test.title,
                    path_utils::resolve_against(base_dir, &test.file),
                );
                entry.origin = test.origin;
                entry
            })
            .collect::<Vec<_>>();
        log::debug!(
            "CoreSuiteStorage: Loaded suite with {} test cases from {path:?}.",
            entries.len()
        );
        Ok(TestSuite::from_entries(Some(path.to_path_buf()), entries))
    }

    fn save_suite(&self, suite: &TestSuite, path: &Path) -> Result<()> {
        log::trace!("CoreSuiteStorage: Saving suite to {path:?}");
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let mut tests = Vec::with_capacity(suite.len());
        for entry in suite.entries() {
            match &entry.file {
                Some(file) => tests.push(SuiteDocumentEntry {
                    title: entry.title().to_string(),
                    file: path_utils::relative_to(base_dir, file),
                    origin: entry.origin.clone(),
                }),
                None => log::warn!(
                    "CoreSuiteStorage: Test case '{}' has no file and is left out of {path:?}.",
                    entry.title()
                ),
            }
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &SuiteDocument { tests })?;
        log::debug!("CoreSuiteStorage: Saved suite to {path:?}.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::TestCase;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_save_writes_relative_paths_and_load_resolves_them() {
        let dir = tempdir().unwrap();
        let suite_path = dir.path().join("suite.json");
        let inside = dir.path().join("cases").join("login.json");
        let outside = PathBuf::from("/shared/logout.json");

        let mut suite = TestSuite::new();
        suite.add_entry(SuiteEntry::from_file("login", inside.clone()));
        suite.add_entry(SuiteEntry::from_file("logout", outside.clone()));

        let storage = CoreSuiteStorage::new();
        storage.save_suite(&suite, &suite_path).unwrap();

        let raw = fs::read_to_string(&suite_path).unwrap();
        let document: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            document["tests"][0]["file"],
            serde_json::Value::String(format!("cases{}login.json", std::path::MAIN_SEPARATOR))
        );

        let loaded = storage.load_suite(&suite_path).unwrap();
        assert_eq!(loaded.file(), Some(suite_path.as_path()));
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.entries()[0].title(), "login");
        assert_eq!(loaded.entries()[0].file.as_deref(), Some(inside.as_path()));
        assert_eq!(loaded.entries()[1].file.as_deref(), Some(outside.as_path()));
        assert!(loaded.entries().iter().all(|e| e.content.is_none()));
    }

    #[test]
    fn test_origin_survives_save_and_load() {
        let dir = tempdir().unwrap();
        let suite_path = dir.path().join("suite.json");
        let mut imported = SuiteEntry::from_file("login", dir.path().join("login.json"));
        imported.origin = Some("shared".to_string());
        let mut suite = TestSuite::new();
        suite.add_entry(imported);
        suite.add_entry(SuiteEntry::from_file("local", dir.path().join("local.json")));

        let storage = CoreSuiteStorage::new();
        storage.save_suite(&suite, &suite_path).unwrap();

        let raw = fs::read_to_string(&suite_path).unwrap();
        let document: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(document["tests"][1].get("origin").is_none());

        let loaded = storage.load_suite(&suite_path).unwrap();
        assert_eq!(loaded.entries()[0].origin.as_deref(), Some("shared"));
        assert_eq!(loaded.entries()[1].origin, None);
    }

    #[test]
    fn test_save_skips_entries_without_file() {
        let dir = tempdir().unwrap();
        let suite_path = dir.path().join("suite.json");
        let mut suite = TestSuite::new();
        suite.add_test_case_from_content(TestCase::new("never saved"));

        let storage = CoreSuiteStorage::new();
        storage.save_suite(&suite, &suite_path).unwrap();

        assert!(storage.load_suite(&suite_path).unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_suite_is_not_found() {
        let dir = tempdir().unwrap();
        let err = CoreSuiteStorage::new()
            .load_suite(&dir.path().join("nope.json"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_test_case_file_as_suite_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("case.json");
        fs::write(&path, r#"{"title": "a case", "commands": []}"#).unwrap();

        let err = CoreSuiteStorage::new().load_suite(&path).unwrap_err();
        assert!(matches!(err, SuiteError::Serde(_)));
    }
}
