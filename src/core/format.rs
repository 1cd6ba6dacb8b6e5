/*
 * Pluggable test case formats. A format knows how to read a test case from a file
 * and write one back; choosing which file is the controller's job, so formats
 * never touch the user interaction surface.
 *
 * `FormatCollection` is the registry the controller selects its current and
 * clipboard formats from. It always holds at least one format (the default), which
 * is what an unknown or missing format id resolves to. `JsonFormat` is the built-in
 * native format.
 */
use super::models::{Command, TestCase};
use super::path_utils;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_FORMAT_ID: &str = "default";

#[derive(Debug)]
pub enum FormatError {
    Io(io::Error),
    Serde(serde_json::Error),
    NotFound(PathBuf),
}

impl FormatError {
    pub fn is_not_found(&self) -> bool {
        match self {
            FormatError::NotFound(_) => true,
            FormatError::Io(e) => e.kind() == io::ErrorKind::NotFound,
            FormatError::Serde(_) => false,
        }
    }
}

impl From<io::Error> for FormatError {
    fn from(err: io::Error) -> Self {
        FormatError::Io(err)
    }
}

impl From<serde_json::Error> for FormatError {
    fn from(err: serde_json::Error) -> Self {
        FormatError::Serde(err)
    }
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::Io(e) => write!(f, "I/O error: {e}"),
            FormatError::Serde(e) => write!(f, "Parse error: {e}"),
            FormatError::NotFound(path) => write!(f, "File not found: {}", path.display()),
        }
    }
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FormatError::Io(e) => Some(e),
            FormatError::Serde(e) => Some(e),
            FormatError::NotFound(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FormatError>;

pub trait TestCaseFormat: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    // Without the leading dot, used to filter file pickers.
    fn extension(&self) -> &str;
    // Whether cases in this format can be replayed by the editor.
    fn playable(&self) -> bool {
        true
    }
    fn load_file(&self, path: &Path) -> Result<TestCase>;
    fn save_file(&self, test_case: &TestCase, path: &Path) -> Result<()>;
}

pub struct FormatCollection {
    formats: Vec<Arc<dyn TestCaseFormat>>,
}

impl FormatCollection {
    pub fn new(default_format: Arc<dyn TestCaseFormat>) -> Self {
        FormatCollection {
            formats: vec![default_format],
        }
    }

    pub fn with_format(mut self, format: Arc<dyn TestCaseFormat>) -> Self {
        self.register(format);
        self
    }

    // A format registered under an existing id replaces it in place.
    pub fn register(&mut self, format: Arc<dyn TestCaseFormat>) {
        if let Some(slot) = self.formats.iter_mut().find(|f| f.id() == format.id()) {
            log::debug!("FormatCollection: Replacing format '{}'", format.id());
            *slot = format;
        } else {
            log::debug!("FormatCollection: Registered format '{}'", format.id());
            self.formats.push(format);
        }
    }

    pub fn find(&self, id: &str) -> Option<Arc<dyn TestCaseFormat>> {
        self.formats.iter().find(|f| f.id() == id).cloned()
    }

    pub fn default_format(&self) -> Arc<dyn TestCaseFormat> {
        Arc::clone(&self.formats[0])
    }

    pub fn select_format(&self, id: Option<&str>) -> Arc<dyn TestCaseFormat> {
        match id.filter(|id| !id.is_empty()) {
            Some(id) => self.find(id).unwrap_or_else(|| {
                log::warn!("FormatCollection: Unknown format '{id}', using the default format.");
                self.default_format()
            }),
            None => self.default_format(),
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.formats.iter().map(|f| f.id().to_string()).collect()
    }
}

impl Default for FormatCollection {
    fn default() -> Self {
        FormatCollection::new(Arc::new(JsonFormat::new()))
    }
}

// On-disk shape of a test case written by `JsonFormat`. Unknown fields are rejected so a
// suite file is never mistaken for an empty test case.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TestCaseDocument {
    #[serde(default)]
    title: Option<String>,
    #[serde(rename = "baseURL", default)]
    base_url: String,
    #[serde(default)]
    commands: Vec<Command>,
}

pub struct JsonFormat {}

impl JsonFormat {
    pub fn new() -> Self {
        JsonFormat {}
    }
}

impl Default for JsonFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCaseFormat for JsonFormat {
    fn id(&self) -> &str {
        DEFAULT_FORMAT_ID
    }

    fn name(&self) -> &str {
        "Native JSON"
    }

    fn extension(&self) -> &str {
        "json"
    }

    fn load_file(&self, path: &Path) -> Result<TestCase> {
        log::trace!("JsonFormat: Loading test case from {path:?}");
        if !path.exists() {
            return Err(FormatError::NotFound(path.to_path_buf()));
        }
        let reader = BufReader::new(File::open(path)?);
        let document: TestCaseDocument = serde_json::from_reader(reader)?;
        let title = document
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| path_utils::file_title(path));
        log::debug!(
            "JsonFormat: Loaded test case '{title}' with {} commands from {path:?}.",
            document.commands.len()
        );
        Ok(TestCase::from_stored(
            title,
            document.base_url,
            document.commands,
            path.to_path_buf(),
        ))
    }

    fn save_file(&self, test_case: &TestCase, path: &Path) -> Result<()> {
        log::trace!(
            "JsonFormat: Saving test case '{}' to {path:?}",
            test_case.title()
        );
        let document = TestCaseDocument {
            title: Some(test_case.title().to_string()),
            base_url: test_case.base_url().to_string(),
            commands: test_case.commands().to_vec(),
        };
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &document)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    struct NamedFormat(&'static str);

    impl TestCaseFormat for NamedFormat {
        fn id(&self) -> &str {
            self.0
        }
        fn name(&self) -> &str {
            self.0
        }
        fn extension(&self) -> &str {
            "txt"
        }
        fn playable(&self) -> bool {
            false
        }
        fn load_file(&self, path: &Path) -> Result<TestCase> {
            Err(FormatError::NotFound(path.to_path_buf()))
        }
        fn save_file(&self, _test_case: &TestCase, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_json_format_save_then_load_preserves_case() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("login.json");
        let format = JsonFormat::new();

        let mut test_case = TestCase::new("login");
        test_case.set_base_url("http://example.com");
        test_case.push_command(Command::new("open", "/login", ""));
        test_case.push_command(Command::new("type", "id=user", "alice"));

        format.save_file(&test_case, &path).unwrap();
        let loaded = format.load_file(&path).unwrap();

        assert_eq!(loaded.title(), "login");
        assert_eq!(loaded.base_url(), "http://example.com");
        assert_eq!(loaded.commands(), test_case.commands());
        assert_eq!(loaded.file(), Some(path.as_path()));
        assert!(!loaded.is_modified());
    }

    #[test]
    fn test_json_format_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = JsonFormat::new()
            .load_file(&dir.path().join("missing.json"))
            .unwrap_err();
        assert!(err.is_not_found(), "Unexpected error: {err:?}");
    }

    #[test]
    fn test_json_format_invalid_content_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "<html>not a test case</html>").unwrap();

        let err = JsonFormat::new().load_file(&path).unwrap_err();
        assert!(matches!(err, FormatError::Serde(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_json_format_rejects_suite_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("suite.json");
        fs::write(&path, r#"{"tests": [{"title": "a", "file": "a.json"}]}"#).unwrap();

        let err = JsonFormat::new().load_file(&path).unwrap_err();
        assert!(matches!(err, FormatError::Serde(_)));
    }

    #[test]
    fn test_json_format_title_defaults_to_file_stem() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("checkout.json");
        fs::write(&path, r#"{"commands": []}"#).unwrap();

        let loaded = JsonFormat::new().load_file(&path).unwrap();
        assert_eq!(loaded.title(), "checkout");
        assert_eq!(loaded.base_url(), "");
    }

    #[test]
    fn test_select_format_falls_back_to_default() {
        let formats = FormatCollection::default().with_format(Arc::new(NamedFormat("java")));

        assert_eq!(formats.select_format(Some("java")).id(), "java");
        assert_eq!(formats.select_format(Some("ruby")).id(), DEFAULT_FORMAT_ID);
        assert_eq!(formats.select_format(Some("")).id(), DEFAULT_FORMAT_ID);
        assert_eq!(formats.select_format(None).id(), DEFAULT_FORMAT_ID);
        assert_eq!(formats.ids(), vec!["default".to_string(), "java".to_string()]);
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut formats = FormatCollection::default();
        formats.register(Arc::new(NamedFormat("java")));
        formats.register(Arc::new(NamedFormat("java")));
        assert_eq!(formats.ids().len(), 2);
        assert!(!formats.find("java").unwrap().playable());
    }
}
