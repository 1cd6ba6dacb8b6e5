/*
 * Manages the editor's persisted options: a flat string key-value map stored as
 * `options.json` in the per-user configuration directory. The controller writes
 * through this store after every change to a persisted key (last opened suite and
 * case, selected formats, remembered base URL).
 *
 * Stored values are merged over `Options::default()`, so keys added in later
 * versions get their defaults when an older file is read.
 */
use super::path_utils;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;

const OPTIONS_FILENAME: &str = "options.json";

pub const OPTION_BASE_URL: &str = "baseURL";
pub const OPTION_REMEMBER_BASE_URL: &str = "rememberBaseURL";
pub const OPTION_SELECTED_FORMAT: &str = "selectedFormat";
pub const OPTION_CLIPBOARD_FORMAT: &str = "clipboardFormat";
pub const OPTION_LAST_SAVED_TEST_SUITE: &str = "lastSavedTestSuite";
pub const OPTION_LAST_SAVED_TEST_CASE: &str = "lastSavedTestCase";
pub const OPTION_DISABLE_FORMAT_CHANGE_MSG: &str = "disableFormatChangeMsg";

#[derive(Debug)]
pub enum PreferencesError {
    Io(io::Error),
    Serde(serde_json::Error),
    NoConfigDirectory,
}

impl From<io::Error> for PreferencesError {
    fn from(err: io::Error) -> Self {
        PreferencesError::Io(err)
    }
}

impl From<serde_json::Error> for PreferencesError {
    fn from(err: serde_json::Error) -> Self {
        PreferencesError::Serde(err)
    }
}

impl std::fmt::Display for PreferencesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreferencesError::Io(e) => write!(f, "Preferences I/O error: {e}"),
            PreferencesError::Serde(e) => write!(f, "Preferences format error: {e}"),
            PreferencesError::NoConfigDirectory => {
                write!(f, "Could not determine configuration directory for preferences")
            }
        }
    }
}

impl std::error::Error for PreferencesError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PreferencesError::Io(e) => Some(e),
            PreferencesError::Serde(e) => Some(e),
            PreferencesError::NoConfigDirectory => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PreferencesError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options {
    values: BTreeMap<String, String>,
}

impl Options {
    pub fn empty() -> Self {
        Options {
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    // Missing keys read as the empty string.
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .is_some_and(|value| value.eq_ignore_ascii_case("true"))
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn merged_over(self, mut base: Options) -> Options {
        base.values.extend(self.values);
        base
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Default for Options {
    fn default() -> Self {
        let mut options = Options::empty();
        options.set(OPTION_REMEMBER_BASE_URL, "true");
        options.set(OPTION_BASE_URL, "");
        options.set(OPTION_LAST_SAVED_TEST_SUITE, "");
        options.set(OPTION_LAST_SAVED_TEST_CASE, "");
        options.set(OPTION_DISABLE_FORMAT_CHANGE_MSG, "false");
        options
    }
}

pub trait PreferencesOperations: Send + Sync {
    fn load_options(&self) -> Result<Options>;
    fn save_options(&self, options: &Options) -> Result<()>;
}

pub struct CorePreferencesManager {
    app_name: String,
    directory_override: Option<PathBuf>,
}

impl CorePreferencesManager {
    pub fn new(app_name: &str) -> Self {
        CorePreferencesManager {
            app_name: app_name.to_string(),
            directory_override: None,
        }
    }

    // Stores `options.json` in `directory` instead of the per-user config directory.
    pub fn with_directory(app_name: &str, directory: PathBuf) -> Self {
        CorePreferencesManager {
            app_name: app_name.to_string(),
            directory_override: Some(directory),
        }
    }

    fn options_file_path(&self) -> Result<PathBuf> {
        let dir = match &self.directory_override {
            Some(dir) => dir.clone(),
            None => path_utils::get_base_app_config_local_dir(&self.app_name)
                .ok_or(PreferencesError::NoConfigDirectory)?,
        };
        Ok(dir.join(OPTIONS_FILENAME))
    }
}

impl PreferencesOperations for CorePreferencesManager {
    fn load_options(&self) -> Result<Options> {
        let file_path = self.options_file_path()?;
        log::trace!("CorePreferencesManager: Loading options from {file_path:?}");
        if !file_path.exists() {
            log::debug!("CorePreferencesManager: {file_path:?} does not exist, using defaults.");
            return Ok(Options::default());
        }
        let reader = BufReader::new(File::open(&file_path)?);
        let stored: Options = serde_json::from_reader(reader)?;
        log::debug!("CorePreferencesManager: Loaded options from {file_path:?}.");
        Ok(stored.merged_over(Options::default()))
    }

    fn save_options(&self, options: &Options) -> Result<()> {
        let file_path = self.options_file_path()?;
        let writer = BufWriter::new(File::create(&file_path)?);
        serde_json::to_writer_pretty(writer, options)?;
        log::trace!("CorePreferencesManager: Saved options to {file_path:?}.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_without_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let manager = CorePreferencesManager::with_directory("AnyApp", dir.path().to_path_buf());

        let options = manager.load_options().unwrap();

        assert_eq!(options, Options::default());
        assert!(options.get_bool(OPTION_REMEMBER_BASE_URL));
        assert_eq!(options.get_or_empty(OPTION_LAST_SAVED_TEST_SUITE), "");
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempdir().unwrap();
        let manager = CorePreferencesManager::with_directory("AnyApp", dir.path().to_path_buf());
        let mut options = Options::default();
        options.set(OPTION_SELECTED_FORMAT, "java");
        options.set(OPTION_LAST_SAVED_TEST_SUITE, "/suites/smoke.json");

        manager.save_options(&options).unwrap();
        let loaded = manager.load_options().unwrap();

        assert_eq!(loaded, options);
    }

    #[test]
    fn test_stored_values_are_merged_over_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(OPTIONS_FILENAME),
            r#"{"rememberBaseURL": "false", "custom": "x"}"#,
        )
        .unwrap();
        let manager = CorePreferencesManager::with_directory("AnyApp", dir.path().to_path_buf());

        let loaded = manager.load_options().unwrap();

        assert!(!loaded.get_bool(OPTION_REMEMBER_BASE_URL));
        assert_eq!(loaded.get("custom"), Some("x"));
        assert_eq!(loaded.get(OPTION_LAST_SAVED_TEST_CASE), Some(""));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(OPTIONS_FILENAME), "not json").unwrap();
        let manager = CorePreferencesManager::with_directory("AnyApp", dir.path().to_path_buf());

        assert!(matches!(
            manager.load_options(),
            Err(PreferencesError::Serde(_))
        ));
    }

    #[test]
    fn test_get_bool_is_case_insensitive() {
        let mut options = Options::empty();
        assert!(!options.get_bool("flag"));
        options.set("flag", "TRUE");
        assert!(options.get_bool("flag"));
        options.set("flag", "yes");
        assert!(!options.get_bool("flag"));
    }
}
