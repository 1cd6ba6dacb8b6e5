/*
 * Recently used entries (base URLs, suite and test case paths). `History` is the
 * bounded most-recent-first list; `StoredHistory` ties one list to a named slot in
 * a `HistoryStoreOperations` backend and persists it after every change.
 */
use super::path_utils;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;

const HISTORY_FILENAME: &str = "history.json";

pub const BASE_URL_HISTORY: &str = "baseURLHistory";
pub const RECENT_TEST_SUITES_HISTORY: &str = "recentTestSuites";
pub const RECENT_TEST_CASES_HISTORY: &str = "recentTestCases";
pub const BASE_URL_HISTORY_CAPACITY: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    capacity: Option<usize>,
    items: Vec<String>,
}

impl History {
    // `None` keeps every entry.
    pub fn new(capacity: Option<usize>) -> Self {
        History {
            capacity,
            items: Vec::new(),
        }
    }

    pub fn with_items(capacity: Option<usize>, items: Vec<String>) -> Self {
        let mut history = History::new(capacity);
        // Oldest first, so the first stored item ends up in front.
        for item in items.iter().rev() {
            history.add(item);
        }
        history
    }

    // Moves an existing entry to the front instead of duplicating it. Empty entries are
    // ignored.
    pub fn add(&mut self, item: &str) {
        if item.is_empty() {
            return;
        }
        self.items.retain(|existing| existing != item);
        self.items.insert(0, item.to_string());
        if let Some(capacity) = self.capacity {
            self.items.truncate(capacity);
        }
    }

    pub fn list(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[derive(Debug)]
pub enum HistoryError {
    Io(io::Error),
    Serde(serde_json::Error),
    NoConfigDirectory,
}

impl From<io::Error> for HistoryError {
    fn from(err: io::Error) -> Self {
        HistoryError::Io(err)
    }
}

impl From<serde_json::Error> for HistoryError {
    fn from(err: serde_json::Error) -> Self {
        HistoryError::Serde(err)
    }
}

impl std::fmt::Display for HistoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryError::Io(e) => write!(f, "History I/O error: {e}"),
            HistoryError::Serde(e) => write!(f, "History format error: {e}"),
            HistoryError::NoConfigDirectory => {
                write!(f, "Could not determine configuration directory for history")
            }
        }
    }
}

impl std::error::Error for HistoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HistoryError::Io(e) => Some(e),
            HistoryError::Serde(e) => Some(e),
            HistoryError::NoConfigDirectory => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, HistoryError>;

pub trait HistoryStoreOperations: Send + Sync {
    fn load_history(&self, name: &str) -> Result<Vec<String>>;
    fn save_history(&self, name: &str, items: &[String]) -> Result<()>;
}

// All named histories share one `history.json` file, keyed by history name.
pub struct CoreHistoryStore {
    app_name: String,
    directory_override: Option<PathBuf>,
}

impl CoreHistoryStore {
    pub fn new(app_name: &str) -> Self {
        CoreHistoryStore {
            app_name: app_name.to_string(),
            directory_override: None,
        }
    }

    pub fn with_directory(app_name: &str, directory: PathBuf) -> Self {
        CoreHistoryStore {
            app_name: app_name.to_string(),
            directory_override: Some(directory),
        }
    }

    fn history_file_path(&self) -> Result<PathBuf> {
        let dir = match &self.directory_override {
            Some(dir) => dir.clone(),
            None => path_utils::get_base_app_config_local_dir(&self.app_name)
                .ok_or(HistoryError::NoConfigDirectory)?,
        };
        Ok(dir.join(HISTORY_FILENAME))
    }

    fn read_all(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let file_path = self.history_file_path()?;
        if !file_path.exists() {
            return Ok(BTreeMap::new());
        }
        let reader = BufReader::new(File::open(&file_path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl HistoryStoreOperations for CoreHistoryStore {
    fn load_history(&self, name: &str) -> Result<Vec<String>> {
        let mut all = self.read_all()?;
        Ok(all.remove(name).unwrap_or_default())
    }

    fn save_history(&self, name: &str, items: &[String]) -> Result<()> {
        let mut all = self.read_all()?;
        all.insert(name.to_string(), items.to_vec());
        let file_path = self.history_file_path()?;
        let writer = BufWriter::new(File::create(&file_path)?);
        serde_json::to_writer_pretty(writer, &all)?;
        log::trace!("CoreHistoryStore: Saved history '{name}' to {file_path:?}.");
        Ok(())
    }
}

pub struct StoredHistory {
    name: String,
    history: History,
    store: Arc<dyn HistoryStoreOperations>,
}

impl StoredHistory {
    // A store that cannot be read yields an empty history; the failure is only logged.
    pub fn load(name: &str, capacity: Option<usize>, store: Arc<dyn HistoryStoreOperations>) -> Self {
        let items = match store.load_history(name) {
            Ok(items) => items,
            Err(e) => {
                log::warn!("StoredHistory: Could not load history '{name}': {e}. Starting empty.");
                Vec::new()
            }
        };
        StoredHistory {
            name: name.to_string(),
            history: History::with_items(capacity, items),
            store,
        }
    }

    pub fn add(&mut self, item: &str) {
        self.history.add(item);
        if let Err(e) = self.store.save_history(&self.name, self.history.list()) {
            log::error!("StoredHistory: Failed to persist history '{}': {e}", self.name);
        }
    }

    pub fn list(&self) -> &[String] {
        self.history.list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct MemoryHistoryStore {
        saved: Mutex<BTreeMap<String, Vec<String>>>,
        fail_saves: bool,
    }

    impl HistoryStoreOperations for MemoryHistoryStore {
        fn load_history(&self, name: &str) -> Result<Vec<String>> {
            Ok(self
                .saved
                .lock()
                .unwrap()
                .get(name)
                .cloned()
                .unwrap_or_default())
        }

        fn save_history(&self, name: &str, items: &[String]) -> Result<()> {
            if self.fail_saves {
                return Err(HistoryError::NoConfigDirectory);
            }
            self.saved
                .lock()
                .unwrap()
                .insert(name.to_string(), items.to_vec());
            Ok(())
        }
    }

    #[test]
    fn test_two_capacity_history_keeps_most_recent_first() {
        let mut history = History::new(Some(2));
        history.add("http://a");
        history.add("http://b");
        assert_eq!(history.list(), ["http://b", "http://a"]);
    }

    #[test]
    fn test_history_never_exceeds_capacity() {
        let mut history = History::new(Some(3));
        for i in 0..10 {
            history.add(&format!("item{i}"));
            assert!(history.len() <= 3);
        }
        assert_eq!(history.list(), ["item9", "item8", "item7"]);
    }

    #[test]
    fn test_re_adding_moves_to_front_without_growing() {
        let mut history = History::new(Some(5));
        history.add("a");
        history.add("b");
        history.add("c");
        history.add("a");
        assert_eq!(history.list(), ["a", "c", "b"]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_unbounded_history_and_empty_items() {
        let mut history = History::new(None);
        for i in 0..50 {
            history.add(&i.to_string());
        }
        history.add("");
        assert_eq!(history.len(), 50);
        assert_eq!(history.list()[0], "49");
    }

    #[test]
    fn test_with_items_applies_capacity_and_keeps_order() {
        let items = vec!["c".to_string(), "b".to_string(), "a".to_string(), "b".to_string()];
        let history = History::with_items(Some(2), items);
        assert_eq!(history.list(), ["c", "b"]);
    }

    #[test]
    fn test_stored_history_persists_each_add() {
        let store = Arc::new(MemoryHistoryStore::default());
        let mut history = StoredHistory::load(BASE_URL_HISTORY, Some(2), store.clone());
        history.add("http://a");
        history.add("http://b");
        history.add("http://c");

        assert_eq!(
            store.load_history(BASE_URL_HISTORY).unwrap(),
            vec!["http://c".to_string(), "http://b".to_string()]
        );
        let reloaded = StoredHistory::load(BASE_URL_HISTORY, Some(2), store);
        assert_eq!(reloaded.list(), history.list());
    }

    #[test]
    fn test_stored_history_survives_failing_store() {
        let store = Arc::new(MemoryHistoryStore {
            fail_saves: true,
            ..Default::default()
        });
        let mut history = StoredHistory::load(RECENT_TEST_CASES_HISTORY, None, store);
        history.add("/cases/a.json");
        assert_eq!(history.list(), ["/cases/a.json"]);
    }

    #[test]
    fn test_core_history_store_keeps_histories_apart() {
        let dir = tempdir().unwrap();
        let store = CoreHistoryStore::with_directory("AnyApp", dir.path().to_path_buf());

        store
            .save_history(RECENT_TEST_SUITES_HISTORY, &["/s.json".to_string()])
            .unwrap();
        store
            .save_history(RECENT_TEST_CASES_HISTORY, &["/c.json".to_string()])
            .unwrap();

        assert_eq!(
            store.load_history(RECENT_TEST_SUITES_HISTORY).unwrap(),
            vec!["/s.json".to_string()]
        );
        assert_eq!(
            store.load_history(RECENT_TEST_CASES_HISTORY).unwrap(),
            vec!["/c.json".to_string()]
        );
        assert!(store.load_history(BASE_URL_HISTORY).unwrap().is_empty());
    }
}
