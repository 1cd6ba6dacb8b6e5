use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

pub const UNTITLED_TEST_CASE_TITLE: &str = "Untitled";

static NEXT_TEST_CASE_ID: AtomicU64 = AtomicU64::new(1);

// Identifies one test case entry inside a suite. Every entry ever created, clones included,
// gets a new id, so an id taken from a replaced suite never resolves against the suite that
// replaced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestCaseId(u64);

impl TestCaseId {
    pub(crate) fn next() -> Self {
        TestCaseId(NEXT_TEST_CASE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TestCaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// One recorded step of a test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub command: String,
    pub target: String,
    #[serde(default)]
    pub value: String,
}

impl Command {
    pub fn new(command: &str, target: &str, value: &str) -> Self {
        Command {
            command: command.to_string(),
            target: target.to_string(),
            value: value.to_string(),
        }
    }
}

/*
 * A single recorded browser interaction script.
 * `modified` is raised by every command edit and cleared only by `mark_saved`. Changing the
 * base URL is not considered an edit, since the controller copies its own base URL into
 * every case it activates.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    title: String,
    base_url: String,
    commands: Vec<Command>,
    file: Option<PathBuf>,
    modified: bool,
}

impl TestCase {
    pub fn new(title: &str) -> Self {
        TestCase {
            title: title.to_string(),
            base_url: String::new(),
            commands: Vec::new(),
            file: None,
            modified: false,
        }
    }

    // Builds a case as read back from storage: bound to `file` and unmodified.
    pub fn from_stored(
        title: String,
        base_url: String,
        commands: Vec<Command>,
        file: PathBuf,
    ) -> Self {
        TestCase {
            title,
            base_url,
            commands,
            file: Some(file),
            modified: false,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_base_url(&mut self, base_url: &str) {
        self.base_url = base_url.to_string();
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn push_command(&mut self, command: Command) {
        self.commands.push(command);
        self.modified = true;
    }

    pub fn remove_command(&mut self, index: usize) -> Option<Command> {
        if index >= self.commands.len() {
            return None;
        }
        self.modified = true;
        Some(self.commands.remove(index))
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self, file: &Path) {
        self.file = Some(file.to_path_buf());
        self.modified = false;
    }

    pub fn summary(&self, id: TestCaseId) -> TestCaseSummary {
        TestCaseSummary {
            id,
            title: self.title.clone(),
            base_url: self.base_url.clone(),
            file: self.file.clone(),
            modified: self.modified,
        }
    }
}

/*
 * A suite's reference to one test case. The content is loaded lazily the first time the
 * case is shown; until then only the title and file recorded in the suite are known.
 * `origin` names the suite directory an imported entry came from.
 */
#[derive(Debug)]
pub struct SuiteEntry {
    id: TestCaseId,
    pub title: String,
    pub file: Option<PathBuf>,
    pub content: Option<TestCase>,
    pub origin: Option<String>,
}

impl SuiteEntry {
    pub fn from_file(title: &str, file: PathBuf) -> Self {
        SuiteEntry {
            id: TestCaseId::next(),
            title: title.to_string(),
            file: Some(file),
            content: None,
            origin: None,
        }
    }

    pub fn from_content(test_case: TestCase) -> Self {
        SuiteEntry {
            id: TestCaseId::next(),
            title: test_case.title().to_string(),
            file: test_case.file().map(Path::to_path_buf),
            content: Some(test_case),
            origin: None,
        }
    }

    pub fn id(&self) -> TestCaseId {
        self.id
    }

    pub fn title(&self) -> &str {
        self.content
            .as_ref()
            .map(TestCase::title)
            .unwrap_or(&self.title)
    }

    // Loaded entries that were edited, or never written to disk, must be saved before the
    // suite that references them.
    pub fn needs_save(&self) -> bool {
        match &self.content {
            Some(test_case) => test_case.is_modified() || self.file.is_none(),
            None => false,
        }
    }
}

// A clone is a distinct entry and gets its own id.
impl Clone for SuiteEntry {
    fn clone(&self) -> Self {
        SuiteEntry {
            id: TestCaseId::next(),
            title: self.title.clone(),
            file: self.file.clone(),
            content: self.content.clone(),
            origin: self.origin.clone(),
        }
    }
}

// An ordered collection of test cases, optionally backed by a suite file.
#[derive(Debug, Clone, Default)]
pub struct TestSuite {
    file: Option<PathBuf>,
    entries: Vec<SuiteEntry>,
}

impl TestSuite {
    pub fn new() -> Self {
        TestSuite::default()
    }

    pub fn from_entries(file: Option<PathBuf>, entries: Vec<SuiteEntry>) -> Self {
        TestSuite { file, entries }
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn set_file(&mut self, file: &Path) {
        self.file = Some(file.to_path_buf());
    }

    pub fn directory(&self) -> Option<&Path> {
        self.file.as_deref().and_then(Path::parent)
    }

    pub fn entries(&self) -> &[SuiteEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<SuiteEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_id(&self) -> Option<TestCaseId> {
        self.entries.first().map(SuiteEntry::id)
    }

    pub fn entry(&self, id: TestCaseId) -> Option<&SuiteEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn entry_mut(&mut self, id: TestCaseId) -> Option<&mut SuiteEntry> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }

    pub fn test_case(&self, id: TestCaseId) -> Option<&TestCase> {
        self.entry(id).and_then(|entry| entry.content.as_ref())
    }

    pub fn test_case_mut(&mut self, id: TestCaseId) -> Option<&mut TestCase> {
        self.entry_mut(id).and_then(|entry| entry.content.as_mut())
    }

    pub fn add_entry(&mut self, entry: SuiteEntry) -> TestCaseId {
        let id = entry.id;
        self.entries.push(entry);
        id
    }

    pub fn add_test_case_from_content(&mut self, test_case: TestCase) -> TestCaseId {
        self.add_entry(SuiteEntry::from_content(test_case))
    }

    pub fn generate_new_test_case_title(&self) -> String {
        let is_taken = |title: &str| self.entries.iter().any(|entry| entry.title() == title);
        if !is_taken(UNTITLED_TEST_CASE_TITLE) {
            return UNTITLED_TEST_CASE_TITLE.to_string();
        }
        (2..)
            .map(|n| format!("{UNTITLED_TEST_CASE_TITLE} {n}"))
            .find(|title| !is_taken(title))
            .unwrap_or_else(|| UNTITLED_TEST_CASE_TITLE.to_string())
    }

    pub fn summary(&self) -> TestSuiteSummary {
        TestSuiteSummary {
            file: self.file.clone(),
            test_count: self.entries.len(),
        }
    }
}

// Owned snapshots handed to observers, so callbacks never borrow the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCaseSummary {
    pub id: TestCaseId,
    pub title: String,
    pub base_url: String,
    pub file: Option<PathBuf>,
    pub modified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSuiteSummary {
    pub file: Option<PathBuf>,
    pub test_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_test_case_is_unmodified_and_unbound() {
        let test_case = TestCase::new("login");
        assert_eq!(test_case.title(), "login");
        assert!(test_case.file().is_none());
        assert!(!test_case.is_modified());
        assert!(test_case.commands().is_empty());
    }

    #[test]
    fn test_command_edits_mark_modified_and_save_clears_it() {
        let mut test_case = TestCase::new("login");
        test_case.push_command(Command::new("open", "/", ""));
        assert!(test_case.is_modified());

        test_case.mark_saved(Path::new("/tmp/login.json"));
        assert!(!test_case.is_modified());
        assert_eq!(test_case.file(), Some(Path::new("/tmp/login.json")));

        assert!(test_case.remove_command(5).is_none());
        assert!(!test_case.is_modified(), "Out of range removal is not an edit");
        assert!(test_case.remove_command(0).is_some());
        assert!(test_case.is_modified());
    }

    #[test]
    fn test_base_url_change_is_not_an_edit() {
        let mut test_case = TestCase::new("login");
        test_case.set_base_url("http://example.com");
        assert_eq!(test_case.base_url(), "http://example.com");
        assert!(!test_case.is_modified());
    }

    #[test]
    fn test_ids_are_unique_across_suites() {
        let mut first = TestSuite::new();
        let mut second = TestSuite::new();
        let a = first.add_test_case_from_content(TestCase::new("a"));
        let b = second.add_test_case_from_content(TestCase::new("b"));
        assert_ne!(a, b);
        assert!(first.entry(b).is_none());
        assert!(second.entry(a).is_none());
    }

    #[test]
    fn test_cloned_suite_gets_fresh_ids() {
        let mut suite = TestSuite::new();
        let id = suite.add_test_case_from_content(TestCase::new("a"));
        let copy = suite.clone();

        assert_eq!(copy.len(), 1);
        assert_eq!(copy.entries()[0].title(), "a");
        assert_ne!(copy.entries()[0].id(), id);
        assert!(copy.entry(id).is_none());
    }

    #[test]
    fn test_generate_new_test_case_title_skips_taken_titles() {
        let mut suite = TestSuite::new();
        assert_eq!(suite.generate_new_test_case_title(), "Untitled");

        suite.add_test_case_from_content(TestCase::new("Untitled"));
        assert_eq!(suite.generate_new_test_case_title(), "Untitled 2");

        suite.add_entry(SuiteEntry::from_file(
            "Untitled 2",
            PathBuf::from("/suite/untitled2.json"),
        ));
        assert_eq!(suite.generate_new_test_case_title(), "Untitled 3");
    }

    #[test]
    fn test_entry_needs_save_only_when_loaded_and_dirty_or_unbound() {
        let unloaded = SuiteEntry::from_file("a", PathBuf::from("/suite/a.json"));
        assert!(!unloaded.needs_save());

        let unbound = SuiteEntry::from_content(TestCase::new("b"));
        assert!(unbound.needs_save());

        let mut stored = TestCase::from_stored(
            "c".to_string(),
            String::new(),
            Vec::new(),
            PathBuf::from("/suite/c.json"),
        );
        let clean = SuiteEntry::from_content(stored.clone());
        assert!(!clean.needs_save());

        stored.push_command(Command::new("click", "id=go", ""));
        let dirty = SuiteEntry::from_content(stored);
        assert!(dirty.needs_save());
    }

    #[test]
    fn test_entry_title_prefers_loaded_content() {
        let mut entry = SuiteEntry::from_file("from suite", PathBuf::from("/suite/a.json"));
        assert_eq!(entry.title(), "from suite");
        entry.content = Some(TestCase::new("from content"));
        assert_eq!(entry.title(), "from content");
    }
}
