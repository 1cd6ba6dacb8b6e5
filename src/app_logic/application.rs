use super::error::{AppError, ErrorPolicy, Result};
use super::observers::{AppEvent, AppEventKind, ObserverId, ObserverRegistry};
use crate::core::history::{
    BASE_URL_HISTORY, BASE_URL_HISTORY_CAPACITY, RECENT_TEST_CASES_HISTORY,
    RECENT_TEST_SUITES_HISTORY,
};
use crate::core::models::UNTITLED_TEST_CASE_TITLE;
use crate::core::path_utils;
use crate::core::preferences::{
    OPTION_BASE_URL, OPTION_CLIPBOARD_FORMAT, OPTION_DISABLE_FORMAT_CHANGE_MSG,
    OPTION_LAST_SAVED_TEST_CASE, OPTION_LAST_SAVED_TEST_SUITE, OPTION_REMEMBER_BASE_URL,
    OPTION_SELECTED_FORMAT,
};
use crate::core::suite_store::SUITE_FILE_EXTENSION;
use crate::core::{
    FormatCollection, HistoryStoreOperations, Options, PreferencesOperations, StoredHistory,
    SuiteStorageOperations, TestCase, TestCaseFormat, TestCaseId, TestCaseSummary, TestSuite,
};
use crate::platform_layer::{FilePickerRequest, UserInteraction};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub(crate) const FORMAT_SWITCH_WARNING: &str = "Changing the format may discard parts of the \
     current test case that the new format cannot express. Do you want to switch the format?";
const DEFAULT_SUITE_FILENAME: &str = "suite.json";

/*
 * The central state of the editor: the open test suite and the test case selected in
 * it, the current and clipboard formats, the base URL, options and recent-entry
 * histories. Views subscribe to change notifications (`AppEvent`) and drive the
 * state through the methods below; every notification is sent after the change is
 * committed.
 *
 * Dialogs go through the injected `UserInteraction`, persistence through the
 * `*Operations` stores, so the whole controller runs headless under test.
 *
 * The current test case is always an entry of the current suite. `test_case` keeps a
 * snapshot of it so the unload notification can still describe a case whose suite has
 * already been replaced.
 */
pub struct Application {
    base_url: String,
    options: Options,
    formats: FormatCollection,
    current_format: Arc<dyn TestCaseFormat>,
    clipboard_format: Arc<dyn TestCaseFormat>,
    test_suite: Option<TestSuite>,
    test_case: Option<TestCaseSummary>,
    base_url_history: StoredHistory,
    recent_test_suites: StoredHistory,
    recent_test_cases: StoredHistory,
    observers: ObserverRegistry,
    preferences: Arc<dyn PreferencesOperations>,
    suite_storage: Arc<dyn SuiteStorageOperations>,
    interaction: Arc<dyn UserInteraction>,
}

impl Application {
    /*
     * Creates the controller for one editor session. Options are loaded from
     * `preferences` (defaults when they cannot be read) and the current and clipboard
     * formats are selected from them. Views should subscribe and then call
     * `init_options` so they receive the initial notifications.
     */
    pub fn new(
        preferences: Arc<dyn PreferencesOperations>,
        history_store: Arc<dyn HistoryStoreOperations>,
        suite_storage: Arc<dyn SuiteStorageOperations>,
        formats: FormatCollection,
        interaction: Arc<dyn UserInteraction>,
    ) -> Self {
        let options = match preferences.load_options() {
            Ok(options) => options,
            Err(e) => {
                log::warn!("Application: Failed to load options: {e}. Using defaults.");
                Options::default()
            }
        };
        let current_format = formats.select_format(options.get(OPTION_SELECTED_FORMAT));
        let clipboard_format = formats.select_format(options.get(OPTION_CLIPBOARD_FORMAT));
        Application {
            base_url: String::new(),
            options,
            formats,
            current_format,
            clipboard_format,
            test_suite: None,
            test_case: None,
            base_url_history: StoredHistory::load(
                BASE_URL_HISTORY,
                Some(BASE_URL_HISTORY_CAPACITY),
                Arc::clone(&history_store),
            ),
            recent_test_suites: StoredHistory::load(
                RECENT_TEST_SUITES_HISTORY,
                None,
                Arc::clone(&history_store),
            ),
            recent_test_cases: StoredHistory::load(RECENT_TEST_CASES_HISTORY, None, history_store),
            observers: ObserverRegistry::new(),
            preferences,
            suite_storage,
            interaction,
        }
    }

    /*
     * Registers `listener` for one kind of notification. Listeners of a kind are called
     * in subscription order. The returned id is what `unsubscribe` takes.
     */
    pub fn subscribe<F>(&mut self, kind: AppEventKind, listener: F) -> ObserverId
    where
        F: FnMut(&AppEvent) + 'static,
    {
        self.observers.subscribe(kind, listener)
    }

    // Returns false when `id` is not subscribed.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn notify(&mut self, event: AppEvent) {
        self.observers.notify(&event);
    }

    // Persistence failures are logged; they never undo the in-memory change.
    fn set_and_save(&mut self, key: &str, value: &str) {
        self.options.set(key, value);
        if let Err(e) = self.preferences.save_options(&self.options) {
            log::error!("Application: Failed to save option '{key}': {e}");
        }
    }

    fn report_error(&self, error: AppError, context: &str, policy: ErrorPolicy) -> Result<()> {
        match policy {
            ErrorPolicy::Propagate => Err(error),
            ErrorPolicy::Alert => {
                log::warn!("Application: {context}: {error}");
                self.interaction.alert(&format!("{context}: {error}"));
                Ok(())
            }
        }
    }

    // Pickers start in the open suite's directory.
    fn working_directory(&self) -> Option<PathBuf> {
        self.test_suite
            .as_ref()
            .and_then(TestSuite::directory)
            .map(Path::to_path_buf)
    }

    fn open_request(&self, title: &str, extension: &str) -> FilePickerRequest {
        FilePickerRequest::open(title)
            .with_extension(extension)
            .with_initial_dir(self.working_directory())
    }

    fn active_suite(&self) -> Result<&TestSuite> {
        self.test_suite.as_ref().ok_or(AppError::NoActiveTestSuite)
    }

    fn active_suite_mut(&mut self) -> Result<&mut TestSuite> {
        self.test_suite.as_mut().ok_or(AppError::NoActiveTestSuite)
    }

    // --- Base URL and options ---

    // The current test case's base URL wins over the session's when it has one.
    pub fn base_url(&self) -> &str {
        match self.test_case() {
            Some(test_case) if !test_case.base_url().is_empty() => test_case.base_url(),
            _ => &self.base_url,
        }
    }

    /*
     * Sets the session's base URL and records it in the base URL history. The current
     * test case takes the same base URL. Sends `baseURLChanged`.
     */
    pub fn set_base_url(&mut self, base_url: &str) {
        self.base_url = base_url.to_string();
        self.base_url_history.add(base_url);
        if let Some(test_case) = self.test_case_mut() {
            test_case.set_base_url(base_url);
        }
        self.notify(AppEvent::BaseUrlChanged {
            base_url: base_url.to_string(),
        });
    }

    // Most recent first.
    pub fn base_url_history(&self) -> &[String] {
        self.base_url_history.list()
    }

    /*
     * Persists the session's base URL as the `baseURL` option, so the next session
     * starts with it. Does nothing unless `rememberBaseURL` is set.
     */
    pub fn save_state(&mut self) {
        if self.options.get_bool(OPTION_REMEMBER_BASE_URL) {
            let base_url = self.base_url.clone();
            self.set_and_save(OPTION_BASE_URL, &base_url);
        }
    }

    /*
     * Applies the loaded options at startup: restores a remembered base URL, then
     * re-applies all options so subscribed views receive `optionsChanged`.
     */
    pub fn init_options(&mut self) {
        if self.options.get_bool(OPTION_REMEMBER_BASE_URL)
            && let Some(base_url) = self.options.get(OPTION_BASE_URL).map(str::to_string)
        {
            self.set_base_url(&base_url);
        }
        let options = self.options.clone();
        self.set_options(options);
    }

    // Missing options read as false.
    pub fn boolean_option(&self, name: &str) -> bool {
        self.options.get_bool(name)
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /*
     * Replaces the options in memory and reselects the current and clipboard formats
     * from them. Unknown format ids fall back to the default format. Sends
     * `optionsChanged`. The options are not persisted here.
     */
    pub fn set_options(&mut self, options: Options) {
        self.current_format = self
            .formats
            .select_format(options.get(OPTION_SELECTED_FORMAT));
        self.clipboard_format = self
            .formats
            .select_format(options.get(OPTION_CLIPBOARD_FORMAT));
        self.options = options;
        log::debug!(
            "Application: Options applied (format '{}', clipboard format '{}').",
            self.current_format.id(),
            self.clipboard_format.id()
        );
        self.notify(AppEvent::OptionsChanged {
            options: self.options.clone(),
        });
    }

    // --- Formats ---

    pub fn formats(&self) -> &FormatCollection {
        &self.formats
    }

    pub fn current_format(&self) -> &dyn TestCaseFormat {
        self.current_format.as_ref()
    }

    pub fn clipboard_format(&self) -> &dyn TestCaseFormat {
        self.clipboard_format.as_ref()
    }

    // Whether test cases in the current format can be replayed.
    pub fn is_playable(&self) -> bool {
        self.current_format.playable()
    }

    /*
     * Switches the format on the user's request. Unless the warning has been disabled
     * through `disableFormatChangeMsg`, the user must confirm first. Returns whether
     * the format changed.
     */
    pub fn user_set_current_format(&mut self, format_id: &str) -> Result<bool> {
        if self.formats.find(format_id).is_none() {
            return Err(AppError::UnknownFormat(format_id.to_string()));
        }
        if self.current_format.id() == format_id {
            return Ok(false);
        }
        if !self.boolean_option(OPTION_DISABLE_FORMAT_CHANGE_MSG)
            && !self.interaction.confirm(FORMAT_SWITCH_WARNING)
        {
            log::debug!("Application: User declined switching to format '{format_id}'.");
            return Ok(false);
        }
        self.set_current_format(format_id)?;
        Ok(true)
    }

    /*
     * Switches the current format without asking. Sends `currentFormatChanging` with the
     * outgoing format, persists `selectedFormat`, then sends `currentFormatChanged`.
     */
    pub fn set_current_format(&mut self, format_id: &str) -> Result<()> {
        let format = self
            .formats
            .find(format_id)
            .ok_or_else(|| AppError::UnknownFormat(format_id.to_string()))?;
        self.notify(AppEvent::CurrentFormatChanging {
            format_id: self.current_format.id().to_string(),
        });
        self.current_format = format;
        self.set_and_save(OPTION_SELECTED_FORMAT, format_id);
        log::info!("Application: Current format is now '{format_id}'.");
        self.notify(AppEvent::CurrentFormatChanged {
            format_id: format_id.to_string(),
        });
        Ok(())
    }

    /*
     * Switches the format used for copy and paste, persists `clipboardFormat` and sends
     * `clipboardFormatChanged`.
     */
    pub fn set_clipboard_format(&mut self, format_id: &str) -> Result<()> {
        let format = self
            .formats
            .find(format_id)
            .ok_or_else(|| AppError::UnknownFormat(format_id.to_string()))?;
        self.clipboard_format = format;
        self.set_and_save(OPTION_CLIPBOARD_FORMAT, format_id);
        self.notify(AppEvent::ClipboardFormatChanged {
            format_id: format_id.to_string(),
        });
        Ok(())
    }

    // --- Suite and test case state ---

    pub fn test_suite(&self) -> Option<&TestSuite> {
        self.test_suite.as_ref()
    }

    // Structural edits made through this reference send no notification.
    pub fn test_suite_mut(&mut self) -> Option<&mut TestSuite> {
        self.test_suite.as_mut()
    }

    /*
     * Installs `test_suite` as the current suite. An existing suite is unloaded first
     * (`testSuiteUnloaded`), then `testSuiteChanged` is sent. The current test case is
     * not reselected; callers follow up with `set_test_case`.
     */
    pub fn set_test_suite(&mut self, test_suite: TestSuite) {
        if let Some(previous) = self.test_suite.as_ref().map(TestSuite::summary) {
            self.test_case = self.current_test_case_summary();
            self.notify(AppEvent::TestSuiteUnloaded(previous));
        }
        let summary = test_suite.summary();
        self.test_suite = Some(test_suite);
        self.notify(AppEvent::TestSuiteChanged(summary));
    }

    // Drops the open suite, back to the state without any document.
    pub fn close_test_suite(&mut self) {
        if let Some(previous) = self.current_test_case_summary() {
            self.test_case = None;
            self.notify(AppEvent::TestCaseUnloaded(previous));
        }
        if let Some(previous) = self.test_suite.take() {
            self.notify(AppEvent::TestSuiteUnloaded(previous.summary()));
        }
    }

    // The live summary of the current test case, or its last snapshot once the case is
    // no longer reachable through the current suite.
    fn current_test_case_summary(&self) -> Option<TestCaseSummary> {
        let snapshot = self.test_case.as_ref()?;
        let live = self
            .test_suite
            .as_ref()
            .and_then(|suite| suite.test_case(snapshot.id))
            .map(|test_case| test_case.summary(snapshot.id));
        Some(live.unwrap_or_else(|| snapshot.clone()))
    }

    // `None` when no case is current or the current case is not in the current suite.
    pub fn test_case_id(&self) -> Option<TestCaseId> {
        let id = self.test_case.as_ref()?.id;
        self.test_suite.as_ref()?.test_case(id).map(|_| id)
    }

    pub fn test_case(&self) -> Option<&TestCase> {
        let id = self.test_case.as_ref()?.id;
        self.test_suite.as_ref()?.test_case(id)
    }

    /*
     * Edit access to the current test case. Command edits mark it modified, which is
     * what makes a suite save prompt for it.
     */
    pub fn test_case_mut(&mut self) -> Option<&mut TestCase> {
        let id = self.test_case.as_ref()?.id;
        self.test_suite.as_mut()?.test_case_mut(id)
    }

    /*
     * Makes the loaded suite entry `id` the current test case. Selecting the current
     * case again does nothing. Otherwise the previous case is unloaded first; then the
     * base URLs are reconciled (a case with its own base URL sets the session's, a case
     * without one inherits it) and `testCaseChanged` is sent.
     */
    pub fn set_test_case(&mut self, id: TestCaseId) -> Result<()> {
        let case_base_url = self
            .active_suite()?
            .test_case(id)
            .ok_or(AppError::UnknownTestCase(id))?
            .base_url()
            .to_string();
        if self.test_case_id() == Some(id) {
            log::trace!("Application: Test case {id} is already current.");
            return Ok(());
        }
        if let Some(previous) = self.current_test_case_summary() {
            self.notify(AppEvent::TestCaseUnloaded(previous));
        }
        self.test_case = self
            .test_suite
            .as_ref()
            .and_then(|suite| suite.test_case(id))
            .map(|test_case| test_case.summary(id));

        if case_base_url.is_empty() {
            let base_url = self.base_url.clone();
            if let Some(test_case) = self.test_case_mut() {
                test_case.set_base_url(&base_url);
            }
        } else {
            self.set_base_url(&case_base_url);
        }

        self.test_case = self.current_test_case_summary();
        if let Some(summary) = self.test_case.clone() {
            log::debug!("Application: Test case {id} ('{}') is current.", summary.title);
            self.notify(AppEvent::TestCaseChanged(summary));
        }
        Ok(())
    }

    /*
     * Replaces the current suite with a new one holding a single untitled case, which
     * becomes current. The remembered last suite and case are cleared.
     */
    pub fn new_test_suite(&mut self) -> Result<TestCaseId> {
        log::debug!("Application: new_test_suite");
        let mut test_suite = TestSuite::new();
        let id = test_suite.add_test_case_from_content(TestCase::new(UNTITLED_TEST_CASE_TITLE));
        self.set_test_suite(test_suite);
        self.set_test_case(id)?;
        self.set_and_save(OPTION_LAST_SAVED_TEST_SUITE, "");
        self.set_and_save(OPTION_LAST_SAVED_TEST_CASE, "");
        Ok(id)
    }

    // Adds an empty case with a free "Untitled" title to the current suite and selects it.
    pub fn new_test_case(&mut self) -> Result<TestCaseId> {
        let suite = self.active_suite_mut()?;
        let title = suite.generate_new_test_case_title();
        let id = suite.add_test_case_from_content(TestCase::new(&title));
        self.set_test_case(id)?;
        Ok(id)
    }

    // --- Recent entries ---

    pub fn recent_test_suites(&self) -> &[String] {
        self.recent_test_suites.list()
    }

    pub fn recent_test_cases(&self) -> &[String] {
        self.recent_test_cases.list()
    }

    /*
     * Records a suite file as recently used and as the document to reopen next session.
     * The remembered last case is cleared, since it is reached through the suite.
     */
    pub fn add_recent_test_suite(&mut self, path: &Path) {
        let path = path.to_string_lossy();
        self.recent_test_suites.add(&path);
        self.set_and_save(OPTION_LAST_SAVED_TEST_SUITE, &path);
        self.set_and_save(OPTION_LAST_SAVED_TEST_CASE, "");
    }

    // A case saved inside a suite is reopened through the suite, so it is only remembered
    // as the last case when no suite is remembered.
    pub fn add_recent_test_case(&mut self, path: &Path, is_new_suite: bool) {
        let path = path.to_string_lossy();
        self.recent_test_cases.add(&path);
        if is_new_suite {
            self.set_and_save(OPTION_LAST_SAVED_TEST_SUITE, "");
        }
        if self.options.get_or_empty(OPTION_LAST_SAVED_TEST_SUITE).is_empty() {
            self.set_and_save(OPTION_LAST_SAVED_TEST_CASE, &path);
        }
    }

    /*
     * Reopens what was open when the last session ended: the remembered suite if its
     * file still exists, else the remembered test case in a new suite. Errors are
     * alerted. Returns whether a document was opened.
     */
    pub fn reopen_last_test_case_or_suite(&mut self) -> bool {
        let last_suite = PathBuf::from(self.options.get_or_empty(OPTION_LAST_SAVED_TEST_SUITE));
        let last_case = PathBuf::from(self.options.get_or_empty(OPTION_LAST_SAVED_TEST_CASE));
        let result = if last_suite.is_file() {
            log::info!("Application: Reopening test suite {last_suite:?}");
            self.load_test_suite(Some(&last_suite), ErrorPolicy::Propagate)
        } else if last_case.is_file() {
            log::info!("Application: Reopening test case {last_case:?}");
            self.load_test_case_with_new_suite(Some(&last_case))
        } else {
            log::debug!("Application: Nothing to reopen.");
            return false;
        };
        match result {
            Ok(reopened) => reopened,
            Err(e) => {
                log::error!("Application: Error reopening test suite / case: {e}");
                self.interaction
                    .alert(&format!("Error reopening test suite / case {e}"));
                false
            }
        }
    }

    // --- Loading ---

    /*
     * Reads a test case through the current format without changing any state. Without
     * a path the user picks the file; cancelling yields `Ok(None)`, as does a failure
     * under `ErrorPolicy::Alert`.
     */
    pub fn load_test_case(
        &self,
        path: Option<&Path>,
        policy: ErrorPolicy,
    ) -> Result<Option<TestCase>> {
        log::debug!("Application: load_test_case {path:?}");
        let file = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let request = self.open_request("Open Test Case", self.current_format.extension());
                match self.interaction.pick_file(&request) {
                    Some(file) => file,
                    None => return Ok(None),
                }
            }
        };
        match self.current_format.load_file(&file) {
            Ok(test_case) => Ok(Some(test_case)),
            Err(e) => {
                self.report_error(e.into(), "error loading test case", policy)?;
                Ok(None)
            }
        }
    }

    /*
     * Adds test cases to the current suite and selects each in turn. With a path that
     * one file is added; without, the user picks any number of files. A file that fails
     * to load is alerted and skipped. Returns the ids of the added cases.
     */
    pub fn add_test_case(&mut self, path: Option<&Path>) -> Result<Vec<TestCaseId>> {
        self.active_suite()?;
        let files = match path {
            Some(path) => vec![path.to_path_buf()],
            None => {
                let request = self.open_request(
                    "Select one or more test cases to add",
                    self.current_format.extension(),
                );
                self.interaction.pick_files(&request)
            }
        };

        let mut added = Vec::new();
        for file in files {
            match self.load_test_case(Some(&file), ErrorPolicy::Alert) {
                Ok(Some(test_case)) => {
                    let id = self.active_suite_mut()?.add_test_case_from_content(test_case);
                    self.set_test_case(id)?;
                    added.push(id);
                }
                Ok(None) => log::warn!("Application: Skipped test case {file:?}."),
                Err(e) => log::error!("Application: add_test_case {file:?}: {e}"),
            }
        }
        Ok(added)
    }

    /*
     * Appends every test case of another suite file to the current suite. Entries keep
     * their (absolute) files and are tagged with the name of the directory the imported
     * suite lives in. Returns the number of imported entries.
     */
    pub fn import_test_suite(&mut self, path: Option<&Path>, policy: ErrorPolicy) -> Result<usize> {
        self.active_suite()?;
        let file = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let request = self.open_request("Select a test suite to import", SUITE_FILE_EXTENSION);
                match self.interaction.pick_file(&request) {
                    Some(file) => file,
                    None => return Ok(0),
                }
            }
        };
        let imported = match self.suite_storage.load_suite(&file) {
            Ok(imported) => imported,
            Err(e) => {
                self.report_error(e.into(), "error importing test suite", policy)?;
                return Ok(0);
            }
        };

        let origin = path_utils::parent_directory_name(&file);
        let suite = self.active_suite_mut()?;
        let mut count = 0;
        for mut entry in imported.into_entries() {
            entry.origin = origin.clone();
            suite.add_entry(entry);
            count += 1;
        }
        let summary = suite.summary();
        log::info!("Application: Imported {count} test cases from {file:?}.");
        self.notify(AppEvent::TestSuiteChanged(summary));
        Ok(count)
    }

    /*
     * Opens a file as a test case in a new suite of its own. A file that does not load
     * as a test case is retried as a test suite; if that fails too, the test case error
     * is the one alerted. Returns whether a document was opened.
     */
    pub fn load_test_case_with_new_suite(&mut self, path: Option<&Path>) -> Result<bool> {
        let file = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let request = self.open_request("Select a File", self.current_format.extension());
                match self.interaction.pick_file(&request) {
                    Some(file) => file,
                    None => return Ok(false),
                }
            }
        };
        match self.load_test_case(Some(&file), ErrorPolicy::Propagate) {
            Ok(Some(test_case)) => {
                self.set_test_case_with_new_suite(test_case)?;
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(case_error) => match self.load_test_suite(Some(&file), ErrorPolicy::Propagate) {
                Ok(loaded) => Ok(loaded),
                Err(suite_error) => {
                    log::debug!(
                        "Application: {file:?} is neither a test case nor a test suite: {suite_error}"
                    );
                    self.interaction
                        .alert(&format!("error loading test case: {case_error}"));
                    Ok(false)
                }
            },
        }
    }

    /*
     * Puts `test_case` alone into a new suite and selects it. A case read from a file is
     * recorded as the recent case, replacing any remembered suite.
     */
    pub fn set_test_case_with_new_suite(&mut self, test_case: TestCase) -> Result<TestCaseId> {
        let file = test_case.file().map(Path::to_path_buf);
        let mut test_suite = TestSuite::new();
        let id = test_suite.add_test_case_from_content(test_case);
        self.set_test_suite(test_suite);
        self.set_test_case(id)?;
        if let Some(file) = file {
            self.add_recent_test_case(&file, true);
        }
        Ok(id)
    }

    /*
     * Selects a suite entry, loading its content on first use. The loaded case takes
     * the title recorded in the suite. Load failures are alerted and leave the current
     * case unchanged. Returns whether the entry is now current.
     */
    pub fn show_test_case_from_suite(&mut self, id: TestCaseId) -> Result<bool> {
        let entry = self
            .active_suite()?
            .entry(id)
            .ok_or(AppError::UnknownTestCase(id))?;
        if entry.content.is_some() {
            self.set_test_case(id)?;
            return Ok(true);
        }
        let title = entry.title.clone();
        let Some(file) = entry.file.clone() else {
            log::warn!("Application: Test case {id} has neither content nor file.");
            return Ok(false);
        };

        match self.current_format.load_file(&file) {
            Ok(mut test_case) => {
                test_case.set_title(&title);
                if let Some(entry) = self.active_suite_mut()?.entry_mut(id) {
                    entry.content = Some(test_case);
                }
                self.set_test_case(id)?;
                Ok(true)
            }
            Err(e) if e.is_not_found() => {
                log::warn!("Application: Test case file {file:?} does not exist.");
                self.interaction.alert(&format!(
                    "The test case does not exist. You should probably remove it from the suite. The path specified is {}",
                    file.display()
                ));
                Ok(false)
            }
            Err(e) => {
                log::warn!("Application: Failed to load test case {file:?}: {e}");
                self.interaction
                    .alert(&format!("error loading test case: {e}"));
                Ok(false)
            }
        }
    }

    /*
     * Opens a suite file (picked by the user when no path is given), makes it current,
     * remembers it, and shows its first test case. A failed load leaves the current
     * suite untouched.
     */
    pub fn load_test_suite(&mut self, path: Option<&Path>, policy: ErrorPolicy) -> Result<bool> {
        log::debug!("Application: load_test_suite {path:?}");
        let file = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let request = self.open_request("Open Test Suite", SUITE_FILE_EXTENSION);
                match self.interaction.pick_file(&request) {
                    Some(file) => file,
                    None => return Ok(false),
                }
            }
        };
        let test_suite = match self.suite_storage.load_suite(&file) {
            Ok(test_suite) => test_suite,
            Err(e) => {
                self.report_error(e.into(), "error loading test suite", policy)?;
                return Ok(false);
            }
        };

        let first = test_suite.first_id();
        self.set_test_suite(test_suite);
        self.add_recent_test_suite(&file);
        if let Some(first) = first {
            self.show_test_case_from_suite(first)?;
        }
        Ok(true)
    }

    // --- Saving ---

    // Saves the suite to its own file, asking for one only when it has never been saved.
    pub fn save_test_suite(&mut self, suppress_test_case_prompt: bool) -> Result<bool> {
        self.save_test_suite_with(false, suppress_test_case_prompt)
    }

    // Always asks where to save the suite.
    pub fn save_new_test_suite(&mut self, suppress_test_case_prompt: bool) -> Result<bool> {
        self.save_test_suite_with(true, suppress_test_case_prompt)
    }

    /*
     * Saves every loaded test case that is modified or has never been saved, asking
     * for each unless `suppress_test_case_prompt` is set, then writes the suite file.
     * Declining any prompt or cancelling any save aborts the rest, including the suite
     * file. `as_new` always asks for the suite file location.
     */
    fn save_test_suite_with(&mut self, as_new: bool, suppress_test_case_prompt: bool) -> Result<bool> {
        log::debug!("Application: save_test_suite (as new: {as_new})");
        let pending = self
            .active_suite()?
            .entries()
            .iter()
            .filter(|entry| entry.needs_save())
            .map(|entry| (entry.id(), entry.title().to_string()))
            .collect::<Vec<_>>();

        for (id, title) in pending {
            if !suppress_test_case_prompt
                && !self.interaction.confirm(&format!(
                    "The test case {title} is modified. Do you want to save this test case?"
                ))
            {
                log::info!("Application: Saving the suite was cancelled at test case '{title}'.");
                return Ok(false);
            }
            if self.save_suite_test_case(id, false)?.is_none() {
                log::info!("Application: Test case '{title}' was not saved; suite not saved.");
                return Ok(false);
            }
        }

        let existing = if as_new {
            None
        } else {
            self.active_suite()?.file().map(Path::to_path_buf)
        };
        let target = match existing {
            Some(file) => file,
            None => {
                let request = FilePickerRequest::save("Save Test Suite", DEFAULT_SUITE_FILENAME)
                    .with_extension(SUITE_FILE_EXTENSION)
                    .with_initial_dir(self.working_directory());
                match self.interaction.pick_file(&request) {
                    Some(file) => file,
                    None => return Ok(false),
                }
            }
        };

        let test_suite = self.active_suite()?;
        if let Err(e) = self.suite_storage.save_suite(test_suite, &target) {
            log::error!("Application: Failed to save test suite to {target:?}: {e}");
            self.interaction
                .alert(&format!("error saving test suite: {e}"));
            return Ok(false);
        }
        self.active_suite_mut()?.set_file(&target);
        self.add_recent_test_suite(&target);
        log::info!("Application: Saved test suite to {target:?}.");
        Ok(true)
    }

    // Writes one loaded suite entry through the current format. Returns the file it was
    // written to, or `None` when the user cancelled or the write failed (alerted).
    fn save_suite_test_case(&mut self, id: TestCaseId, as_new: bool) -> Result<Option<PathBuf>> {
        let (existing, default_filename) = {
            let test_case = self
                .active_suite()?
                .test_case(id)
                .ok_or(AppError::UnknownTestCase(id))?;
            (
                test_case.file().map(Path::to_path_buf),
                format!("{}.{}", test_case.title(), self.current_format.extension()),
            )
        };
        let target = match existing.filter(|_| !as_new) {
            Some(file) => file,
            None => {
                let request = FilePickerRequest::save("Save Test Case", &default_filename)
                    .with_extension(self.current_format.extension())
                    .with_initial_dir(self.working_directory());
                match self.interaction.pick_file(&request) {
                    Some(file) => file,
                    None => return Ok(None),
                }
            }
        };

        let test_case = self
            .active_suite()?
            .test_case(id)
            .ok_or(AppError::UnknownTestCase(id))?;
        if let Err(e) = self.current_format.save_file(test_case, &target) {
            log::error!("Application: Failed to save test case to {target:?}: {e}");
            self.interaction
                .alert(&format!("error saving test case: {e}"));
            return Ok(None);
        }

        if let Some(entry) = self.active_suite_mut()?.entry_mut(id) {
            entry.file = Some(target.clone());
            if let Some(test_case) = entry.content.as_mut() {
                test_case.mark_saved(&target);
            }
        }
        if self.test_case_id() == Some(id) {
            self.test_case = self.current_test_case_summary();
        }
        log::debug!("Application: Saved test case {id} to {target:?}.");
        Ok(Some(target))
    }

    /*
     * Saves the current test case to its file, or to a picked one when it has none.
     * Returns whether it was written; on success it becomes a recent case.
     */
    pub fn save_test_case(&mut self) -> Result<bool> {
        let id = self.test_case_id().ok_or(AppError::NoActiveTestCase)?;
        match self.save_suite_test_case(id, false)? {
            Some(file) => {
                self.add_recent_test_case(&file, false);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // Like `save_test_case`, but always asks for the target file.
    pub fn save_new_test_case(&mut self) -> Result<bool> {
        let id = self.test_case_id().ok_or(AppError::NoActiveTestCase)?;
        match self.save_suite_test_case(id, true)? {
            Some(file) => {
                self.add_recent_test_case(&file, false);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
