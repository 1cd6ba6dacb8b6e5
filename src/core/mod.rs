/*
 * This module consolidates the platform-agnostic model and storage of the editor:
 * test cases and suites, the format registry, suite storage, persisted options and
 * recent-entry histories. Every store sits behind an `*Operations` trait so the
 * application controller can be driven by mocks in tests.
 */
pub mod format;
pub mod history;
pub mod models;
pub mod path_utils;
pub mod preferences;
pub mod suite_store;

pub use models::{
    Command, SuiteEntry, TestCase, TestCaseId, TestCaseSummary, TestSuite, TestSuiteSummary,
};

pub use format::{DEFAULT_FORMAT_ID, FormatCollection, FormatError, JsonFormat, TestCaseFormat};

pub use suite_store::{CoreSuiteStorage, SuiteError, SuiteStorageOperations};

pub use preferences::{CorePreferencesManager, Options, PreferencesError, PreferencesOperations};

pub use history::{
    CoreHistoryStore, History, HistoryError, HistoryStoreOperations, StoredHistory,
};
