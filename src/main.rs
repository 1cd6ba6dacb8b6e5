// src/main.rs

use suite_editor::app_logic::{AppEvent, AppEventKind, Application};
use suite_editor::core::{
    CoreHistoryStore, CorePreferencesManager, CoreSuiteStorage, FormatCollection,
    HistoryStoreOperations, PreferencesOperations, SuiteStorageOperations,
};
use suite_editor::platform_layer::{ConsoleInteraction, UserInteraction};

use std::path::PathBuf;
use std::sync::Arc;

const APP_NAME: &str = "SuiteEditor";

fn describe_event(event: &AppEvent) -> String {
    match event {
        AppEvent::BaseUrlChanged { base_url } => format!("base URL is now '{base_url}'"),
        AppEvent::OptionsChanged { options } => format!("{} options applied", options.iter().count()),
        AppEvent::CurrentFormatChanging { format_id } => format!("leaving format '{format_id}'"),
        AppEvent::CurrentFormatChanged { format_id } => format!("format is now '{format_id}'"),
        AppEvent::ClipboardFormatChanged { format_id } => {
            format!("clipboard format is now '{format_id}'")
        }
        AppEvent::TestSuiteUnloaded(summary) | AppEvent::TestSuiteChanged(summary) => format!(
            "suite {} with {} test cases",
            summary
                .file
                .as_ref()
                .map_or("(unsaved)".to_string(), |file| file.display().to_string()),
            summary.test_count
        ),
        AppEvent::TestCaseUnloaded(summary) | AppEvent::TestCaseChanged(summary) => format!(
            "test case {} '{}'{}",
            summary.id,
            summary.title,
            if summary.modified { " (modified)" } else { "" }
        ),
    }
}

fn print_state(application: &Application) {
    println!("Format: {}", application.current_format().name());
    println!("Base URL: {}", application.base_url());
    match application.test_suite() {
        Some(suite) => {
            let location = suite
                .file()
                .map_or("(unsaved)".to_string(), |file| file.display().to_string());
            println!("Test suite: {location}");
            for entry in suite.entries() {
                let marker = if Some(entry.id()) == application.test_case_id() {
                    "*"
                } else {
                    " "
                };
                println!(" {marker} {}", entry.title());
            }
        }
        None => println!("No test suite is open."),
    }
}

fn main() {
    suite_editor::initialize_logging();
    log::info!("{APP_NAME} starting.");

    let preferences: Arc<dyn PreferencesOperations> = Arc::new(CorePreferencesManager::new(APP_NAME));
    let histories: Arc<dyn HistoryStoreOperations> = Arc::new(CoreHistoryStore::new(APP_NAME));
    let suite_storage: Arc<dyn SuiteStorageOperations> = Arc::new(CoreSuiteStorage::new());
    let interaction: Arc<dyn UserInteraction> = Arc::new(ConsoleInteraction::stdio());

    let mut application = Application::new(
        preferences,
        histories,
        suite_storage,
        FormatCollection::default(),
        interaction,
    );
    for kind in AppEventKind::ALL {
        application.subscribe(kind, |event| {
            log::info!("{}: {}", event.name(), describe_event(event));
        });
    }
    application.init_options();

    let opened = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => match application.load_test_case_with_new_suite(Some(&path)) {
            Ok(opened) => opened,
            Err(e) => {
                log::error!("Failed to open {path:?}: {e}");
                false
            }
        },
        None => application.reopen_last_test_case_or_suite(),
    };
    if !opened && let Err(e) = application.new_test_suite() {
        log::error!("Failed to create a new test suite: {e}");
    }

    print_state(&application);
    application.save_state();
    log::info!("{APP_NAME} exiting.");
}
