use super::types::FilePickerRequest;
use std::path::PathBuf;

// The blocking dialogs the application logic needs from its host. Every call returns
// only after the user answered.
pub trait UserInteraction: Send + Sync {
    // `None` when the user cancelled.
    fn pick_file(&self, request: &FilePickerRequest) -> Option<PathBuf>;

    // Empty when the user cancelled.
    fn pick_files(&self, request: &FilePickerRequest) -> Vec<PathBuf>;

    fn confirm(&self, message: &str) -> bool;

    fn alert(&self, message: &str);
}
