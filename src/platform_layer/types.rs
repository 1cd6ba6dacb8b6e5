/*
 * Platform-agnostic descriptions of the dialogs the application logic asks the host
 * to show. The host decides how a request is rendered; the logic only sees the
 * chosen path(s) or `None` when the user cancelled.
 */
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerMode {
    Open,
    Save,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePickerRequest {
    pub title: String,
    pub mode: PickerMode,
    // Without the leading dot.
    pub extension: Option<String>,
    pub initial_dir: Option<PathBuf>,
    pub default_filename: Option<String>,
}

impl FilePickerRequest {
    pub fn open(title: &str) -> Self {
        FilePickerRequest {
            title: title.to_string(),
            mode: PickerMode::Open,
            extension: None,
            initial_dir: None,
            default_filename: None,
        }
    }

    pub fn save(title: &str, default_filename: &str) -> Self {
        FilePickerRequest {
            title: title.to_string(),
            mode: PickerMode::Save,
            extension: None,
            initial_dir: None,
            default_filename: Some(default_filename.to_string()),
        }
    }

    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = Some(extension.to_string());
        self
    }

    pub fn with_initial_dir(mut self, initial_dir: Option<PathBuf>) -> Self {
        self.initial_dir = initial_dir;
        self
    }
}
