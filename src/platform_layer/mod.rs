pub mod console;
pub mod interaction;
pub mod types;

pub use console::ConsoleInteraction;
pub use interaction::UserInteraction;
pub use types::{FilePickerRequest, PickerMode};
