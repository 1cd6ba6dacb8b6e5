/*
 * This module provides the application logic layer, centered around `Application`,
 * the controller that owns the open test suite and test case and notifies views of
 * every change through `ObserverRegistry`. Unit tests for `Application` are in
 * `application_tests.rs`.
 */
pub mod application;
pub mod error;
pub mod observers;


pub use application::Application;
pub use error::{AppError, ErrorPolicy};
pub use observers::{AppEvent, AppEventKind, ObserverId, ObserverRegistry};
