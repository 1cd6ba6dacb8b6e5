use crate::core::{FormatError, SuiteError, TestCaseId};

// How a load operation reports failure: shown to the user through an alert, or handed
// back to the caller, which then decides what the user sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    Alert,
    Propagate,
}

#[derive(Debug)]
pub enum AppError {
    Format(FormatError),
    Suite(SuiteError),
    NoActiveTestSuite,
    NoActiveTestCase,
    UnknownTestCase(TestCaseId),
    UnknownFormat(String),
}

impl AppError {
    pub fn is_not_found(&self) -> bool {
        match self {
            AppError::Format(e) => e.is_not_found(),
            AppError::Suite(e) => e.is_not_found(),
            _ => false,
        }
    }
}

impl From<FormatError> for AppError {
    fn from(err: FormatError) -> Self {
        AppError::Format(err)
    }
}

impl From<SuiteError> for AppError {
    fn from(err: SuiteError) -> Self {
        AppError::Suite(err)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Format(e) => write!(f, "{e}"),
            AppError::Suite(e) => write!(f, "{e}"),
            AppError::NoActiveTestSuite => write!(f, "No test suite is open"),
            AppError::NoActiveTestCase => write!(f, "No test case is open"),
            AppError::UnknownTestCase(id) => {
                write!(f, "Test case {id} is not loaded in the current suite")
            }
            AppError::UnknownFormat(id) => write!(f, "Unknown format: {id}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Format(e) => Some(e),
            AppError::Suite(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
