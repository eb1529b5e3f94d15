//! Test harness errors.

use thiserror::Error;

/// Errors raised while running a scenario.
#[derive(Debug, Error)]
pub enum TestError {
    #[error("setup failed: {message}")]
    Setup { message: String },

    #[error("step '{step}': {message}")]
    AssertionFailed { step: String, message: String },
}

impl TestError {
    pub fn setup(message: impl Into<String>) -> Self {
        Self::Setup {
            message: message.into(),
        }
    }

    pub fn assertion_failed(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            step: step.into(),
            message: message.into(),
        }
    }
}

pub type TestResult<T> = Result<T, TestError>;

/// Failure of a scenario step's action, carrying the error's message.
///
/// Converts from any error so step closures can use `?` on session calls.
#[derive(Debug)]
pub struct StepError(pub String);

impl<E: std::error::Error> From<E> for StepError {
    fn from(err: E) -> Self {
        Self(err.to_string())
    }
}

impl StepError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
