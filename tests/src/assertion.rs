//! Assertion types and builders for verifying step results.

use meld_core::Value;

use crate::error::{TestError, TestResult};

/// What a step did to the model, read off the journal entries it appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    pub created: usize,
    pub modified: usize,
    /// Instances gone after the step, cascaded parts included.
    pub deleted: usize,
    pub linked: usize,
    pub unlinked: usize,
    /// Value the step's action returned.
    pub value: Value,
}

/// A complete assertion for a step result.
#[derive(Default)]
pub struct Assertion {
    // Mutation assertions
    pub created: Option<usize>,
    pub modified: Option<usize>,
    pub deleted: Option<usize>,
    pub linked: Option<usize>,
    pub unlinked: Option<usize>,

    // Value assertions
    pub value: Option<Value>,
    pub size: Option<usize>,

    // Error assertions
    pub error: Option<String>,

    #[allow(clippy::type_complexity)]
    pub custom: Option<Box<dyn Fn(&StepOutcome) -> bool>>,
}

impl std::fmt::Debug for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assertion")
            .field("created", &self.created)
            .field("modified", &self.modified)
            .field("deleted", &self.deleted)
            .field("linked", &self.linked)
            .field("unlinked", &self.unlinked)
            .field("value", &self.value)
            .field("size", &self.size)
            .field("error", &self.error)
            .field("custom", &self.custom.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Assertion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify the assertion against a step result.
    pub fn verify(&self, step: &str, result: &Result<StepOutcome, String>) -> TestResult<()> {
        if let Some(ref expected_error) = self.error {
            return match result {
                Err(msg) if msg.contains(expected_error) => Ok(()),
                Err(msg) => Err(TestError::assertion_failed(
                    step,
                    format!("expected error containing '{expected_error}', got: {msg}"),
                )),
                Ok(_) => Err(TestError::assertion_failed(
                    step,
                    format!("expected error containing '{expected_error}', but step succeeded"),
                )),
            };
        }

        let outcome = result
            .as_ref()
            .map_err(|msg| TestError::assertion_failed(step, format!("step failed: {msg}")))?;

        let counts = [
            ("created", self.created, outcome.created),
            ("modified", self.modified, outcome.modified),
            ("deleted", self.deleted, outcome.deleted),
            ("linked", self.linked, outcome.linked),
            ("unlinked", self.unlinked, outcome.unlinked),
        ];
        for (what, expected, actual) in counts {
            if let Some(expected) = expected {
                if expected != actual {
                    return Err(TestError::assertion_failed(
                        step,
                        format!("expected {expected} {what}, got {actual}"),
                    ));
                }
            }
        }

        if let Some(ref expected) = self.value {
            if *expected != outcome.value {
                return Err(TestError::assertion_failed(
                    step,
                    format!("expected value {expected:?}, got {:?}", outcome.value),
                ));
            }
        }

        if let Some(expected) = self.size {
            let actual = outcome.value.cardinality();
            if expected != actual {
                return Err(TestError::assertion_failed(
                    step,
                    format!("expected {expected} value(s), got {actual}"),
                ));
            }
        }

        if let Some(ref custom) = self.custom {
            if !custom(outcome) {
                return Err(TestError::assertion_failed(step, "custom assertion failed"));
            }
        }

        Ok(())
    }
}

/// Builder for fluent assertion construction.
#[derive(Default)]
pub struct AssertionBuilder {
    assertion: Assertion,
}

impl AssertionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self) -> Assertion {
        self.assertion
    }

    // ========== Mutation assertions ==========

    /// Assert that N instances were created.
    pub fn created(mut self, n: usize) -> Self {
        self.assertion.created = Some(n);
        self
    }

    /// Assert that N attribute writes happened.
    pub fn modified(mut self, n: usize) -> Self {
        self.assertion.modified = Some(n);
        self
    }

    /// Assert that N instances were deleted, cascade included.
    pub fn deleted(mut self, n: usize) -> Self {
        self.assertion.deleted = Some(n);
        self
    }

    pub fn linked(mut self, n: usize) -> Self {
        self.assertion.linked = Some(n);
        self
    }

    pub fn unlinked(mut self, n: usize) -> Self {
        self.assertion.unlinked = Some(n);
        self
    }

    // ========== Value assertions ==========

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.assertion.value = Some(value.into());
        self
    }

    /// Assert the returned value holds N items (1 for a single value).
    pub fn size(mut self, n: usize) -> Self {
        self.assertion.size = Some(n);
        self
    }

    // ========== Error assertions ==========

    /// Assert that the step failed with a message containing `text`.
    pub fn error(mut self, text: impl Into<String>) -> Self {
        self.assertion.error = Some(text.into());
        self
    }

    pub fn custom(mut self, check: impl Fn(&StepOutcome) -> bool + 'static) -> Self {
        self.assertion.custom = Some(Box::new(check));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== TEST: counts_are_compared ==========
    #[test]
    fn test_counts_are_compared() {
        let assertion = AssertionBuilder::new().created(2).linked(1).build();
        let outcome = StepOutcome {
            created: 2,
            linked: 3,
            ..Default::default()
        };

        let result = assertion.verify("spawn", &Ok(outcome));

        assert!(matches!(
            result,
            Err(TestError::AssertionFailed { ref message, .. }) if message == "expected 1 linked, got 3"
        ));
    }

    // ========== TEST: expected_error_matches_substring ==========
    #[test]
    fn test_expected_error_matches_substring() {
        let assertion = AssertionBuilder::new().error("abstract").build();

        let failed = assertion.verify("spawn", &Err("Cannot instantiate abstract class: Type".into()));
        let succeeded = assertion.verify("spawn", &Ok(StepOutcome::default()));

        assert!(failed.is_ok());
        assert!(succeeded.is_err());
    }
}
