//! Evaluation settings.

use serde::{Deserialize, Serialize};

/// How errors inside expressions are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EvalMode {
    /// Recover navigation and type errors as `Null`.
    #[default]
    Derivation,
    /// Surface every error.
    Verification,
}

/// Engine limits and switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum nesting of derived-property and operation evaluation.
    pub max_depth: usize,
    /// Cache argument-free derived values within one top-level evaluation.
    pub memoize: bool,
    /// Enable null propagation in `EvalMode::Derivation`.
    pub recover_errors: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: 256,
            memoize: true,
            recover_errors: true,
        }
    }
}

impl EngineConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    pub fn with_recover_errors(mut self, recover_errors: bool) -> Self {
        self.recover_errors = recover_errors;
        self
    }
}
