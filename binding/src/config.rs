//! Binding configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Remove an implied edge once its general is reachable through the
    /// type's other generals.
    pub suppress_redundant: bool,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            suppress_redundant: true,
        }
    }
}

impl BindingConfig {
    pub fn with_suppress_redundant(mut self, suppress: bool) -> Self {
        self.suppress_redundant = suppress;
        self
    }
}
