//! Membership and import visibility.

use serde::{Deserialize, Serialize};
use std::fmt;

use meld_core::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }

    /// Read a stored visibility slot. Unset or unrecognized values are public.
    pub fn from_value(value: &Value) -> Self {
        value.as_str().and_then(Self::parse).unwrap_or_default()
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Visibility> for Value {
    fn from(visibility: Visibility) -> Self {
        Value::String(visibility.as_str().to_string())
    }
}
