//! Opaque reference keys.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An opaque reference value usable wherever a key-like field is declared.
///
/// The mapping engine never interprets the contents; string fields accept a
/// key by coercing it to its string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key(String);

impl Key {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// A fresh, unique key.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Key {
    fn from(val: &str) -> Self {
        Self(val.to_string())
    }
}

impl From<String> for Key {
    fn from(val: String) -> Self {
        Self(val)
    }
}
