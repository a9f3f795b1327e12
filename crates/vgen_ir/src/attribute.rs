//! Synthesis attributes attached to signals and special primitives.
//!
//! An attribute is either a bare key that the emitter translates through the
//! configured translation table, or a pre-resolved `name = value` pair that a
//! platform wants emitted verbatim.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// The value side of an emitted attribute.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// An integer value, emitted bare.
    Int(i64),
    /// A string value, emitted quoted.
    Str(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(v) => write!(f, "{v}"),
            AttrValue::Str(s) => write!(f, "\"{s}\""),
        }
    }
}

/// An attribute annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attribute {
    /// A key resolved through the attribute translation table at emission time.
    Key(String),
    /// A platform-specific attribute emitted as-is.
    Pair {
        /// Attribute name.
        name: String,
        /// Attribute value.
        value: AttrValue,
    },
}

impl Attribute {
    /// Creates a translated attribute key.
    pub fn key(key: impl Into<String>) -> Self {
        Attribute::Key(key.into())
    }

    /// Creates a verbatim `name = "value"` attribute.
    pub fn pair(name: impl Into<String>, value: impl Into<String>) -> Self {
        Attribute::Pair {
            name: name.into(),
            value: AttrValue::Str(value.into()),
        }
    }

    /// Sort key: bare keys order as `("", key)`, pairs as `(name, value)`.
    fn sort_key(&self) -> (&str, Option<&AttrValue>, &str) {
        match self {
            Attribute::Key(k) => ("", None, k),
            Attribute::Pair { name, value } => (name, Some(value), ""),
        }
    }
}

impl PartialOrd for Attribute {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Attribute {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}
