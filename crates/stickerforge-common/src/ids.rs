//! Typed identifiers for stickers and packs.
//!
//! Store identifiers are opaque strings (numeric for sticker packs, 24-char
//! hex for emoji packs), so both wrap a `String` rather than a number.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pack-scoped identifier of a single sticker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StickerId(String);

impl StickerId {
    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StickerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for StickerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for StickerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a sticker or emoji pack.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackId(String);

impl PackId {
    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PackId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PackId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for PackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
