//! Storage location identifiers.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Identifier of a storage location (warehouse).
///
/// The special value [`LocationId::SENTINEL`] stands for "outside the
/// system": a transaction whose source is the sentinel mints new stock, one
/// whose destination is the sentinel burns it. The sentinel never belongs
/// to an entity.
///
/// # Examples
///
/// ```
/// use gainledger_core::LocationId;
///
/// let wh = LocationId::from("WH_A12345");
/// assert!(!wh.is_sentinel());
/// assert!(LocationId::sentinel().is_sentinel());
/// assert_eq!(wh.as_str(), "WH_A12345");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    /// Raw value of the "outside the system" sentinel.
    pub const SENTINEL: &'static str = "0x0000";

    /// Create a location identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The "outside the system" sentinel location.
    #[must_use]
    pub fn sentinel() -> Self {
        Self(Self::SENTINEL.to_string())
    }

    /// Check whether this is the mint/burn sentinel.
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.0 == Self::SENTINEL
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LocationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for LocationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&Self> for LocationId {
    fn from(id: &Self) -> Self {
        id.clone()
    }
}

impl AsRef<str> for LocationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for LocationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for LocationId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for LocationId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
