//! Principals: the identities that hold value and make calls.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, ValidationError};

/// An opaque account identifier.
///
/// The empty identifier is reserved as the null sentinel, meaning
/// "absent/unset". It can be stored (for example as an unconfigured fee
/// recipient) but never holds value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    /// Create a principal from an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    /// The null sentinel.
    #[must_use]
    pub const fn null() -> Self {
        Self(String::new())
    }

    /// Check if this is the null sentinel.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the identifier as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return `self` if it is a real principal.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NullPrincipal`] for the null sentinel.
    pub fn require(&self) -> Result<&Self> {
        if self.is_null() {
            return Err(ValidationError::NullPrincipal.into());
        }
        Ok(self)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "<null>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<&str> for Principal {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Principal {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<Principal> for String {
    fn from(principal: Principal) -> Self {
        principal.0
    }
}

impl AsRef<str> for Principal {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
