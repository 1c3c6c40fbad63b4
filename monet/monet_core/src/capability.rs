//! Capability names.
//!
//! A capability is identified by a name of the form `namespace/name`, where
//! each segment is one or more word characters and the second segment may be
//! the wildcard marker `*` instead. The grammar is a public contract: any name
//! failing it is rejected at the boundary.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CapabilityError, Result};

static CAPABILITY_NAME: Lazy<Regex> = Lazy::new(|| {
    // ASCII word characters only: `\w` in `regex` is Unicode-aware by default.
    Regex::new(r"^[A-Za-z0-9_]+/([A-Za-z0-9_]+|\*)$")
        .expect("capability name pattern is a valid regex")
});

/// The wildcard suffix accepted in the second segment of a name.
pub const WILDCARD_SUFFIX: &str = "/*";

/// Check whether `name` is a valid capability name.
///
/// # Arguments
///
/// * `name` - The candidate name.
///
/// # Returns
///
/// `true` iff `name` matches `^\w+/(\w+|\*)$`.
pub fn is_valid_capability(name: &str) -> bool {
    CAPABILITY_NAME.is_match(name)
}

/// Fail with `InvalidFormat` unless `name` is a valid capability name.
pub fn ensure_valid_capability(name: &str) -> Result<()> {
    if is_valid_capability(name) {
        Ok(())
    } else {
        Err(CapabilityError::InvalidFormat(name.to_string()).into())
    }
}

/// A validated capability name.
///
/// Identity is the string itself. A `Capability` can only be constructed from
/// a name that passed [`is_valid_capability`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Capability(String);

impl Capability {
    /// Create a capability from a name, validating it.
    ///
    /// # Arguments
    ///
    /// * `name` - The capability name.
    ///
    /// # Returns
    ///
    /// * `Ok(Capability)` - If the name is valid.
    /// * `Err` - `CapabilityError::InvalidFormat` carrying the offending name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        ensure_valid_capability(&name)?;
        Ok(Self(name))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first segment of the name.
    pub fn namespace(&self) -> &str {
        // Validated names always contain exactly one slash.
        self.0.split_once('/').map(|(ns, _)| ns).unwrap_or(&self.0)
    }

    /// Whether this is a namespace-level wildcard (`namespace/*`).
    pub fn is_wildcard(&self) -> bool {
        self.0.ends_with(WILDCARD_SUFFIX)
    }

    /// Whether this capability matches `other` under the wildcard relation.
    pub fn matches(&self, other: &str) -> bool {
        crate::matching::matches(&self.0, other)
    }

    /// Consume the capability, returning the underlying name.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Capability {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Capability {
    type Error = crate::error::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Capability {
    type Error = crate::error::Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Capability> for String {
    fn from(capability: Capability) -> Self {
        capability.0
    }
}

impl AsRef<str> for Capability {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Capability {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Capability {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Capability {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
