//! Attach points on a user's avatar

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named point on an avatar that an object can be attached to
///
/// The host engine owns the set of valid names; this is carried opaquely.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachPoint(String);

impl AttachPoint {
    /// Create an attach point from its engine name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Engine name of the attach point
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AttachPoint {
    fn default() -> Self {
        Self::new("head")
    }
}

impl fmt::Display for AttachPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AttachPoint {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}
