//! Registration handles

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier returned when an action is registered
///
/// Handles are minted in increasing order starting at 0 and are never
/// reused for the lifetime of the registry that minted them.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Handle(u64);

impl Handle {
    /// Create a handle from its raw value
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// The handle minted after this one
    pub(crate) fn successor(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
