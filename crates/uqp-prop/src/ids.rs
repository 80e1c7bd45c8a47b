use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of an uncertain quantity within a correlation registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuantityId(u64);

impl QuantityId {
    /// Wraps a registry counter value.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Counter value the registry assigned.
    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for QuantityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uq#{}", self.0)
    }
}
