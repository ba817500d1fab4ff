//! Owned references to engine documents

use core::fmt;

/// Handle to a text document owned by the editing engine
///
/// The handle is deliberately neither `Clone` nor `Copy`: whoever holds it
/// owns one reference to the engine's document, and the only way to give it
/// up is to move it back into the engine's release call.
#[derive(Debug, PartialEq, Eq, Hash)]
#[must_use = "dropping a DocumentHandle leaks the engine document"]
pub struct DocumentHandle(u64);

impl DocumentHandle {
    /// Wraps a raw engine identifier
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw engine identifier
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc:{}", self.0)
    }
}
