use std::fmt;

use serde::{Deserialize, Serialize};

/// A symbolic pointer into the component set, e.g.
/// `#/components/schemas/Error`.
///
/// A reference never owns what it points at; it is a pure lookup key that is
/// decomposed positionally into (section, kind, name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reference(pub String);

impl Reference {
    pub fn new(pointer: impl Into<String>) -> Self {
        Reference(pointer.into())
    }

    fn segment(&self, index: usize) -> &str {
        self.0.split('/').nth(index).unwrap_or("")
    }

    /// The section the pointer enters, normally `components`.
    pub fn section(&self) -> &str {
        self.segment(1)
    }

    /// The component kind: `schemas`, `parameters` or `responses`.
    pub fn kind(&self) -> &str {
        self.segment(2)
    }

    /// The component name.
    pub fn name(&self) -> &str {
        self.segment(3)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
