//! Order-independent identity for a display arrangement.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::topology::DisplayDescriptor;

const SEPARATOR: &str = "|";

/// Identity of a set of attached displays.
///
/// The empty fingerprint is valid and stands for "no displays" (for example
/// a closed laptop lid with nothing attached).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Fingerprint {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Fingerprint {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the fingerprint for `displays`. Enumeration order does not matter.
pub fn compute(displays: &[DisplayDescriptor]) -> Fingerprint {
    let mut parts: Vec<String> = displays.iter().map(DisplayDescriptor::canonical).collect();
    parts.sort();
    Fingerprint(parts.join(SEPARATOR))
}
