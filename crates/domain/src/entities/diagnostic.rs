//! Data-quality notes attached to a mapped creature.

use serde::{Deserialize, Serialize};

/// An input value the mapper could not interpret.
///
/// Diagnostics never stop mapping; the affected field gets a sentinel
/// ("Unknown Item", "Unknown Spell") or a default and the note records why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Source field path, e.g. "gear[2]" or "spellcasting[0].daily.1e[1]"
    pub field: String,
    pub message: String,
    /// The offending value as compact JSON
    pub raw: String,
}

impl Diagnostic {
    pub fn new(field: impl Into<String>, message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            raw: raw.into(),
        }
    }
}
