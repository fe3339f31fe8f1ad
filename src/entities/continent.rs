// 🌍 Continent Entity
// Seven fixed ISO continent codes, each with a friendly display label.
// The curated continent table contains exactly the codes referenced by
// at least one curated country.

use serde::{Deserialize, Serialize};

/// The fixed set of continent codes used by the raw source,
/// mapped to human-friendly names.
pub const CONTINENT_LABELS: [(&str, &str); 7] = [
    ("AF", "Africa"),
    ("AN", "Antarctica"),
    ("AS", "Asia"),
    ("EU", "Europe"),
    ("NA", "North America"),
    ("OC", "Oceania"),
    ("SA", "South America"),
];

/// Look up the friendly label for a continent code.
/// Returns None for anything outside the fixed seven-code set.
pub fn continent_label(code: &str) -> Option<&'static str> {
    CONTINENT_LABELS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Curated continent row: `code,name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continent {
    pub code: String,
    pub name: String,
}
