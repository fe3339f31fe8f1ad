// 📝 Manual Correction Records
// Hand-authored override tables consumed by the curators and validators.
// The pipeline reads these files and never writes them; remediation of a
// failed run means editing a correction file and re-running.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// COUNTRY NAME NOTES
// ============================================================================

/// A single country-name correction: the display name we publish instead of
/// the upstream name, and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryNameNote {
    pub name: String,
    #[serde(default)]
    pub note: String,
}

/// Display-name corrections keyed by ISO alpha-2 code.
#[derive(Debug, Clone, Default)]
pub struct NameOverrides {
    entries: BTreeMap<String, CountryNameNote>,
}

impl NameOverrides {
    /// The corrections we always apply, recorded with their rationale.
    pub fn builtin() -> Self {
        let mut entries = BTreeMap::new();
        let builtin = [
            ("CC", "Cocos Islands", "Short form of 'Cocos (Keeling) Islands'"),
            ("EH", "Western Sahara", "Upstream appends a disputed-status qualifier"),
            ("PS", "Palestine", "Short form of 'Palestine, State of'"),
            (
                "SH",
                "Saint Helena & Tristan da Cunha",
                "Upstream comma list reads poorly in client UIs",
            ),
        ];
        for (code, name, note) in builtin {
            entries.insert(
                code.to_string(),
                CountryNameNote {
                    name: name.to_string(),
                    note: note.to_string(),
                },
            );
        }
        NameOverrides { entries }
    }

    /// Built-in corrections merged with the optional corrections file.
    /// File entries win over built-ins for the same code.
    pub fn load(path: &Path) -> Result<Self> {
        let mut overrides = Self::builtin();
        if !path.exists() {
            return Ok(overrides);
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let parsed: BTreeMap<String, CountryNameNote> = serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;

        for (code, entry) in parsed {
            let code = code.trim().to_uppercase();
            if code.is_empty() || entry.name.trim().is_empty() {
                continue;
            }
            overrides.entries.insert(
                code,
                CountryNameNote {
                    name: entry.name.trim().to_string(),
                    note: entry.note,
                },
            );
        }

        Ok(overrides)
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// TIMEZONE OVERRIDES
// ============================================================================

/// A timezone correction for one airport: the IANA zone we publish instead
/// of the upstream value, optionally with a corrected country code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneOverride {
    pub timezone: String,
    #[serde(default, rename = "countryCode")]
    pub country_code: String,
    #[serde(default)]
    pub note: String,
}

/// The overrides file accepts either a bare IANA string or a full record
/// per IATA code.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawOverride {
    Zone(String),
    Record(TimezoneOverride),
}

/// Timezone corrections keyed by IATA code.
#[derive(Debug, Clone, Default)]
pub struct TimezoneOverrides {
    entries: BTreeMap<String, TimezoneOverride>,
}

impl TimezoneOverrides {
    /// Load overrides from JSON. A missing file means no overrides;
    /// malformed JSON is an error (a silently ignored correction file
    /// would mask upstream regressions).
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let parsed: BTreeMap<String, RawOverride> = serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;

        let mut entries = BTreeMap::new();
        for (code, raw) in parsed {
            let code = code.trim().to_uppercase();
            if code.is_empty() {
                continue;
            }
            let record = match raw {
                RawOverride::Zone(tz) => TimezoneOverride {
                    timezone: tz.trim().to_string(),
                    country_code: String::new(),
                    note: String::new(),
                },
                RawOverride::Record(mut record) => {
                    record.timezone = record.timezone.trim().to_string();
                    record.country_code = record.country_code.trim().to_string();
                    record
                }
            };
            // An override with no timezone corrects nothing
            if record.timezone.is_empty() {
                continue;
            }
            entries.insert(code, record);
        }

        Ok(TimezoneOverrides { entries })
    }

    pub fn get(&self, iata: &str) -> Option<&TimezoneOverride> {
        self.entries.get(iata)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TimezoneOverride)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
