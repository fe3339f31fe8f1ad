// 🕐 Timezone Map & Validator
// The upstream timezone source is a JSON array of {code, timezone,
// countryCode} entries keyed by IATA code. Manual overrides are layered on
// top before any consumer sees a value.

use crate::corrections::TimezoneOverrides;
use crate::entities::AirportSet;
use crate::paths::PipelinePaths;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// TIMEZONE MAP
// ============================================================================

/// One effective timezone assignment for an airport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneEntry {
    pub timezone: String,
    pub country_code: String,
}

/// Raw entry as it appears in airport-timezones.json.
#[derive(Debug, Clone, Deserialize)]
struct RawTimezoneEntry {
    #[serde(default)]
    code: String,
    #[serde(default)]
    timezone: String,
    #[serde(default, rename = "countryCode")]
    country_code: String,
}

/// Upstream timezone assignments, deduplicated by IATA code (first entry
/// wins) with manual overrides applied on top.
#[derive(Debug, Clone, Default)]
pub struct TimezoneMap {
    entries: BTreeMap<String, TimezoneEntry>,
}

impl TimezoneMap {
    /// Load the upstream source and apply overrides. An override without a
    /// country code inherits the upstream country for that airport.
    pub fn load(path: &Path, overrides: &TimezoneOverrides) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let raw: Vec<RawTimezoneEntry> = serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?;

        let mut entries: BTreeMap<String, TimezoneEntry> = BTreeMap::new();
        for entry in raw {
            let code = entry.code.trim().to_string();
            if code.is_empty() || entries.contains_key(&code) {
                continue;
            }
            entries.insert(
                code,
                TimezoneEntry {
                    timezone: entry.timezone.trim().to_string(),
                    country_code: entry.country_code.trim().to_string(),
                },
            );
        }

        for (code, correction) in overrides.iter() {
            let country_code = if correction.country_code.is_empty() {
                entries
                    .get(code)
                    .map(|e| e.country_code.clone())
                    .unwrap_or_default()
            } else {
                correction.country_code.clone()
            };
            entries.insert(
                code.clone(),
                TimezoneEntry {
                    timezone: correction.timezone.clone(),
                    country_code,
                },
            );
        }

        Ok(TimezoneMap { entries })
    }

    pub fn get(&self, iata: &str) -> Option<&TimezoneEntry> {
        self.entries.get(iata)
    }

    /// Effective timezone string for an airport, empty when unmapped
    pub fn timezone_for(&self, iata: &str) -> String {
        self.entries
            .get(iata)
            .map(|e| e.timezone.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// TIMEZONE VALIDATOR
// ============================================================================

/// An airport whose timezone source disagrees with the curated country.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryMismatch {
    pub iata: String,
    pub curated_country: String,
    pub source_country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimezoneReport {
    pub total_airports: usize,
    pub mapped_entries: usize,
    pub covered: usize,
    /// Airports with no timezone at all
    pub missing: Vec<String>,
    /// Airports whose timezone does not parse as an IANA Area/Location name
    pub invalid: Vec<(String, String)>,
    pub mismatches: Vec<CountryMismatch>,
    pub generated_at: DateTime<Utc>,
}

impl TimezoneReport {
    pub fn coverage_pct(&self) -> f64 {
        if self.total_airports == 0 {
            return 100.0;
        }
        self.covered as f64 / self.total_airports as f64 * 100.0
    }

    /// Full coverage is required; country mismatches are informational
    /// (they need a manual override authored, not a failed run per se,
    /// but missing coverage blocks release).
    pub fn passed(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Covered {}/{} airports ({:.2}%), {} missing, {} invalid, {} country mismatches",
            self.covered,
            self.total_airports,
            self.coverage_pct(),
            self.missing.len(),
            self.invalid.len(),
            self.mismatches.len(),
        )
    }

    pub fn print(&self) {
        println!("Curated airports: {}", self.total_airports);
        println!("Timezones available: {} (deduped)", self.mapped_entries);
        println!(
            "Covered airports: {} ({:.2}%)",
            self.covered,
            self.coverage_pct()
        );

        println!("Missing airports: {}", self.missing.len());
        if !self.missing.is_empty() {
            println!("Missing codes: {}", self.missing.join(", "));
        }

        if !self.invalid.is_empty() {
            println!("Invalid timezone identifiers:");
            for (iata, tz) in &self.invalid {
                println!("  {}: '{}'", iata, tz);
            }
        }

        println!("Country mismatches: {}", self.mismatches.len());
        for m in self.mismatches.iter().take(10) {
            println!(
                "  {}: curated={}, tz_source={}",
                m.iata, m.curated_country, m.source_country
            );
        }
    }
}

pub struct TimezoneValidator {
    iana_shape: Regex,
}

impl TimezoneValidator {
    pub fn new() -> Self {
        TimezoneValidator {
            // Area/Location form, e.g. Asia/Dubai or America/Argentina/Buenos_Aires
            iana_shape: Regex::new(r"^[A-Za-z][A-Za-z0-9_+\-]*(/[A-Za-z0-9_+\-]+)+$").unwrap(),
        }
    }

    pub fn is_valid_identifier(&self, tz: &str) -> bool {
        self.iana_shape.is_match(tz)
    }

    /// Check coverage of the curated airports and cross-check the upstream
    /// source's country codes against the curated values.
    pub fn validate(&self, airports: &AirportSet, map: &TimezoneMap) -> TimezoneReport {
        let mut covered = 0;
        let mut missing = Vec::new();
        let mut invalid = Vec::new();
        let mut mismatches = Vec::new();

        for airport in airports.iter() {
            if airport.timezone.is_empty() {
                missing.push(airport.iata.clone());
            } else if !self.is_valid_identifier(&airport.timezone) {
                invalid.push((airport.iata.clone(), airport.timezone.clone()));
            } else {
                covered += 1;
            }

            if let Some(entry) = map.get(&airport.iata) {
                if !entry.country_code.is_empty() && entry.country_code != airport.iso_country {
                    mismatches.push(CountryMismatch {
                        iata: airport.iata.clone(),
                        curated_country: airport.iso_country.clone(),
                        source_country: entry.country_code.clone(),
                    });
                }
            }
        }

        TimezoneReport {
            total_airports: airports.len(),
            mapped_entries: map.len(),
            covered,
            missing,
            invalid,
            mismatches,
            generated_at: Utc::now(),
        }
    }
}

impl Default for TimezoneValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Full validation stage: curated airports against the timezone source.
pub fn run(paths: &PipelinePaths) -> Result<TimezoneReport> {
    let airports = AirportSet::from_csv(&paths.curated_airports)
        .context("Curated airports not found. Run process-airports first")?;
    let overrides = TimezoneOverrides::load(&paths.timezone_overrides)?;
    let map = TimezoneMap::load(&paths.airport_timezones, &overrides)?;

    Ok(TimezoneValidator::new().validate(&airports, &map))
}
