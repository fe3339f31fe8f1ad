// 🗺️ Country/Continent Curator
// Reads the raw OurAirports country table and emits the curated country and
// continent CSVs. Rows with non-ISO codes are dropped, display names are
// normalized, and the continent table is derived from the survivors.

use crate::corrections::NameOverrides;
use crate::entities::{continent_label, Continent, Country};
use crate::paths::PipelinePaths;
use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Non-ISO placeholder codes present in the raw source that we omit
/// from the curated export.
pub const EXCLUDED_COUNTRY_CODES: [&str; 1] = ["XP"];

/// Raw row from countries.csv. Extra source columns (id, wikipedia_link,
/// keywords) are ignored by the reader.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCountryRow {
    pub code: String,
    pub name: String,
    pub continent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryCurationSummary {
    pub raw_rows: usize,
    pub curated_countries: usize,
    pub curated_continents: usize,
    pub dropped_codes: Vec<String>,
}

impl CountryCurationSummary {
    pub fn summary(&self) -> String {
        format!(
            "Processed {} countries and {} continents from {} raw rows ({} dropped)",
            self.curated_countries,
            self.curated_continents,
            self.raw_rows,
            self.dropped_codes.len(),
        )
    }
}

pub struct CountryCurator {
    overrides: NameOverrides,
    iso_alpha2: Regex,
    parenthetical: Regex,
    whitespace_runs: Regex,
}

impl CountryCurator {
    pub fn new(overrides: NameOverrides) -> Self {
        CountryCurator {
            overrides,
            iso_alpha2: Regex::new(r"^[A-Z]{2}$").unwrap(),
            parenthetical: Regex::new(r"\s*\([^)]*\)").unwrap(),
            whitespace_runs: Regex::new(r"\s{2,}").unwrap(),
        }
    }

    /// Normalize a display name: manual correction wins, otherwise strip
    /// parenthetical qualifiers and collapse whitespace.
    pub fn clean_name(&self, code: &str, name: &str) -> String {
        if let Some(corrected) = self.overrides.get(code) {
            return corrected.to_string();
        }
        let stripped = self.parenthetical.replace_all(name, "");
        self.whitespace_runs
            .replace_all(stripped.trim(), " ")
            .to_string()
    }

    /// True if the code is a genuine two-letter ISO alpha-2 code and not
    /// a known placeholder.
    pub fn is_curatable_code(&self, code: &str) -> bool {
        self.iso_alpha2.is_match(code) && !EXCLUDED_COUNTRY_CODES.contains(&code)
    }

    /// Filter and normalize the raw rows, preserving source order.
    pub fn curate(&self, raw: &[RawCountryRow]) -> (Vec<Country>, Vec<String>) {
        let mut curated = Vec::new();
        let mut dropped = Vec::new();

        for row in raw {
            let code = row.code.trim();
            if !self.is_curatable_code(code) {
                if !code.is_empty() {
                    dropped.push(code.to_string());
                }
                continue;
            }
            curated.push(Country {
                code: code.to_string(),
                name: self.clean_name(code, row.name.trim()),
                continent_code: row.continent.trim().to_string(),
            });
        }

        (curated, dropped)
    }

    /// Derive the continent table: distinct codes in first-reference order,
    /// labeled from the fixed table, then sorted by (name, code).
    /// A code outside the fixed seven is a hard error.
    pub fn derive_continents(&self, countries: &[Country]) -> Result<Vec<Continent>> {
        let mut seen = std::collections::BTreeSet::new();
        let mut continents = Vec::new();

        for country in countries {
            let code = country.continent_code.as_str();
            if code.is_empty() || seen.contains(code) {
                continue;
            }
            let Some(name) = continent_label(code) else {
                bail!(
                    "Country {} ({}) references unknown continent code '{}'",
                    country.code,
                    country.name,
                    code
                );
            };
            seen.insert(code.to_string());
            continents.push(Continent {
                code: code.to_string(),
                name: name.to_string(),
            });
        }

        continents.sort_by(|a, b| (&a.name, &a.code).cmp(&(&b.name, &b.code)));
        Ok(continents)
    }
}

pub fn load_raw_countries(path: &Path) -> Result<Vec<RawCountryRow>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: RawCountryRow = result.context("Failed to deserialize raw country row")?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn write_curated_countries(path: &Path, countries: &[Country]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for country in countries {
        wtr.serialize(country)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_curated_continents(path: &Path, continents: &[Continent]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for continent in continents {
        wtr.serialize(continent)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Full curation stage: raw countries.csv → curated country + continent CSVs.
pub fn run(paths: &PipelinePaths) -> Result<CountryCurationSummary> {
    std::fs::create_dir_all(&paths.data_dir)
        .with_context(|| format!("Failed to create {}", paths.data_dir.display()))?;

    let overrides = NameOverrides::load(&paths.country_name_overrides)?;
    let curator = CountryCurator::new(overrides);

    let raw = load_raw_countries(&paths.raw_countries)?;
    let (countries, dropped) = curator.curate(&raw);
    let continents = curator.derive_continents(&countries)?;

    write_curated_countries(&paths.curated_countries, &countries)?;
    write_curated_continents(&paths.curated_continents, &continents)?;

    Ok(CountryCurationSummary {
        raw_rows: raw.len(),
        curated_countries: countries.len(),
        curated_continents: continents.len(),
        dropped_codes: dropped,
    })
}
