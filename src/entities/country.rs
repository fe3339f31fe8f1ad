// 🗺️ Country Entity
// ISO 3166-1 alpha-2 keyed records with normalized display names.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Curated country row: `code,name,continent_code`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
    pub continent_code: String,
}

/// Curated country collection, keeping source row order plus a code set
/// for membership checks.
#[derive(Debug, Clone, Default)]
pub struct CountrySet {
    rows: Vec<Country>,
    codes: BTreeSet<String>,
}

impl CountrySet {
    pub fn new(rows: Vec<Country>) -> Self {
        let codes = rows.iter().map(|c| c.code.clone()).collect();
        CountrySet { rows, codes }
    }

    /// Load the curated country CSV written by the country curator
    pub fn from_csv(path: &Path) -> Result<Self> {
        let mut rdr = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let mut rows = Vec::new();
        for result in rdr.deserialize() {
            let country: Country = result.context("Failed to deserialize country row")?;
            rows.push(country);
        }

        Ok(Self::new(rows))
    }

    pub fn rows(&self) -> &[Country] {
        &self.rows
    }

    pub fn codes(&self) -> &BTreeSet<String> {
        &self.codes
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code)
    }

    pub fn get(&self, code: &str) -> Option<&Country> {
        self.rows.iter().find(|c| c.code == code)
    }

    /// Display name for a code, falling back to the code itself
    pub fn display_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.get(code).map(|c| c.name.as_str()).unwrap_or(code)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
