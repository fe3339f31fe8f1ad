// 🔍 Dataset Validator
// Reconciles the curated airport table against the curated country table.
// An airport country with no matching country is a blocking error (upstream
// drift or a curation bug); a country with no airports is an expected gap.

use crate::entities::{AirportSet, CountrySet};
use crate::paths::PipelinePaths;
use crate::reconcile::{DiffSeverity, KeySet, ReconciliationReport, SetReconciler};
use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct DatasetReport {
    pub country_total: usize,
    pub airport_total: usize,
    pub reconciliation: ReconciliationReport,
    /// (code, display name) for countries with no curated airports
    pub countries_without_airports: Vec<(String, String)>,
}

impl DatasetReport {
    pub fn passed(&self) -> bool {
        !self.reconciliation.has_blocking()
    }

    pub fn print(&self) {
        println!(
            "Loaded {} countries and {} airports.",
            self.country_total, self.airport_total
        );

        let missing = &self.reconciliation.left_only;
        if missing.keys.is_empty() {
            println!("All airport country codes are present in curated countries.");
        } else {
            println!("Countries referenced by airports but missing from curated countries:");
            for code in &missing.keys {
                println!("  {}", code);
            }
        }

        if self.countries_without_airports.is_empty() {
            println!("Every curated country has at least one curated airport.");
        } else {
            println!("Countries with no curated airports:");
            for (code, name) in &self.countries_without_airports {
                println!("  {} - {}", code, name);
            }
            println!(
                "Total without airports: {}",
                self.countries_without_airports.len()
            );
        }
    }
}

/// Reconcile curated airports against curated countries.
pub fn validate(countries: &CountrySet, airports: &AirportSet) -> DatasetReport {
    let reconciler = SetReconciler::new(
        DiffSeverity::Blocking,
        "airport country codes missing from curated countries",
        DiffSeverity::Informational,
        "countries with no curated airports",
    );

    let airport_countries = KeySet::new("airport country codes", airports.country_codes());
    let country_codes = KeySet::new("curated country codes", countries.codes().clone());

    let reconciliation = reconciler.reconcile(&airport_countries, &country_codes);

    let countries_without_airports = reconciliation
        .right_only
        .keys
        .iter()
        .map(|code| (code.clone(), countries.display_name(code).to_string()))
        .collect();

    DatasetReport {
        country_total: countries.len(),
        airport_total: airports.len(),
        reconciliation,
        countries_without_airports,
    }
}

/// Full validation stage over the curated CSV artifacts.
pub fn run(paths: &PipelinePaths) -> Result<DatasetReport> {
    let countries = CountrySet::from_csv(&paths.curated_countries)
        .context("Curated countries not found. Run process-countries first")?;
    let airports = AirportSet::from_csv(&paths.curated_airports)
        .context("Curated airports not found. Run process-airports first")?;

    Ok(validate(&countries, &airports))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Airport, Country};

    fn country(code: &str, name: &str) -> Country {
        Country {
            code: code.to_string(),
            name: name.to_string(),
            continent_code: "AS".to_string(),
        }
    }

    fn airport(iata: &str, country: &str) -> Airport {
        Airport {
            iata: iata.to_string(),
            name: format!("{} Airport", iata),
            latitude_deg: "0.0".to_string(),
            longitude_deg: "0.0".to_string(),
            continent: "AS".to_string(),
            iso_country: country.to_string(),
            municipality: String::new(),
            timezone: "Asia/Dubai".to_string(),
            icao_code: String::new(),
            gps_code: String::new(),
        }
    }

    #[test]
    fn test_consistent_datasets_pass() {
        let countries = CountrySet::new(vec![country("AE", "United Arab Emirates")]);
        let airports = AirportSet::new(vec![airport("DXB", "AE"), airport("AUH", "AE")]);

        let report = validate(&countries, &airports);

        assert!(report.passed());
        assert!(report.reconciliation.is_clean());
        assert_eq!(report.airport_total, 2);
    }

    #[test]
    fn test_orphan_airport_country_blocks() {
        let countries = CountrySet::new(vec![country("AE", "United Arab Emirates")]);
        let airports = AirportSet::new(vec![airport("DXB", "AE"), airport("XXX", "ZZ")]);

        let report = validate(&countries, &airports);

        assert!(!report.passed());
        assert_eq!(
            report.reconciliation.left_only.keys,
            vec!["ZZ".to_string()]
        );
    }

    #[test]
    fn test_country_without_airports_is_informational() {
        let countries = CountrySet::new(vec![
            country("AE", "United Arab Emirates"),
            country("VA", "Vatican City"),
        ]);
        let airports = AirportSet::new(vec![airport("DXB", "AE")]);

        let report = validate(&countries, &airports);

        // A micro-state with no airports does not block release
        assert!(report.passed());
        assert_eq!(
            report.countries_without_airports,
            vec![("VA".to_string(), "Vatican City".to_string())]
        );
    }
}
