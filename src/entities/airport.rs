// ✈️ Airport Entity
// IATA-keyed records curated from the raw OurAirports extract.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Curated airport row. Column order in the curated CSV is the field
/// order here and is an external-interface contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub iata: String,
    pub name: String,
    pub latitude_deg: String,
    pub longitude_deg: String,
    pub continent: String,
    pub iso_country: String,
    pub municipality: String,
    pub timezone: String,
    pub icao_code: String,
    pub gps_code: String,
}

impl Airport {
    /// Latitude parsed as decimal degrees (0.0 when the source field is blank)
    pub fn latitude(&self) -> f64 {
        self.latitude_deg.parse().unwrap_or(0.0)
    }

    /// Longitude parsed as decimal degrees (0.0 when the source field is blank)
    pub fn longitude(&self) -> f64 {
        self.longitude_deg.parse().unwrap_or(0.0)
    }
}

/// Curated airport collection keyed by IATA code.
#[derive(Debug, Clone, Default)]
pub struct AirportSet {
    by_iata: BTreeMap<String, Airport>,
}

impl AirportSet {
    pub fn new(airports: Vec<Airport>) -> Self {
        let by_iata = airports.into_iter().map(|a| (a.iata.clone(), a)).collect();
        AirportSet { by_iata }
    }

    /// Load the curated airport CSV written by the airport curator
    pub fn from_csv(path: &Path) -> Result<Self> {
        let mut rdr = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let mut airports = Vec::new();
        for result in rdr.deserialize() {
            let airport: Airport = result.context("Failed to deserialize airport row")?;
            airports.push(airport);
        }

        Ok(Self::new(airports))
    }

    pub fn get(&self, iata: &str) -> Option<&Airport> {
        self.by_iata.get(iata)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Airport> {
        self.by_iata.values()
    }

    pub fn iata_codes(&self) -> std::collections::BTreeSet<String> {
        self.by_iata.keys().cloned().collect()
    }

    /// Distinct country codes referenced by at least one airport
    pub fn country_codes(&self) -> std::collections::BTreeSet<String> {
        self.by_iata
            .values()
            .filter(|a| !a.iso_country.is_empty())
            .map(|a| a.iso_country.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_iata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_iata.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_airport(iata: &str, country: &str, tz: &str) -> Airport {
        Airport {
            iata: iata.to_string(),
            name: format!("{} International Airport", iata),
            latitude_deg: "25.2528".to_string(),
            longitude_deg: "55.3644".to_string(),
            continent: "AS".to_string(),
            iso_country: country.to_string(),
            municipality: "Test City".to_string(),
            timezone: tz.to_string(),
            icao_code: format!("O{}", iata),
            gps_code: format!("O{}", iata),
        }
    }

    #[test]
    fn test_coordinates_parse() {
        let airport = test_airport("DXB", "AE", "Asia/Dubai");
        assert!((airport.latitude() - 25.2528).abs() < 1e-9);
        assert!((airport.longitude() - 55.3644).abs() < 1e-9);

        let mut blank = airport.clone();
        blank.latitude_deg = String::new();
        assert_eq!(blank.latitude(), 0.0);
    }

    #[test]
    fn test_country_codes_skip_empty() {
        let set = AirportSet::new(vec![
            test_airport("DXB", "AE", "Asia/Dubai"),
            test_airport("AUH", "AE", "Asia/Dubai"),
            test_airport("XXX", "", ""),
        ]);

        let countries = set.country_codes();
        assert_eq!(countries.len(), 1);
        assert!(countries.contains("AE"));
    }

    #[test]
    fn test_iata_keyed_lookup() {
        let set = AirportSet::new(vec![test_airport("LHR", "GB", "Europe/London")]);
        assert_eq!(set.len(), 1);
        assert!(set.get("LHR").is_some());
        assert!(set.get("DXB").is_none());
    }
}
