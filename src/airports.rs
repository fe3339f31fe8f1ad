// ✈️ Airport Curator
// Filters the raw OurAirports airport table down to medium/large airports
// with IATA codes, attaches effective timezones, and emits the curated
// airport CSV. Rows referencing countries we never curated abort the stage.

use crate::corrections::TimezoneOverrides;
use crate::entities::{Airport, CountrySet};
use crate::paths::PipelinePaths;
use crate::timezones::TimezoneMap;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const ALLOWED_TYPES: [&str; 2] = ["medium_airport", "large_airport"];

/// Raw row from airports.csv. Extra source columns (ident, elevation_ft,
/// iso_region, scheduled_service, ...) are ignored by the reader.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAirportRow {
    #[serde(rename = "type", default)]
    pub airport_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub latitude_deg: String,
    #[serde(default)]
    pub longitude_deg: String,
    #[serde(default)]
    pub continent: String,
    #[serde(default)]
    pub iso_country: String,
    #[serde(default)]
    pub municipality: String,
    #[serde(default)]
    pub iata_code: String,
    #[serde(default)]
    pub icao_code: String,
    #[serde(default)]
    pub gps_code: String,
}

impl RawAirportRow {
    fn classification_rank(&self) -> u8 {
        match self.airport_type.trim() {
            "large_airport" => 2,
            "medium_airport" => 1,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirportCurationSummary {
    pub raw_rows: usize,
    pub kept: usize,
    pub medium_count: usize,
    pub large_count: usize,
    pub missing_iata: usize,
    /// Rows discarded by the duplicate-IATA tie-break, described for the operator
    pub discarded_duplicates: Vec<String>,
    pub top_countries: Vec<(String, usize)>,
}

impl AirportCurationSummary {
    pub fn summary(&self) -> String {
        let top = if self.top_countries.is_empty() {
            "n/a".to_string()
        } else {
            self.top_countries
                .iter()
                .map(|(code, count)| format!("{}:{}", code, count))
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            "Kept {} airports (medium: {}, large: {}). \
             Skipped {} medium/large airports without IATA codes. \
             Top countries by count: {}.",
            self.kept, self.medium_count, self.large_count, self.missing_iata, top,
        )
    }
}

pub struct AirportCurator {
    timezones: TimezoneMap,
}

impl AirportCurator {
    pub fn new(timezones: TimezoneMap) -> Self {
        AirportCurator { timezones }
    }

    /// Filter, deduplicate, and normalize the raw rows.
    ///
    /// Duplicate IATA codes: the larger classification wins; on a tie the
    /// first-encountered row is kept and the loser is reported.
    pub fn curate(
        &self,
        raw: &[RawAirportRow],
        countries: &CountrySet,
    ) -> Result<(Vec<Airport>, AirportCurationSummary)> {
        let mut by_iata: BTreeMap<String, (u8, Airport)> = BTreeMap::new();
        let mut missing_iata = 0;
        let mut discarded = Vec::new();

        for row in raw {
            let airport_type = row.airport_type.trim();
            if !ALLOWED_TYPES.contains(&airport_type) {
                continue;
            }

            let iata = row.iata_code.trim().to_string();
            if iata.is_empty() {
                missing_iata += 1;
                continue;
            }

            let candidate = self.to_airport(row, &iata);
            let rank = row.classification_rank();

            let replace = match by_iata.get(&iata) {
                Some((kept_rank, kept)) if *kept_rank >= rank => {
                    discarded.push(format!(
                        "{}: kept '{}' over '{}'",
                        iata, kept.name, candidate.name
                    ));
                    false
                }
                Some((_, kept)) => {
                    discarded.push(format!(
                        "{}: kept '{}' over '{}'",
                        iata, candidate.name, kept.name
                    ));
                    true
                }
                None => true,
            };
            if replace {
                by_iata.insert(iata, (rank, candidate));
            }
        }

        // Count classifications of the rows that survived the tie-break
        let mut medium = 0;
        let mut large = 0;
        for (rank, _) in by_iata.values() {
            match rank {
                2 => large += 1,
                1 => medium += 1,
                _ => {}
            }
        }

        let mut airports: Vec<Airport> = by_iata.into_values().map(|(_, a)| a).collect();
        airports.sort_by(|a, b| (&a.iata, &a.name).cmp(&(&b.iata, &b.name)));

        self.check_country_references(&airports, countries)?;

        let mut country_counts: BTreeMap<String, usize> = BTreeMap::new();
        for airport in &airports {
            *country_counts.entry(airport.iso_country.clone()).or_default() += 1;
        }
        let mut top_countries: Vec<(String, usize)> = country_counts.into_iter().collect();
        top_countries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        top_countries.truncate(5);

        let summary = AirportCurationSummary {
            raw_rows: raw.len(),
            kept: airports.len(),
            medium_count: medium,
            large_count: large,
            missing_iata,
            discarded_duplicates: discarded,
            top_countries,
        };

        Ok((airports, summary))
    }

    fn to_airport(&self, row: &RawAirportRow, iata: &str) -> Airport {
        Airport {
            iata: iata.to_string(),
            name: row.name.trim().to_string(),
            latitude_deg: row.latitude_deg.trim().to_string(),
            longitude_deg: row.longitude_deg.trim().to_string(),
            continent: row.continent.trim().to_string(),
            iso_country: row.iso_country.trim().to_string(),
            municipality: row.municipality.trim().to_string(),
            timezone: self.timezones.timezone_for(iata),
            icao_code: row.icao_code.trim().to_string(),
            gps_code: row.gps_code.trim().to_string(),
        }
    }

    /// Every curated airport must reference a curated country. Offenders
    /// must not silently appear downstream, so the stage aborts.
    fn check_country_references(&self, airports: &[Airport], countries: &CountrySet) -> Result<()> {
        let orphans: Vec<String> = airports
            .iter()
            .filter(|a| !countries.contains(&a.iso_country))
            .map(|a| format!("{} ({}) -> '{}'", a.iata, a.name, a.iso_country))
            .collect();

        if !orphans.is_empty() {
            bail!(
                "{} airports reference countries absent from the curated set:\n  {}",
                orphans.len(),
                orphans.join("\n  ")
            );
        }
        Ok(())
    }
}

pub fn load_raw_airports(path: &Path) -> Result<Vec<RawAirportRow>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: RawAirportRow = result.context("Failed to deserialize raw airport row")?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn write_curated_airports(path: &Path, airports: &[Airport]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for airport in airports {
        wtr.serialize(airport)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Full curation stage: raw airports.csv → curated_airports.csv.
pub fn run(paths: &PipelinePaths) -> Result<AirportCurationSummary> {
    let countries = CountrySet::from_csv(&paths.curated_countries)
        .context("Curated countries not found. Run process-countries first")?;

    let overrides = TimezoneOverrides::load(&paths.timezone_overrides)?;
    let timezones = TimezoneMap::load(&paths.airport_timezones, &overrides)?;
    let curator = AirportCurator::new(timezones);

    let raw = load_raw_airports(&paths.raw_airports)?;
    let (airports, summary) = curator.curate(&raw, &countries)?;

    write_curated_airports(&paths.curated_airports, &airports)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Country;

    fn raw(
        airport_type: &str,
        iata: &str,
        name: &str,
        country: &str,
    ) -> RawAirportRow {
        RawAirportRow {
            airport_type: airport_type.to_string(),
            name: name.to_string(),
            latitude_deg: "25.2528".to_string(),
            longitude_deg: "55.3644".to_string(),
            continent: "AS".to_string(),
            iso_country: country.to_string(),
            municipality: "City".to_string(),
            iata_code: iata.to_string(),
            icao_code: String::new(),
            gps_code: String::new(),
        }
    }

    fn countries(codes: &[&str]) -> CountrySet {
        CountrySet::new(
            codes
                .iter()
                .map(|code| Country {
                    code: code.to_string(),
                    name: code.to_string(),
                    continent_code: "AS".to_string(),
                })
                .collect(),
        )
    }

    fn curator() -> AirportCurator {
        AirportCurator::new(TimezoneMap::default())
    }

    #[test]
    fn test_filters_type_and_iata() {
        let rows = vec![
            raw("large_airport", "DXB", "Dubai Intl", "AE"),
            raw("small_airport", "XYZ", "Tiny Strip", "AE"),
            raw("heliport", "", "Pad", "AE"),
            raw("medium_airport", "", "No IATA Field", "AE"),
            raw("medium_airport", "AUH", "Abu Dhabi", "AE"),
        ];

        let (airports, summary) = curator().curate(&rows, &countries(&["AE"])).unwrap();

        assert_eq!(airports.len(), 2);
        assert_eq!(summary.kept, 2);
        assert_eq!(summary.large_count, 1);
        assert_eq!(summary.medium_count, 1);
        // Only medium/large rows missing IATA are counted
        assert_eq!(summary.missing_iata, 1);
    }

    #[test]
    fn test_small_airport_excluded_even_with_iata() {
        let rows = vec![raw("small_airport", "ABC", "Small Field", "AE")];
        let (airports, _) = curator().curate(&rows, &countries(&["AE"])).unwrap();
        assert!(airports.is_empty());
    }

    #[test]
    fn test_duplicate_iata_larger_classification_wins() {
        let rows = vec![
            raw("medium_airport", "DXB", "Old Dubai Field", "AE"),
            raw("large_airport", "DXB", "Dubai Intl", "AE"),
        ];

        let (airports, summary) = curator().curate(&rows, &countries(&["AE"])).unwrap();

        assert_eq!(airports.len(), 1);
        assert_eq!(airports[0].name, "Dubai Intl");
        assert_eq!(summary.discarded_duplicates.len(), 1);
        assert!(summary.discarded_duplicates[0].contains("kept 'Dubai Intl'"));
    }

    #[test]
    fn test_duplicate_iata_tie_keeps_first() {
        let rows = vec![
            raw("medium_airport", "AAA", "First Field", "AE"),
            raw("medium_airport", "AAA", "Second Field", "AE"),
        ];

        let (airports, summary) = curator().curate(&rows, &countries(&["AE"])).unwrap();

        assert_eq!(airports.len(), 1);
        assert_eq!(airports[0].name, "First Field");
        assert_eq!(summary.discarded_duplicates.len(), 1);
    }

    #[test]
    fn test_unknown_country_aborts() {
        let rows = vec![raw("large_airport", "DXB", "Dubai Intl", "ZZ")];

        let err = curator().curate(&rows, &countries(&["AE"])).unwrap_err();
        assert!(err.to_string().contains("DXB"));
        assert!(err.to_string().contains("'ZZ'"));
    }

    #[test]
    fn test_output_sorted_by_iata() {
        let rows = vec![
            raw("large_airport", "LHR", "Heathrow", "GB"),
            raw("large_airport", "AUH", "Abu Dhabi", "AE"),
            raw("large_airport", "DXB", "Dubai Intl", "AE"),
        ];

        let (airports, _) = curator()
            .curate(&rows, &countries(&["AE", "GB"]))
            .unwrap();
        let iatas: Vec<&str> = airports.iter().map(|a| a.iata.as_str()).collect();
        assert_eq!(iatas, vec!["AUH", "DXB", "LHR"]);
    }

    #[test]
    fn test_timezone_attached_from_map() {
        let dir = tempfile::tempdir().unwrap();
        let map_path = dir.path().join("airport-timezones.json");
        std::fs::write(
            &map_path,
            r#"[{"code": "DXB", "timezone": "Asia/Dubai", "countryCode": "AE"}]"#,
        )
        .unwrap();
        let map = TimezoneMap::load(&map_path, &Default::default()).unwrap();

        let rows = vec![
            raw("large_airport", "DXB", "Dubai Intl", "AE"),
            raw("large_airport", "AUH", "Abu Dhabi", "AE"),
        ];
        let (airports, _) = AirportCurator::new(map)
            .curate(&rows, &countries(&["AE"]))
            .unwrap();

        assert_eq!(airports[1].timezone, "Asia/Dubai");
        assert_eq!(airports[0].timezone, "");
    }

    #[test]
    fn test_curated_csv_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curated_airports.csv");
        let rows = vec![raw("large_airport", "DXB", "Dubai Intl", "AE")];
        let (airports, _) = curator().curate(&rows, &countries(&["AE"])).unwrap();

        write_curated_airports(&path, &airports).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "iata,name,latitude_deg,longitude_deg,continent,iso_country,municipality,timezone,icao_code,gps_code"
        );
    }

    #[test]
    fn test_top_countries_ranked_by_count() {
        let rows = vec![
            raw("large_airport", "DXB", "Dubai Intl", "AE"),
            raw("large_airport", "AUH", "Abu Dhabi", "AE"),
            raw("large_airport", "LHR", "Heathrow", "GB"),
        ];

        let (_, summary) = curator()
            .curate(&rows, &countries(&["AE", "GB"]))
            .unwrap();

        assert_eq!(summary.top_countries[0], ("AE".to_string(), 2));
        assert_eq!(summary.top_countries[1], ("GB".to_string(), 1));
    }
}
