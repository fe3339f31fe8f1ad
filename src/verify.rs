// 🔍 Database Verifier
// Proves the built database matches the curated CSVs exactly: row counts,
// key sets, field values, and the recorded source fingerprint. A fixed
// battery of full-text searches confirms the index was populated and did
// not mangle international characters.

use crate::db::source_fingerprint;
use crate::entities::{AirportSet, CountrySet};
use crate::paths::PipelinePaths;
use crate::reconcile::{DiffSeverity, KeySet, ReconciliationReport, SetReconciler};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One full-text search smoke probe: the query must return the expected
/// IATA code among the first ten rank-ordered matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchProbe {
    pub query: String,
    pub expected_iata: String,
}

impl SearchProbe {
    pub fn new(query: &str, expected_iata: &str) -> Self {
        SearchProbe {
            query: query.to_string(),
            expected_iata: expected_iata.to_string(),
        }
    }
}

/// The default battery. The zurich probe doubles as the international
/// character check: the indexed name is "Zürich Airport".
fn default_battery() -> Vec<SearchProbe> {
    vec![
        SearchProbe::new("dubai", "DXB"),
        SearchProbe::new("heathrow", "LHR"),
        SearchProbe::new("tokyo", "HND"),
        SearchProbe::new("zurich", "ZRH"),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCheck {
    pub query: String,
    pub expected_iata: String,
    pub hits: Vec<(String, String)>,
    pub found: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub airport_csv_rows: usize,
    pub airport_db_rows: usize,
    pub country_csv_rows: usize,
    pub country_db_rows: usize,
    pub airport_keys: ReconciliationReport,
    pub country_keys: ReconciliationReport,
    pub field_mismatches: Vec<String>,
    pub fingerprint_matches: bool,
    pub search_checks: Vec<SearchCheck>,
    pub verified_at: DateTime<Utc>,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.airport_keys.is_clean()
            && self.country_keys.is_clean()
            && self.field_mismatches.is_empty()
            && self.fingerprint_matches
            && self.search_checks.iter().all(|c| c.found)
    }

    pub fn print(&self) {
        println!("Curated airports CSV rows: {}", self.airport_csv_rows);
        println!("Airports in database: {}", self.airport_db_rows);
        println!(
            "Missing airports in database: {:?}",
            self.airport_keys.left_only.keys
        );
        println!(
            "Extra airports in database: {:?}",
            self.airport_keys.right_only.keys
        );

        println!("Mismatched fields: {}", self.field_mismatches.len());
        for line in self.field_mismatches.iter().take(10) {
            println!("  {}", line);
        }

        println!("Curated countries CSV rows: {}", self.country_csv_rows);
        println!("Countries in database: {}", self.country_db_rows);
        println!(
            "Missing countries in database: {:?}",
            self.country_keys.left_only.keys
        );
        println!(
            "Extra countries in database: {:?}",
            self.country_keys.right_only.keys
        );

        println!(
            "Source fingerprint: {}",
            if self.fingerprint_matches {
                "matches curated CSVs"
            } else {
                "DOES NOT match curated CSVs"
            }
        );

        println!("FTS smoke searches:");
        for check in &self.search_checks {
            let formatted = check
                .hits
                .iter()
                .map(|(iata, name)| format!("{}:{}", iata, name))
                .collect::<Vec<_>>()
                .join(", ");
            let status = if check.found { "ok" } else { "MISSING" };
            println!(
                "  '{}' -> {} [{} {}]",
                check.query,
                if formatted.is_empty() { "no hits" } else { formatted.as_str() },
                status,
                check.expected_iata
            );
        }
    }
}

/// Airport row as stored in the database.
#[derive(Debug, Clone)]
struct DbAirport {
    name: String,
    municipality: String,
    latitude: f64,
    longitude: f64,
    continent_code: String,
    country_code: String,
    timezone: String,
    icao_code: String,
    gps_code: String,
}

pub struct DatabaseVerifier {
    battery: Vec<SearchProbe>,
}

impl DatabaseVerifier {
    pub fn new() -> Self {
        DatabaseVerifier {
            battery: default_battery(),
        }
    }

    /// Replace the search battery (tests use fixture-specific probes)
    pub fn with_battery(battery: Vec<SearchProbe>) -> Self {
        DatabaseVerifier { battery }
    }

    pub fn verify(&self, paths: &PipelinePaths) -> Result<VerificationReport> {
        if !paths.database.exists() {
            bail!("Database not found. Run build-db first");
        }

        let airports_csv = AirportSet::from_csv(&paths.curated_airports)
            .context("Curated airports not found. Run process-airports first")?;
        let countries_csv = CountrySet::from_csv(&paths.curated_countries)
            .context("Curated countries not found. Run process-countries first")?;

        // Consumers open read-only; the verifier does the same
        let conn = Connection::open_with_flags(
            &paths.database,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open {}", paths.database.display()))?;

        let db_airports = load_db_airports(&conn)?;
        let db_countries = load_db_countries(&conn)?;

        let key_reconciler = SetReconciler::new(
            DiffSeverity::Blocking,
            "CSV rows missing from the database",
            DiffSeverity::Blocking,
            "database rows absent from the CSV",
        );
        let airport_keys = key_reconciler.reconcile(
            &KeySet::new("curated airport CSV", airports_csv.iata_codes()),
            &KeySet::from_iter("airport table", db_airports.keys().cloned()),
        );
        let country_keys = key_reconciler.reconcile(
            &KeySet::new("curated country CSV", countries_csv.codes().clone()),
            &KeySet::from_iter("country table", db_countries.keys().cloned()),
        );

        let mut field_mismatches = Vec::new();
        for airport in airports_csv.iter() {
            let Some(db_row) = db_airports.get(&airport.iata) else {
                continue;
            };
            compare_airport_fields(&airport.iata, airport, db_row, &mut field_mismatches);
        }
        for country in countries_csv.rows() {
            let Some((name, continent_code)) = db_countries.get(&country.code) else {
                continue;
            };
            if *name != country.name {
                field_mismatches.push(format!(
                    "{}: name mismatch CSV='{}' DB='{}'",
                    country.code, country.name, name
                ));
            }
            if *continent_code != country.continent_code {
                field_mismatches.push(format!(
                    "{}: continent_code mismatch CSV='{}' DB='{}'",
                    country.code, country.continent_code, continent_code
                ));
            }
        }

        let stored_fingerprint: Option<String> = conn
            .query_row(
                "SELECT value FROM build_info WHERE key = 'source_fingerprint'",
                [],
                |row| row.get(0),
            )
            .ok();
        let fingerprint_matches = match stored_fingerprint {
            Some(stored) => stored == source_fingerprint(paths)?,
            None => false,
        };

        let mut search_checks = Vec::new();
        for probe in &self.battery {
            search_checks.push(run_search_probe(&conn, probe)?);
        }

        Ok(VerificationReport {
            airport_csv_rows: airports_csv.len(),
            airport_db_rows: db_airports.len(),
            country_csv_rows: countries_csv.len(),
            country_db_rows: db_countries.len(),
            airport_keys,
            country_keys,
            field_mismatches,
            fingerprint_matches,
            search_checks,
            verified_at: Utc::now(),
        })
    }
}

impl Default for DatabaseVerifier {
    fn default() -> Self {
        Self::new()
    }
}

fn load_db_airports(conn: &Connection) -> Result<BTreeMap<String, DbAirport>> {
    let mut stmt = conn.prepare(
        "SELECT iata, name, IFNULL(municipality, ''), latitude, longitude,
                continent_code, country_code, IFNULL(timezone, ''),
                IFNULL(icao_code, ''), IFNULL(gps_code, '')
         FROM airport",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                DbAirport {
                    name: row.get(1)?,
                    municipality: row.get(2)?,
                    latitude: row.get(3)?,
                    longitude: row.get(4)?,
                    continent_code: row.get(5)?,
                    country_code: row.get(6)?,
                    timezone: row.get(7)?,
                    icao_code: row.get(8)?,
                    gps_code: row.get(9)?,
                },
            ))
        })?
        .collect::<std::result::Result<BTreeMap<_, _>, _>>()?;

    Ok(rows)
}

fn load_db_countries(conn: &Connection) -> Result<BTreeMap<String, (String, String)>> {
    let mut stmt = conn.prepare("SELECT code, name, continent_code FROM country")?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                (row.get::<_, String>(1)?, row.get::<_, String>(2)?),
            ))
        })?
        .collect::<std::result::Result<BTreeMap<_, _>, _>>()?;

    Ok(rows)
}

fn compare_airport_fields(
    iata: &str,
    csv_row: &crate::entities::Airport,
    db_row: &DbAirport,
    mismatches: &mut Vec<String>,
) {
    let text_fields = [
        ("name", csv_row.name.as_str(), db_row.name.as_str()),
        (
            "municipality",
            csv_row.municipality.as_str(),
            db_row.municipality.as_str(),
        ),
        (
            "continent",
            csv_row.continent.as_str(),
            db_row.continent_code.as_str(),
        ),
        (
            "iso_country",
            csv_row.iso_country.as_str(),
            db_row.country_code.as_str(),
        ),
        (
            "timezone",
            csv_row.timezone.as_str(),
            db_row.timezone.as_str(),
        ),
        (
            "icao_code",
            csv_row.icao_code.as_str(),
            db_row.icao_code.as_str(),
        ),
        (
            "gps_code",
            csv_row.gps_code.as_str(),
            db_row.gps_code.as_str(),
        ),
    ];

    for (field, csv_value, db_value) in text_fields {
        if csv_value != db_value {
            mismatches.push(format!(
                "{}: {} mismatch CSV='{}' DB='{}'",
                iata, field, csv_value, db_value
            ));
        }
    }

    if csv_row.latitude() != db_row.latitude {
        mismatches.push(format!(
            "{}: latitude mismatch CSV={} DB={}",
            iata,
            csv_row.latitude(),
            db_row.latitude
        ));
    }
    if csv_row.longitude() != db_row.longitude {
        mismatches.push(format!(
            "{}: longitude mismatch CSV={} DB={}",
            iata,
            csv_row.longitude(),
            db_row.longitude
        ));
    }
}

fn run_search_probe(conn: &Connection, probe: &SearchProbe) -> Result<SearchCheck> {
    let mut stmt = conn.prepare(
        "SELECT iata, name FROM airport_search WHERE airport_search MATCH ?1
         ORDER BY rank LIMIT 10",
    )?;

    let hits = stmt
        .query_map(rusqlite::params![probe.query], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let found = hits.iter().any(|(iata, _)| *iata == probe.expected_iata);

    Ok(SearchCheck {
        query: probe.query.clone(),
        expected_iata: probe.expected_iata.clone(),
        hits,
        found,
    })
}

/// Full verification stage against the default battery.
pub fn run(paths: &PipelinePaths) -> Result<VerificationReport> {
    DatabaseVerifier::new().verify(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::write_fixture_csvs;
    use crate::db::build;

    #[test]
    fn test_verification_passes_on_fresh_build() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PipelinePaths::rooted(dir.path());
        write_fixture_csvs(&paths);
        build(&paths).unwrap();

        let report = DatabaseVerifier::new().verify(&paths).unwrap();

        assert!(report.passed());
        assert_eq!(report.airport_csv_rows, report.airport_db_rows);
        assert!(report.fingerprint_matches);
        assert!(report.field_mismatches.is_empty());
        assert!(report.search_checks.iter().all(|c| c.found));

        println!("✅ Verification test passed");
    }

    #[test]
    fn test_detects_missing_airport() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PipelinePaths::rooted(dir.path());
        write_fixture_csvs(&paths);
        build(&paths).unwrap();

        // Add a CSV row after the build; the database is now stale
        let mut csv = std::fs::read_to_string(&paths.curated_airports).unwrap();
        csv.push_str("AAA,Anaa Airport,-17.3526,-145.5097,OC,PF,Anaa,Pacific/Tahiti,NTGA,NTGA\n");
        std::fs::write(&paths.curated_airports, csv).unwrap();

        let report = DatabaseVerifier::with_battery(vec![SearchProbe::new("dubai", "DXB")])
            .verify(&paths)
            .unwrap();

        assert!(!report.passed());
        assert_eq!(
            report.airport_keys.left_only.keys,
            vec!["AAA".to_string()]
        );
        // The stale fingerprint is caught too
        assert!(!report.fingerprint_matches);
    }

    #[test]
    fn test_detects_field_drift() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PipelinePaths::rooted(dir.path());
        write_fixture_csvs(&paths);
        build(&paths).unwrap();

        let conn = Connection::open(&paths.database).unwrap();
        conn.execute(
            "UPDATE airport SET timezone = 'Asia/Muscat' WHERE iata = 'DXB'",
            [],
        )
        .unwrap();
        drop(conn);

        let report = DatabaseVerifier::with_battery(vec![]).verify(&paths).unwrap();

        assert!(!report.passed());
        assert_eq!(report.field_mismatches.len(), 1);
        assert!(report.field_mismatches[0].contains("timezone"));
        assert!(report.field_mismatches[0].contains("Asia/Muscat"));
    }

    #[test]
    fn test_search_probe_miss_fails() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PipelinePaths::rooted(dir.path());
        write_fixture_csvs(&paths);
        build(&paths).unwrap();

        let report =
            DatabaseVerifier::with_battery(vec![SearchProbe::new("atlantis", "ATL")])
                .verify(&paths)
                .unwrap();

        assert!(!report.passed());
        assert!(!report.search_checks[0].found);
        assert!(report.search_checks[0].hits.is_empty());
    }

    #[test]
    fn test_default_battery_covers_international_names() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PipelinePaths::rooted(dir.path());
        write_fixture_csvs(&paths);
        build(&paths).unwrap();

        let report = DatabaseVerifier::new().verify(&paths).unwrap();
        let zurich = report
            .search_checks
            .iter()
            .find(|c| c.query == "zurich")
            .unwrap();

        // ASCII query must match the diacritic name via the tokenizer
        assert!(zurich.found);
        assert!(zurich.hits.iter().any(|(_, name)| name.contains("Zürich")));
    }
}
