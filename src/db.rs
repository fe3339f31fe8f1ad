// 🗄️ Database Builder
// Builds the distributable SQLite file from the three curated CSVs and
// nothing else. Foreign keys are enforced during the load, so an airport
// referencing a missing country fails the build instead of being dropped.

use crate::entities::{AirportSet, Continent, CountrySet};
use crate::paths::PipelinePaths;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSummary {
    pub continents: usize,
    pub countries: usize,
    pub airports: usize,
    pub fingerprint: String,
}

impl BuildSummary {
    pub fn summary(&self) -> String {
        format!(
            "Loaded {} continents, {} countries, {} airports (fingerprint {})",
            self.continents,
            self.countries,
            self.airports,
            &self.fingerprint[..12.min(self.fingerprint.len())],
        )
    }
}

/// SHA-256 over the curated CSVs in fixed order. Stored in build_info so
/// the verifier can prove the database came from exactly these artifacts.
pub fn source_fingerprint(paths: &PipelinePaths) -> Result<String> {
    let mut hasher = Sha256::new();
    for path in [
        &paths.curated_continents,
        &paths.curated_countries,
        &paths.curated_airports,
    ] {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        hasher.update(&bytes);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE continent (
            code TEXT PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE country (
            code TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            continent_code TEXT NOT NULL REFERENCES continent(code) ON UPDATE CASCADE
        );

        CREATE TABLE airport (
            iata TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            municipality TEXT,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            continent_code TEXT NOT NULL REFERENCES continent(code),
            country_code TEXT NOT NULL REFERENCES country(code),
            timezone TEXT,
            icao_code TEXT,
            gps_code TEXT
        );

        CREATE INDEX idx_airport_country ON airport(country_code);
        CREATE INDEX idx_airport_municipality ON airport(municipality);
        CREATE INDEX idx_airport_timezone ON airport(timezone);

        CREATE TABLE build_info (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;
    Ok(())
}

fn read_continents(path: &Path) -> Result<Vec<Continent>> {
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let continent: Continent = result.context("Failed to deserialize continent row")?;
        rows.push(continent);
    }
    Ok(rows)
}

fn populate_continents(conn: &Connection, continents: &[Continent]) -> Result<usize> {
    let mut stmt = conn.prepare("INSERT INTO continent(code, name) VALUES (?1, ?2)")?;
    for continent in continents {
        stmt.execute(params![continent.code, continent.name])
            .with_context(|| format!("Failed to insert continent {}", continent.code))?;
    }
    Ok(continents.len())
}

fn populate_countries(conn: &Connection, countries: &CountrySet) -> Result<usize> {
    let mut stmt =
        conn.prepare("INSERT INTO country(code, name, continent_code) VALUES (?1, ?2, ?3)")?;
    for country in countries.rows() {
        stmt.execute(params![country.code, country.name, country.continent_code])
            .with_context(|| format!("Failed to insert country {}", country.code))?;
    }
    Ok(countries.len())
}

fn populate_airports(conn: &Connection, airports: &AirportSet) -> Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO airport(
            iata, name, municipality, latitude, longitude,
            continent_code, country_code, timezone, icao_code, gps_code
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;

    let mut inserted = 0;
    for airport in airports.iter() {
        stmt.execute(params![
            airport.iata,
            airport.name,
            empty_as_null(&airport.municipality),
            airport.latitude(),
            airport.longitude(),
            airport.continent,
            airport.iso_country,
            empty_as_null(&airport.timezone),
            empty_as_null(&airport.icao_code),
            empty_as_null(&airport.gps_code),
        ])
        .with_context(|| format!("Failed to insert airport {}", airport.iata))?;
        inserted += 1;
    }
    Ok(inserted)
}

fn empty_as_null(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn populate_fts(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE VIRTUAL TABLE airport_search USING fts5(
            name,
            municipality,
            iata,
            icao_code,
            country_code,
            content='airport',
            content_rowid='rowid'
        );

        INSERT INTO airport_search(rowid, name, municipality, iata, icao_code, country_code)
        SELECT rowid, name, IFNULL(municipality, ''), iata, IFNULL(icao_code, ''), country_code
        FROM airport;",
    )?;
    Ok(())
}

fn populate_build_info(conn: &Connection, summary: &BuildSummary) -> Result<()> {
    let mut stmt = conn.prepare("INSERT INTO build_info(key, value) VALUES (?1, ?2)")?;
    let rows = [
        ("built_at".to_string(), Utc::now().to_rfc3339()),
        (
            "source_fingerprint".to_string(),
            summary.fingerprint.clone(),
        ),
        ("continent_count".to_string(), summary.continents.to_string()),
        ("country_count".to_string(), summary.countries.to_string()),
        ("airport_count".to_string(), summary.airports.to_string()),
    ];
    for (key, value) in rows {
        stmt.execute(params![key, value])?;
    }
    Ok(())
}

/// Build the database from the curated CSVs. Fully reproducible: the only
/// inputs are the three artifacts, fingerprinted into build_info.
pub fn build(paths: &PipelinePaths) -> Result<BuildSummary> {
    if !paths.curated_countries.exists() || !paths.curated_airports.exists() {
        bail!("Run the curation stages before building the database");
    }

    let continents = read_continents(&paths.curated_continents)?;
    let countries = CountrySet::from_csv(&paths.curated_countries)?;
    let airports = AirportSet::from_csv(&paths.curated_airports)?;
    let fingerprint = source_fingerprint(paths)?;

    // Stale output is deleted, never patched
    if paths.database.exists() {
        std::fs::remove_file(&paths.database)
            .with_context(|| format!("Failed to remove {}", paths.database.display()))?;
    }

    let mut conn = Connection::open(&paths.database)
        .with_context(|| format!("Failed to create {}", paths.database.display()))?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    let summary = BuildSummary {
        continents: continents.len(),
        countries: countries.len(),
        airports: airports.len(),
        fingerprint,
    };

    let tx = conn.transaction()?;
    create_schema(&tx)?;
    populate_continents(&tx, &continents)?;
    populate_countries(&tx, &countries)?;
    populate_airports(&tx, &airports)?;
    populate_fts(&tx)?;
    populate_build_info(&tx, &summary)?;
    tx.commit()?;

    conn.execute("VACUUM", [])?;

    Ok(summary)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn write_fixture_csvs(paths: &PipelinePaths) {
        std::fs::create_dir_all(&paths.data_dir).unwrap();
        std::fs::write(&paths.curated_continents, "code,name\nAS,Asia\nEU,Europe\n").unwrap();
        std::fs::write(
            &paths.curated_countries,
            "code,name,continent_code\nAE,United Arab Emirates,AS\nCH,Switzerland,EU\nGB,United Kingdom,EU\nJP,Japan,AS\n",
        )
        .unwrap();
        std::fs::write(
            &paths.curated_airports,
            "iata,name,latitude_deg,longitude_deg,continent,iso_country,municipality,timezone,icao_code,gps_code\n\
             DXB,Dubai International Airport,25.2528,55.3644,AS,AE,Dubai,Asia/Dubai,OMDB,OMDB\n\
             HND,Tokyo Haneda International Airport,35.552258,139.779694,AS,JP,Tokyo,Asia/Tokyo,RJTT,RJTT\n\
             LHR,London Heathrow Airport,51.4706,-0.461941,EU,GB,London,Europe/London,EGLL,EGLL\n\
             ZRH,Zürich Airport,47.464699,8.54917,EU,CH,Zürich,Europe/Zurich,LSZH,LSZH\n",
        )
        .unwrap();
    }

    #[test]
    fn test_build_populates_all_tables() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PipelinePaths::rooted(dir.path());
        write_fixture_csvs(&paths);

        let summary = build(&paths).unwrap();
        assert_eq!(summary.continents, 2);
        assert_eq!(summary.countries, 4);
        assert_eq!(summary.airports, 4);

        let conn = Connection::open(&paths.database).unwrap();
        let airports: i64 = conn
            .query_row("SELECT COUNT(*) FROM airport", [], |row| row.get(0))
            .unwrap();
        assert_eq!(airports, 4);

        let (lat, tz): (f64, String) = conn
            .query_row(
                "SELECT latitude, timezone FROM airport WHERE iata = 'DXB'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert!((lat - 25.2528).abs() < 1e-9);
        assert_eq!(tz, "Asia/Dubai");

        println!("✅ Test passed: {}", summary.summary());
    }

    #[test]
    fn test_build_records_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PipelinePaths::rooted(dir.path());
        write_fixture_csvs(&paths);

        let summary = build(&paths).unwrap();

        let conn = Connection::open(&paths.database).unwrap();
        let stored: String = conn
            .query_row(
                "SELECT value FROM build_info WHERE key = 'source_fingerprint'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(stored, summary.fingerprint);
        assert_eq!(stored, source_fingerprint(&paths).unwrap());
    }

    #[test]
    fn test_dangling_country_reference_fails_build() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PipelinePaths::rooted(dir.path());
        write_fixture_csvs(&paths);
        // XX never appears in the curated country table
        std::fs::write(
            &paths.curated_airports,
            "iata,name,latitude_deg,longitude_deg,continent,iso_country,municipality,timezone,icao_code,gps_code\n\
             XXX,Ghost Field,0.0,0.0,AS,XX,Nowhere,Asia/Dubai,,\n",
        )
        .unwrap();

        let err = build(&paths).unwrap_err();
        assert!(err.to_string().contains("XXX"));
        // The failed build must not leave a half-populated database behind
        // (the transaction never committed, so the file has no airport rows)
        let conn = Connection::open(&paths.database).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'airport'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 0);
    }

    #[test]
    fn test_fts_matches_diacritic_folded_query() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PipelinePaths::rooted(dir.path());
        write_fixture_csvs(&paths);
        build(&paths).unwrap();

        let conn = Connection::open(&paths.database).unwrap();
        let iata: String = conn
            .query_row(
                "SELECT iata FROM airport_search WHERE airport_search MATCH 'zurich' ORDER BY rank LIMIT 1",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(iata, "ZRH");
    }

    #[test]
    fn test_rebuild_replaces_stale_database() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PipelinePaths::rooted(dir.path());
        write_fixture_csvs(&paths);

        build(&paths).unwrap();

        // Shrink the dataset and rebuild; the old rows must be gone
        std::fs::write(
            &paths.curated_airports,
            "iata,name,latitude_deg,longitude_deg,continent,iso_country,municipality,timezone,icao_code,gps_code\n\
             DXB,Dubai International Airport,25.2528,55.3644,AS,AE,Dubai,Asia/Dubai,OMDB,OMDB\n",
        )
        .unwrap();
        let summary = build(&paths).unwrap();
        assert_eq!(summary.airports, 1);

        let conn = Connection::open(&paths.database).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM airport", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }
}
