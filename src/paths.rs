// 📁 Well-known pipeline paths
// Every stage operates on fixed locations under the working directory,
// so each subcommand can run with no arguments.

use std::path::PathBuf;

/// Directory holding raw sources and curated artifacts
pub const DATA_DIR: &str = "data";

/// Directory holding flag image assets (one file per country)
pub const FLAGS_DIR: &str = "flags";

/// Resolved set of input/output paths for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelinePaths {
    pub data_dir: PathBuf,
    pub flags_dir: PathBuf,

    // Raw sources (third-party extracts, never written by the pipeline)
    pub raw_countries: PathBuf,
    pub raw_airports: PathBuf,
    pub airport_timezones: PathBuf,

    // Manual correction files (authored by hand, read-only to the pipeline)
    pub country_name_overrides: PathBuf,
    pub timezone_overrides: PathBuf,

    // Curated artifacts (each owned by exactly one curator)
    pub curated_countries: PathBuf,
    pub curated_continents: PathBuf,
    pub curated_airports: PathBuf,

    // Built database
    pub database: PathBuf,
}

impl PipelinePaths {
    /// Paths rooted at the current working directory
    pub fn default_layout() -> Self {
        Self::rooted(".")
    }

    /// Paths rooted at an arbitrary directory (tests use temp dirs)
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let data_dir = root.join(DATA_DIR);
        let corrections = data_dir.join("corrections");

        PipelinePaths {
            flags_dir: root.join(FLAGS_DIR),
            raw_countries: data_dir.join("countries.csv"),
            raw_airports: data_dir.join("airports.csv"),
            airport_timezones: data_dir.join("airport-timezones.json"),
            country_name_overrides: corrections.join("country_name_overrides.json"),
            timezone_overrides: corrections.join("timezone_overrides.json"),
            curated_countries: data_dir.join("curated_countries.csv"),
            curated_continents: data_dir.join("curated_continents.csv"),
            curated_airports: data_dir.join("curated_airports.csv"),
            database: data_dir.join("globelog.sqlite"),
            data_dir,
        }
    }
}

impl Default for PipelinePaths {
    fn default() -> Self {
        Self::default_layout()
    }
}
