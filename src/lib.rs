// Globelog Curator - Core Library
// Curates open geographic reference data (countries, continents, airports,
// timezones, flag images) into clean CSV artifacts and a SQLite database
// with full-text search. Exposes all pipeline stages for the CLI and tests.

pub mod paths;
pub mod entities;       // Flat records: Country, Continent, Airport
pub mod corrections;    // Manual correction files (name notes, timezone overrides)
pub mod countries;      // Curation stage: raw countries → curated countries/continents
pub mod airports;       // Curation stage: raw airports → curated airports
pub mod timezones;      // Timezone map + coverage validator
pub mod reconcile;      // Set-reconciliation engine shared by every validator
pub mod datasets;       // Validator: airports vs countries
pub mod flags;          // Validator: countries vs flag assets
pub mod db;             // Database build (schema, load, FTS, fingerprint)
pub mod verify;         // Database verification against the curated CSVs
pub mod inspect;        // Database preview for operators

// Re-export commonly used types
pub use corrections::{CountryNameNote, NameOverrides, TimezoneOverride, TimezoneOverrides};
pub use entities::{continent_label, Airport, AirportSet, Continent, Country, CountrySet};
pub use paths::PipelinePaths;
pub use reconcile::{
    DiffSeverity, KeySet, ReconciliationReport, SetDifference, SetReconciler,
};
pub use timezones::{TimezoneMap, TimezoneReport, TimezoneValidator};
pub use verify::{DatabaseVerifier, SearchProbe, VerificationReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
