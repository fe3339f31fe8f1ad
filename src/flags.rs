// 🏳️ Flag Validator
// Checks the bijection between curated country codes and flag assets:
// every country has exactly one flag file named with its uppercase ISO code,
// and no flag exists without a country. Wrongly-cased filenames are
// normalized to the uppercase form before presence is judged.

use crate::entities::CountrySet;
use crate::paths::PipelinePaths;
use crate::reconcile::{DiffSeverity, KeySet, ReconciliationReport, SetReconciler};
use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Image extensions accepted as flag assets
pub const FLAG_EXTENSIONS: [&str; 3] = ["pdf", "svg", "png"];

#[derive(Debug, Clone)]
pub struct FlagReport {
    pub country_total: usize,
    pub renamed: Vec<String>,
    /// Codes whose filename could not be normalized to uppercase
    pub rename_failures: Vec<String>,
    /// Codes with more than one asset file
    pub duplicates: BTreeMap<String, Vec<PathBuf>>,
    pub reconciliation: ReconciliationReport,
}

impl FlagReport {
    pub fn missing(&self) -> &[String] {
        &self.reconciliation.left_only.keys
    }

    pub fn orphans(&self) -> &[String] {
        &self.reconciliation.right_only.keys
    }

    pub fn passed(&self) -> bool {
        self.missing().is_empty() && self.rename_failures.is_empty() && self.duplicates.is_empty()
    }

    pub fn print(&self) {
        println!(
            "Validated {} curated countries against flag assets.",
            self.country_total
        );

        if self.renamed.is_empty() {
            println!("All matching flag files already used uppercase ISO codes.");
        } else {
            println!(
                "Renamed {} flag files to uppercase ISO codes.",
                self.renamed.len()
            );
        }

        if !self.missing().is_empty() {
            println!("Missing {} flags:", self.missing().len());
            for code in self.missing() {
                println!("  {}", code);
            }
        }

        if !self.rename_failures.is_empty() {
            println!(
                "Failed to normalize filenames for codes: {}",
                self.rename_failures.join(", ")
            );
        }

        if !self.duplicates.is_empty() {
            println!("Duplicate flag files detected:");
            for (code, paths) in &self.duplicates {
                let formatted = paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("  {}: {}", code, formatted);
            }
        }

        if !self.orphans().is_empty() {
            println!(
                "Flags without matching country codes: {}",
                self.orphans().join(", ")
            );
        }

        if self.passed() {
            println!("Every curated country has a flag asset in the flags directory.");
        }
    }
}

/// Index flag files by uppercased stem. Non-image files are ignored;
/// a second file for the same code is recorded as a duplicate.
fn index_flag_files(
    directory: &Path,
) -> Result<(BTreeMap<String, PathBuf>, BTreeMap<String, Vec<PathBuf>>)> {
    let mut mapping: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut duplicates: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

    let entries = std::fs::read_dir(directory)
        .with_context(|| format!("Failed to read {}", directory.display()))?;

    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !FLAG_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let key = stem.to_uppercase();

        if let Some(existing) = mapping.get(&key) {
            duplicates
                .entry(key)
                .or_insert_with(|| vec![existing.clone()])
                .push(path);
        } else {
            mapping.insert(key, path);
        }
    }

    Ok((mapping, duplicates))
}

/// Rename a flag file so its stem is exactly the uppercase code. Goes
/// through a unique temporary name for case-insensitive filesystems where
/// a direct rename to the same letters is a no-op or an error.
fn rename_with_case(source: &Path, code: &str) -> Result<PathBuf> {
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();
    let target = source.with_file_name(format!("{}.{}", code, ext));

    if source.file_name() == target.file_name() {
        return Ok(target);
    }

    if std::fs::rename(source, &target).is_err() {
        let temp = source.with_file_name(format!(
            "{}_{}.{}",
            code,
            uuid::Uuid::new_v4().simple(),
            ext
        ));
        std::fs::rename(source, &temp)
            .with_context(|| format!("Failed to rename {}", source.display()))?;
        std::fs::rename(&temp, &target)
            .with_context(|| format!("Failed to rename {}", temp.display()))?;
    }

    Ok(target)
}

/// Validate flag assets against the curated country set.
pub fn validate(countries: &CountrySet, flags_dir: &Path) -> Result<FlagReport> {
    if countries.is_empty() {
        bail!("No country codes found in the curated country table");
    }

    let (mut flag_index, duplicates) = index_flag_files(flags_dir)?;

    let mut renamed = Vec::new();
    let mut rename_failures = Vec::new();

    for code in countries.codes() {
        let Some(path) = flag_index.get(code).cloned() else {
            continue;
        };
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        if stem == code {
            continue;
        }
        match rename_with_case(&path, code) {
            Ok(new_path) => {
                renamed.push(code.clone());
                flag_index.insert(code.clone(), new_path);
            }
            Err(_) => rename_failures.push(code.clone()),
        }
    }

    let reconciler = SetReconciler::new(
        DiffSeverity::Blocking,
        "countries lacking a flag asset",
        DiffSeverity::Informational,
        "flag assets without a curated country",
    );
    let reconciliation = reconciler.reconcile(
        &KeySet::new("curated country codes", countries.codes().clone()),
        &KeySet::from_iter("flag asset codes", flag_index.keys().cloned()),
    );

    Ok(FlagReport {
        country_total: countries.len(),
        renamed,
        rename_failures,
        duplicates,
        reconciliation,
    })
}

/// Full validation stage over the flags directory.
pub fn run(paths: &PipelinePaths) -> Result<FlagReport> {
    let countries = CountrySet::from_csv(&paths.curated_countries)
        .context("Curated countries not found. Run process-countries first")?;

    if !paths.flags_dir.exists() {
        bail!("Missing flags directory: {}", paths.flags_dir.display());
    }

    validate(&countries, &paths.flags_dir)
}
