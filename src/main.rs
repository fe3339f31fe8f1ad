use anyhow::Result;
use std::env;
use std::process;

use globelog_curator::{airports, countries, datasets, db, flags, inspect, timezones, verify};
use globelog_curator::PipelinePaths;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    let paths = PipelinePaths::default_layout();

    match command {
        "process-countries" => run_process_countries(&paths),
        "process-airports" => run_process_airports(&paths),
        "validate-datasets" => run_validate_datasets(&paths),
        "validate-flags" => run_validate_flags(&paths),
        "verify-timezones" => run_verify_timezones(&paths),
        "build-db" => run_build_db(&paths),
        "verify-db" => run_verify_db(&paths),
        "inspect-db" => inspect::run(&paths),
        "all" => run_all(&paths),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("globelog-curator {}", globelog_curator::VERSION);
    println!();
    println!("Usage: globelog-curator <stage>");
    println!();
    println!("Stages (run in this order):");
    println!("  process-countries   Curate countries.csv into curated country/continent tables");
    println!("  process-airports    Curate airports.csv into the curated airport table");
    println!("  validate-datasets   Reconcile curated airports against curated countries");
    println!("  validate-flags      Reconcile curated countries against flag assets");
    println!("  verify-timezones    Check timezone coverage of the curated airports");
    println!("  build-db            Build data/globelog.sqlite from the curated CSVs");
    println!("  verify-db           Verify the database against the curated CSVs");
    println!("  inspect-db          Preview the tables in the built database");
    println!("  all                 Run every stage in dependency order");
}

fn run_process_countries(paths: &PipelinePaths) -> Result<()> {
    println!("🗺️  Curating countries and continents");

    let summary = countries::run(paths)?;

    if !summary.dropped_codes.is_empty() {
        println!(
            "✓ Dropped non-ISO codes: {}",
            summary.dropped_codes.join(", ")
        );
    }
    println!("✓ {}", summary.summary());

    Ok(())
}

fn run_process_airports(paths: &PipelinePaths) -> Result<()> {
    println!("✈️  Curating airports");

    let summary = airports::run(paths)?;

    println!(
        "✓ Read {} airports from the raw extract. Wrote {} curated rows.",
        summary.raw_rows, summary.kept
    );
    println!("✓ {}", summary.summary());
    if !summary.discarded_duplicates.is_empty() {
        println!("✓ Duplicate IATA codes resolved:");
        for line in &summary.discarded_duplicates {
            println!("    {}", line);
        }
    }

    Ok(())
}

fn run_validate_datasets(paths: &PipelinePaths) -> Result<()> {
    println!("🔍 Validating curated datasets");

    let report = datasets::run(paths)?;
    report.print();

    if !report.passed() {
        eprintln!("❌ Dataset validation failed");
        process::exit(1);
    }
    Ok(())
}

fn run_validate_flags(paths: &PipelinePaths) -> Result<()> {
    println!("🏳️  Validating flag assets");

    let report = flags::run(paths)?;
    report.print();

    if !report.passed() {
        eprintln!("❌ Flag validation failed");
        process::exit(1);
    }
    Ok(())
}

fn run_verify_timezones(paths: &PipelinePaths) -> Result<()> {
    println!("🕐 Verifying timezone coverage");

    let report = timezones::run(paths)?;
    report.print();

    if !report.passed() {
        eprintln!("❌ Timezone coverage incomplete");
        process::exit(1);
    }
    Ok(())
}

fn run_build_db(paths: &PipelinePaths) -> Result<()> {
    println!("🗄️  Building SQLite database");

    let summary = db::build(paths)?;

    println!("✓ {}", summary.summary());
    println!("✓ Database written to {}", paths.database.display());

    Ok(())
}

fn run_verify_db(paths: &PipelinePaths) -> Result<()> {
    println!("🔍 Verifying database against curated CSVs");

    let report = verify::run(paths)?;
    report.print();

    if !report.passed() {
        eprintln!("❌ Database verification failed");
        process::exit(1);
    }
    println!("✅ Database matches the curated artifacts");
    Ok(())
}

fn run_all(paths: &PipelinePaths) -> Result<()> {
    run_process_countries(paths)?;
    println!();
    run_process_airports(paths)?;
    println!();
    run_validate_datasets(paths)?;
    println!();
    run_validate_flags(paths)?;
    println!();
    run_verify_timezones(paths)?;
    println!();
    run_build_db(paths)?;
    println!();
    run_verify_db(paths)?;

    println!();
    println!("✅ Pipeline complete");
    Ok(())
}
