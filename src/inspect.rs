// 🔎 Database Inspector
// Operator convenience: lists the tables in the built database and previews
// a handful of rows from each. Read-only.

use crate::paths::PipelinePaths;
use anyhow::{bail, Context, Result};
use rusqlite::{Connection, OpenFlags};

const ROW_LIMIT: usize = 10;

/// Fixed column picks per table; everything else falls back to *.
fn preview_columns(table: &str) -> &'static str {
    match table {
        "airport" => "iata, name, municipality, country_code, timezone, latitude, longitude",
        "country" => "code, name, continent_code",
        "continent" => "code, name",
        "build_info" => "key, value",
        _ => "*",
    }
}

pub fn run(paths: &PipelinePaths) -> Result<()> {
    if !paths.database.exists() {
        bail!("Database not found. Run build-db first");
    }

    let conn = Connection::open_with_flags(
        &paths.database,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open {}", paths.database.display()))?;

    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
         ORDER BY name",
    )?;
    let tables = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    println!("Database: {}", paths.database.display());
    println!("Tables ({}): {}", tables.len(), tables.join(", "));
    println!();

    for table in &tables {
        // FTS shadow tables are storage internals, not content
        if table.starts_with("airport_search") {
            println!("Table: {} (full-text index, no preview)", table);
            println!();
            continue;
        }

        print_table_preview(&conn, table)?;
    }

    Ok(())
}

fn print_table_preview(conn: &Connection, table: &str) -> Result<()> {
    let cols = preview_columns(table);
    let sql = format!("SELECT {} FROM {} LIMIT {}", cols, table, ROW_LIMIT);
    let mut stmt = conn.prepare(&sql)?;

    let names: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    println!("Table: {} (columns: {})", table, names.join(", "));

    let mut rows = stmt.query([])?;
    let mut any = false;
    while let Some(row) = rows.next()? {
        any = true;
        let formatted: Vec<String> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value: rusqlite::types::Value = row.get(i).unwrap_or(rusqlite::types::Value::Null);
                format!("{}={}", name, format_value(&value))
            })
            .collect();
        println!("  {}", formatted.join(", "));
    }
    if !any {
        println!("  [empty]");
    }
    println!();

    Ok(())
}

fn format_value(value: &rusqlite::types::Value) -> String {
    use rusqlite::types::Value;
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::build;
    use crate::db::tests::write_fixture_csvs;

    #[test]
    fn test_inspect_runs_against_built_database() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PipelinePaths::rooted(dir.path());
        write_fixture_csvs(&paths);
        build(&paths).unwrap();

        run(&paths).unwrap();
    }

    #[test]
    fn test_inspect_requires_database() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PipelinePaths::rooted(dir.path());

        assert!(run(&paths).is_err());
    }
}
