use crate::transform::EnrichedBankRecord;
use crate::progress::ProgressLog;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Audit record of one full-replace load (one row of `etl_runs`)
#[derive(Debug, Clone)]
pub struct LoadRun {
    pub run_id: String,
    pub loaded_at: DateTime<Utc>,
    pub table_name: String,
    pub row_count: i64,
    pub dataset_hash: String,
}

impl LoadRun {
    pub fn new(table_name: &str, row_count: i64, dataset_hash: String) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            loaded_at: Utc::now(),
            table_name: table_name.to_string(),
            row_count,
            dataset_hash,
        }
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass
pub fn validate_table_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if !valid {
        bail!("Invalid table name: '{}'", name);
    }
    Ok(())
}

/// SHA-256 over the rows in order; equal datasets give equal hashes
pub fn compute_dataset_hash(dataset: &[EnrichedBankRecord]) -> String {
    let mut hasher = Sha256::new();
    for bank in dataset {
        hasher.update(format!(
            "{}|{}|{}|{}|{}\n",
            bank.name,
            bank.market_cap_usd,
            bank.market_cap_gbp,
            bank.market_cap_eur,
            bank.market_cap_inr
        ));
    }
    format!("{:x}", hasher.finalize())
}

pub fn open_store(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // ==========================================================================
    // Load audit trail (never replaced, one row per load)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS etl_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT UNIQUE NOT NULL,
            loaded_at TEXT NOT NULL,
            table_name TEXT NOT NULL,
            row_count INTEGER NOT NULL,
            dataset_hash TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_etl_runs_table ON etl_runs(table_name)",
        [],
    )?;

    Ok(())
}

/// Replace `table_name` with `dataset`.
///
/// Drop, create and insert run in one SQLite transaction; the previous
/// contents are gone once it commits. Returns the audit record written.
pub fn load_table(
    conn: &mut Connection,
    dataset: &[EnrichedBankRecord],
    table_name: &str,
    log: &dyn ProgressLog,
) -> Result<LoadRun> {
    validate_table_name(table_name)?;
    log.record("Loading data to the database...");

    let run = LoadRun::new(table_name, dataset.len() as i64, compute_dataset_hash(dataset));

    let tx = conn.transaction()?;

    tx.execute(&format!("DROP TABLE IF EXISTS \"{}\"", table_name), [])
        .with_context(|| format!("Failed to drop table {}", table_name))?;

    tx.execute(
        &format!(
            "CREATE TABLE \"{}\" (
                Name TEXT,
                MC_USD_Billion REAL,
                MC_GBP_Billion REAL,
                MC_EUR_Billion REAL,
                MC_INR_Billion REAL
            )",
            table_name
        ),
        [],
    )
    .with_context(|| format!("Failed to create table {}", table_name))?;

    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO \"{}\" (
                Name, MC_USD_Billion, MC_GBP_Billion, MC_EUR_Billion, MC_INR_Billion
            ) VALUES (?1, ?2, ?3, ?4, ?5)",
            table_name
        ))?;

        for bank in dataset {
            stmt.execute(params![
                bank.name,
                bank.market_cap_usd,
                bank.market_cap_gbp,
                bank.market_cap_eur,
                bank.market_cap_inr,
            ])
            .with_context(|| format!("Failed to insert {}", bank.name))?;
        }
    }

    insert_load_run(&tx, &run)?;
    tx.commit()?;

    tracing::debug!(
        "replaced {} with {} rows (hash {})",
        table_name,
        run.row_count,
        run.dataset_hash
    );
    log.record("Data loaded to the database.");

    Ok(run)
}

fn insert_load_run(conn: &Connection, run: &LoadRun) -> Result<()> {
    conn.execute(
        "INSERT INTO etl_runs (
            run_id, loaded_at, table_name, row_count, dataset_hash
        ) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            run.run_id,
            run.loaded_at.to_rfc3339(),
            run.table_name,
            run.row_count,
            run.dataset_hash,
        ],
    )?;

    Ok(())
}

/// Load audit entries for a table, oldest first
pub fn get_load_runs(conn: &Connection, table_name: &str) -> Result<Vec<LoadRun>> {
    let mut stmt = conn.prepare(
        "SELECT run_id, loaded_at, table_name, row_count, dataset_hash
         FROM etl_runs
         WHERE table_name = ?1
         ORDER BY id",
    )?;

    let runs = stmt
        .query_map([table_name], |row| {
            let loaded_at_str: String = row.get(1)?;

            Ok(LoadRun {
                run_id: row.get(0)?,
                loaded_at: DateTime::parse_from_rfc3339(&loaded_at_str)
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            1,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?
                    .with_timezone(&Utc),
                table_name: row.get(2)?,
                row_count: row.get(3)?,
                dataset_hash: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(runs)
}

/// Stored banks in insertion order
pub fn get_stored_banks(conn: &Connection, table_name: &str) -> Result<Vec<EnrichedBankRecord>> {
    validate_table_name(table_name)?;

    let mut stmt = conn.prepare(&format!(
        "SELECT Name, MC_USD_Billion, MC_GBP_Billion, MC_EUR_Billion, MC_INR_Billion
         FROM \"{}\"
         ORDER BY rowid",
        table_name
    ))?;

    let banks = stmt
        .query_map([], |row| {
            Ok(EnrichedBankRecord {
                name: row.get(0)?,
                market_cap_usd: row.get(1)?,
                market_cap_gbp: row.get(2)?,
                market_cap_eur: row.get(3)?,
                market_cap_inr: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(banks)
}

pub fn count_rows(conn: &Connection, table_name: &str) -> Result<i64> {
    validate_table_name(table_name)?;

    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM \"{}\"", table_name),
        [],
        |row| row.get(0),
    )?;

    Ok(count)
}
