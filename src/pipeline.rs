// Pipeline - Extract → Transform → Load → Query → Report, strictly in order
//
// Extraction failures follow the configured policy; any later failure
// ends the run. Nothing already loaded is rolled back.

use crate::config::EtlConfig;
use crate::extract::{extract, PageFetcher};
use crate::progress::ProgressLog;
use crate::query::run_queries;
use crate::report::{fifth_bank_eur, render_dataset, write_dataset_csv};
use crate::store::{load_table, open_store};
use crate::transform::{transform_with_rates_file, EnrichedBankRecord};
use anyhow::{Context, Result};
use std::io::Write;

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Audit id of the load (`etl_runs.run_id`)
    pub run_id: String,
    pub extracted: usize,
    pub loaded: i64,
    pub dataset: Vec<EnrichedBankRecord>,
}

pub fn run_pipeline<W: Write>(
    config: &EtlConfig,
    fetcher: &dyn PageFetcher,
    log: &dyn ProgressLog,
    out: &mut W,
) -> Result<RunSummary> {
    config.validate()?;

    // 1. Extract
    let records = extract(
        fetcher,
        &config.url,
        &config.extraction,
        config.on_extract_failure,
        log,
    )?;
    let extracted = records.len();
    tracing::info!("extracted {} banks from {}", extracted, config.url);

    // 2. Transform
    let dataset = transform_with_rates_file(records, &config.rates_path, log)?;

    // 3. Load
    let mut conn = open_store(&config.db_path)?;
    let run = load_table(&mut conn, &dataset, &config.table_name, log)?;

    // 4. Query
    run_queries(&config.queries(), &conn, out)?;

    conn.close()
        .map_err(|(_, e)| e)
        .with_context(|| format!("Failed to close database: {}", config.db_path.display()))?;

    // 5. Report
    writeln!(out, "{}", render_dataset(&dataset))?;
    match fifth_bank_eur(&dataset) {
        Some(value) => writeln!(
            out,
            "Market Cap of the 5th largest bank in billion EUR: {}",
            value
        )?,
        None => writeln!(
            out,
            "Market Cap of the 5th largest bank in billion EUR: unavailable ({} banks extracted)",
            dataset.len()
        )?,
    }

    write_dataset_csv(&config.output_csv, &dataset)?;
    log.record("Data transformed. Output saved to CSV.");

    Ok(RunSummary {
        run_id: run.run_id,
        extracted,
        loaded: run.row_count,
        dataset,
    })
}
