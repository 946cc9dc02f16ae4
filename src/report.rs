// Report - console rendering of the final dataset and its CSV artifact

use crate::query::{QueryResult, QueryValue};
use crate::transform::{EnrichedBankRecord, DATASET_COLUMNS};
use anyhow::{Context, Result};
use std::path::Path;

/// Dataset as a printable table (same layout as query results)
pub fn dataset_table(dataset: &[EnrichedBankRecord]) -> QueryResult {
    QueryResult {
        query: String::new(),
        columns: DATASET_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows: dataset
            .iter()
            .map(|bank| {
                vec![
                    QueryValue::Text(bank.name.clone()),
                    QueryValue::Real(bank.market_cap_usd),
                    QueryValue::Real(bank.market_cap_gbp),
                    QueryValue::Real(bank.market_cap_eur),
                    QueryValue::Real(bank.market_cap_inr),
                ]
            })
            .collect(),
    }
}

pub fn render_dataset(dataset: &[EnrichedBankRecord]) -> String {
    dataset_table(dataset).to_string()
}

/// EUR market cap of the 5th bank, if there are at least five
pub fn fifth_bank_eur(dataset: &[EnrichedBankRecord]) -> Option<f64> {
    dataset.get(4).map(|bank| bank.market_cap_eur)
}

/// Write the dataset as CSV with a leading unnamed row-index column
pub fn write_dataset_csv(path: &Path, dataset: &[EnrichedBankRecord]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;

    let mut header = vec![""];
    header.extend(DATASET_COLUMNS);
    wtr.write_record(&header)?;

    for (idx, bank) in dataset.iter().enumerate() {
        wtr.serialize((
            idx,
            &bank.name,
            bank.market_cap_usd,
            bank.market_cap_gbp,
            bank.market_cap_eur,
            bank.market_cap_inr,
        ))
        .with_context(|| format!("Failed to write row {} to {}", idx, path.display()))?;
    }

    wtr.flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}
