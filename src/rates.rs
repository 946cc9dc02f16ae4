use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// One row of the exchange-rate file (`Currency,Rate`)
#[derive(Debug, Deserialize)]
struct RateRow {
    #[serde(rename = "Currency")]
    currency: String,

    #[serde(rename = "Rate")]
    rate: f64,
}

/// Currency code → units of that currency per USD.
/// Built once per run, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl RateTable {
    /// Build from (code, rate) pairs; later duplicates overwrite earlier ones
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        RateTable {
            rates: pairs.into_iter().map(|(c, r)| (c.into(), r)).collect(),
        }
    }

    /// Read a headed `Currency,Rate` CSV from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rates = HashMap::new();
        for (line_num, result) in rdr.deserialize().enumerate() {
            let row: RateRow = result.with_context(|| {
                format!("Failed to parse exchange rate on line {}", line_num + 2)
            })?;
            rates.insert(row.currency, row.rate);
        }

        Ok(RateTable { rates })
    }

    pub fn get(&self, currency: &str) -> Option<f64> {
        self.rates.get(currency).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Load the exchange-rate table from a CSV file
pub fn load_rates(path: &Path) -> Result<RateTable> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open exchange rate file: {}", path.display()))?;

    let table = RateTable::from_reader(file)
        .with_context(|| format!("Failed to read exchange rate file: {}", path.display()))?;

    tracing::debug!("loaded {} exchange rates from {}", table.len(), path.display());
    Ok(table)
}
