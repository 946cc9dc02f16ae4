use crate::error::TransformError;
use crate::extract::BankRecord;
use crate::progress::ProgressLog;
use crate::rates::{load_rates, RateTable};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Currencies every enriched record carries, besides USD
pub const TARGET_CURRENCIES: [&str; 3] = ["GBP", "EUR", "INR"];

/// Stored column order
pub const DATASET_COLUMNS: [&str; 5] = [
    "Name",
    "MC_USD_Billion",
    "MC_GBP_Billion",
    "MC_EUR_Billion",
    "MC_INR_Billion",
];

/// A bank with its market cap in every target currency (billions, 2 decimals)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBankRecord {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "MC_USD_Billion")]
    pub market_cap_usd: f64,

    #[serde(rename = "MC_GBP_Billion")]
    pub market_cap_gbp: f64,

    #[serde(rename = "MC_EUR_Billion")]
    pub market_cap_eur: f64,

    #[serde(rename = "MC_INR_Billion")]
    pub market_cap_inr: f64,
}

/// Round to two decimal places, ties to even (numpy's `round(x, 2)`)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

fn require_rate(rates: &RateTable, currency: &str) -> Result<f64, TransformError> {
    rates.get(currency).ok_or_else(|| TransformError::MissingRate {
        currency: currency.to_string(),
    })
}

fn convert(
    records: Vec<BankRecord>,
    rates: &RateTable,
) -> Result<Vec<EnrichedBankRecord>, TransformError> {
    let gbp = require_rate(rates, "GBP")?;
    let eur = require_rate(rates, "EUR")?;
    let inr = require_rate(rates, "INR")?;

    Ok(records
        .into_iter()
        .map(|record| EnrichedBankRecord {
            market_cap_gbp: round2(record.market_cap_usd * gbp),
            market_cap_eur: round2(record.market_cap_usd * eur),
            market_cap_inr: round2(record.market_cap_usd * inr),
            market_cap_usd: record.market_cap_usd,
            name: record.name,
        })
        .collect())
}

/// Convert every record into GBP, EUR and INR.
///
/// All three rates are looked up before any record is touched, so a
/// missing rate fails even for an empty dataset. Output order is input order.
pub fn transform(
    records: Vec<BankRecord>,
    rates: &RateTable,
    log: &dyn ProgressLog,
) -> Result<Vec<EnrichedBankRecord>, TransformError> {
    log.record("Transforming data...");
    let enriched = convert(records, rates)?;
    log.record("Transformation complete.");
    Ok(enriched)
}

/// Same as `transform`, reading the rate table from `rates_path` once
/// "Transforming data..." has been logged.
pub fn transform_with_rates_file(
    records: Vec<BankRecord>,
    rates_path: &Path,
    log: &dyn ProgressLog,
) -> Result<Vec<EnrichedBankRecord>> {
    log.record("Transforming data...");
    let rates = load_rates(rates_path)?;
    let enriched = convert(records, &rates)?;
    log.record("Transformation complete.");
    Ok(enriched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemoryProgressLog;

    fn rates() -> RateTable {
        RateTable::from_pairs([("GBP", 0.8), ("EUR", 0.93), ("INR", 82.1)])
    }

    #[test]
    fn test_two_bank_scenario() {
        let log = MemoryProgressLog::new();
        let records = vec![BankRecord::new("Bank A", 100.0), BankRecord::new("Bank B", 50.0)];

        let enriched = transform(records, &rates(), &log).unwrap();

        assert_eq!(
            enriched,
            vec![
                EnrichedBankRecord {
                    name: "Bank A".to_string(),
                    market_cap_usd: 100.0,
                    market_cap_gbp: 80.0,
                    market_cap_eur: 93.0,
                    market_cap_inr: 8210.0,
                },
                EnrichedBankRecord {
                    name: "Bank B".to_string(),
                    market_cap_usd: 50.0,
                    market_cap_gbp: 40.0,
                    market_cap_eur: 46.5,
                    market_cap_inr: 4105.0,
                },
            ]
        );
        assert_eq!(
            log.entries(),
            vec!["Transforming data...".to_string(), "Transformation complete.".to_string()]
        );
    }

    #[test]
    fn test_values_are_rounded_to_cents() {
        let log = MemoryProgressLog::new();
        let enriched =
            transform(vec![BankRecord::new("JPMorgan Chase", 432.92)], &rates(), &log).unwrap();

        assert_eq!(enriched[0].market_cap_gbp, 346.34);
        assert_eq!(enriched[0].market_cap_eur, 402.62);
        assert_eq!(enriched[0].market_cap_inr, 35542.73);
    }

    #[test]
    fn test_missing_rate_is_an_error() {
        let log = MemoryProgressLog::new();
        let partial = RateTable::from_pairs([("GBP", 0.8), ("INR", 82.1)]);

        let err = transform(vec![BankRecord::new("Bank A", 1.0)], &partial, &log).unwrap_err();

        assert_eq!(
            err,
            TransformError::MissingRate {
                currency: "EUR".to_string()
            }
        );
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_empty_dataset_passes_through() {
        let log = MemoryProgressLog::new();
        let enriched = transform(Vec::new(), &rates(), &log).unwrap();
        assert!(enriched.is_empty());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(46.5), 46.5);
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.236), 1.24);
        assert_eq!(round2(-1.236), -1.24);
    }

    #[test]
    fn test_round2_ties_go_to_even() {
        // (input, expected) - exact binary midpoints and one near-miss
        let cases = [
            (0.125, 0.12),
            (0.375, 0.38),
            (0.625, 0.62),
            (-0.125, -0.12),
            (2.675, 2.67),
        ];

        for (input, expected) in cases {
            assert_eq!(round2(input), expected, "round2({})", input);
        }
    }

    #[test]
    fn test_midpoint_conversion() {
        let log = MemoryProgressLog::new();
        let halves = RateTable::from_pairs([("GBP", 0.5), ("EUR", 1.5), ("INR", 0.5)]);

        let enriched = transform(
            vec![BankRecord::new("Mid", 0.25), BankRecord::new("Upper", 0.75)],
            &halves,
            &log,
        )
        .unwrap();

        assert_eq!(enriched[0].market_cap_gbp, 0.12);
        assert_eq!(enriched[0].market_cap_eur, 0.38);
        assert_eq!(enriched[1].market_cap_gbp, 0.38);
        assert_eq!(enriched[1].market_cap_eur, 1.12);
    }

    #[test]
    fn test_rates_file_is_read_after_start_entry() {
        let log = MemoryProgressLog::new();

        let result = transform_with_rates_file(
            vec![BankRecord::new("Bank A", 1.0)],
            Path::new("/definitely/not/exchange_rate.csv"),
            &log,
        );

        assert!(result.is_err());
        assert_eq!(log.entries(), vec!["Transforming data...".to_string()]);
    }

    #[test]
    fn test_rates_file_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exchange_rate.csv");
        std::fs::write(&path, "Currency,Rate\nEUR,0.93\nGBP,0.8\nINR,82.1\n").unwrap();
        let log = MemoryProgressLog::new();

        let enriched =
            transform_with_rates_file(vec![BankRecord::new("Bank B", 50.0)], &path, &log).unwrap();

        assert_eq!(enriched[0].market_cap_eur, 46.5);
        assert_eq!(log.len(), 2);
    }
}
