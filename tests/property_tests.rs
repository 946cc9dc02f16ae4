//! Property tests for the currency transform.
//!
//! 1. One output per input, USD unchanged, derived values within half a cent
//! 2. Transform is pure: equal inputs give equal outputs
//! 3. Names and order pass through untouched
//!
//! Exact rounding is pinned by fixed cases in the transform unit tests.

use bank_etl::{transform, BankRecord, MemoryProgressLog, RateTable};
use proptest::prelude::*;

// ── Strategies ───────────────────────────────────────────────────────

fn arb_market_cap() -> impl Strategy<Value = f64> {
    (0.0..5000.0_f64).prop_map(|v| (v * 100.0).round() / 100.0)
}

fn arb_records() -> impl Strategy<Value = Vec<BankRecord>> {
    prop::collection::vec(("[A-Za-z ]{1,24}", arb_market_cap()), 0..30).prop_map(|rows| {
        rows.into_iter()
            .map(|(name, usd)| BankRecord::new(name, usd))
            .collect()
    })
}

fn arb_rates() -> impl Strategy<Value = RateTable> {
    (0.01..2.0_f64, 0.01..2.0_f64, 1.0..150.0_f64)
        .prop_map(|(gbp, eur, inr)| RateTable::from_pairs([("GBP", gbp), ("EUR", eur), ("INR", inr)]))
}

proptest! {
    #[test]
    fn one_record_per_input_near_the_rate(records in arb_records(), rates in arb_rates()) {
        let log = MemoryProgressLog::new();
        let enriched = transform(records.clone(), &rates, &log).unwrap();

        prop_assert_eq!(enriched.len(), records.len());
        for (bank, source) in enriched.iter().zip(&records) {
            prop_assert_eq!(bank.market_cap_usd, source.market_cap_usd);

            for (derived, currency) in [
                (bank.market_cap_gbp, "GBP"),
                (bank.market_cap_eur, "EUR"),
                (bank.market_cap_inr, "INR"),
            ] {
                let exact = source.market_cap_usd * rates.get(currency).unwrap();
                prop_assert!(
                    (derived - exact).abs() <= 0.005 + 1e-9 * exact.abs().max(1.0),
                    "{} {} is not within half a cent of {}", currency, derived, exact
                );
            }
        }
    }

    #[test]
    fn transform_is_pure(records in arb_records(), rates in arb_rates()) {
        let log = MemoryProgressLog::new();

        let first = transform(records.clone(), &rates, &log).unwrap();
        let second = transform(records, &rates, &log).unwrap();

        prop_assert_eq!(first, second);
    }

    #[test]
    fn names_keep_their_order(records in arb_records(), rates in arb_rates()) {
        let log = MemoryProgressLog::new();
        let enriched = transform(records.clone(), &rates, &log).unwrap();

        let before: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        let after: Vec<&str> = enriched.iter().map(|r| r.name.as_str()).collect();
        prop_assert_eq!(before, after);
    }
}
