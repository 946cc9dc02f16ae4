// Bank ETL - Core Library
// Largest-bank market caps: HTML page → currency conversion → SQLite → report

pub mod error;
pub mod progress;
pub mod rates;
pub mod extract;
pub mod transform;
pub mod store;
pub mod query;
pub mod report;
pub mod config;
pub mod pipeline;

// Re-export commonly used types
pub use error::{ExtractionError, TransformError};
pub use progress::{FileProgressLog, MemoryProgressLog, ProgressLog};
pub use rates::{load_rates, RateTable};
pub use extract::{
    extract, parse_bank_table,
    BankRecord, ExtractFailurePolicy, ExtractionRule, HttpFetcher, PageFetcher,
};
pub use transform::{
    transform, transform_with_rates_file, EnrichedBankRecord, DATASET_COLUMNS, TARGET_CURRENCIES,
};
pub use store::{
    LoadRun,
    count_rows, get_load_runs, get_stored_banks, load_table, open_store, setup_database,
};
pub use query::{default_queries, execute_query, run_queries, QueryResult, QueryValue};
pub use report::{fifth_bank_eur, render_dataset, write_dataset_csv};
pub use config::EtlConfig;
pub use pipeline::{run_pipeline, RunSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
