// Run configuration - JSON file with defaults, overridable from the CLI

use crate::extract::{ExtractFailurePolicy, ExtractionRule};
use crate::query::default_queries;
use crate::store::validate_table_name;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_URL: &str = "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    /// Page holding the bank table
    pub url: String,

    /// `Currency,Rate` CSV
    pub rates_path: PathBuf,

    pub db_path: PathBuf,

    pub table_name: String,

    /// Where the final dataset is written as CSV
    pub output_csv: PathBuf,

    /// Append-only progress log
    pub log_path: PathBuf,

    pub extraction: ExtractionRule,

    pub on_extract_failure: ExtractFailurePolicy,

    /// Replaces the default report queries when set
    pub queries: Option<Vec<String>>,

    /// No timeout when unset
    pub http_timeout_secs: Option<u64>,
}

impl Default for EtlConfig {
    fn default() -> Self {
        EtlConfig {
            url: DEFAULT_URL.to_string(),
            rates_path: PathBuf::from("data/exchange_rate.csv"),
            db_path: PathBuf::from("Banks.db"),
            table_name: "Largest_banks".to_string(),
            output_csv: PathBuf::from("transformed_data.csv"),
            log_path: PathBuf::from("code_log.txt"),
            extraction: ExtractionRule::default(),
            on_extract_failure: ExtractFailurePolicy::default(),
            queries: None,
            http_timeout_secs: None,
        }
    }
}

impl EtlConfig {
    /// Load from a JSON file; missing fields keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: EtlConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        Ok(config)
    }

    /// Report queries for this run
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .clone()
            .unwrap_or_else(|| default_queries(&self.table_name))
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }

    pub fn validate(&self) -> Result<()> {
        validate_table_name(&self.table_name)?;
        if self.extraction.anchor_id.is_empty() {
            anyhow::bail!("extraction.anchor_id must not be empty");
        }
        Ok(())
    }
}
