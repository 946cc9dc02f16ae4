// Extraction - bank table from the source HTML page
//
// Fetching and parsing are separate so the parser can run on fixtures.

use crate::error::ExtractionError;
use crate::progress::ProgressLog;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Column names of an extracted record, in order
pub const EXTRACTED_COLUMNS: [&str; 2] = ["Name", "MC_USD_Billion"];

// ============================================================================
// CORE TYPES
// ============================================================================

/// One qualifying row of the source table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankRecord {
    #[serde(rename = "Name")]
    pub name: String,

    /// Market capitalization, billions of USD
    #[serde(rename = "MC_USD_Billion")]
    pub market_cap_usd: f64,
}

impl BankRecord {
    pub fn new(name: impl Into<String>, market_cap_usd: f64) -> Self {
        BankRecord {
            name: name.into(),
            market_cap_usd,
        }
    }
}

/// Where the bank table lives in the page and which cells to read.
///
/// Cell and link indices are 0-based. The defaults match the
/// "By market capitalization" table of the largest-banks page: the name is
/// the second link of the second cell, the value is the third cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRule {
    /// `id` of the element preceding the table in document order
    pub anchor_id: String,
    pub name_cell: usize,
    pub name_link: usize,
    pub market_cap_cell: usize,
}

impl Default for ExtractionRule {
    fn default() -> Self {
        ExtractionRule {
            anchor_id: "By_market_capitalization".to_string(),
            name_cell: 1,
            name_link: 1,
            market_cap_cell: 2,
        }
    }
}

/// What `extract` does when fetching or parsing fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractFailurePolicy {
    /// Log the error and continue with an empty dataset
    #[default]
    Degrade,
    /// Log the error and return it
    FailFast,
}

// ============================================================================
// FETCHING
// ============================================================================

/// Source of raw page markup
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<String, ExtractionError>;
}

/// Blocking HTTP fetcher
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// `timeout = None` waits for the server indefinitely
    pub fn new(timeout: Option<Duration>) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bank-etl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(HttpFetcher { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, ExtractionError> {
        let fetch_error = |e: reqwest::Error| ExtractionError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self.client.get(url).send().map_err(fetch_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(fetch_error)?;
        tracing::debug!("fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

// ============================================================================
// PARSING
// ============================================================================

fn selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::Selector(format!("{css}: {e:?}")))
}

/// First `<table>` after the element with `id == anchor_id`, in document order.
/// A table nested inside the anchor element counts.
fn find_table_after_anchor<'a>(
    document: &'a Html,
    anchor_id: &str,
) -> Result<ElementRef<'a>, ExtractionError> {
    let mut nodes = document.tree.root().descendants();

    nodes
        .by_ref()
        .find(|node| node.value().as_element().and_then(|el| el.id()) == Some(anchor_id))
        .ok_or_else(|| ExtractionError::AnchorNotFound {
            anchor_id: anchor_id.to_string(),
        })?;

    nodes
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
        .ok_or_else(|| ExtractionError::TableNotFound {
            anchor_id: anchor_id.to_string(),
        })
}

/// Parse the bank table out of a full HTML document.
///
/// Rows without data cells (headers) and rows whose name cell lacks the
/// configured link are skipped. A qualifying row with a missing or
/// non-numeric market-cap cell fails the whole parse.
pub fn parse_bank_table(
    html: &str,
    rule: &ExtractionRule,
) -> Result<Vec<BankRecord>, ExtractionError> {
    let document = Html::parse_document(html);
    let table = find_table_after_anchor(&document, &rule.anchor_id)?;

    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;
    let link_sel = selector("a")?;

    let mut records = Vec::new();

    for (row_idx, row) in table.select(&row_sel).enumerate() {
        let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
        if cells.is_empty() {
            continue;
        }

        let link = cells
            .get(rule.name_cell)
            .and_then(|cell| cell.select(&link_sel).nth(rule.name_link));
        let Some(link) = link else {
            tracing::debug!("row {} has no name link, skipped", row_idx);
            continue;
        };
        let name = link.text().next().unwrap_or_default().trim().to_string();

        let cap_cell = cells
            .get(rule.market_cap_cell)
            .ok_or(ExtractionError::MissingCell {
                row: row_idx,
                cell: rule.market_cap_cell,
            })?;
        let raw = cap_cell.text().next().unwrap_or_default().replace('\n', "");
        let market_cap_usd =
            raw.trim()
                .parse::<f64>()
                .map_err(|_| ExtractionError::InvalidMarketCap {
                    row: row_idx,
                    value: raw.trim().to_string(),
                })?;

        records.push(BankRecord::new(name, market_cap_usd));
    }

    Ok(records)
}

/// Fetch `url` and extract its bank table.
///
/// Writes "Extracting..." before starting and either "Extraction complete."
/// or the error message afterwards. On failure `policy` decides between an
/// empty dataset and the error.
pub fn extract(
    fetcher: &dyn PageFetcher,
    url: &str,
    rule: &ExtractionRule,
    policy: ExtractFailurePolicy,
    log: &dyn ProgressLog,
) -> Result<Vec<BankRecord>, ExtractionError> {
    log.record("Extracting data from the webpage...");

    match fetcher
        .fetch(url)
        .and_then(|html| parse_bank_table(&html, rule))
    {
        Ok(records) => {
            log.record("Extraction complete.");
            Ok(records)
        }
        Err(e) => {
            log.record(&format!("Error during extraction: {}", e));
            match policy {
                ExtractFailurePolicy::Degrade => {
                    tracing::warn!("extraction failed, continuing with an empty dataset");
                    Ok(Vec::new())
                }
                ExtractFailurePolicy::FailFast => Err(e),
            }
        }
    }
}
