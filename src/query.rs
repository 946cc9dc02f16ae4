// Query Runner - executes the report queries against the store and prints them

use anyhow::{Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::fmt;
use std::io::Write;

/// The fixed report queries, in execution order
pub fn default_queries(table_name: &str) -> Vec<String> {
    vec![
        format!("SELECT * FROM {}", table_name),
        format!("SELECT AVG(MC_GBP_Billion) FROM {}", table_name),
        format!("SELECT Name FROM {} LIMIT 5", table_name),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl QueryValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            QueryValue::Integer(i) => Some(*i as f64),
            QueryValue::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            QueryValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<ValueRef<'_>> for QueryValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => QueryValue::Null,
            ValueRef::Integer(i) => QueryValue::Integer(i),
            ValueRef::Real(r) => QueryValue::Real(r),
            ValueRef::Text(t) => QueryValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => QueryValue::Text(format!("<{} bytes>", b.len())),
        }
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Null => write!(f, "None"),
            QueryValue::Integer(i) => write!(f, "{}", i),
            QueryValue::Real(r) => write!(f, "{:?}", r),
            QueryValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Full result set of one query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub query: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<QueryValue>>,
}

impl QueryResult {
    pub fn column(&self, name: &str) -> Option<Vec<&QueryValue>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }
}

/// Right-aligned text table with a leading 0-based row index
impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect();

        let index_width = self.rows.len().saturating_sub(1).to_string().len();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                cells
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:>w$}", "", w = index_width)?;
        for (name, w) in self.columns.iter().zip(&widths) {
            write!(f, "  {:>w$}", name, w = *w)?;
        }
        writeln!(f)?;

        if cells.is_empty() {
            return write!(f, "(no rows)");
        }

        for (i, row) in cells.iter().enumerate() {
            write!(f, "{:<w$}", i, w = index_width)?;
            for (value, w) in row.iter().zip(&widths) {
                write!(f, "  {:>w$}", value, w = *w)?;
            }
            if i + 1 < cells.len() {
                writeln!(f)?;
            }
        }

        Ok(())
    }
}

/// Execute one read query and collect every row
pub fn execute_query(conn: &Connection, sql: &str) -> Result<QueryResult> {
    let mut stmt = conn
        .prepare(sql)
        .with_context(|| format!("Failed to prepare query: {}", sql))?;

    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let column_count = columns.len();

    let rows = stmt
        .query_map([], |row| {
            (0..column_count)
                .map(|i| row.get_ref(i).map(QueryValue::from))
                .collect::<rusqlite::Result<Vec<_>>>()
        })
        .with_context(|| format!("Failed to execute query: {}", sql))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read rows of query: {}", sql))?;

    Ok(QueryResult {
        query: sql.to_string(),
        columns,
        rows,
    })
}

/// Run every query in order and print statement, result and a blank line.
/// The first failing query aborts the rest.
pub fn run_queries<W: Write>(
    queries: &[String],
    conn: &Connection,
    out: &mut W,
) -> Result<Vec<QueryResult>> {
    let mut results = Vec::with_capacity(queries.len());

    for query in queries {
        writeln!(out, "Query statement: {}", query)?;
        let result = execute_query(conn, query)?;
        writeln!(out, "{}", result)?;
        writeln!(out)?;

        tracing::debug!("{} returned {} rows", query, result.rows.len());
        results.push(result);
    }

    Ok(results)
}
