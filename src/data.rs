//! Tabular (CSV) import and export using Polars

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use polars::prelude::*;

use crate::error::{Result, SegmentError};
use crate::record::{validate, CustomerRecord};

pub const COL_CUSTOMER_ID: &str = "CustomerID";
pub const COL_AGE: &str = "Age";
pub const COL_ANNUAL_INCOME: &str = "AnnualIncome";
pub const COL_SPENDING_SCORE: &str = "SpendingScore";
pub const COL_CLUSTER: &str = "Cluster";

/// Read and validate customer rows from a CSV file with a header row.
///
/// A `Cluster` column, if present, is ignored. Any invalid row rejects the whole
/// file; the error names the 1-based data row.
pub fn read_customers_csv(path: &Path) -> Result<Vec<CustomerRecord>> {
    let file = File::open(path).map_err(|e| SegmentError::io(path, e))?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_schema_overwrite(Some(Arc::new(text_schema())))
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| SegmentError::parse(path, e.to_string()))?;

    let records = records_from_frame(&df).map_err(|reason| SegmentError::parse(path, reason))?;

    for (row, record) in records.iter().enumerate() {
        if let Err(e) = validate(record) {
            tracing::warn!(path = %path.display(), row = row + 1, error = %e, "rejected import row");
            return Err(SegmentError::parse(path, format!("row {}: {e}", row + 1)));
        }
    }

    Ok(records)
}

/// Customer columns are read as text so IDs keep their exact spelling and numbers
/// are parsed strictly below.
fn text_schema() -> Schema {
    Schema::from_iter(
        [COL_CUSTOMER_ID, COL_AGE, COL_ANNUAL_INCOME, COL_SPENDING_SCORE]
            .map(|name| Field::new(name, DataType::String)),
    )
}

fn records_from_frame(df: &DataFrame) -> std::result::Result<Vec<CustomerRecord>, String> {
    let ids = text_column(df, COL_CUSTOMER_ID)?;
    let ages = text_column(df, COL_AGE)?;
    let incomes = text_column(df, COL_ANNUAL_INCOME)?;
    let scores = text_column(df, COL_SPENDING_SCORE)?;

    let ids = ids.str().map_err(|e| e.to_string())?;
    let ages = ages.str().map_err(|e| e.to_string())?;
    let incomes = incomes.str().map_err(|e| e.to_string())?;
    let scores = scores.str().map_err(|e| e.to_string())?;

    ids.into_iter()
        .zip(ages)
        .zip(incomes)
        .zip(scores)
        .enumerate()
        .map(|(row, (((id, age), income), score))| -> std::result::Result<_, String> {
            let row = row + 1;
            let id = id.ok_or_else(|| format!("row {row}: missing {COL_CUSTOMER_ID}"))?;
            Ok(CustomerRecord::new(
                id,
                parse_cell(age, COL_AGE, row)?,
                parse_cell(income, COL_ANNUAL_INCOME, row)?,
                parse_cell(score, COL_SPENDING_SCORE, row)?,
            ))
        })
        .collect()
}

/// Fetch a column as text.
fn text_column(df: &DataFrame, name: &str) -> std::result::Result<Series, String> {
    df.column(name)
        .map_err(|_| format!("missing column {name}"))?
        .strict_cast(&DataType::String)
        .map_err(|e| format!("column {name}: {e}"))
}

/// Parse one cell; `25.9` is not an integer age and is rejected, not truncated.
fn parse_cell<T: std::str::FromStr>(
    cell: Option<&str>,
    column: &str,
    row: usize,
) -> std::result::Result<T, String> {
    let text = cell.map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(format!("row {row}: missing {column}"));
    }
    text.parse()
        .map_err(|_| format!("row {row}: invalid {column} value {text:?}"))
}

/// Write records to `path` as CSV, atomically.
///
/// The `Cluster` column is written only when every record carries a label. The file
/// is first written and synced in the destination directory, then renamed over
/// `path`, so a failure never leaves a partial file behind.
pub fn write_customers_csv(path: &Path, records: &[CustomerRecord]) -> Result<()> {
    let mut df = frame_from_records(records)
        .map_err(|e| SegmentError::io(path, std::io::Error::other(e.to_string())))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| SegmentError::io(path, e))?;

    CsvWriter::new(tmp.as_file_mut())
        .include_header(true)
        .finish(&mut df)
        .map_err(|e| SegmentError::io(path, std::io::Error::other(e.to_string())))?;
    tmp.as_file_mut()
        .flush()
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| SegmentError::io(path, e))?;

    tmp.persist(path).map_err(|e| SegmentError::io(path, e.error))?;
    Ok(())
}

fn frame_from_records(records: &[CustomerRecord]) -> PolarsResult<DataFrame> {
    let ids: Vec<&str> = records.iter().map(|r| r.customer_id.as_str()).collect();
    let ages: Vec<i64> = records.iter().map(|r| r.age).collect();
    let incomes: Vec<f64> = records.iter().map(|r| r.annual_income).collect();
    let scores: Vec<f64> = records.iter().map(|r| r.spending_score).collect();

    let mut columns = vec![
        Series::new(COL_CUSTOMER_ID, ids),
        Series::new(COL_AGE, ages),
        Series::new(COL_ANNUAL_INCOME, incomes),
        Series::new(COL_SPENDING_SCORE, scores),
    ];

    let labels: Option<Vec<u64>> = records
        .iter()
        .map(|r| r.cluster.map(|c| c as u64))
        .collect();
    if let Some(labels) = labels.filter(|l| !l.is_empty()) {
        columns.push(Series::new(COL_CLUSTER, labels));
    }

    DataFrame::new(columns)
}
