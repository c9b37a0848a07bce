use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Dataset, Row};
use crate::error::DataError;

// ---------------------------------------------------------------------------
// Request records
// ---------------------------------------------------------------------------

/// Build a dataset from records-oriented JSON rows (`[{col: value, ...}, ...]`).
///
/// Column order follows `declared` where those columns exist, then first
/// appearance in the rows.
pub fn from_json_rows(records: Vec<JsonValue>, declared: &[String]) -> Result<Dataset, DataError> {
    let mut rows = Vec::with_capacity(records.len());
    let mut first_seen: Vec<String> = Vec::new();

    for (i, rec) in records.into_iter().enumerate() {
        let JsonValue::Object(obj) = rec else {
            return Err(DataError::RowNotObject { row: i });
        };

        let mut row = Row::new();
        for (key, val) in obj {
            if !first_seen.contains(&key) {
                first_seen.push(key.clone());
            }
            row.insert(key, json_to_cell(&val));
        }
        rows.push(row);
    }

    Ok(Dataset::from_rows(rows, first_seen, declared))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Load a tabular dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – flat Parquet file with primitive columns
/// * `.json`    – `[{ "col": value, ... }, ...]`
/// * `.csv`     – header row, one record per line; cell types are guessed
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => Err(DataError::UnsupportedFormat(other.to_string()).into()),
    }
}

fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let JsonValue::Array(records) = root else {
        return Err(DataError::NotAnArray.into());
    };

    from_json_rows(records, &[]).context("building dataset from JSON records")
}

fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(col, value)| (col.clone(), guess_cell_type(value)))
            .collect();
        rows.push(row);
    }

    Ok(Dataset::from_rows(rows, headers, &[]))
}

fn guess_cell_type(s: &str) -> CellValue {
    let s = s.trim();
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_finite() {
            return CellValue::Float(f);
        }
        return CellValue::Null;
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::Text(s.to_string())
}

/// Load a flat Parquet file. Every column becomes a dataset column; nested
/// columns are rendered as text.
///
/// Works with files written by **Pandas** (`df.to_parquet()`), **Polars**
/// (`df.write_parquet()`) and the `generate_sample` binary.
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        for row in 0..batch.num_rows() {
            let mut cells = BTreeMap::new();
            for (col_idx, field) in schema.fields().iter().enumerate() {
                let value = extract_cell(batch.column(col_idx), row)
                    .with_context(|| format!("Row {row}: failed to read '{}'", field.name()))?;
                cells.insert(field.name().clone(), value);
            }
            rows.push(cells);
        }
    }

    Ok(Dataset::from_rows(rows, columns, &[]))
}

// -- Arrow helpers --

fn downcast<'a, T: 'static>(col: &'a Arc<dyn Array>) -> Result<&'a T> {
    match col.as_any().downcast_ref::<T>() {
        Some(arr) => Ok(arr),
        None => bail!("column type {:?} does not match its array", col.data_type()),
    }
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => CellValue::Text(downcast::<StringArray>(col)?.value(row).to_string()),
        DataType::LargeUtf8 => CellValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(downcast::<Int32Array>(col)?.value(row) as i64),
        DataType::Int64 => CellValue::Integer(downcast::<Int64Array>(col)?.value(row)),
        DataType::Float32 => float_cell(downcast::<Float32Array>(col)?.value(row) as f64),
        DataType::Float64 => float_cell(downcast::<Float64Array>(col)?.value(row)),
        DataType::Boolean => CellValue::Bool(downcast::<BooleanArray>(col)?.value(row)),
        other => CellValue::Text(format!("{other:?}")),
    };
    Ok(value)
}

// NaN in a float column means "missing"
fn float_cell(v: f64) -> CellValue {
    if v.is_finite() {
        CellValue::Float(v)
    } else {
        CellValue::Null
    }
}
