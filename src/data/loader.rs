use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::Table;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a source table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – Parquet file with one numeric column per feature
/// * `.json`    – `[{ "Open": 1.0, "Mid": 1.1, ... }, ...]` (records orient)
/// * `.csv`     – header row of column names, numeric cells
///
/// Non-numeric columns (timestamps, tickers, ...) are skipped with a warning;
/// the windowing layer only consumes homogeneous numeric features.
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one time step per row.
/// A column whose cells do not all parse as numbers is dropped.
fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let records: Vec<csv::StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .context("reading CSV rows")?;

    let mut columns: Vec<(String, Vec<f32>)> = Vec::new();

    'cols: for (col_idx, name) in headers.iter().enumerate() {
        let mut values = Vec::with_capacity(records.len());
        for (row_no, record) in records.iter().enumerate() {
            let cell = record.get(col_idx).unwrap_or("");
            match cell.trim().parse::<f32>() {
                Ok(v) => values.push(v),
                Err(_) => {
                    log::warn!(
                        "Skipping non-numeric column '{name}' (row {row_no}: '{cell}')"
                    );
                    continue 'cols;
                }
            }
        }
        columns.push((name.clone(), values));
    }

    if columns.is_empty() {
        bail!("CSV has no numeric columns");
    }
    Ok(Table::from_columns(columns))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default
/// `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Open": 1.02, "Mid": 1.03, "Close": 1.04 },
///   ...
/// ]
/// ```
///
/// Column order follows the first record (sorted by name — JSON objects
/// carry no reliable key order).
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;
    if records.is_empty() {
        bail!("JSON file contains no records");
    }

    let first = records[0]
        .as_object()
        .context("Row 0 is not a JSON object")?;

    // Numeric keys of the first record define the schema.
    let mut names: Vec<String> = first
        .iter()
        .filter(|(_, v)| v.is_number())
        .map(|(k, _)| k.clone())
        .collect();
    names.sort();
    for (key, _) in first.iter().filter(|(_, v)| !v.is_number()) {
        log::warn!("Skipping non-numeric column '{key}'");
    }
    if names.is_empty() {
        bail!("JSON records have no numeric fields");
    }

    let mut columns: Vec<(String, Vec<f32>)> = names
        .into_iter()
        .map(|n| (n, Vec::with_capacity(records.len())))
        .collect();

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for (name, values) in &mut columns {
            let v = obj
                .get(name.as_str())
                .and_then(|v| v.as_f64())
                .with_context(|| format!("Row {i}: missing or non-numeric '{name}'"))?;
            values.push(v as f32);
        }
    }

    Ok(Table::from_columns(columns))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one numeric column per feature.
///
/// Float64/Float32/Int64/Int32 columns become features (widened or narrowed
/// to `f32`); anything else is skipped with a warning.  Works with files
/// written by both **Pandas** (`df.to_parquet()`) and **Polars**
/// (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut names: Vec<String> = Vec::new();
    let mut columns: Vec<Vec<f32>> = Vec::new();
    let mut first_batch = true;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        if first_batch {
            for field in schema.fields() {
                if numeric_type(field.data_type()) {
                    names.push(field.name().clone());
                } else {
                    log::warn!(
                        "Skipping non-numeric column '{}' ({:?})",
                        field.name(),
                        field.data_type()
                    );
                }
            }
            if names.is_empty() {
                bail!("Parquet file has no numeric columns");
            }
            columns = vec![Vec::new(); names.len()];
            first_batch = false;
        }

        for (i, name) in names.iter().enumerate() {
            let col_idx = schema
                .index_of(name)
                .with_context(|| format!("column '{name}' missing from a later batch"))?;
            append_numeric(batch.column(col_idx), &mut columns[i])
                .with_context(|| format!("reading column '{name}'"))?;
        }
    }

    if first_batch {
        bail!("Parquet file contains no record batches");
    }

    Ok(Table::from_columns(
        names.into_iter().zip(columns).collect(),
    ))
}

// -- Parquet / Arrow helpers --

fn numeric_type(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Float64 | DataType::Float32 | DataType::Int64 | DataType::Int32
    )
}

/// Append an Arrow numeric column to an `f32` buffer.  Nulls become NaN.
fn append_numeric(col: &Arc<dyn Array>, out: &mut Vec<f32>) -> Result<()> {
    match col.data_type() {
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            out.extend(arr.iter().map(|v| v.map(|x| x as f32).unwrap_or(f32::NAN)));
        }
        DataType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            out.extend(arr.iter().map(|v| v.unwrap_or(f32::NAN)));
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            out.extend(arr.iter().map(|v| v.map(|x| x as f32).unwrap_or(f32::NAN)));
        }
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            out.extend(arr.iter().map(|v| v.map(|x| x as f32).unwrap_or(f32::NAN)));
        }
        other => bail!("Expected a numeric column, got {other:?}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_numeric_columns_become_features() {
        let path = write_temp(
            "rusty_window_loader_basic.csv",
            "Open,Mid,Close\n1.0,1.5,2.0\n2.0,2.5,3.0\n",
        );
        let table = load_file(&path).unwrap();
        assert_eq!(
            table.schema.names(),
            &["Open".to_string(), "Mid".to_string(), "Close".to_string()]
        );
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.values[[1, 1]], 2.5);
    }

    #[test]
    fn csv_non_numeric_column_is_dropped() {
        let path = write_temp(
            "rusty_window_loader_mixed.csv",
            "Date,Mid\n2024-01-01,1.5\n2024-01-02,2.5\n",
        );
        let table = load_file(&path).unwrap();
        assert_eq!(table.schema.names(), &["Mid".to_string()]);
        assert_eq!(table.num_rows(), 2);
    }

    #[test]
    fn csv_without_numeric_columns_fails() {
        let path = write_temp("rusty_window_loader_text.csv", "Date\n2024-01-01\n");
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn json_records_load_with_sorted_columns() {
        let path = write_temp(
            "rusty_window_loader.json",
            r#"[{"Mid": 1.0, "Open": 0.5}, {"Mid": 2.0, "Open": 1.5}]"#,
        );
        let table = load_file(&path).unwrap();
        assert_eq!(
            table.schema.names(),
            &["Mid".to_string(), "Open".to_string()]
        );
        assert_eq!(table.values[[1, 0]], 2.0);
    }

    #[test]
    fn unsupported_extension_fails() {
        assert!(load_file(Path::new("data.xlsx")).is_err());
    }
}
