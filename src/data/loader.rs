use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{
    CustomerRecord, FieldValue, SpendCategory, BIRTH_YEAR_COLUMN, MARITAL_STATUS_COLUMN,
};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load campaign records from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.tsv` – header row; the delimiter is a tab when the header
///   contains one, a comma otherwise
/// * `.json`         – `[{ "Year_Birth": 1970, "Marital_Status": "Single", ... }, ...]`
/// * `.parquet`      – flat columns named like the CSV header
///
/// Cells that are empty or cannot be read as the expected type become missing
/// values on the record; they never fail the load.
pub fn load_file(path: &Path) -> Result<Vec<CustomerRecord>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let records = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        "csv" | "tsv" | "txt" => load_delimited(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };
    log::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

// ---------------------------------------------------------------------------
// Cell → record mapping
// ---------------------------------------------------------------------------

/// Assign one named cell to the matching record field, or to `extra`.
fn assign_cell(record: &mut CustomerRecord, column: &str, value: FieldValue) {
    if column == BIRTH_YEAR_COLUMN {
        record.birth_year = value.as_i64().and_then(|y| i32::try_from(y).ok());
        return;
    }
    if column == MARITAL_STATUS_COLUMN {
        record.marital_status = match value {
            FieldValue::Null => None,
            FieldValue::String(s) => Some(s),
            other => Some(other.to_string()),
        };
        return;
    }
    if let Some(category) = SpendCategory::ALL.iter().find(|c| c.column() == column) {
        record.set_spend(*category, value.as_f64());
        return;
    }
    record.extra.insert(column.to_string(), value);
}

fn warn_missing_columns<'a>(columns: impl IntoIterator<Item = &'a str>) {
    let present: Vec<&str> = columns.into_iter().collect();
    let required = [BIRTH_YEAR_COLUMN, MARITAL_STATUS_COLUMN]
        .into_iter()
        .chain(SpendCategory::ALL.iter().map(|c| c.column()));
    for col in required {
        if !present.contains(&col) {
            log::warn!("Column '{col}' not found; every record will report it missing");
        }
    }
}

// ---------------------------------------------------------------------------
// CSV / TSV loader
// ---------------------------------------------------------------------------

fn load_delimited(path: &Path) -> Result<Vec<CustomerRecord>> {
    let text = std::fs::read_to_string(path).context("reading delimited file")?;
    parse_delimited(&text)
}

/// Parse delimited text with a header row.  Short rows leave their trailing
/// fields missing instead of failing.
pub fn parse_delimited(text: &str) -> Result<Vec<CustomerRecord>> {
    let header_line = text.lines().next().unwrap_or("");
    let delimiter = if header_line.contains('\t') { b'\t' } else { b',' };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    warn_missing_columns(headers.iter().map(String::as_str));

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        let mut record = CustomerRecord::default();
        for (col_idx, header) in headers.iter().enumerate() {
            let value = row.get(col_idx).map(FieldValue::parse).unwrap_or(FieldValue::Null);
            assign_cell(&mut record, header, value);
        }
        records.push(record);
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<Vec<CustomerRecord>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

/// Parse a records-oriented JSON array, as written by
/// `df.to_json(orient='records')`.
pub fn parse_json(text: &str) -> Result<Vec<CustomerRecord>> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut seen_columns = std::collections::BTreeSet::new();
    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        let mut record = CustomerRecord::default();
        for (key, val) in obj {
            seen_columns.insert(key.as_str());
            assign_cell(&mut record, key, json_to_field(val));
        }
        records.push(record);
    }
    if !records.is_empty() {
        warn_missing_columns(seen_columns);
    }
    Ok(records)
}

fn json_to_field(val: &JsonValue) -> FieldValue {
    match val {
        JsonValue::String(s) => FieldValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                FieldValue::Float(f)
            } else {
                FieldValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => FieldValue::Bool(*b),
        JsonValue::Null => FieldValue::Null,
        other => FieldValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per campaign attribute.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`, including
/// categoricals) and **Polars** (`df.write_parquet()`, including string views).
fn load_parquet(path: &Path) -> Result<Vec<CustomerRecord>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    warn_missing_columns(builder.schema().fields().iter().map(|f| f.name().as_str()));
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let columns: Vec<Option<ArrayRef>> = schema
            .fields()
            .iter()
            .zip(batch.columns())
            .map(|(field, col)| normalize_column(field.name(), col))
            .collect();
        for row in 0..batch.num_rows() {
            let mut record = CustomerRecord::default();
            for (field, col) in schema.fields().iter().zip(&columns) {
                let value = col
                    .as_ref()
                    .map_or(FieldValue::Null, |c| extract_field_value(c, row));
                assign_cell(&mut record, field.name(), value);
            }
            records.push(record);
        }
    }
    Ok(records)
}

// -- Parquet / Arrow helpers --

/// Bring a column to one of the types [`extract_field_value`] reads: strings,
/// `Int64`, `Float64` or `Boolean`. Integers widen to `Int64`, floats and
/// decimals become `Float64`, everything else is rendered as `Utf8`.
/// `None` when the column cannot be converted.
fn normalize_column(name: &str, col: &ArrayRef) -> Option<ArrayRef> {
    let target = match col.data_type() {
        DataType::Utf8
        | DataType::LargeUtf8
        | DataType::Utf8View
        | DataType::Int64
        | DataType::Float64
        | DataType::Boolean => return Some(col.clone()),
        t if t.is_integer() => DataType::Int64,
        t if t.is_floating() => DataType::Float64,
        DataType::Decimal128(..) | DataType::Decimal256(..) => DataType::Float64,
        _ => DataType::Utf8,
    };
    match cast(col, &target) {
        Ok(converted) => Some(converted),
        Err(e) => {
            log::warn!(
                "Column '{name}' of type {} cannot be read as {target}: {e}",
                col.data_type()
            );
            None
        }
    }
}

/// Extract a single cell from a normalized Arrow column at a given row.
fn extract_field_value(col: &ArrayRef, row: usize) -> FieldValue {
    if col.is_null(row) {
        return FieldValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => FieldValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => FieldValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Utf8View => FieldValue::String(col.as_string_view().value(row).to_string()),
        DataType::Int64 => FieldValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float64 => FieldValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => FieldValue::Bool(col.as_boolean().value(row)),
        _ => FieldValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{
        Decimal128Array, DictionaryArray, Float64Array, Int32Array, Int8Array,
        LargeStringArray, StringArray, StringViewArray, UInt16Array, UInt32Array,
    };
    use arrow::datatypes::{Field, Int32Type, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    const HEADER: &str = "ID\tYear_Birth\tMarital_Status\tMntWines\tMntFruits\tMntMeatProducts\tMntFishProducts\tMntSweetProducts\tMntGoldProds";

    #[test]
    fn tab_separated_campaign_rows() {
        let text = format!("{HEADER}\n5524\t1957\tSingle\t635\t88\t546\t172\t88\t88\n2174\t1954\tSingle\t11\t1\t6\t2\t1\t6\n");
        let records = parse_delimited(&text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].birth_year, Some(1957));
        assert_eq!(records[0].marital_status.as_deref(), Some("Single"));
        assert_eq!(records[0].spend(SpendCategory::Wines), Some(635.0));
        assert_eq!(records[1].spend(SpendCategory::GoldProds), Some(6.0));
        assert_eq!(records[0].extra.get("ID"), Some(&FieldValue::Integer(5524)));
    }

    #[test]
    fn comma_separated_with_blank_and_short_rows() {
        let text = "Year_Birth,Marital_Status,MntWines\n1980,,12.5\n1975\n,Married,abc\n";
        let records = parse_delimited(text).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].marital_status, None);
        assert_eq!(records[0].spend(SpendCategory::Wines), Some(12.5));
        assert_eq!(records[1].birth_year, Some(1975));
        assert_eq!(records[1].spend(SpendCategory::Wines), None);
        assert_eq!(records[2].birth_year, None);
        assert_eq!(records[2].spend(SpendCategory::Wines), None);
        // Columns absent from the header stay missing.
        assert_eq!(records[0].spend(SpendCategory::Fruits), None);
    }

    #[test]
    fn json_records() {
        let text = r#"[
            {"Year_Birth": 1990, "Marital_Status": "Married", "MntWines": 10, "Kidhome": 1},
            {"Year_Birth": null, "Marital_Status": "Alone", "MntWines": 2.5}
        ]"#;
        let records = parse_json(text).unwrap();
        assert_eq!(records[0].birth_year, Some(1990));
        assert_eq!(records[0].spend(SpendCategory::Wines), Some(10.0));
        assert_eq!(records[0].extra.get("Kidhome"), Some(&FieldValue::Integer(1)));
        assert_eq!(records[1].birth_year, None);
        assert_eq!(records[1].marital_status.as_deref(), Some("Alone"));
    }

    #[test]
    fn json_must_be_an_array_of_objects() {
        assert!(parse_json(r#"{"Year_Birth": 1990}"#).is_err());
        assert!(parse_json(r#"[1, 2]"#).is_err());
    }

    #[test]
    fn dispatches_on_extension() {
        let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "1\t1990\tTogether\t1\t1\t1\t1\t1\t1").unwrap();
        let records = load_file(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].marital_status.as_deref(), Some("Together"));

        let other = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        assert!(load_file(other.path()).is_err());
    }

    fn normalized_cell(col: ArrayRef, row: usize) -> FieldValue {
        let col = normalize_column("test", &col).expect("column converts");
        extract_field_value(&col, row)
    }

    #[test]
    fn arrow_string_views_and_categoricals_read_as_text() {
        let view: ArrayRef = Arc::new(StringViewArray::from(vec!["Single", "Married"]));
        assert_eq!(normalized_cell(view, 1), FieldValue::String("Married".into()));

        let dict: ArrayRef = Arc::new(
            vec!["Together", "Divorced", "Together"]
                .into_iter()
                .collect::<DictionaryArray<Int32Type>>(),
        );
        assert_eq!(normalized_cell(dict.clone(), 0), FieldValue::String("Together".into()));
        assert_eq!(normalized_cell(dict, 1), FieldValue::String("Divorced".into()));
    }

    #[test]
    fn arrow_numeric_types_widen() {
        let small: ArrayRef = Arc::new(Int8Array::from(vec![7i8]));
        assert_eq!(normalized_cell(small, 0), FieldValue::Integer(7));

        let unsigned: ArrayRef = Arc::new(UInt32Array::from(vec![1990u32]));
        assert_eq!(normalized_cell(unsigned, 0), FieldValue::Integer(1990));

        let decimal: ArrayRef = Arc::new(
            Decimal128Array::from(vec![1250i128])
                .with_precision_and_scale(10, 2)
                .unwrap(),
        );
        assert_eq!(normalized_cell(decimal, 0), FieldValue::Float(12.5));
    }

    #[test]
    fn parquet_round_trip_with_nulls_and_large_strings() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(BIRTH_YEAR_COLUMN, DataType::Int32, true),
            Field::new(MARITAL_STATUS_COLUMN, DataType::LargeUtf8, true),
            Field::new("MntWines", DataType::UInt16, false),
            Field::new("MntFruits", DataType::Float64, true),
            Field::new("Education", DataType::Utf8, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int32Array::from(vec![Some(1970), None])),
            Arc::new(LargeStringArray::from(vec![None, Some("Widow")])),
            Arc::new(UInt16Array::from(vec![635u16, 11])),
            Arc::new(Float64Array::from(vec![Some(88.0), None])),
            Arc::new(StringArray::from(vec!["PhD", "Basic"])),
        ];
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let records = load_file(file.path()).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].birth_year, Some(1970));
        assert_eq!(records[0].marital_status, None);
        assert_eq!(records[0].spend(SpendCategory::Wines), Some(635.0));
        assert_eq!(records[0].spend(SpendCategory::Fruits), Some(88.0));
        assert_eq!(
            records[0].extra.get("Education"),
            Some(&FieldValue::String("PhD".into()))
        );

        assert_eq!(records[1].birth_year, None);
        assert_eq!(records[1].marital_status.as_deref(), Some("Widow"));
        assert_eq!(records[1].spend(SpendCategory::Wines), Some(11.0));
        assert_eq!(records[1].spend(SpendCategory::Fruits), None);
    }
}
