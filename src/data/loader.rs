use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Float64Array, StringArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{OrderDataset, OrderRecord};

pub const COL_TIMESTAMP: &str = "order_purchase_timestamp";
pub const COL_ORDER_ID: &str = "order_id";
pub const COL_CUSTOMER: &str = "customer_unique_id";
pub const COL_STATUS: &str = "order_status";
pub const COL_CATEGORY: &str = "product_category_name";
pub const COL_PRICE: &str = "price";
pub const COL_TOTAL_REVENUE: &str = "total_revenue";

/// Columns every input file must provide. Any others are ignored.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    COL_TIMESTAMP,
    COL_ORDER_ID,
    COL_CUSTOMER,
    COL_STATUS,
    COL_CATEGORY,
    COL_PRICE,
    COL_TOTAL_REVENUE,
];

// ---------------------------------------------------------------------------
// Schema errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("row {row}: '{value}' is not a valid purchase timestamp")]
    BadTimestamp { row: usize, value: String },
    #[error("row {row}: column '{column}' value '{value}' is not a number")]
    BadNumber {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("row {row}: column '{column}' is empty")]
    EmptyField { row: usize, column: &'static str },
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an order export from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one line item per row (the usual export)
/// * `.json`    – `[{ "order_id": ..., "price": ..., ... }, ...]`
/// * `.parquet` / `.pq` – flat table with the same column names
pub fn load_file(path: &Path) -> Result<OrderDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let orders = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    Ok(OrderDataset::from_orders(orders))
}

// ---------------------------------------------------------------------------
// Format-neutral row
// ---------------------------------------------------------------------------

/// A row with text columns extracted but the timestamp still unparsed.
struct RawOrder {
    timestamp: String,
    order_id: String,
    customer_unique_id: String,
    order_status: String,
    product_category_name: Option<String>,
    price: Option<f64>,
    total_revenue: Option<f64>,
}

impl RawOrder {
    fn into_record(self, row: usize) -> Result<OrderRecord, SchemaError> {
        let purchase_timestamp =
            parse_timestamp(&self.timestamp).ok_or_else(|| SchemaError::BadTimestamp {
                row,
                value: self.timestamp.clone(),
            })?;
        Ok(OrderRecord {
            purchase_timestamp,
            order_id: require(self.order_id, row, COL_ORDER_ID)?,
            customer_unique_id: require(self.customer_unique_id, row, COL_CUSTOMER)?,
            order_status: require(self.order_status, row, COL_STATUS)?,
            product_category_name: self.product_category_name.filter(|c| !c.is_empty()),
            price: self.price,
            total_revenue: self.total_revenue,
        })
    }
}

fn require(value: String, row: usize, column: &'static str) -> Result<String, SchemaError> {
    if value.is_empty() {
        Err(SchemaError::EmptyField { row, column })
    } else {
        Ok(value)
    }
}

/// Parse a purchase timestamp.
///
/// Accepts `2017-10-02 10:56:33`, fractional seconds, a `T` separator,
/// an RFC 3339 offset (converted to its local wall-clock time) or a bare date.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.naive_local());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn parse_number(
    raw: Option<&str>,
    row: usize,
    column: &'static str,
) -> Result<Option<f64>, SchemaError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(tok) if tok.eq_ignore_ascii_case("nan") => Ok(None),
        Some(tok) => tok
            .parse::<f64>()
            .map(Some)
            .map_err(|_| SchemaError::BadNumber {
                row,
                column,
                value: tok.to_string(),
            }),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CsvRow {
    order_purchase_timestamp: String,
    order_id: String,
    customer_unique_id: String,
    order_status: String,
    product_category_name: Option<String>,
    price: Option<String>,
    total_revenue: Option<String>,
}

fn load_csv(path: &Path) -> Result<Vec<OrderRecord>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers = reader.headers().context("reading CSV headers")?.clone();
    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == col) {
            return Err(SchemaError::MissingColumn(col).into());
        }
    }

    let mut orders = Vec::new();
    for (row_no, result) in reader.deserialize::<CsvRow>().enumerate() {
        let rec = result.with_context(|| format!("CSV row {row_no}"))?;
        let raw = RawOrder {
            price: parse_number(rec.price.as_deref(), row_no, COL_PRICE)?,
            total_revenue: parse_number(rec.total_revenue.as_deref(), row_no, COL_TOTAL_REVENUE)?,
            timestamp: rec.order_purchase_timestamp,
            order_id: rec.order_id,
            customer_unique_id: rec.customer_unique_id,
            order_status: rec.order_status,
            product_category_name: rec.product_category_name,
        };
        orders.push(raw.into_record(row_no)?);
    }

    Ok(orders)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, as written by `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "order_purchase_timestamp": "2017-10-02 10:56:33",
///     "order_id": "e481f51cbdc54678b7cc49136f2d6af7",
///     "customer_unique_id": "7c396fd4830fd04220f754e42b4e5bff",
///     "order_status": "delivered",
///     "product_category_name": "utilidades_domesticas",
///     "price": 29.99,
///     "total_revenue": 13591643.7
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Vec<OrderRecord>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut orders = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let text_field = |col: &'static str| -> Result<Option<String>, SchemaError> {
            match obj.get(col) {
                None => Err(SchemaError::MissingColumn(col)),
                Some(v) => Ok(json_to_text(v)),
            }
        };
        let number_field = |col: &'static str| -> Result<Option<f64>, SchemaError> {
            match obj.get(col) {
                None => Err(SchemaError::MissingColumn(col)),
                Some(JsonValue::Number(n)) => Ok(n.as_f64()),
                Some(JsonValue::String(s)) => parse_number(Some(s.as_str()), i, col),
                Some(JsonValue::Null) => Ok(None),
                Some(other) => Err(SchemaError::BadNumber {
                    row: i,
                    column: col,
                    value: other.to_string(),
                }),
            }
        };

        let raw = RawOrder {
            timestamp: text_field(COL_TIMESTAMP)?.unwrap_or_default(),
            order_id: text_field(COL_ORDER_ID)?.unwrap_or_default(),
            customer_unique_id: text_field(COL_CUSTOMER)?.unwrap_or_default(),
            order_status: text_field(COL_STATUS)?.unwrap_or_default(),
            product_category_name: text_field(COL_CATEGORY)?,
            price: number_field(COL_PRICE)?,
            total_revenue: number_field(COL_TOTAL_REVENUE)?,
        };
        orders.push(raw.into_record(i)?);
    }

    Ok(orders)
}

fn json_to_text(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet order export.
///
/// Each required column is cast to a uniform Arrow type first: text columns
/// (and the timestamp, whether stored as `Timestamp`, `Date32` or text) to
/// `Utf8`, the money columns to `Float64`. Works with files written by both
/// **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Vec<OrderRecord>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut orders = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let timestamps = text_column(&batch, COL_TIMESTAMP)?;
        let order_ids = text_column(&batch, COL_ORDER_ID)?;
        let customers = text_column(&batch, COL_CUSTOMER)?;
        let statuses = text_column(&batch, COL_STATUS)?;
        let categories = text_column(&batch, COL_CATEGORY)?;
        let prices = float_column(&batch, COL_PRICE)?;
        let revenues = float_column(&batch, COL_TOTAL_REVENUE)?;

        let base = orders.len();
        for row in 0..batch.num_rows() {
            let raw = RawOrder {
                timestamp: text_at(&timestamps, row).unwrap_or_default(),
                order_id: text_at(&order_ids, row).unwrap_or_default(),
                customer_unique_id: text_at(&customers, row).unwrap_or_default(),
                order_status: text_at(&statuses, row).unwrap_or_default(),
                product_category_name: text_at(&categories, row),
                price: float_at(&prices, row),
                total_revenue: float_at(&revenues, row),
            };
            orders.push(raw.into_record(base + row)?);
        }
    }

    Ok(orders)
}

// -- Parquet / Arrow helpers --

fn cast_column(batch: &RecordBatch, name: &'static str, to: &DataType) -> Result<Arc<dyn Array>> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| SchemaError::MissingColumn(name))?;
    cast(batch.column(idx).as_ref(), to).with_context(|| format!("casting column '{name}' to {to:?}"))
}

fn text_column(batch: &RecordBatch, name: &'static str) -> Result<StringArray> {
    let arr = cast_column(batch, name, &DataType::Utf8)?;
    let strings = arr
        .as_any()
        .downcast_ref::<StringArray>()
        .context("expected StringArray after cast")?;
    Ok(strings.clone())
}

fn float_column(batch: &RecordBatch, name: &'static str) -> Result<Float64Array> {
    let arr = cast_column(batch, name, &DataType::Float64)?;
    let floats = arr
        .as_any()
        .downcast_ref::<Float64Array>()
        .context("expected Float64Array after cast")?;
    Ok(floats.clone())
}

fn text_at(arr: &StringArray, row: usize) -> Option<String> {
    (!arr.is_null(row)).then(|| arr.value(row).to_string())
}

fn float_at(arr: &Float64Array, row: usize) -> Option<f64> {
    (!arr.is_null(row))
        .then(|| arr.value(row))
        .filter(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::array::{
        ArrayRef, Date32Array, Float64Array, Int32Array, Int64Array, StringArray,
        TimestampSecondArray,
    };
    use arrow::datatypes::{Field, Schema, TimeUnit};
    use parquet::arrow::ArrowWriter;
    use tempfile::NamedTempFile;

    use super::*;

    const HEADER: &str = "order_id,customer_unique_id,order_status,order_purchase_timestamp,\
                          product_category_name,price,total_revenue,freight_value\n";

    fn write_temp(suffix: &str, contents: &str) -> NamedTempFile {
        let mut tmp = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        write!(tmp, "{contents}").unwrap();
        tmp
    }

    /// Write one batch with the required columns; `timestamp`, `price` and
    /// `total_revenue` carry their own Arrow types.
    fn write_parquet(
        suffix: &str,
        timestamp: ArrayRef,
        price: ArrayRef,
        total_revenue: ArrayRef,
    ) -> NamedTempFile {
        let rows = timestamp.len();
        let schema = Arc::new(Schema::new(vec![
            Field::new(COL_TIMESTAMP, timestamp.data_type().clone(), true),
            Field::new(COL_ORDER_ID, DataType::Utf8, false),
            Field::new(COL_CUSTOMER, DataType::Utf8, false),
            Field::new(COL_STATUS, DataType::Utf8, false),
            Field::new(COL_CATEGORY, DataType::Utf8, true),
            Field::new(COL_PRICE, price.data_type().clone(), true),
            Field::new(COL_TOTAL_REVENUE, total_revenue.data_type().clone(), true),
        ]));
        let ids: Vec<String> = (1..=rows).map(|i| format!("o{i}")).collect();
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                timestamp,
                Arc::new(StringArray::from_iter_values(ids.iter())),
                Arc::new(StringArray::from_iter_values(std::iter::repeat("c1").take(rows))),
                Arc::new(StringArray::from_iter_values(std::iter::repeat("delivered").take(rows))),
                Arc::new(StringArray::from_iter((0..rows).map(|i| (i == 0).then_some("toys")))),
                price,
                total_revenue,
            ],
        )
        .unwrap();

        let tmp = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(std::fs::File::create(tmp.path()).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        tmp
    }

    #[test]
    fn loads_csv_with_extra_columns_and_missing_values() {
        let csv = format!(
            "{HEADER}\
             o1,c1,delivered,2017-10-02 10:56:33,toys,10.5,10.5,1.0\n\
             o1,c1,delivered,2017-10-02 10:56:33,,4.5,15.0,1.0\n\
             o2,c2,canceled,2017-11-18 19:28:06.123,bed_bath,,15.0,2.0\n"
        );
        let tmp = write_temp(".csv", &csv);
        let ds = load_file(tmp.path()).unwrap();

        assert_eq!(ds.len(), 3);
        assert_eq!(ds.orders[0].price, Some(10.5));
        assert_eq!(ds.orders[1].product_category_name, None);
        assert_eq!(ds.orders[2].price, None);
        assert_eq!(ds.statuses, vec!["delivered", "canceled"]);
        assert_eq!(ds.categories, vec!["toys", "bed_bath"]);
        assert_eq!(
            ds.date_bounds.map(|(lo, hi)| (lo.to_string(), hi.to_string())),
            Some(("2017-10-02".to_string(), "2017-11-18".to_string()))
        );
    }

    #[test]
    fn csv_missing_column_is_a_schema_error() {
        let tmp = write_temp(".csv", "order_id,price\no1,1.0\n");
        let err = load_file(tmp.path()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SchemaError>(),
            Some(&SchemaError::MissingColumn(COL_TIMESTAMP))
        );
    }

    #[test]
    fn csv_bad_timestamp_reports_row() {
        let csv = format!("{HEADER}o1,c1,delivered,yesterday,toys,1.0,1.0,0\n");
        let tmp = write_temp(".csv", &csv);
        let err = load_file(tmp.path()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SchemaError>(),
            Some(&SchemaError::BadTimestamp {
                row: 0,
                value: "yesterday".to_string()
            })
        );
    }

    #[test]
    fn csv_bad_price_is_rejected() {
        let csv = format!("{HEADER}o1,c1,delivered,2017-10-02,toys,cheap,1.0,0\n");
        let tmp = write_temp(".csv", &csv);
        let err = load_file(tmp.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SchemaError>(),
            Some(SchemaError::BadNumber { column: COL_PRICE, .. })
        ));
    }

    #[test]
    fn loads_json_records() {
        let json = r#"[
            {"order_purchase_timestamp": "2018-01-01T09:00:00", "order_id": 17,
             "customer_unique_id": "c1", "order_status": "delivered",
             "product_category_name": null, "price": 12.0, "total_revenue": "12.0"}
        ]"#;
        let tmp = write_temp(".json", json);
        let ds = load_file(tmp.path()).unwrap();
        let rec = &ds.orders[0];
        assert_eq!(rec.order_id, "17");
        assert_eq!(rec.product_category_name, None);
        assert_eq!(rec.total_revenue, Some(12.0));
        assert!(ds.categories.is_empty());
    }

    #[test]
    fn loads_parquet_with_native_timestamps() {
        // 2017-10-02 10:56:33 UTC
        let tmp = write_parquet(
            ".parquet",
            Arc::new(TimestampSecondArray::from(vec![1_506_941_793])),
            Arc::new(Float64Array::from(vec![Some(9.5)])),
            Arc::new(Float64Array::from(vec![Some(9.5)])),
        );

        let ds = load_file(tmp.path()).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(
            ds.orders[0].purchase_timestamp,
            parse_timestamp("2017-10-02 10:56:33").unwrap()
        );
        assert_eq!(ds.orders[0].price, Some(9.5));
        assert_eq!(ds.categories, vec!["toys"]);
    }

    #[test]
    fn loads_pq_with_date32_and_integer_money() {
        // 17441 days after the epoch is 2017-10-02.
        let tmp = write_parquet(
            ".pq",
            Arc::new(Date32Array::from(vec![17_441, 17_442])),
            Arc::new(Int64Array::from(vec![Some(12), None])),
            Arc::new(Int32Array::from(vec![Some(12), Some(12)])),
        );

        let ds = load_file(tmp.path()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(
            ds.orders[0].purchase_timestamp,
            parse_timestamp("2017-10-02 00:00:00").unwrap()
        );
        assert_eq!(
            ds.orders[1].purchase_timestamp,
            parse_timestamp("2017-10-03 00:00:00").unwrap()
        );
        assert_eq!(ds.orders[0].price, Some(12.0));
        assert_eq!(ds.orders[1].price, None);
        assert_eq!(ds.orders[1].total_revenue, Some(12.0));
        assert_eq!(ds.orders[1].product_category_name, None);
    }

    #[test]
    fn loads_parquet_with_text_timestamps() {
        let tmp = write_parquet(
            ".parquet",
            Arc::new(StringArray::from(vec![
                "2018-01-01 09:00:00",
                "2018-01-02T17:30:00",
            ])),
            Arc::new(Float64Array::from(vec![Some(1.25), Some(2.0)])),
            Arc::new(Float64Array::from(vec![Some(1.25), Some(3.25)])),
        );

        let ds = load_file(tmp.path()).unwrap();
        assert_eq!(
            ds.orders[1].purchase_timestamp,
            parse_timestamp("2018-01-02 17:30:00").unwrap()
        );
        assert_eq!(
            ds.date_bounds.map(|(lo, hi)| (lo.to_string(), hi.to_string())),
            Some(("2018-01-01".to_string(), "2018-01-02".to_string()))
        );
    }

    #[test]
    fn parquet_bad_text_timestamp_reports_row() {
        let tmp = write_parquet(
            ".parquet",
            Arc::new(StringArray::from(vec!["2018-01-01", "soon"])),
            Arc::new(Float64Array::from(vec![Some(1.0), Some(1.0)])),
            Arc::new(Float64Array::from(vec![Some(1.0), Some(2.0)])),
        );

        let err = load_file(tmp.path()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<SchemaError>(),
            Some(&SchemaError::BadTimestamp {
                row: 1,
                value: "soon".to_string()
            })
        );
    }

    #[test]
    fn unsupported_extension() {
        let tmp = write_temp(".xlsx", "");
        assert!(load_file(tmp.path()).is_err());
    }

    #[test]
    fn timestamp_formats() {
        let expected = parse_timestamp("2017-10-02 00:00:00").unwrap();
        assert_eq!(parse_timestamp("2017-10-02"), Some(expected));
        assert_eq!(parse_timestamp("2017-10-02T00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2017-10-02T00:00:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("02/10/2017"), None);
    }
}
