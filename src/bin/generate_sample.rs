use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use parquet::arrow::ArrowWriter;
use serde::Serialize;

/// One exported line item, in the column layout the dashboard reads.
#[derive(Debug, Serialize)]
struct SampleRow {
    order_id: String,
    customer_unique_id: String,
    order_status: &'static str,
    order_purchase_timestamp: String,
    product_category_name: Option<&'static str>,
    price: f64,
    total_revenue: f64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n.max(1)
    }

    /// Pick from `(value, weight)` pairs.
    fn weighted<T: Copy>(&mut self, choices: &[(T, f64)]) -> T {
        let total: f64 = choices.iter().map(|(_, w)| w).sum();
        let mut target = self.next_f64() * total;
        for &(value, weight) in choices {
            if target < weight {
                return value;
            }
            target -= weight;
        }
        choices[choices.len() - 1].0
    }
}

const STATUSES: [(&str, f64); 6] = [
    ("delivered", 90.0),
    ("shipped", 4.0),
    ("canceled", 2.0),
    ("invoiced", 1.5),
    ("processing", 1.5),
    ("unavailable", 1.0),
];

const CATEGORIES: [(Option<&str>, f64); 14] = [
    (Some("cama_mesa_banho"), 11.0),
    (Some("beleza_saude"), 9.5),
    (Some("esporte_lazer"), 8.5),
    (Some("moveis_decoracao"), 8.0),
    (Some("informatica_acessorios"), 7.0),
    (Some("utilidades_domesticas"), 6.5),
    (Some("relogios_presentes"), 5.5),
    (Some("telefonia"), 4.5),
    (Some("ferramentas_jardim"), 4.0),
    (Some("automotivo"), 4.0),
    (Some("brinquedos"), 4.0),
    (Some("cool_stuff"), 3.5),
    (Some("perfumaria"), 3.0),
    (None, 1.5),
];

const N_ORDERS: usize = 2_000;
const N_CUSTOMERS: usize = 1_600;

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    // Purchases spread over 2017-01-01 .. 2018-08-31.
    let start: NaiveDateTime = NaiveDate::from_ymd_opt(2017, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid start date")?;
    let span_secs = 607 * 24 * 3600;

    let mut items: Vec<(NaiveDateTime, SampleRow)> = Vec::new();
    for order_no in 0..N_ORDERS {
        let order_id = format!("ord{order_no:06}");
        let customer = format!("cust{:05}", rng.below(N_CUSTOMERS));
        let status = rng.weighted(&STATUSES);
        let ts = start + Duration::seconds(rng.below(span_secs) as i64);

        // Most orders have one item, some have up to four.
        let n_items = 1 + rng.weighted(&[(0usize, 80.0), (1, 12.0), (2, 5.0), (3, 3.0)]);
        for _ in 0..n_items {
            let category = rng.weighted(&CATEGORIES);
            let price = ((5.0 + rng.next_f64().powi(3) * 900.0) * 100.0).round() / 100.0;
            items.push((
                ts,
                SampleRow {
                    order_id: order_id.clone(),
                    customer_unique_id: customer.clone(),
                    order_status: status,
                    order_purchase_timestamp: ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                    product_category_name: category,
                    price,
                    total_revenue: 0.0,
                },
            ));
        }
    }

    // total_revenue is the running price total in purchase order.
    items.sort_by_key(|(ts, _)| *ts);
    let mut running = 0.0;
    let rows: Vec<SampleRow> = items
        .into_iter()
        .map(|(_, mut row)| {
            running += row.price;
            row.total_revenue = (running * 100.0).round() / 100.0;
            row
        })
        .collect();

    write_csv("main_data.csv", &rows)?;
    write_parquet("main_data.parquet", &rows)?;

    println!(
        "Wrote {} line items for {N_ORDERS} orders to main_data.csv and main_data.parquet",
        rows.len()
    );
    Ok(())
}

fn write_csv(path: &str, rows: &[SampleRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(path: &str, rows: &[SampleRow]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("order_id", DataType::Utf8, false),
        Field::new("customer_unique_id", DataType::Utf8, false),
        Field::new("order_status", DataType::Utf8, false),
        Field::new("order_purchase_timestamp", DataType::Utf8, false),
        Field::new("product_category_name", DataType::Utf8, true),
        Field::new("price", DataType::Float64, false),
        Field::new("total_revenue", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.order_id.as_str()))),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.customer_unique_id.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.order_status))),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.order_purchase_timestamp.as_str()),
            )),
            Arc::new(
                rows.iter()
                    .map(|r| r.product_category_name)
                    .collect::<StringArray>(),
            ),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.price))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.total_revenue))),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}
