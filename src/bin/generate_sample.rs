//! Writes a reproducible synthetic campaign table for trying out the dashboard.
//!
//! Usage: `generate_sample [OUTPUT] [ROWS]`. Parquet by default, CSV when the
//! output path ends in `.csv`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use marketing_lens::data::model::{SpendCategory, BIRTH_YEAR_COLUMN, MARITAL_STATUS_COLUMN};

const SEED: u64 = 42;

const STATUSES: [(&str, u32); 8] = [
    ("Married", 864),
    ("Together", 580),
    ("Single", 480),
    ("Divorced", 232),
    ("Widow", 77),
    ("Alone", 3),
    ("Absurd", 2),
    ("YOLO", 2),
];

const EDUCATION: [&str; 5] = ["Graduation", "PhD", "Master", "2n Cycle", "Basic"];

/// Mean log-amount per spend category.
const SPEND_LOG_MEAN: [f64; 6] = [5.2, 2.6, 4.4, 2.9, 2.6, 3.4];

struct Customer {
    id: i64,
    birth_year: i64,
    education: String,
    marital_status: String,
    income: f64,
    spend: [f64; 6],
}

/// Box-Muller transform for normal distribution
fn gauss(rng: &mut impl Rng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-15);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

fn generate(rows: usize) -> Result<Vec<Customer>> {
    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let status_dist = WeightedIndex::new(STATUSES.iter().map(|(_, w)| *w))
        .context("building marital status weights")?;

    let customers = (0..rows)
        .map(|i| {
            // A handful of implausible birth years, as in the real campaign data.
            let birth_year = if rng.gen_ratio(1, 800) {
                rng.gen_range(1893..1901)
            } else {
                gauss(&mut rng, 1969.0, 12.0).round().clamp(1940.0, 2005.0) as i64
            };
            let income = gauss(&mut rng, 52_000.0, 21_000.0).max(1_730.0).round();
            let affluence = (income / 52_000.0).ln();

            let mut spend = [0.0; 6];
            for (slot, mean) in spend.iter_mut().zip(SPEND_LOG_MEAN) {
                *slot = gauss(&mut rng, mean + affluence, 1.0).exp().round();
            }

            Customer {
                id: i as i64,
                birth_year,
                education: EDUCATION[rng.gen_range(0..EDUCATION.len())].to_string(),
                marital_status: STATUSES[status_dist.sample(&mut rng)].0.to_string(),
                income,
                spend,
            }
        })
        .collect();
    Ok(customers)
}

fn write_csv(path: &Path, customers: &[Customer]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    let mut header = vec!["ID", BIRTH_YEAR_COLUMN, "Education", MARITAL_STATUS_COLUMN, "Income"];
    header.extend(SpendCategory::ALL.iter().map(|c| c.column()));
    writer.write_record(&header)?;

    for c in customers {
        let mut row = vec![
            c.id.to_string(),
            c.birth_year.to_string(),
            c.education.clone(),
            c.marital_status.clone(),
            c.income.to_string(),
        ];
        row.extend(c.spend.iter().map(|v| v.to_string()));
        writer.write_record(&row)?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(path: &Path, customers: &[Customer]) -> Result<()> {
    let mut fields = vec![
        Field::new("ID", DataType::Int64, false),
        Field::new(BIRTH_YEAR_COLUMN, DataType::Int64, false),
        Field::new("Education", DataType::Utf8, false),
        Field::new(MARITAL_STATUS_COLUMN, DataType::Utf8, false),
        Field::new("Income", DataType::Float64, false),
    ];
    fields.extend(
        SpendCategory::ALL
            .iter()
            .map(|c| Field::new(c.column(), DataType::Float64, false)),
    );
    let schema = Arc::new(Schema::new(fields));

    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(customers.iter().map(|c| c.id))),
        Arc::new(Int64Array::from_iter_values(customers.iter().map(|c| c.birth_year))),
        Arc::new(StringArray::from_iter_values(customers.iter().map(|c| &c.education))),
        Arc::new(StringArray::from_iter_values(customers.iter().map(|c| &c.marital_status))),
        Arc::new(Float64Array::from_iter_values(customers.iter().map(|c| c.income))),
    ];
    for slot in 0..SpendCategory::ALL.len() {
        columns.push(Arc::new(Float64Array::from_iter_values(
            customers.iter().map(|c| c.spend[slot]),
        )));
    }

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let output = args
        .next()
        .unwrap_or_else(|| "sample_campaign.parquet".to_string());
    let rows: usize = match args.next() {
        Some(n) => n.parse().context("ROWS must be a positive integer")?,
        None => 2240,
    };

    let customers = generate(rows)?;
    let path = Path::new(&output);
    if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("csv")) {
        write_csv(path, &customers)?;
    } else {
        write_parquet(path, &customers)?;
    }

    log::info!("Wrote {rows} customers to {output}");
    println!("Wrote {rows} customers to {output}");
    Ok(())
}
