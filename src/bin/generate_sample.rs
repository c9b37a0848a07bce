use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ROWS: usize = 120;

/// Box-Muller transform for a normal sample.
fn gauss(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-15);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

/// Sample table with something for every analyzer to find:
/// * `revenue` trends upward, `cost` tracks it (correlation)
/// * three store segments with distinct `basket_size` / `visits` (clusters)
/// * a handful of injected `returns` spikes (anomalies)
/// * `region` is categorical and only shows up in the summary
struct Sample {
    week: Vec<i64>,
    region: Vec<String>,
    revenue: Vec<f64>,
    cost: Vec<f64>,
    basket_size: Vec<f64>,
    visits: Vec<f64>,
    returns: Vec<f64>,
}

fn generate(rng: &mut StdRng) -> Sample {
    let regions = ["north", "south", "east", "west"];
    let segments = [(12.0, 300.0), (35.0, 120.0), (60.0, 40.0)];
    let spikes = [17, 58, 93];

    let mut s = Sample {
        week: Vec::with_capacity(ROWS),
        region: Vec::with_capacity(ROWS),
        revenue: Vec::with_capacity(ROWS),
        cost: Vec::with_capacity(ROWS),
        basket_size: Vec::with_capacity(ROWS),
        visits: Vec::with_capacity(ROWS),
        returns: Vec::with_capacity(ROWS),
    };

    for i in 0..ROWS {
        let revenue = 1_000.0 + 25.0 * i as f64 + gauss(rng, 0.0, 60.0);
        let (basket, visits) = segments[i % segments.len()];

        s.week.push(i as i64);
        s.region.push(regions[rng.gen_range(0..regions.len())].to_string());
        s.revenue.push(revenue);
        s.cost.push(0.6 * revenue + gauss(rng, 0.0, 30.0));
        s.basket_size.push(gauss(rng, basket, 2.0));
        s.visits.push(gauss(rng, visits, 10.0));
        s.returns.push(if spikes.contains(&i) {
            gauss(rng, 90.0, 5.0)
        } else {
            gauss(rng, 10.0, 1.5)
        });
    }
    s
}

fn write_parquet(sample: &Sample, path: &Path) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("week", DataType::Int64, false),
        Field::new("region", DataType::Utf8, false),
        Field::new("revenue", DataType::Float64, false),
        Field::new("cost", DataType::Float64, false),
        Field::new("basket_size", DataType::Float64, false),
        Field::new("visits", DataType::Float64, false),
        Field::new("returns", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(sample.week.clone())),
            Arc::new(StringArray::from(
                sample.region.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(sample.revenue.clone())),
            Arc::new(Float64Array::from(sample.cost.clone())),
            Arc::new(Float64Array::from(sample.basket_size.clone())),
            Arc::new(Float64Array::from(sample.visits.clone())),
            Arc::new(Float64Array::from(sample.returns.clone())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn write_csv(sample: &Sample, path: &Path) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["week", "region", "revenue", "cost", "basket_size", "visits", "returns"])?;
    for i in 0..sample.week.len() {
        writer.write_record([
            sample.week[i].to_string(),
            sample.region[i].clone(),
            format!("{:.3}", sample.revenue[i]),
            format!("{:.3}", sample.cost[i]),
            format!("{:.3}", sample.basket_size[i]),
            format!("{:.3}", sample.visits[i]),
            format!("{:.3}", sample.returns[i]),
        ])?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn main() -> Result<()> {
    let stem = std::env::args().nth(1).unwrap_or_else(|| "sample_data".to_string());
    let mut rng = StdRng::seed_from_u64(42);
    let sample = generate(&mut rng);

    let parquet_path = PathBuf::from(format!("{stem}.parquet"));
    let csv_path = PathBuf::from(format!("{stem}.csv"));
    write_parquet(&sample, &parquet_path)?;
    write_csv(&sample, &csv_path)?;

    println!(
        "Wrote {ROWS} rows to {} and {}",
        parquet_path.display(),
        csv_path.display()
    );
    Ok(())
}
