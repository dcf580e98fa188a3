//! Write a synthetic OHLC-style time series to CSV and Parquet, for trying
//! the inspector without real market data.

use std::sync::Arc;

use arrow::array::Float64Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ROWS: usize = 5000;

/// Box-Muller transform for normal samples.
fn gauss(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-15);
    let u2: f64 = rng.gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

fn main() {
    let mut rng = StdRng::seed_from_u64(42);

    let mut open = Vec::with_capacity(ROWS);
    let mut high = Vec::with_capacity(ROWS);
    let mut low = Vec::with_capacity(ROWS);
    let mut close = Vec::with_capacity(ROWS);
    let mut mid = Vec::with_capacity(ROWS);
    let mut volume = Vec::with_capacity(ROWS);

    // Geometric-ish random walk with intrabar noise.
    let mut price = 100.0_f64;
    for _ in 0..ROWS {
        let o = price;
        let c = o + gauss(&mut rng, 0.0, 0.6);
        let h = o.max(c) + rng.gen::<f64>() * 0.4;
        let l = o.min(c) - rng.gen::<f64>() * 0.4;
        let v = (gauss(&mut rng, 0.0, 1.0).abs() + 0.1) * 10_000.0;

        open.push(o);
        high.push(h);
        low.push(l);
        close.push(c);
        mid.push((h + l) / 2.0);
        volume.push(v);

        price = c;
    }

    write_csv("sample_series.csv", &open, &high, &low, &close, &mid, &volume);
    write_parquet("sample_series.parquet", &open, &high, &low, &close, &mid, &volume);

    println!("Wrote {ROWS} rows to sample_series.csv and sample_series.parquet");
}

#[allow(clippy::too_many_arguments)]
fn write_csv(
    path: &str,
    open: &[f64],
    high: &[f64],
    low: &[f64],
    close: &[f64],
    mid: &[f64],
    volume: &[f64],
) {
    let mut writer = csv::Writer::from_path(path).expect("Failed to create CSV file");
    writer
        .write_record(["Open", "High", "Low", "Close", "Mid", "Volume"])
        .expect("Failed to write CSV header");
    for i in 0..open.len() {
        writer
            .write_record([
                format!("{:.4}", open[i]),
                format!("{:.4}", high[i]),
                format!("{:.4}", low[i]),
                format!("{:.4}", close[i]),
                format!("{:.4}", mid[i]),
                format!("{:.1}", volume[i]),
            ])
            .expect("Failed to write CSV row");
    }
    writer.flush().expect("Failed to flush CSV");
}

#[allow(clippy::too_many_arguments)]
fn write_parquet(
    path: &str,
    open: &[f64],
    high: &[f64],
    low: &[f64],
    close: &[f64],
    mid: &[f64],
    volume: &[f64],
) {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Open", DataType::Float64, false),
        Field::new("High", DataType::Float64, false),
        Field::new("Low", DataType::Float64, false),
        Field::new("Close", DataType::Float64, false),
        Field::new("Mid", DataType::Float64, false),
        Field::new("Volume", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Float64Array::from(open.to_vec())),
            Arc::new(Float64Array::from(high.to_vec())),
            Arc::new(Float64Array::from(low.to_vec())),
            Arc::new(Float64Array::from(close.to_vec())),
            Arc::new(Float64Array::from(mid.to_vec())),
            Arc::new(Float64Array::from(volume.to_vec())),
        ],
    )
    .expect("Failed to create RecordBatch");

    let file = std::fs::File::create(path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}
