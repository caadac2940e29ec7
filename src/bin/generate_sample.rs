use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Gaussian bump in ln(period).
fn bump(period: f64, center: f64, sigma: f64, amplitude: f64) -> f64 {
    let z = (period.ln() - center.ln()) / sigma;
    amplitude * (-0.5 * z * z).exp()
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
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
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

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

struct Scenario {
    site: &'static str,
    /// (center period, sigma in ln-period, amplitude)
    bumps: &'static [(f64, f64, f64)],
    noise: f64,
    standard_error: f64,
}

const SCENARIOS: &[Scenario] = &[
    Scenario { site: "FLAT", bumps: &[], noise: 0.02, standard_error: 0.1 },
    Scenario { site: "SINGLE_BUMP", bumps: &[(0.5, 0.25, 1.2)], noise: 0.03, standard_error: 0.1 },
    Scenario {
        site: "DOUBLE_BUMP",
        bumps: &[(0.08, 0.2, 0.9), (2.0, 0.25, 1.0)],
        noise: 0.03,
        standard_error: 0.1,
    },
    Scenario { site: "BROAD_HUMP", bumps: &[(0.3, 1.5, 0.8)], noise: 0.03, standard_error: 0.1 },
    Scenario { site: "UNCERTAIN", bumps: &[(0.5, 0.25, 1.2)], noise: 0.03, standard_error: 5.0 },
];

struct Rows {
    site: Vec<String>,
    period: Vec<f64>,
    response: Vec<f64>,
    standard_error: Vec<f64>,
}

fn generate(n_periods: usize, rng: &mut SimpleRng) -> Rows {
    let periods: Vec<f64> = (0..n_periods)
        .map(|i| 0.01 * 10f64.powf(3.0 * i as f64 / (n_periods - 1) as f64))
        .collect();

    let mut rows = Rows {
        site: Vec::new(),
        period: Vec::new(),
        response: Vec::new(),
        standard_error: Vec::new(),
    };
    for sc in SCENARIOS {
        for &t in &periods {
            let signal: f64 = sc.bumps.iter().map(|&(c, s, a)| bump(t, c, s, a)).sum();
            rows.site.push(sc.site.to_string());
            rows.period.push(t);
            rows.response.push(signal + rng.gauss(0.0, sc.noise));
            rows.standard_error.push(sc.standard_error * (1.0 + 0.1 * rng.next_f64()));
        }
    }
    rows
}

fn write_csv(path: &Path, rows: &Rows) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    writer
        .write_record(["site", "period", "response", "standard_error"])
        .context("writing CSV header")?;
    for i in 0..rows.period.len() {
        writer
            .write_record([
                rows.site[i].clone(),
                rows.period[i].to_string(),
                rows.response[i].to_string(),
                rows.standard_error[i].to_string(),
            ])
            .with_context(|| format!("writing CSV row {i}"))?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &Rows) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("site", DataType::Utf8, false),
        Field::new("period", DataType::Float64, false),
        Field::new("response", DataType::Float64, true),
        Field::new("standard_error", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(
                rows.site.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(rows.period.clone())),
            Arc::new(Float64Array::from(rows.response.clone())),
            Arc::new(Float64Array::from(rows.standard_error.clone())),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_curves.parquet".to_string());
    let path = Path::new(&output);

    let mut rng = SimpleRng::new(42);
    let rows = generate(120, &mut rng);

    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => write_csv(path, &rows)?,
        Some("parquet") | Some("pq") => write_parquet(path, &rows)?,
        _ => bail!("output must end in .csv or .parquet, got {output}"),
    }

    println!(
        "Wrote {} curves ({} periods each) to {output}",
        SCENARIOS.len(),
        rows.period.len() / SCENARIOS.len()
    );
    Ok(())
}
