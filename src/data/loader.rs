use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray, Float32Array, Float64Array, StringArray};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Curve, CurveSet, Sample, SiteCurve};

const PERIOD: &str = "period";
const RESPONSE: &str = "response";
const STANDARD_ERROR: &str = "standard_error";
const SITE: &str = "site";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load residual site-response curves from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – flat `period`, `response`, `standard_error` columns, optional `site`
/// * `.json`    – `[{ "site": "...", "period": [...], "response": [...], "standard_error": [...] }, ...]`
/// * `.csv`     – same flat columns as Parquet, one row per sample
///
/// Missing values become NaN and are left for [`super::filter::clean`].
pub fn load_file(path: &Path) -> Result<CurveSet> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let set = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }?;
    log::info!("loaded {} curve(s) from {}", set.len(), path.display());
    Ok(set)
}

// ---------------------------------------------------------------------------
// Row grouping shared by the flat formats
// ---------------------------------------------------------------------------

/// Collects rows into curves; consecutive rows with the same site belong to
/// the same curve.
#[derive(Default)]
struct CurveGrouper {
    curves: Vec<SiteCurve>,
}

impl CurveGrouper {
    fn push(&mut self, site: &str, sample: Sample) {
        match self.curves.last_mut() {
            Some(last) if last.site == site => last.curve.push(sample),
            _ => self.curves.push(SiteCurve {
                site: site.to_string(),
                curve: Curve::from_samples([sample]),
            }),
        }
    }

    fn finish(self) -> CurveSet {
        CurveSet::from_curves(self.curves)
    }
}

/// Site name used when a file has no `site` column or record field.
fn default_site(index: usize) -> String {
    format!("curve-{index}")
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (one record per curve):
///
/// ```json
/// [
///   {
///     "site": "CA.SITE1",
///     "period": [0.01, 0.02, ...],
///     "response": [0.12, null, ...],
///     "standard_error": [0.05, 0.06, ...]
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<CurveSet> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

fn parse_json(text: &str) -> Result<CurveSet> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut curves = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Record {i} is not a JSON object"))?;

        let period = json_array_to_f64(obj.get(PERIOD), i, PERIOD)?;
        let response = json_array_to_f64(obj.get(RESPONSE), i, RESPONSE)?;
        let standard_error = json_array_to_f64(obj.get(STANDARD_ERROR), i, STANDARD_ERROR)?;

        if period.len() != response.len() || period.len() != standard_error.len() {
            bail!(
                "Record {i}: period has {} values, response {}, standard_error {}",
                period.len(),
                response.len(),
                standard_error.len()
            );
        }

        let site = match obj.get(SITE) {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Null) | None => default_site(i),
            Some(other) => other.to_string(),
        };

        curves.push(SiteCurve {
            site,
            curve: Curve::new(period, response, standard_error),
        });
    }

    Ok(CurveSet::from_curves(curves))
}

fn json_array_to_f64(val: Option<&JsonValue>, record: usize, key: &str) -> Result<Vec<f64>> {
    let arr = val
        .and_then(|v| v.as_array())
        .with_context(|| format!("Record {record}: missing or invalid '{key}' array"))?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| match v {
            JsonValue::Null => Ok(f64::NAN),
            _ => v
                .as_f64()
                .with_context(|| format!("Record {record}, {key}[{j}]: not a number")),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row, then one row per sample.
///
/// ```text
/// site,period,response,standard_error
/// CA.SITE1,0.01,0.12,0.05
/// CA.SITE1,0.02,,0.06
/// ```
///
/// Empty cells are NaN. Without a `site` column the file is a single curve.
fn load_csv(path: &Path) -> Result<CurveSet> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<CurveSet> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("CSV missing '{name}' column"))
    };
    let period_idx = column(PERIOD)?;
    let response_idx = column(RESPONSE)?;
    let se_idx = column(STANDARD_ERROR)?;
    let site_idx = headers.iter().position(|h| h == SITE);

    let fallback = default_site(0);
    let mut grouper = CurveGrouper::default();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let cell = |idx: usize, col: &str| parse_cell(record.get(idx).unwrap_or(""), row_no, col);
        let sample = Sample {
            period: cell(period_idx, PERIOD)?,
            response: cell(response_idx, RESPONSE)?,
            standard_error: cell(se_idx, STANDARD_ERROR)?,
        };

        let site = site_idx
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(fallback.as_str());
        grouper.push(site, sample);
    }

    Ok(grouper.finish())
}

fn parse_cell(s: &str, row: usize, col: &str) -> Result<f64> {
    let tok = s.trim();
    if tok.is_empty() {
        return Ok(f64::NAN);
    }
    tok.parse::<f64>()
        .with_context(|| format!("Row {row}, {col}: '{tok}' is not a number"))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one row per sample.
///
/// Expected schema:
/// - `period`, `response`, `standard_error`: Float64 or Float32, nullable
/// - `site`: optional Utf8 / LargeUtf8
///
/// Consecutive rows sharing a site form one curve, across record batches.
fn load_parquet(path: &Path) -> Result<CurveSet> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let fallback = default_site(0);
    let mut grouper = CurveGrouper::default();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let column = |name: &str| -> Result<Vec<f64>> {
            let idx = schema
                .index_of(name)
                .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))?;
            extract_f64_column(batch.column(idx)).with_context(|| format!("reading '{name}'"))
        };
        let period = column(PERIOD)?;
        let response = column(RESPONSE)?;
        let standard_error = column(STANDARD_ERROR)?;

        let sites = match schema.index_of(SITE) {
            Ok(idx) => Some(extract_string_column(batch.column(idx)).context("reading 'site'")?),
            Err(_) => None,
        };

        for row in 0..batch.num_rows() {
            let site = sites
                .as_ref()
                .and_then(|s| s[row].as_deref())
                .unwrap_or(fallback.as_str());
            grouper.push(
                site,
                Sample {
                    period: period[row],
                    response: response[row],
                    standard_error: standard_error[row],
                },
            );
        }
    }

    Ok(grouper.finish())
}

// -- Parquet / Arrow helpers --

/// Read a Float64 or Float32 column; nulls become NaN.
fn extract_f64_column(col: &Arc<dyn Array>) -> Result<Vec<f64>> {
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        Ok(arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        Ok(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect())
    } else {
        bail!("column type is {:?}, expected Float64 or Float32", col.data_type())
    }
}

fn extract_string_column(col: &Arc<dyn Array>) -> Result<Vec<Option<String>>> {
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok(arr.iter().map(|v| v.map(str::to_string)).collect())
        }
        DataType::LargeUtf8 => {
            let arr = col.as_string::<i64>();
            Ok(arr.iter().map(|v| v.map(str::to_string)).collect())
        }
        other => bail!("site column type is {other:?}, expected Utf8"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_records_with_nulls() {
        let set = parse_json(
            r#"[
                {"site": "A", "period": [0.1, 0.2], "response": [1.0, null], "standard_error": [0.1, 0.1]},
                {"period": [0.3], "response": [2.0], "standard_error": [0.2]}
            ]"#,
        )
        .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.curves[0].site, "A");
        assert!(set.curves[0].curve.response[1].is_nan());
        assert_eq!(set.curves[1].site, "curve-1");
    }

    #[test]
    fn json_length_mismatch_is_error() {
        let err = parse_json(r#"[{"period": [0.1, 0.2], "response": [1.0], "standard_error": [0.1, 0.1]}]"#);
        assert!(err.is_err());
    }

    #[test]
    fn csv_groups_consecutive_sites() {
        let text = "site,period,response,standard_error\n\
                    A,0.1,0.0,0.1\n\
                    A,0.2,,0.1\n\
                    B,0.1,1.0,0.2\n";
        let set = read_csv(csv::Reader::from_reader(text.as_bytes())).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.curves[0].curve.len(), 2);
        assert!(set.curves[0].curve.response[1].is_nan());
        assert_eq!(set.get("B").unwrap().curve.response, vec![1.0]);
    }

    #[test]
    fn csv_without_site_is_one_curve() {
        let text = "period,response,standard_error\n0.1,0.0,0.1\n0.2,0.5,0.1\n";
        let set = read_csv(csv::Reader::from_reader(text.as_bytes())).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.curves[0].site, "curve-0");
    }

    #[test]
    fn csv_missing_column_is_error() {
        let text = "period,response\n0.1,0.0\n";
        assert!(read_csv(csv::Reader::from_reader(text.as_bytes())).is_err());
    }

    #[test]
    fn unsupported_extension_is_error() {
        assert!(load_file(Path::new("curves.xlsx")).is_err());
    }
}
