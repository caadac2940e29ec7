mod helpers;

use std::sync::Arc;

use arrow::array::{Float32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use tempfile::TempDir;

use site_peaks::data::loader::load_file;
use site_peaks::{DetectionConfig, identify_peaks};

#[test]
fn parquet_rows_group_by_site_and_nulls_become_nan() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("curves.parquet");

    let schema = Arc::new(Schema::new(vec![
        Field::new("site", DataType::Utf8, false),
        Field::new("period", DataType::Float64, false),
        Field::new("response", DataType::Float64, true),
        Field::new("standard_error", DataType::Float32, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(vec!["A", "A", "A", "B", "B"])),
            Arc::new(Float64Array::from(vec![0.1, 0.2, 0.3, 0.1, 0.2])),
            Arc::new(Float64Array::from(vec![Some(0.0), None, Some(1.0), Some(0.5), Some(0.4)])),
            Arc::new(Float32Array::from(vec![0.25f32, 0.25, 0.25, 0.5, 0.5])),
        ],
    )
    .unwrap();
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let set = load_file(&path).unwrap();
    assert_eq!(set.len(), 2);
    let a = set.get("A").unwrap();
    assert_eq!(a.curve.period, vec![0.1, 0.2, 0.3]);
    assert!(a.curve.response[1].is_nan());
    assert_eq!(a.curve.standard_error, vec![0.25; 3]);
    assert_eq!(set.get("B").unwrap().curve.len(), 2);
}

#[test]
fn csv_file_feeds_the_pipeline() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("curve.csv");

    let curve = helpers::boxcar_curve(80, 0.3, 0.6, 2.0, 0.1);
    let mut text = String::from("period,response,standard_error\n");
    for s in curve.samples() {
        text.push_str(&format!("{},{},{}\n", s.period, s.response, s.standard_error));
    }
    std::fs::write(&path, text).unwrap();

    let set = load_file(&path).unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.curves[0].curve, curve);

    let report = identify_peaks(&set.curves[0].curve, &DetectionConfig::default()).unwrap();
    assert!(report.has_peak);
}

#[test]
fn json_file_feeds_the_pipeline() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("curves.json");

    let curve = helpers::boxcar_curve(80, 0.3, 0.6, 2.0, 0.1);
    let json = serde_json::json!([{
        "site": "S1",
        "period": curve.period,
        "response": curve.response,
        "standard_error": curve.standard_error,
    }]);
    std::fs::write(&path, json.to_string()).unwrap();

    let set = load_file(&path).unwrap();
    let report = identify_peaks(&set.get("S1").unwrap().curve, &DetectionConfig::default()).unwrap();
    assert_eq!(report.candidates.len(), 1);
    assert!(report.candidates[0].accepted);
}
