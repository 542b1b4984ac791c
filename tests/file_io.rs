use std::fs;

use tempfile::TempDir;
use xyspec::{
    load_series, load_series_with, resolve_reference_operand, save_series, Metadata,
    ParseMode, ReferenceOperand, Series, SeriesError, SOURCE_KEY,
};

fn sample(source: &str) -> Series {
    let mut metadata = Metadata::new();
    metadata.insert(SOURCE_KEY.to_string(), source.to_string());
    metadata.insert("grating".to_string(), "2".to_string());
    metadata.insert("added_to".to_string(), "1.0, 2.5".to_string());
    Series::new(
        vec![400.0, 400.5, 401.0, 401.5],
        vec![0.25, -1.5, 3.125, 0.0],
        Some(metadata),
    )
    .unwrap()
}

#[test]
fn text_files_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("spectrum.txt");
    let original = sample(&path.to_string_lossy());

    save_series(&original, &path).unwrap();
    let loaded = load_series(&path).unwrap();
    assert_eq!(loaded, original);

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("\n\n400.000000\t0.250000\n"));
}

#[test]
fn json_files_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("spectrum.json");
    let original = sample(&path.to_string_lossy());

    save_series(&original, &path).unwrap();
    assert_eq!(load_series(&path).unwrap(), original);
}

#[test]
fn json_without_source_gets_the_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bare.json");
    fs::write(&path, r#"{"x": [2.0, 1.0], "y": [4.0, 1.0]}"#).unwrap();

    let loaded = load_series(&path).unwrap();
    assert_eq!(loaded.x(), &[1.0, 2.0]);
    assert_eq!(loaded.source().unwrap(), path.to_string_lossy());
}

#[test]
fn csv_files_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("spectrum.csv");
    let original = sample(&path.to_string_lossy());

    save_series(&original, &path).unwrap();
    assert_eq!(load_series(&path).unwrap(), original);
}

#[test]
fn legacy_text_with_commas_and_loose_metadata() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("legacy.dat");
    fs::write(
        &path,
        "Operator = someone\nExposure 0,5 s\n\n1,0\t10,5\n0,5\t9,25\n",
    )
    .unwrap();

    let loaded = load_series(&path).unwrap();
    assert_eq!(loaded.x(), &[0.5, 1.0]);
    assert_eq!(loaded.y(), &[9.25, 10.5]);
    assert_eq!(loaded.metadata()["Operator"], "someone");
    assert_eq!(loaded.metadata()["Exposure"], "0,5 s");
}

#[test]
fn strict_mode_reports_the_bad_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.txt");
    fs::write(&path, "name: x\n\n0 1\n1 two\n2 3\n").unwrap();

    assert_eq!(load_series(&path).unwrap().len(), 2);
    let err = load_series_with(&path, ParseMode::Strict).unwrap_err();
    assert_eq!(
        err.downcast_ref::<SeriesError>(),
        Some(&SeriesError::MalformedLine {
            line_no: 4,
            content: "1 two".to_string()
        })
    );
}

#[test]
fn missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(load_series(&dir.path().join("nope.txt")).is_err());
}

#[test]
fn reference_operand_prefers_existing_files() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("2.5");
    save_series(&sample("ref"), &path).unwrap();

    match resolve_reference_operand(&path.to_string_lossy()).unwrap() {
        ReferenceOperand::Series(s) => assert_eq!(s.len(), 4),
        other => panic!("expected a series, got {other:?}"),
    }
    assert_eq!(
        resolve_reference_operand("2.5").unwrap(),
        ReferenceOperand::Scalar(2.5)
    );
}

#[test]
fn arithmetic_against_a_loaded_reference() {
    let dir = TempDir::new().unwrap();
    let data_path = dir.path().join("data.txt");
    let ref_path = dir.path().join("dark.txt");
    save_series(&sample(&data_path.to_string_lossy()), &data_path).unwrap();
    // Offset grid, so every sample goes through the interpolator.
    let x: Vec<f64> = (0..9).map(|k| 399.25 + k as f64 * 0.5).collect();
    let dark = Series::new(x, vec![0.25; 9], None)
        .unwrap()
        .with_meta(SOURCE_KEY, ref_path.to_string_lossy());
    save_series(&dark, &ref_path).unwrap();

    let data = load_series(&data_path).unwrap();
    let reference = resolve_reference_operand(&ref_path.to_string_lossy()).unwrap();
    let corrected = data.subtract(reference).unwrap();

    assert_eq!(corrected.x(), data.x());
    for (got, want) in corrected.y().iter().zip(data.y()) {
        assert!((got - (want - 0.25)).abs() < 1e-9);
    }
    assert_eq!(corrected.metadata()["subtracted"], ref_path.to_string_lossy());
}
