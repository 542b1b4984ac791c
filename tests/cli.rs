use std::path::Path;
use std::process::Command;

use tempfile::TempDir;
use xyspec::{load_series, save_series, Series, SOURCE_KEY};

fn xyspec() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_xyspec"));
    cmd.env("RUST_LOG", "warn");
    cmd
}

fn write(dir: &Path, name: &str, x: Vec<f64>, y: Vec<f64>) {
    let path = dir.join(name);
    let series = Series::new(x, y, None)
        .unwrap()
        .with_meta(SOURCE_KEY, path.to_string_lossy());
    save_series(&series, &path).unwrap();
}

#[test]
fn scalar_add_writes_next_to_input() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.txt", vec![0.0, 1.0, 2.0], vec![1.0, 2.0, 3.0]);

    let status = xyspec()
        .args(["add", "0,5"])
        .arg(dir.path().join("a.txt"))
        .status()
        .unwrap();
    assert!(status.success());

    let out = load_series(&dir.path().join("a.txt__add__0.5")).unwrap();
    assert_eq!(out.y(), &[1.5, 2.5, 3.5]);
    assert_eq!(out.metadata()["added_to"], "0.5");
}

#[test]
fn merge_honours_output_dir() {
    let dir = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    write(dir.path(), "lo.txt", vec![0.0, 1.0, 2.0, 3.0], vec![0.0; 4]);
    write(dir.path(), "hi.txt", vec![2.0, 3.0, 4.0, 5.0], vec![1.0; 4]);

    let status = xyspec()
        .arg("--output-dir")
        .arg(out_dir.path())
        .arg("merge")
        .arg(dir.path().join("lo.txt"))
        .arg(dir.path().join("hi.txt"))
        .status()
        .unwrap();
    assert!(status.success());

    let merged = load_series(&out_dir.path().join("merged_lo.txt")).unwrap();
    assert_eq!(merged.x(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
}

#[test]
fn unreadable_inputs_are_skipped_but_all_missing_fails() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "ok.txt", vec![0.0, 1.0, 2.0], vec![0.0, 2.0, 4.0]);

    let status = xyspec()
        .arg("deriv")
        .arg(dir.path().join("missing.txt"))
        .arg(dir.path().join("ok.txt"))
        .status()
        .unwrap();
    assert!(status.success());
    assert!(dir.path().join("ok.txt__deriv").is_file());

    let status = xyspec()
        .arg("area")
        .arg(dir.path().join("missing.txt"))
        .status()
        .unwrap();
    assert!(!status.success());
}

#[test]
fn non_numeric_reference_fails() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.txt", vec![0.0, 1.0], vec![1.0, 2.0]);

    let status = xyspec()
        .args(["div", "not-a-number"])
        .arg(dir.path().join("a.txt"))
        .status()
        .unwrap();
    assert!(!status.success());
}

#[test]
fn noise_prints_the_level_per_file() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "dark.txt",
        vec![0.0, 1.0, 2.0, 3.0, 4.0],
        vec![12.25, 12.75, 11.5, 12.0, 40.0],
    );

    let output = xyspec()
        .arg("noise")
        .arg(dir.path().join("dark.txt"))
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let (source, level) = stdout.trim_end().split_once('\t').unwrap();
    assert!(source.ends_with("dark.txt"));
    assert_eq!(level, "12");
}
