use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use xyspec::{save_series, Metadata, Series, SOURCE_KEY};

/// Step between samples, in nm.
const STEP: f64 = 0.5;
/// Detector offset added to every sample; `xyspec noise` should find it.
const BASELINE: f64 = 12.0;

/// SplitMix64, enough for reproducible test data.
struct Rng(u64);

impl Rng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[lo, hi)`.
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        let unit = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        lo + (hi - lo) * unit
    }

    /// Normal deviate (Box-Muller).
    fn normal(&mut self, sigma: f64) -> f64 {
        let r = (-2.0 * self.uniform(1e-12, 1.0).ln()).sqrt();
        r * (std::f64::consts::TAU * self.uniform(0.0, 1.0)).cos() * sigma
    }
}

/// Gaussian emission line.
struct Line {
    centre: f64,
    width: f64,
    height: f64,
}

impl Line {
    fn random(rng: &mut Rng, lo: f64, hi: f64) -> Self {
        Line {
            centre: rng.uniform(lo, hi),
            width: rng.uniform(2.0, 20.0),
            height: rng.uniform(0.5, 5.0),
        }
    }

    fn at(&self, x: f64) -> f64 {
        let z = (x - self.centre) / self.width;
        self.height * (-0.5 * z * z).exp()
    }
}

fn write(path: &Path, x: Vec<f64>, y: Vec<f64>, extra: &[(&str, String)]) -> Result<()> {
    let mut metadata = Metadata::new();
    metadata.insert(SOURCE_KEY.to_string(), path.to_string_lossy().into_owned());
    for (key, value) in extra {
        metadata.insert(key.to_string(), value.clone());
    }
    let series = Series::new(x, y, Some(metadata))?;
    save_series(&series, path)
}

/// Writes overlapping spectrometer windows plus a dark reference into the
/// directory given as the first argument (default `sample_data`).
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let out_dir = PathBuf::from(
        std::env::args()
            .nth(1)
            .unwrap_or_else(|| "sample_data".to_string()),
    );
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = Rng(42);

    // 100 nm windows overlapping by 40 nm. Each grid starts a quarter step
    // after the previous one, so arithmetic between windows interpolates.
    let windows: [(f64, f64); 3] = [(480.0, 580.0), (540.125, 640.125), (600.25, 700.25)];

    for (i, &(start, stop)) in windows.iter().enumerate() {
        let lines: Vec<Line> = (0..3).map(|_| Line::random(&mut rng, start, stop)).collect();
        let n = ((stop - start) / STEP).round() as usize + 1;
        let x: Vec<f64> = (0..n).map(|k| start + k as f64 * STEP).collect();
        let y = x
            .iter()
            .map(|&wl| BASELINE + lines.iter().map(|l| l.at(wl)).sum::<f64>() + rng.normal(0.05))
            .collect();

        let path = out_dir.join(format!("window_{}.txt", i + 1));
        write(
            &path,
            x,
            y,
            &[
                ("grating", (i + 1).to_string()),
                ("exposure", "0,5 s".to_string()),
            ],
        )?;
        let centres: Vec<f64> = lines.iter().map(|l| l.centre).collect();
        log::debug!("{}: lines at {centres:?}", path.display());
    }

    // Dark level spanning every window.
    let x: Vec<f64> = (0..=460).map(|k| 470.0 + k as f64 * STEP).collect();
    let y = x.iter().map(|_| BASELINE + rng.normal(0.05)).collect();
    write(&out_dir.join("dark.txt"), x, y, &[])?;

    log::info!(
        "Wrote {} spectra and a dark reference to {}",
        windows.len(),
        out_dir.display()
    );
    Ok(())
}
