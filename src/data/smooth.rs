use crate::data::model::Series;
use crate::error::{Result, SeriesError};

/// Metadata key describing the smoothing filter applied.
pub const FILTER_KEY: &str = "filter";

impl Series {
    /// Savitzky-Golay smoothing of Y over the sample index.
    ///
    /// `window` must be odd, larger than `order` and no longer than the
    /// series. Interior samples use the least-squares convolution kernel;
    /// the first and last `window / 2` samples are read off a polynomial
    /// fitted to the first and last full window.
    pub fn savgol(&self, window: usize, order: usize) -> Result<Series> {
        let y = savgol_filter(self.y(), window, order)?;
        let mut result = self.derive(self.x().to_vec(), y)?;
        result
            .metadata_mut()
            .insert(FILTER_KEY.to_string(), format!("savgol, {window}, {order}"));
        Ok(result)
    }
}

/// Apply a Savitzky-Golay filter to `data`.
pub fn savgol_filter(data: &[f64], window: usize, order: usize) -> Result<Vec<f64>> {
    let n = data.len();
    if window % 2 == 0 || order >= window || window > n {
        return Err(SeriesError::InvalidWindow {
            window,
            order,
            len: n,
        });
    }
    let half = window / 2;
    let kernel = savgol_coefficients(window, order)?;

    let mut out = vec![0.0; n];
    for i in half..n - half {
        out[i] = kernel
            .iter()
            .zip(&data[i - half..=i + half])
            .map(|(c, v)| c * v)
            .sum();
    }

    // positions relative to the window centre keep the fit well conditioned
    let t: Vec<f64> = (0..window).map(|j| j as f64 - half as f64).collect();
    let head = polyfit(&t, &data[..window], order)?;
    for (i, slot) in out.iter_mut().take(half).enumerate() {
        *slot = polyval(&head, t[i]);
    }
    let tail = polyfit(&t, &data[n - window..], order)?;
    for j in window - half..window {
        out[n - window + j] = polyval(&tail, t[j]);
    }
    Ok(out)
}

/// Convolution kernel evaluating the least-squares polynomial at the centre
/// of a window.
pub fn savgol_coefficients(window: usize, order: usize) -> Result<Vec<f64>> {
    let half = (window / 2) as f64;
    let z: Vec<f64> = (0..window).map(|j| j as f64 - half).collect();
    let normal = normal_matrix(&z, order);
    let mut e0 = vec![0.0; order + 1];
    e0[0] = 1.0;
    let g = solve_dense(normal, e0)?;
    Ok(z.iter().map(|&zj| polyval(&g, zj)).collect())
}

fn normal_matrix(t: &[f64], order: usize) -> Vec<Vec<f64>> {
    (0..=order)
        .map(|p| {
            (0..=order)
                .map(|q| t.iter().map(|v| v.powi((p + q) as i32)).sum())
                .collect()
        })
        .collect()
}

/// Least-squares polynomial coefficients, lowest power first.
fn polyfit(t: &[f64], y: &[f64], order: usize) -> Result<Vec<f64>> {
    let rhs = (0..=order)
        .map(|p| t.iter().zip(y).map(|(v, w)| v.powi(p as i32) * w).sum())
        .collect();
    solve_dense(normal_matrix(t, order), rhs)
}

fn polyval(coeffs: &[f64], t: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * t + c)
}

/// Gaussian elimination with partial pivoting.
fn solve_dense(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < 1e-12 {
            return Err(SeriesError::SingularSystem { row: col });
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}
