use crate::data::model::Series;
use crate::error::{Result, SeriesError};

/// Derivative at interior index `i`: the mean of the left and right finite
/// differences.
pub fn point_derivative(x: &[f64], y: &[f64], i: usize) -> Result<f64> {
    if x.len() != y.len() {
        return Err(SeriesError::ShapeMismatch {
            x_len: x.len(),
            y_len: y.len(),
        });
    }
    if i == 0 || i + 1 >= x.len() {
        return Err(SeriesError::IndexOutOfRange {
            index: i,
            len: x.len(),
        });
    }
    let left = (y[i] - y[i - 1]) / (x[i] - x[i - 1]);
    let right = (y[i + 1] - y[i]) / (x[i + 1] - x[i]);
    Ok(0.5 * (left + right))
}

/// [`point_derivative`] at every interior index, paired with the interior X
/// values. Both outputs have length `n - 2` (empty for fewer than three
/// samples).
pub fn array_derivative(x: &[f64], y: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
    if x.len() != y.len() {
        return Err(SeriesError::ShapeMismatch {
            x_len: x.len(),
            y_len: y.len(),
        });
    }
    if x.len() < 3 {
        return Ok((Vec::new(), Vec::new()));
    }
    let dx = x[1..x.len() - 1].to_vec();
    let dy = (1..x.len() - 1)
        .map(|i| point_derivative(x, y, i))
        .collect::<Result<Vec<_>>>()?;
    Ok((dx, dy))
}

impl Series {
    /// Trapezoidal integral over the whole X range.
    pub fn area(&self) -> f64 {
        self.x()
            .windows(2)
            .zip(self.y().windows(2))
            .map(|(x, y)| 0.5 * (y[0] + y[1]) * (x[1] - x[0]))
            .sum()
    }

    /// Numeric derivative as a series over the interior samples.
    ///
    /// Needs at least three samples, otherwise the result would be empty.
    pub fn derivative(&self) -> Result<Series> {
        let (x, y) = array_derivative(self.x(), self.y())?;
        let mut result = self.derive(x, y)?;
        result
            .metadata_mut()
            .insert("derivative".to_string(), "central".to_string());
        Ok(result)
    }
}
