use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SeriesError};

/// Metadata key holding the identifier (usually the file path) a series
/// was loaded from.
pub const SOURCE_KEY: &str = "filepath";

/// Free-form key/value annotations attached to a [`Series`].
///
/// Equality ignores insertion order; serialization keeps it.
pub type Metadata = IndexMap<String, String>;

// ---------------------------------------------------------------------------
// Series – ordered (x, y) samples plus metadata
// ---------------------------------------------------------------------------

/// A two-column measurement series (one spectrum).
///
/// Invariants, established by [`Series::new`] and kept by every operation:
/// * `x` and `y` have the same, non-zero length;
/// * `x` is sorted ascending, with `y[i]` still paired to `x[i]`.
///
/// A series is never mutated in place: every operation returns a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSeries")]
pub struct Series {
    x: Vec<f64>,
    y: Vec<f64>,
    metadata: Metadata,
}

/// Unvalidated wire shape, checked through [`Series::new`] on deserialize.
#[derive(Deserialize)]
struct RawSeries {
    x: Vec<f64>,
    y: Vec<f64>,
    #[serde(default)]
    metadata: Metadata,
}

impl TryFrom<RawSeries> for Series {
    type Error = SeriesError;

    fn try_from(raw: RawSeries) -> Result<Self> {
        Series::new(raw.x, raw.y, Some(raw.metadata))
    }
}

impl Series {
    /// Build a series, sorting the pairs by `x`.
    ///
    /// The sort is stable, so samples sharing an X value keep their input
    /// order.
    pub fn new(x: Vec<f64>, y: Vec<f64>, metadata: Option<Metadata>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(SeriesError::ShapeMismatch {
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        if x.is_empty() {
            return Err(SeriesError::EmptySeries);
        }

        let metadata = metadata.unwrap_or_default();
        if x.windows(2).all(|w| w[0] <= w[1]) {
            return Ok(Self { x, y, metadata });
        }

        let mut pairs: Vec<(f64, f64)> = x.into_iter().zip(y).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (x, y) = pairs.into_iter().unzip();
        Ok(Self { x, y, metadata })
    }

    /// Build a series over the same metadata as `self`.
    pub(crate) fn derive(&self, x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        Series::new(x, y, Some(self.metadata.clone()))
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Always `false` for a constructed series; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Smallest X value.
    pub fn x_min(&self) -> f64 {
        self.x[0]
    }

    /// Largest X value.
    pub fn x_max(&self) -> f64 {
        self.x[self.x.len() - 1]
    }

    /// Iterate over `(x, y)` pairs in X order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// The identifier this series came from, if recorded.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }

    /// File name component of the source, or the whole source when it has
    /// none.
    pub fn file_name(&self) -> Option<String> {
        self.source().map(|p| {
            Path::new(p)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.to_string())
        })
    }

    /// Builder-style metadata insertion.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Append `value` to a comma-separated metadata entry, creating it if
    /// absent.
    pub(crate) fn push_meta(metadata: &mut Metadata, key: &str, value: &str) {
        match metadata.get_mut(key) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => {
                metadata.insert(key.to_string(), value.to_string());
            }
        }
    }

    /// Noise-floor estimate: the most common integer part of the Y values.
    ///
    /// Each value is first rounded to as many decimals as the magnitude
    /// range of Y spans decades, so that `2.9999999` counts as `3`. Ties go
    /// to the bucket seen first. `None` when no Y value is finite.
    pub fn y_shift(&self) -> Option<f64> {
        let finite = || self.y.iter().copied().filter(|v| v.is_finite());
        let (lo, hi) = finite()
            .map(f64::abs)
            .filter(|&v| v > 0.0)
            .fold((f64::INFINITY, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
        // all zero leaves `hi` at 0 and nothing to scale
        let decimals = if hi > 0.0 {
            (hi / lo).log10().ceil().clamp(0.0, 15.0) as i32
        } else {
            0
        };
        let scale = 10f64.powi(decimals);

        let mut counts: IndexMap<i64, usize> = IndexMap::new();
        for v in finite() {
            let rounded = (v * scale).round() / scale;
            let rounded = if rounded.is_finite() { rounded } else { v };
            *counts.entry(rounded.trunc() as i64).or_default() += 1;
        }

        let mut best: Option<(i64, usize)> = None;
        for (&bucket, &count) in &counts {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((bucket, count));
            }
        }
        best.map(|(bucket, _)| bucket as f64)
    }

    /// Collapse runs of samples sharing the same X into one, folding their
    /// Y values with `fold` (e.g. `f64::max`).
    pub fn deduplicate_by<F>(&self, fold: F) -> Series
    where
        F: Fn(f64, f64) -> f64,
    {
        let mut x: Vec<f64> = Vec::with_capacity(self.len());
        let mut y: Vec<f64> = Vec::with_capacity(self.len());
        for (xi, yi) in self.points() {
            match (x.last(), y.last_mut()) {
                (Some(&last_x), Some(last_y)) if last_x == xi => *last_y = fold(*last_y, yi),
                _ => {
                    x.push(xi);
                    y.push(yi);
                }
            }
        }
        Series {
            x,
            y,
            metadata: self.metadata.clone(),
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::data::text::to_text(self))
    }
}

// ---------------------------------------------------------------------------
// ReferenceOperand – "a file or a number"
// ---------------------------------------------------------------------------

/// Right-hand operand of an arithmetic operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceOperand {
    Scalar(f64),
    Series(Series),
}

impl ReferenceOperand {
    /// Short label used in output names: the file name of a series source,
    /// or the number itself.
    pub fn label(&self) -> String {
        match self {
            ReferenceOperand::Scalar(v) => format!("{v:?}"),
            ReferenceOperand::Series(s) => s.file_name().unwrap_or_default(),
        }
    }
}

impl From<f64> for ReferenceOperand {
    fn from(v: f64) -> Self {
        ReferenceOperand::Scalar(v)
    }
}

impl From<Series> for ReferenceOperand {
    fn from(s: Series) -> Self {
        ReferenceOperand::Series(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_lengths() {
        let err = Series::new(vec![0.0, 1.0], vec![0.0], None).unwrap_err();
        assert_eq!(err, SeriesError::ShapeMismatch { x_len: 2, y_len: 1 });
    }

    #[test]
    fn rejects_empty_data() {
        assert_eq!(
            Series::new(vec![], vec![], None).unwrap_err(),
            SeriesError::EmptySeries
        );
    }

    #[test]
    fn sorts_pairs_by_x() {
        let s = Series::new(vec![2.0, 0.0, 1.0], vec![20.0, 0.0, 10.0], None).unwrap();
        assert_eq!(s.x(), &[0.0, 1.0, 2.0]);
        assert_eq!(s.y(), &[0.0, 10.0, 20.0]);
    }

    #[test]
    fn sort_is_stable_for_equal_x() {
        let s = Series::new(vec![1.0, 0.0, 1.0], vec![5.0, 0.0, 3.0], None).unwrap();
        assert_eq!(s.x(), &[0.0, 1.0, 1.0]);
        assert_eq!(s.y(), &[0.0, 5.0, 3.0]);
    }

    #[test]
    fn metadata_equality_ignores_order() {
        let a = Series::new(vec![0.0], vec![1.0], None)
            .unwrap()
            .with_meta("a", "1")
            .with_meta("b", "2");
        let b = Series::new(vec![0.0], vec![1.0], None)
            .unwrap()
            .with_meta("b", "2")
            .with_meta("a", "1");
        assert_eq!(a, b);
    }

    #[test]
    fn push_meta_accumulates() {
        let mut meta = Metadata::new();
        Series::push_meta(&mut meta, "added_to", "1.0");
        Series::push_meta(&mut meta, "added_to", "2.5");
        assert_eq!(meta["added_to"], "1.0, 2.5");
    }

    #[test]
    fn deduplicate_keeps_max() {
        let s = Series::new(
            vec![0.0, 1.0, 1.0, 1.0, 2.0],
            vec![1.0, 3.0, 7.0, 5.0, 2.0],
            None,
        )
        .unwrap();
        let d = s.deduplicate_by(f64::max);
        assert_eq!(d.x(), &[0.0, 1.0, 2.0]);
        assert_eq!(d.y(), &[1.0, 7.0, 2.0]);
    }

    #[test]
    fn y_shift_is_the_most_common_integer_part() {
        let s = Series::new(
            (0..8).map(f64::from).collect(),
            vec![0.2, 3.7, 3.1, 2.9999999, 5.5, 3.05, 0.1, 0.4],
            None,
        )
        .unwrap();
        assert_eq!(s.y_shift(), Some(3.0));
    }

    #[test]
    fn y_shift_edge_cases() {
        let zeros = Series::new(vec![0.0, 1.0, 2.0], vec![0.0; 3], None).unwrap();
        assert_eq!(zeros.y_shift(), Some(0.0));

        let tie = Series::new(vec![0.0, 1.0, 2.0, 3.0], vec![7.5, 2.5, 2.0, 7.0], None).unwrap();
        assert_eq!(tie.y_shift(), Some(7.0));

        let negative = Series::new(vec![0.0, 1.0, 2.0], vec![-1.5, -1.25, 4.0], None).unwrap();
        assert_eq!(negative.y_shift(), Some(-1.0));

        let nan = Series::new(vec![0.0], vec![f64::NAN], None).unwrap();
        assert_eq!(nan.y_shift(), None);
    }

    #[test]
    fn json_deserialize_revalidates() {
        let s: Series = serde_json::from_str(r#"{"x":[1.0,0.0],"y":[1.0,0.0]}"#).unwrap();
        assert_eq!(s.x(), &[0.0, 1.0]);
        assert!(serde_json::from_str::<Series>(r#"{"x":[],"y":[]}"#).is_err());
    }

    #[test]
    fn operand_label_uses_file_name() {
        let s = Series::new(vec![0.0], vec![0.0], None)
            .unwrap()
            .with_meta(SOURCE_KEY, "/tmp/data/ref.txt");
        assert_eq!(ReferenceOperand::from(s).label(), "ref.txt");
        assert_eq!(ReferenceOperand::from(2.0).label(), "2.0");
    }
}
