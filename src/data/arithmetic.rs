use std::fmt;
use std::str::FromStr;

use crate::data::model::{ReferenceOperand, Series};
use crate::data::overlap::overlap;
use crate::data::spline::{Spline, SPLINE_DEGREE};
use crate::error::{Result, SeriesError};

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

/// Elementwise binary operator between a series and a reference operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl Operator {
    /// Apply with native floating-point semantics (`inf`/`NaN` propagate).
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Operator::Add => lhs + rhs,
            Operator::Subtract => lhs - rhs,
            Operator::Multiply => lhs * rhs,
            Operator::Divide => lhs / rhs,
            Operator::Power => lhs.powf(rhs),
        }
    }

    /// Metadata key recording what this operator was applied with.
    pub fn metadata_key(self) -> &'static str {
        match self {
            Operator::Add => "added_to",
            Operator::Subtract => "subtracted",
            Operator::Multiply => "multiplied_by",
            Operator::Divide => "divided_by",
            Operator::Power => "exponentiated_by",
        }
    }

    /// Short name, also used in output file names.
    pub fn name(self) -> &'static str {
        match self {
            Operator::Add => "add",
            Operator::Subtract => "sub",
            Operator::Multiply => "mul",
            Operator::Divide => "div",
            Operator::Power => "pow",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operator {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" | "+" => Ok(Operator::Add),
            "sub" | "subtract" | "-" => Ok(Operator::Subtract),
            "mul" | "multiply" | "*" => Ok(Operator::Multiply),
            "div" | "divide" | "/" => Ok(Operator::Divide),
            "pow" | "power" | "**" | "^" => Ok(Operator::Power),
            _ => Err(SeriesError::UnsupportedOperator(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// combine
// ---------------------------------------------------------------------------

/// Apply `op` between `a` and a reference operand.
///
/// * Scalar: every Y of `a` is combined with the number; X is unchanged and
///   the number is appended to the operator's metadata entry.
/// * Series: the two are walked in lock-step over their overlap. Where the
///   X values coincide the Y values are combined directly, otherwise `b` is
///   interpolated at `a`'s X with a degree-5 spline built once for the call.
///   The result covers `a`'s X positions inside the overlap and records
///   `b`'s source under the operator's metadata key. If `a` has no sample
///   inside the overlap the result is [`SeriesError::EmptySeries`].
pub fn combine(a: &Series, b: &ReferenceOperand, op: Operator) -> Result<Series> {
    match b {
        ReferenceOperand::Scalar(value) => combine_scalar(a, *value, op),
        ReferenceOperand::Series(other) => combine_series(a, other, op),
    }
}

fn combine_scalar(a: &Series, value: f64, op: Operator) -> Result<Series> {
    let y = a.y().iter().map(|&v| op.apply(v, value)).collect();
    let mut result = a.derive(a.x().to_vec(), y)?;
    Series::push_meta(result.metadata_mut(), op.metadata_key(), &format!("{value:?}"));
    Ok(result)
}

/// `b`'s Y at `a`'s X for each `(ia, ib)` index pair.
///
/// A pair sitting on the same X takes `b`'s sample as is. The others are
/// evaluated on a spline of `b`, which is only built when some pair needs it.
pub(crate) fn aligned_values(
    a: &Series,
    b: &Series,
    positions: &[(usize, usize)],
) -> Result<Vec<f64>> {
    let spline = if positions.iter().any(|&(ia, ib)| a.x()[ia] != b.x()[ib]) {
        log::debug!(
            "building degree-{SPLINE_DEGREE} interpolator over {} samples",
            b.len()
        );
        Some(Spline::new(b.x(), b.y(), SPLINE_DEGREE)?)
    } else {
        None
    };

    Ok(positions
        .iter()
        .map(|&(ia, ib)| {
            let xa = a.x()[ia];
            match &spline {
                Some(spline) if xa != b.x()[ib] => spline.eval(xa),
                _ => b.y()[ib],
            }
        })
        .collect())
}

fn combine_series(a: &Series, b: &Series, op: Operator) -> Result<Series> {
    let ov = overlap(a, b)?;
    let (shift_a, shift_b) = ov.offsets();

    let positions: Vec<(usize, usize)> = (0..ov.length)
        .map(|i| (i + shift_a, i + shift_b))
        .take_while(|&(ia, _)| a.x()[ia] <= ov.x_max)
        .collect();

    let rhs = aligned_values(a, b, &positions)?;
    let (x, y): (Vec<f64>, Vec<f64>) = positions
        .iter()
        .zip(rhs)
        .map(|(&(ia, _), r)| (a.x()[ia], op.apply(a.y()[ia], r)))
        .unzip();

    let mut result = a.derive(x, y)?;
    if let Some(source) = b.source() {
        result
            .metadata_mut()
            .insert(op.metadata_key().to_string(), source.to_string());
    }
    Ok(result)
}

impl Series {
    /// `self + rhs`, see [`combine`].
    pub fn add(&self, rhs: impl Into<ReferenceOperand>) -> Result<Series> {
        combine(self, &rhs.into(), Operator::Add)
    }

    /// `self - rhs`, see [`combine`].
    pub fn subtract(&self, rhs: impl Into<ReferenceOperand>) -> Result<Series> {
        combine(self, &rhs.into(), Operator::Subtract)
    }

    /// `self * rhs`, see [`combine`].
    pub fn multiply(&self, rhs: impl Into<ReferenceOperand>) -> Result<Series> {
        combine(self, &rhs.into(), Operator::Multiply)
    }

    /// `self / rhs`, see [`combine`].
    pub fn divide(&self, rhs: impl Into<ReferenceOperand>) -> Result<Series> {
        combine(self, &rhs.into(), Operator::Divide)
    }

    /// `self ** rhs`, see [`combine`].
    pub fn power(&self, rhs: impl Into<ReferenceOperand>) -> Result<Series> {
        combine(self, &rhs.into(), Operator::Power)
    }
}

// ---------------------------------------------------------------------------
// Polarization degree
// ---------------------------------------------------------------------------

/// Metadata key naming the TM series a polarization degree was computed with.
pub const POLARIZATION_KEY: &str = "polarization_with";

/// Degree of polarization `(TE - TM) / (TE + TM)` over the overlap of the
/// two series, on `te`'s X grid.
pub fn polarization_degree(te: &Series, tm: &Series) -> Result<Series> {
    let reference = ReferenceOperand::Series(tm.clone());
    let diff = combine(te, &reference, Operator::Subtract)?;
    let sum = combine(te, &reference, Operator::Add)?;

    // Both share te's overlap positions, so the division is exact-grid.
    let y = diff
        .y()
        .iter()
        .zip(sum.y())
        .map(|(d, s)| Operator::Divide.apply(*d, *s))
        .collect();
    let mut result = te.derive(diff.x().to_vec(), y)?;
    if let Some(source) = tm.source() {
        result
            .metadata_mut()
            .insert(POLARIZATION_KEY.to_string(), source.to_string());
    }
    Ok(result)
}
