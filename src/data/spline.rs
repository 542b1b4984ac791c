use crate::error::{Result, SeriesError};

/// Default interpolation degree used by series arithmetic.
pub const SPLINE_DEGREE: usize = 5;

/// Interpolating B-spline through a set of samples.
///
/// Odd degrees use not-a-knot end conditions: the knot vector is the sample
/// grid with `(degree - 1) / 2` interior samples dropped at each end, and
/// both ends clamped with `degree + 1` repeated knots. The collocation
/// system is banded and totally positive, so it is solved by band
/// elimination without pivoting.
///
/// Built once per operation and dropped with it.
#[derive(Debug, Clone)]
pub struct Spline {
    degree: usize,
    knots: Vec<f64>,
    coeffs: Vec<f64>,
}

impl Spline {
    /// Fit a spline through `(x, y)`, which must be sorted by `x`.
    ///
    /// Repeated X values keep only their first sample. The requested degree
    /// is lowered to the largest odd degree the sample count supports; a
    /// single sample yields a constant.
    pub fn new(x: &[f64], y: &[f64], degree: usize) -> Result<Self> {
        if x.len() != y.len() {
            return Err(SeriesError::ShapeMismatch {
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        let (xs, ys) = unique_samples(x, y);
        let n = xs.len();
        if n == 0 {
            return Err(SeriesError::EmptySeries);
        }
        if n == 1 {
            return Ok(Self {
                degree: 0,
                knots: vec![xs[0], xs[0]],
                coeffs: ys,
            });
        }

        let mut k = degree.min(n - 1).max(1);
        if k % 2 == 0 {
            k -= 1;
        }

        let knots = not_a_knot(&xs, k);
        let coeffs = solve_collocation(&xs, &ys, &knots, k)?;
        Ok(Self {
            degree: k,
            knots,
            coeffs,
        })
    }

    /// Degree actually used after reduction for short inputs.
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Evaluate the spline at `x`. Outside the fitted range the end
    /// polynomial pieces are continued.
    pub fn eval(&self, x: f64) -> f64 {
        if self.coeffs.len() == 1 {
            return self.coeffs[0];
        }
        let k = self.degree;
        let span = find_span(&self.knots, self.coeffs.len(), k, x);
        let basis = basis_funs(&self.knots, span, x, k);
        basis
            .iter()
            .enumerate()
            .map(|(r, b)| b * self.coeffs[span - k + r])
            .sum()
    }
}

fn unique_samples(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut xs = Vec::with_capacity(x.len());
    let mut ys = Vec::with_capacity(y.len());
    for (&xi, &yi) in x.iter().zip(y) {
        if xs.last() == Some(&xi) {
            continue;
        }
        xs.push(xi);
        ys.push(yi);
    }
    (xs, ys)
}

fn not_a_knot(xs: &[f64], k: usize) -> Vec<f64> {
    let n = xs.len();
    let m = (k - 1) / 2;
    let first = xs[0];
    let last = xs[n - 1];
    let mut knots = Vec::with_capacity(n + k + 1);
    knots.extend(std::iter::repeat(first).take(k + 1));
    knots.extend_from_slice(&xs[m + 1..n - m - 1]);
    knots.extend(std::iter::repeat(last).take(k + 1));
    knots
}

/// Index `s` in `[k, n - 1]` with `knots[s] <= x < knots[s + 1]`.
fn find_span(knots: &[f64], n: usize, k: usize, x: f64) -> usize {
    if x >= knots[n] {
        return n - 1;
    }
    if x <= knots[k] {
        return k;
    }
    let (mut lo, mut hi) = (k, n);
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if x < knots[mid] {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    lo
}

/// The `k + 1` basis functions that are non-zero on `span`, evaluated at `x`.
fn basis_funs(knots: &[f64], span: usize, x: f64, k: usize) -> Vec<f64> {
    let mut n = vec![0.0; k + 1];
    let mut left = vec![0.0; k + 1];
    let mut right = vec![0.0; k + 1];
    n[0] = 1.0;
    for j in 1..=k {
        left[j] = x - knots[span + 1 - j];
        right[j] = knots[span + j] - x;
        let mut saved = 0.0;
        for r in 0..j {
            let temp = n[r] / (right[r + 1] + left[j - r]);
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }
    n
}

/// Solve for the B-spline coefficients interpolating `(xs, ys)`.
fn solve_collocation(xs: &[f64], ys: &[f64], knots: &[f64], k: usize) -> Result<Vec<f64>> {
    let n = xs.len();
    let width = 2 * k + 1;
    // band[i * width + (j + k - i)] holds A[i][j] for |i - j| <= k
    let mut band = vec![0.0; n * width];
    let at = |i: usize, j: usize| i * width + j + k - i;

    for (i, &xi) in xs.iter().enumerate() {
        let span = find_span(knots, n, k, xi);
        for (r, value) in basis_funs(knots, span, xi, k).into_iter().enumerate() {
            let j = span - k + r;
            if value == 0.0 {
                continue;
            }
            if j + k < i || j > i + k {
                return Err(SeriesError::SingularSystem { row: i });
            }
            band[at(i, j)] = value;
        }
    }

    let mut rhs = ys.to_vec();
    for p in 0..n {
        let pivot = band[at(p, p)];
        if pivot.abs() < f64::EPSILON * 1e-3 {
            return Err(SeriesError::SingularSystem { row: p });
        }
        let last = (p + k).min(n - 1);
        for r in p + 1..=last {
            let factor = band[at(r, p)] / pivot;
            if factor == 0.0 {
                continue;
            }
            for c in p..=last {
                band[at(r, c)] -= factor * band[at(p, c)];
            }
            rhs[r] -= factor * rhs[p];
        }
    }

    let mut coeffs = vec![0.0; n];
    for p in (0..n).rev() {
        let last = (p + k).min(n - 1);
        let tail: f64 = (p + 1..=last).map(|c| band[at(p, c)] * coeffs[c]).sum();
        coeffs[p] = (rhs[p] - tail) / band[at(p, p)];
    }
    Ok(coeffs)
}
