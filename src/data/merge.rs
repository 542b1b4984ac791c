use std::collections::VecDeque;

use crate::data::arithmetic::aligned_values;
use crate::data::model::Series;
use crate::data::overlap::overlap;
use crate::error::{Result, SeriesError};

/// Metadata key listing the sources merged into a series.
pub const MERGE_KEY: &str = "merged_with";

/// Merge two overlapping series into a new one.
///
/// Over the overlap, values are cross-faded on `a`'s X positions inside
/// `[x_min, x_max]`: at step `i` of `n` such positions,
/// `c2 = (i + 1) / (n + 1)` and the new value is `(1 - c2) * a + c2 * b`.
/// `b` is read at the same X, interpolated where its grid differs. The
/// leading samples of whichever series starts earlier are kept as they are,
/// as are the samples of both series past `x_max`. If `a` has no sample in
/// the overlap, `b`'s samples there are taken unchanged.
///
/// When both series reach the overlap at the same index (`shift == 0`) the
/// result is an unchanged copy of `a`.
pub fn merge(a: &Series, b: &Series) -> Result<Series> {
    let ov = overlap(a, b)?;
    if ov.shift == 0 {
        return Ok(a.clone());
    }

    let (shift_a, shift_b) = ov.offsets();
    let end_a = a.x().partition_point(|&v| v <= ov.x_max);
    let end_b = b.x().partition_point(|&v| v <= ov.x_max);
    let mut x = Vec::with_capacity(a.len() + b.len());
    let mut y = Vec::with_capacity(a.len() + b.len());

    let head = if shift_a > 0 {
        (&a.x()[..shift_a], &a.y()[..shift_a])
    } else {
        (&b.x()[..shift_b], &b.y()[..shift_b])
    };
    x.extend_from_slice(head.0);
    y.extend_from_slice(head.1);

    let count = end_a - shift_a;
    if count == 0 {
        x.extend_from_slice(&b.x()[shift_b..end_b]);
        y.extend_from_slice(&b.y()[shift_b..end_b]);
    } else {
        let last_b = b.len() - 1;
        let positions: Vec<(usize, usize)> = (0..count)
            .map(|i| (shift_a + i, (shift_b + i).min(last_b)))
            .collect();
        let rhs = aligned_values(a, b, &positions)?;
        for (i, ((ia, _), vb)) in positions.into_iter().zip(rhs).enumerate() {
            let c2 = (i + 1) as f64 / (count + 1) as f64;
            let c1 = 1.0 - c2;
            x.push(a.x()[ia]);
            y.push(c1 * a.y()[ia] + c2 * vb);
        }
    }

    // Samples past x_max; the constructor restores X order.
    x.extend_from_slice(&a.x()[end_a..]);
    y.extend_from_slice(&a.y()[end_a..]);
    x.extend_from_slice(&b.x()[end_b..]);
    y.extend_from_slice(&b.y()[end_b..]);

    let mut merged = a.derive(x, y)?;
    if let Some(source) = b.source() {
        Series::push_meta(merged.metadata_mut(), MERGE_KEY, source);
    }
    Ok(merged)
}

/// Fold a batch of series into one by repeated pairwise merging.
///
/// The first series seeds the result. A candidate that does not overlap the
/// current result is put back at the end of the worklist. The loop gives up
/// with [`SeriesError::MergeExhausted`] after `n * (n - 1) / 2` attempts, or
/// as soon as every remaining candidate has failed since the last
/// successful merge.
pub fn merge_all(series: Vec<Series>) -> Result<Series> {
    let n = series.len();
    let bound = n * n.saturating_sub(1) / 2;
    let mut worklist: VecDeque<Series> = series.into();
    let mut merged = worklist.pop_front().ok_or(SeriesError::EmptySeries)?;

    let mut attempts = 0;
    let mut failures_in_row = 0;
    while let Some(next) = worklist.pop_front() {
        if attempts >= bound || failures_in_row > worklist.len() {
            worklist.push_front(next);
            return Err(SeriesError::MergeExhausted {
                attempts,
                unmerged: worklist
                    .iter()
                    .map(|s| s.source().unwrap_or("<unnamed>").to_string())
                    .collect(),
            });
        }
        attempts += 1;

        match merge(&merged, &next) {
            Ok(m) => {
                merged = m;
                failures_in_row = 0;
            }
            Err(SeriesError::NoOverlap { .. }) => {
                log::debug!(
                    "no overlap with {}, retrying later",
                    next.source().unwrap_or("<unnamed>")
                );
                failures_in_row += 1;
                worklist.push_back(next);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(merged)
}
