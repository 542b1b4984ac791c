use crate::data::model::Series;
use crate::error::{Result, SeriesError};

/// Common X-domain of two series and the index alignment over it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlap {
    /// Max of the two series' first X values.
    pub x_min: f64,
    /// Min of the two series' last X values.
    pub x_max: f64,
    /// Index in `a` of the first X `>= x_min`, minus the same index in `b`.
    pub shift: isize,
    /// Number of lock-step positions available from the shifted starts.
    pub length: usize,
}

impl Overlap {
    /// Starting indices into `a` and `b` for the lock-step walk.
    pub fn offsets(&self) -> (usize, usize) {
        if self.shift > 0 {
            (self.shift.unsigned_abs(), 0)
        } else {
            (0, self.shift.unsigned_abs())
        }
    }
}

/// Resolve the overlap of `a` and `b`.
///
/// Fails with [`SeriesError::NoOverlap`] when the X ranges are disjoint.
pub fn overlap(a: &Series, b: &Series) -> Result<Overlap> {
    let x_min = a.x_min().max(b.x_min());
    let x_max = a.x_max().min(b.x_max());
    if x_max < x_min {
        return Err(SeriesError::NoOverlap {
            a_min: a.x_min(),
            a_max: a.x_max(),
            b_min: b.x_min(),
            b_max: b.x_max(),
        });
    }

    // Both exist: x_min never exceeds either series' last X.
    let i1 = a.x().partition_point(|&v| v < x_min);
    let i2 = b.x().partition_point(|&v| v < x_min);
    let shift = i1 as isize - i2 as isize;

    let length = if shift > 0 {
        (a.len() - i1 + i2).min(b.len())
    } else {
        (b.len() - i2 + i1).min(a.len())
    };

    Ok(Overlap {
        x_min,
        x_max,
        shift,
        length,
    })
}
