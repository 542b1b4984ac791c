use std::borrow::Cow;
use std::ops::Range;

use crate::data::model::Series;
use crate::error::{Result, SeriesError};

// ---------------------------------------------------------------------------
// X-window restriction
// ---------------------------------------------------------------------------

/// Position and value of an extremum, with `index` in the original series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremum {
    pub x: f64,
    pub y: f64,
    pub index: usize,
}

/// A series cut in two at its minimum.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub minimum: Extremum,
    /// Samples before the minimum; `None` when the minimum is the first one.
    pub left: Option<Series>,
    /// Samples from the minimum on; `None` when the minimum is the last one.
    pub right: Option<Series>,
}

/// Index of the sample whose X is closest to `target`, first one on ties.
fn nearest_index(x: &[f64], target: f64) -> usize {
    let mut best = 0;
    let mut best_diff = f64::INFINITY;
    for (i, &v) in x.iter().enumerate() {
        let diff = (v - target).abs();
        if diff < best_diff {
            best = i;
            best_diff = diff;
        }
    }
    best
}

impl Series {
    /// Index window `lpos..end` selected by the bounds, or `None` when
    /// neither bound narrows the series.
    ///
    /// A narrowing right bound is exclusive: the sample it snaps to is left
    /// out. Without one the window runs to the last sample.
    fn window(&self, xl: Option<f64>, xr: Option<f64>) -> Result<Option<Range<usize>>> {
        let mut lpos = 0;
        let mut end = self.len();
        let mut narrowed = false;

        if let Some(xl) = xl.filter(|&v| v > self.x_min()) {
            lpos = nearest_index(self.x(), xl);
            narrowed = true;
        }
        if let Some(xr) = xr.filter(|&v| v < self.x_max()) {
            end = nearest_index(self.x(), xr);
            narrowed = true;
        }
        if !narrowed {
            return Ok(None);
        }
        if lpos >= end {
            return Err(SeriesError::InvalidRange {
                xl: xl.unwrap_or(self.x_min()),
                xr: xr.unwrap_or(self.x_max()),
            });
        }
        Ok(Some(lpos..end))
    }

    /// Restrict to the X window `[xl, xr)`; missing bounds default to the
    /// series' own extremes.
    ///
    /// Each bound snaps to the sample nearest to it, so the window may start
    /// or end slightly outside the requested range. The sample a right bound
    /// snaps to is excluded; the last sample is kept when there is no right
    /// bound. When neither bound narrows the series it is returned borrowed,
    /// without a copy.
    pub fn xfilter(&self, xl: Option<f64>, xr: Option<f64>) -> Result<Cow<'_, Series>> {
        match self.window(xl, xr)? {
            None => Ok(Cow::Borrowed(self)),
            Some(range) => Ok(Cow::Owned(self.derive(
                self.x()[range.clone()].to_vec(),
                self.y()[range].to_vec(),
            )?)),
        }
    }

    /// Minimum Y inside the [`Series::xfilter`] window, first occurrence on
    /// ties.
    pub fn minimum(&self, xl: Option<f64>, xr: Option<f64>) -> Result<Extremum> {
        let range = self.window(xl, xr)?.unwrap_or(0..self.len());

        let mut index = range.start;
        for i in range {
            if self.y()[i] < self.y()[index] {
                index = i;
            }
        }
        Ok(Extremum {
            x: self.x()[index],
            y: self.y()[index],
            index,
        })
    }

    /// Cut the series at the minimum found inside the [`Series::xfilter`]
    /// window.
    ///
    /// The minimum sample starts the right piece.
    pub fn split_at_minimum(&self, xl: Option<f64>, xr: Option<f64>) -> Result<Split> {
        let minimum = self.minimum(xl, xr)?;
        let at = minimum.index;

        let left = if at > 0 {
            Some(self.derive(self.x()[..at].to_vec(), self.y()[..at].to_vec())?)
        } else {
            None
        };
        let right = if at < self.len() - 1 {
            Some(self.derive(self.x()[at..].to_vec(), self.y()[at..].to_vec())?)
        } else {
            None
        };
        Ok(Split {
            minimum,
            left,
            right,
        })
    }
}
