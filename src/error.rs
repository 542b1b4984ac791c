use thiserror::Error;

/// Errors raised by the series engine.
///
/// Every variant is a local, synchronous failure: no operation that returns
/// an error leaves a partially built [`Series`](crate::Series) behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("X and Y must be of the same length (x has {x_len}, y has {y_len})")]
    ShapeMismatch { x_len: usize, y_len: usize },

    #[error("series data must be non-empty")]
    EmptySeries,

    #[error("X ranges do not overlap: [{a_min}, {a_max}] vs [{b_min}, {b_max}]")]
    NoOverlap {
        a_min: f64,
        a_max: f64,
        b_min: f64,
        b_max: f64,
    },

    #[error("unsupported arithmetic operator: {0}")]
    UnsupportedOperator(String),

    #[error("not a series or a number: {0}")]
    TypeMismatch(String),

    #[error("index {index} is not an interior index of a series of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("empty X window: left bound {xl} lies past right bound {xr}")]
    InvalidRange { xl: f64, xr: f64 },

    #[error("interpolation system is singular at row {row}")]
    SingularSystem { row: usize },

    #[error("invalid smoothing window {window} for polynomial order {order} over {len} samples")]
    InvalidWindow {
        window: usize,
        order: usize,
        len: usize,
    },

    #[error("line {line_no}: not a data or metadata line: {content:?}")]
    MalformedLine { line_no: usize, content: String },

    #[error("some data cannot be merged with the rest after {attempts} attempts: {}", unmerged.join(", "))]
    MergeExhausted {
        attempts: usize,
        unmerged: Vec<String>,
    },
}

pub type Result<T> = std::result::Result<T, SeriesError>;
