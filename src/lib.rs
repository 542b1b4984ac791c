//! Two-column (X, Y) measurement series ("spectra") and their numeric
//! engine: construction, arithmetic between misaligned grids, overlap
//! merging, range queries, calculus helpers and a flat text format.

pub mod data;
pub mod error;

pub use data::arithmetic::{combine, polarization_degree, Operator};
pub use data::calculus::{array_derivative, point_derivative};
pub use data::filter::{Extremum, Split};
pub use data::loader::{load_series, load_series_with, resolve_reference_operand, save_series};
pub use data::merge::{merge, merge_all};
pub use data::model::{Metadata, ReferenceOperand, Series, SOURCE_KEY};
pub use data::overlap::{overlap, Overlap};
pub use data::spline::{Spline, SPLINE_DEGREE};
pub use data::text::{from_text, to_text, ParseMode};
pub use error::SeriesError;
