//! Data layer: the series type and everything computed from it.
//!
//! Architecture:
//! ```text
//!  text / .json / .csv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  file → Series (text parsing in `text`)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐        ┌──────────┐
//!   │  Series   │ ◄────► │ overlap   │  common X-domain, index shift
//!   └──────────┘        └──────────┘
//!        │                    │
//!        ├── arithmetic ◄─────┤  (+ spline for misaligned grids)
//!        ├── merge ◄──────────┘
//!        ├── filter      X-window, minimum, split
//!        ├── calculus    derivative, area
//!        └── smooth      Savitzky-Golay
//! ```

pub mod arithmetic;
pub mod calculus;
pub mod filter;
pub mod loader;
pub mod merge;
pub mod model;
pub mod overlap;
pub mod smooth;
pub mod spline;
pub mod text;
