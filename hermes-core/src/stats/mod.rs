//! Incremental statistics over decimal series
//!
//! Building blocks for the standard indicator set. Each updates in O(1) per
//! sample and its value is a pure function of the samples pushed so far.

mod ewma;
mod sma;
mod stddev;

pub use ewma::Ewma;
pub use sma::Sma;
pub use stddev::RollingVariance;
