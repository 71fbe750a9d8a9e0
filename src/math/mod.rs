//! Mathematical utilities: bounded Levenberg-Marquardt, numerical
//! integration, and the statistical tests used by the comparator.

pub mod integrate;
pub mod lm;
pub mod stats;

pub use integrate::*;
pub use lm::*;
pub use stats::*;
