//! Growth-curve fitting.
//!
//! Responsibilities:
//!
//! - fit one replicate's log-relative growth series to a model (`fitter`)
//! - retry with fresh random initial guesses until a fit quality threshold
//!   is reached or the trial budget runs out (`trials`)

pub mod fitter;
pub mod trials;

pub use fitter::*;
pub use trials::*;
