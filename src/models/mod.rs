//! Growth model functions (Logistic / Gompertz).

pub mod model;

pub use model::*;
