//! Input/output helpers.
//!
//! - long-format CSV ingest + validation (`ingest`)
//! - per-plate metabolite maps (`plate`)
//! - result exports (`export`)

pub mod export;
pub mod ingest;
pub mod plate;

pub use export::*;
pub use ingest::*;
pub use plate::*;
