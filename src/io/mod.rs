//! Input/output helpers.
//!
//! - raw CSV ingest + validation (`ingest`)
//! - cleaned/feature CSV writers (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
