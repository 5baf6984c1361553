//! Synthetic dataset generation.

pub mod generate;

pub use generate::*;
