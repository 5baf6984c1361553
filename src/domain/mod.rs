//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the column vocabulary (`NumericField`, `CatField`)
//! - raw and cleaned asset records (`AssetRow`, `CleanAsset`, `FeatureRow`)
//! - per-stage configuration (`GenerateConfig`, `PreprocessConfig`, `AnalyzeConfig`)

pub mod types;

pub use types::*;
