//! Imputation passes: vendor-median numerics, sentinel categoricals, dates.
//!
//! The numeric pass is an explicit two-level fallback, applied per column:
//!
//! 1. median of the same-vendor group (only rows with a present value count)
//! 2. global median of the column
//! 3. `0.0` when the entire column is empty (logged, should not happen on
//!    generator output)
//!
//! Row order is never changed; each pass only fills absent slots in place.

use std::collections::HashMap;

use chrono::NaiveDate;
use log::warn;

use crate::domain::{reference_date, AssetRow, CatField, NumericField};
use crate::math::median;

/// Sentinel for absent categorical values.
pub const UNKNOWN: &str = "unknown";

/// Vendor key used to group rows whose vendor is still absent.
fn vendor_key(row: &AssetRow) -> &str {
    row.vendor.as_deref().unwrap_or(UNKNOWN)
}

/// Fill absent numeric values, column by column. Returns the number of
/// values imputed (for the run summary).
pub fn impute_numeric(rows: &mut [AssetRow]) -> usize {
    let mut filled = 0usize;

    for field in NumericField::ALL {
        // Aggregation pass: collect present values per vendor and globally.
        let mut by_vendor: HashMap<String, Vec<f64>> = HashMap::new();
        let mut all = Vec::with_capacity(rows.len());
        for row in rows.iter() {
            if let Some(v) = field.get(row) {
                by_vendor
                    .entry(vendor_key(row).to_string())
                    .or_default()
                    .push(v);
                all.push(v);
            }
        }

        let global = median(&all);
        let vendor_medians: HashMap<String, f64> = by_vendor
            .into_iter()
            .filter_map(|(vendor, values)| median(&values).map(|m| (vendor, m)))
            .collect();

        // Fill pass.
        for row in rows.iter_mut() {
            if field.get(row).is_some() {
                continue;
            }
            let value = vendor_medians
                .get(vendor_key(row))
                .copied()
                .or(global)
                .unwrap_or_else(|| {
                    warn!(
                        "column `{}` has no valid values at all; imputing 0",
                        field.name()
                    );
                    0.0
                });
            field.set(row, Some(value));
            filled += 1;
        }
    }

    filled
}

/// Fill absent or empty categorical values with the `"unknown"` sentinel.
pub fn impute_categorical(rows: &mut [AssetRow]) -> usize {
    let mut filled = 0usize;
    for row in rows.iter_mut() {
        for field in CatField::ALL {
            let absent = match field.get(row) {
                None => true,
                Some(s) => s.trim().is_empty(),
            };
            if absent {
                field.set(row, Some(UNKNOWN.to_string()));
                filled += 1;
            }
        }
    }
    filled
}

/// Fill absent purchase dates with the column's median date.
///
/// Age features need a defined purchase date on every row. The median (lower
/// middle order statistic, no interpolation) is deterministic and robust to
/// the handful of unparseable dates the generator plants. Falls back to the
/// reference date (age 0) if no row carries a parseable date.
pub fn impute_purchase_date(rows: &mut [AssetRow]) -> usize {
    let mut dates: Vec<NaiveDate> = rows.iter().filter_map(|r| r.purchase_date).collect();
    dates.sort();

    let fallback = if dates.is_empty() {
        warn!("no parseable purchase_date in the dataset; imputing the reference date");
        reference_date()
    } else {
        dates[(dates.len() - 1) / 2]
    };

    let mut filled = 0usize;
    for row in rows.iter_mut() {
        if row.purchase_date.is_none() {
            row.purchase_date = Some(fallback);
            filled += 1;
        }
    }
    filled
}
