//! Cleaning pipeline: dedupe -> normalize -> bound -> impute -> cap -> derive.
//!
//! The passes run in a fixed order on an in-memory row set. Field-level
//! problems were already degraded to absent values during ingest; this module
//! never aborts on data content, only on internal inconsistencies.

use std::collections::HashSet;

use log::info;

use crate::domain::{reference_date, AssetRow, CatField, CleanAsset, NumericField};
use crate::error::AppError;
use crate::math::clip_bounds;

pub mod features;
pub mod impute;
pub mod parse;

/// Counters describing what the cleaning pass did (for the run summary).
#[derive(Debug, Clone, Default)]
pub struct CleanStats {
    pub rows_in: usize,
    pub rows_out: usize,
    pub duplicates_dropped: usize,
    pub numeric_imputed: usize,
    pub categorical_imputed: usize,
    pub dates_imputed: usize,
    pub out_of_range_cleared: usize,
    pub labels_defaulted: usize,
}

/// Output of a full preprocessing run.
#[derive(Debug, Clone)]
pub struct PreprocessOutput {
    pub assets: Vec<CleanAsset>,
    pub stats: CleanStats,
}

/// Run the full cleaning pipeline over ingested rows.
pub fn preprocess(rows: Vec<AssetRow>) -> Result<PreprocessOutput, AppError> {
    let mut stats = CleanStats {
        rows_in: rows.len(),
        ..CleanStats::default()
    };

    // 1) Deduplicate by asset_id, keep the last occurrence.
    let mut rows = dedupe_keep_last(rows);
    stats.duplicates_dropped = stats.rows_in - rows.len();

    // 2) Normalize vendor spellings (other categoricals are only trimmed).
    for row in rows.iter_mut() {
        if let Some(v) = row.vendor.take() {
            row.vendor = Some(parse::normalize_vendor(&v));
        }
        for field in CatField::ALL {
            if let Some(s) = field.get(row) {
                let trimmed = s.trim().to_string();
                field.set(row, Some(trimmed));
            }
        }
    }

    // 3) Clear physically implausible numerics (absent, then imputed below).
    stats.out_of_range_cleared = clear_out_of_range(&mut rows);

    // 4) Impute.
    stats.numeric_imputed = impute::impute_numeric(&mut rows);
    stats.categorical_imputed = impute::impute_categorical(&mut rows);
    stats.dates_imputed = impute::impute_purchase_date(&mut rows);

    // 5) Cap outliers to each column's own [p01, p99].
    cap_outliers(&mut rows);

    // 6) Engineer derived attributes and assemble the cleaned records.
    let reference = reference_date();
    let mut assets = Vec::with_capacity(rows.len());
    for row in &rows {
        if row.label_failure_90d.is_none() || row.label_retire_180d.is_none() {
            stats.labels_defaulted += 1;
        }
        assets.push(finalize_row(row, reference)?);
    }

    stats.rows_out = assets.len();
    info!(
        "cleaned {} rows ({} duplicates dropped, {} numeric + {} categorical values imputed)",
        stats.rows_out, stats.duplicates_dropped, stats.numeric_imputed, stats.categorical_imputed
    );

    Ok(PreprocessOutput { assets, stats })
}

/// Keep only the last record per `asset_id`, in last-occurrence order.
fn dedupe_keep_last(rows: Vec<AssetRow>) -> Vec<AssetRow> {
    let mut seen: HashSet<String> = HashSet::with_capacity(rows.len());
    let mut kept: Vec<AssetRow> = Vec::with_capacity(rows.len());
    for row in rows.into_iter().rev() {
        if seen.insert(row.asset_id.clone()) {
            kept.push(row);
        }
    }
    kept.reverse();
    kept
}

/// Set values outside their plausibility bounds to absent.
fn clear_out_of_range(rows: &mut [AssetRow]) -> usize {
    let mut cleared = 0usize;
    for row in rows.iter_mut() {
        for field in NumericField::ALL {
            let Some((min, max)) = field.plausible_range() else {
                continue;
            };
            if let Some(v) = field.get(row) {
                if v < min || v > max {
                    field.set(row, None);
                    cleared += 1;
                }
            }
        }
    }
    cleared
}

/// Clamp every numeric column to its own [p01, p99].
///
/// Bounds are computed from the pre-clip distribution of each column; values
/// outside are moved to the nearest bound, never dropped. `clip_bounds` picks
/// order statistics, which keeps a second run over already-capped data from
/// moving anything.
fn cap_outliers(rows: &mut [AssetRow]) {
    for field in NumericField::ALL {
        let values: Vec<f64> = rows.iter().filter_map(|r| field.get(r)).collect();
        let Some((lo, hi)) = clip_bounds(&values, 0.01, 0.99) else {
            continue;
        };
        for row in rows.iter_mut() {
            if let Some(v) = field.get(row) {
                field.set(row, Some(v.clamp(lo, hi)));
            }
        }
    }
}

/// Assemble a `CleanAsset`. All fields must be present by now; a gap here is
/// a pipeline bug, not bad data.
fn finalize_row(row: &AssetRow, reference: chrono::NaiveDate) -> Result<CleanAsset, AppError> {
    fn req<T>(value: Option<T>, name: &str) -> Result<T, AppError> {
        value.ok_or_else(|| {
            AppError::new(4, format!("internal: `{name}` still absent after imputation"))
        })
    }

    let derived = features::derive(row, reference);

    Ok(CleanAsset {
        asset_id: row.asset_id.clone(),
        vendor: req(row.vendor.clone(), "vendor")?,
        model: req(row.model.clone(), "model")?,
        cpu: req(row.cpu.clone(), "cpu")?,
        storage_type: req(row.storage_type.clone(), "storage_type")?,
        os_version: req(row.os_version.clone(), "os_version")?,
        location: req(row.location.clone(), "location")?,
        status: req(row.status.clone(), "status")?,
        purchase_date: req(row.purchase_date, "purchase_date")?,
        warranty_end: row.warranty_end,
        retire_date: row.retire_date,
        ram_gb: req(row.ram_gb, "ram_gb")?,
        storage_gb: req(row.storage_gb, "storage_gb")?,
        ticket_count_last_6m: req(row.ticket_count_last_6m, "ticket_count_last_6m")?,
        bsod_cnt_30d: req(row.bsod_cnt_30d, "bsod_cnt_30d")?,
        battery_cycle: req(row.battery_cycle, "battery_cycle")?,
        battery_design_cap: req(row.battery_design_cap, "battery_design_cap")?,
        battery_full_cap: req(row.battery_full_cap, "battery_full_cap")?,
        cpu_temp_max: req(row.cpu_temp_max, "cpu_temp_max")?,
        gpu_temp_max: req(row.gpu_temp_max, "gpu_temp_max")?,
        thermal_throttle_cnt: req(row.thermal_throttle_cnt, "thermal_throttle_cnt")?,
        smart_realloc: req(row.smart_realloc, "smart_realloc")?,
        smart_pending: req(row.smart_pending, "smart_pending")?,
        disk_errors_30d: req(row.disk_errors_30d, "disk_errors_30d")?,
        uptime_hours_7d: req(row.uptime_hours_7d, "uptime_hours_7d")?,
        patch_missing_cnt: req(row.patch_missing_cnt, "patch_missing_cnt")?,
        age_months: derived.age_months,
        in_warranty: derived.in_warranty,
        battery_health: derived.battery_health,
        is_nvme: derived.is_nvme,
        is_mac: derived.is_mac,
        label_failure_90d: row.label_failure_90d.unwrap_or(0),
        label_retire_180d: row.label_retire_180d.unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// A fully-populated plausible row; tests poke holes into copies of it.
    fn base_row(id: &str, vendor: &str) -> AssetRow {
        AssetRow {
            asset_id: id.to_string(),
            vendor: Some(vendor.to_string()),
            model: Some("T14".to_string()),
            cpu: Some("i7-1260P".to_string()),
            storage_type: Some("NVMe".to_string()),
            os_version: Some("Windows 11".to_string()),
            location: Some("HQ".to_string()),
            status: Some("active".to_string()),
            purchase_date: Some(d(2022, 1, 10)),
            warranty_end: Some(d(2025, 1, 10)),
            retire_date: None,
            ram_gb: Some(16.0),
            storage_gb: Some(512.0),
            ticket_count_last_6m: Some(1.0),
            bsod_cnt_30d: Some(0.0),
            battery_cycle: Some(300.0),
            battery_design_cap: Some(50.0),
            battery_full_cap: Some(45.0),
            cpu_temp_max: Some(70.0),
            gpu_temp_max: Some(65.0),
            thermal_throttle_cnt: Some(2.0),
            smart_realloc: Some(0.0),
            smart_pending: Some(0.0),
            disk_errors_30d: Some(0.0),
            uptime_hours_7d: Some(80.0),
            patch_missing_cnt: Some(1.0),
            label_failure_90d: Some(0),
            label_retire_180d: Some(0),
        }
    }

    /// Re-feed a cleaned asset as if it were raw input.
    fn as_raw(a: &CleanAsset) -> AssetRow {
        AssetRow {
            asset_id: a.asset_id.clone(),
            vendor: Some(a.vendor.clone()),
            model: Some(a.model.clone()),
            cpu: Some(a.cpu.clone()),
            storage_type: Some(a.storage_type.clone()),
            os_version: Some(a.os_version.clone()),
            location: Some(a.location.clone()),
            status: Some(a.status.clone()),
            purchase_date: Some(a.purchase_date),
            warranty_end: a.warranty_end,
            retire_date: a.retire_date,
            ram_gb: Some(a.ram_gb),
            storage_gb: Some(a.storage_gb),
            ticket_count_last_6m: Some(a.ticket_count_last_6m),
            bsod_cnt_30d: Some(a.bsod_cnt_30d),
            battery_cycle: Some(a.battery_cycle),
            battery_design_cap: Some(a.battery_design_cap),
            battery_full_cap: Some(a.battery_full_cap),
            cpu_temp_max: Some(a.cpu_temp_max),
            gpu_temp_max: Some(a.gpu_temp_max),
            thermal_throttle_cnt: Some(a.thermal_throttle_cnt),
            smart_realloc: Some(a.smart_realloc),
            smart_pending: Some(a.smart_pending),
            disk_errors_30d: Some(a.disk_errors_30d),
            uptime_hours_7d: Some(a.uptime_hours_7d),
            patch_missing_cnt: Some(a.patch_missing_cnt),
            label_failure_90d: Some(a.label_failure_90d),
            label_retire_180d: Some(a.label_retire_180d),
        }
    }

    #[test]
    fn dedupe_keeps_last_occurrence() {
        let mut first = base_row("L-001", "Lenovo");
        first.cpu_temp_max = Some(60.0);
        let mut last = base_row("L-001", "Lenovo");
        last.cpu_temp_max = Some(75.0);
        let other = base_row("L-002", "Dell");

        let out = preprocess(vec![first, other, last]).unwrap();
        assert_eq!(out.assets.len(), 2);
        assert_eq!(out.stats.duplicates_dropped, 1);
        let survivor = out.assets.iter().find(|a| a.asset_id == "L-001").unwrap();
        assert_eq!(survivor.cpu_temp_max, 75.0);
    }

    #[test]
    fn imputation_is_complete() {
        let mut rows = Vec::new();
        for i in 0..20 {
            rows.push(base_row(&format!("L-{i:03}"), "Lenovo"));
        }
        // Poke holes of every kind.
        rows[0].vendor = None;
        rows[1].battery_cycle = None;
        rows[2].purchase_date = None;
        rows[3].cpu_temp_max = Some(500.0); // implausible -> absent -> imputed
        rows[4].status = Some(String::new());

        let out = preprocess(rows).unwrap();
        assert!(out.stats.out_of_range_cleared >= 1);
        for a in &out.assets {
            assert!(!a.vendor.is_empty());
            assert!(!a.status.is_empty());
            for field in NumericField::ALL {
                assert!(
                    field.get_clean(a).is_finite(),
                    "column {} not imputed",
                    field.name()
                );
            }
        }
    }

    #[test]
    fn capping_respects_preclip_percentiles() {
        let mut rows = Vec::new();
        for i in 0..150 {
            let mut r = base_row(&format!("L-{i:03}"), "Lenovo");
            r.uptime_hours_7d = Some(i as f64);
            rows.push(r);
        }
        let values: Vec<f64> = (0..150).map(|i| i as f64).collect();
        let (lo, hi) = clip_bounds(&values, 0.01, 0.99).unwrap();

        let out = preprocess(rows).unwrap();
        for a in &out.assets {
            assert!(a.uptime_hours_7d >= lo && a.uptime_hours_7d <= hi);
        }
        // The extremes were clamped to the bounds, not dropped.
        assert_eq!(out.assets.len(), 150);
        assert!(out.assets.iter().any(|a| a.uptime_hours_7d == lo));
        assert!(out.assets.iter().any(|a| a.uptime_hours_7d == hi));
    }

    #[test]
    fn battery_health_is_exact_ratio() {
        let rows: Vec<AssetRow> = (0..10)
            .map(|i| {
                let mut r = base_row(&format!("L-{i:03}"), "Lenovo");
                r.battery_design_cap = Some(50.0);
                r.battery_full_cap = Some(40.0 + i as f64);
                r
            })
            .collect();
        let out = preprocess(rows).unwrap();
        for a in &out.assets {
            assert_eq!(a.battery_health, a.battery_full_cap / a.battery_design_cap);
        }
    }

    #[test]
    fn preprocess_is_idempotent_on_clean_data() {
        let mut rows = Vec::new();
        for i in 0..30 {
            let mut r = base_row(&format!("L-{i:03}"), if i % 2 == 0 { "Lenovo" } else { "Dell" });
            r.cpu_temp_max = Some(55.0 + i as f64);
            r.battery_cycle = Some(100.0 + 10.0 * i as f64);
            rows.push(r);
        }
        let first = preprocess(rows).unwrap();
        let again = preprocess(first.assets.iter().map(as_raw).collect()).unwrap();

        assert_eq!(again.stats.numeric_imputed, 0);
        assert_eq!(again.stats.categorical_imputed, 0);
        assert_eq!(again.stats.duplicates_dropped, 0);
        assert_eq!(first.assets, again.assets);
    }

    #[test]
    fn end_to_end_dirty_row_scenario() {
        // The canonical dirty row: typo'd vendor, unit-suffixed temperature,
        // missing battery cycle count, non-ISO purchase date.
        let mut dirty = base_row("L-999", "lenov0");
        dirty.cpu_temp_max = parse::to_number("65°C");
        dirty.battery_cycle = None;
        dirty.purchase_date = parse::coerce_date("10/01/2022");

        let mut rows = vec![dirty];
        for i in 0..5 {
            let mut r = base_row(&format!("L-{i:03}"), "Lenovo");
            r.battery_cycle = Some(200.0 + 100.0 * i as f64);
            rows.push(r);
        }
        let vendor_median = 400.0; // median of 200..600

        let out = preprocess(rows).unwrap();
        let a = out.assets.iter().find(|a| a.asset_id == "L-999").unwrap();
        assert_eq!(a.vendor, "Lenovo");
        assert_eq!(a.cpu_temp_max, 65.0);
        assert_eq!(a.battery_cycle, vendor_median);
        assert_eq!(a.purchase_date, d(2022, 1, 10));
    }
}
