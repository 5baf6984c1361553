//! CSV writers for the three pipeline artifacts.
//!
//! All writers create parent directories on demand so a fresh checkout can
//! run the stages in order without any setup.

use std::fs::{create_dir_all, File};
use std::path::Path;

use crate::data::{GeneratedData, RAW_HEADER};
use crate::domain::{CleanAsset, FeatureRow};
use crate::error::AppError;

/// Create the parent directory of `path` if it does not exist yet.
pub fn ensure_parent_dir(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent).map_err(|e| {
                AppError::new(
                    2,
                    format!("Failed to create directory '{}': {e}", parent.display()),
                )
            })?;
        }
    }
    Ok(())
}

/// Write the generator's dirty rows as the raw CSV artifact.
pub fn write_raw_csv(path: &Path, data: &GeneratedData) -> Result<(), AppError> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create raw CSV '{}': {e}", path.display()))
    })?;

    let mut writer = csv::Writer::from_writer(file);
    writer
        .write_record(RAW_HEADER)
        .map_err(|e| AppError::new(2, format!("Failed to write raw CSV header: {e}")))?;
    for row in &data.rows {
        writer
            .write_record(row)
            .map_err(|e| AppError::new(2, format!("Failed to write raw CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush raw CSV: {e}")))?;
    Ok(())
}

/// Write the full cleaned table.
pub fn write_clean_csv(path: &Path, assets: &[CleanAsset]) -> Result<(), AppError> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create cleaned CSV '{}': {e}", path.display()),
        )
    })?;

    let mut writer = csv::Writer::from_writer(file);
    for asset in assets {
        writer
            .serialize(asset)
            .map_err(|e| AppError::new(2, format!("Failed to write cleaned CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush cleaned CSV: {e}")))?;
    Ok(())
}

/// Write the modeling-ready feature projection.
pub fn write_features_csv(path: &Path, assets: &[CleanAsset]) -> Result<(), AppError> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create feature CSV '{}': {e}", path.display()),
        )
    })?;

    let mut writer = csv::Writer::from_writer(file);
    for asset in assets {
        writer
            .serialize(FeatureRow::from(asset))
            .map_err(|e| AppError::new(2, format!("Failed to write feature CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush feature CSV: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ingest::read_clean_assets;
    use chrono::NaiveDate;

    fn asset(id: &str) -> CleanAsset {
        CleanAsset {
            asset_id: id.to_string(),
            vendor: "Lenovo".to_string(),
            model: "ThinkPad T14".to_string(),
            cpu: "i7-1260P".to_string(),
            storage_type: "NVMe".to_string(),
            os_version: "Windows 11 23H2".to_string(),
            location: "HQ".to_string(),
            status: "active".to_string(),
            purchase_date: NaiveDate::from_ymd_opt(2022, 1, 10).unwrap(),
            warranty_end: Some(NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()),
            retire_date: None,
            ram_gb: 16.0,
            storage_gb: 512.0,
            ticket_count_last_6m: 1.0,
            bsod_cnt_30d: 0.0,
            battery_cycle: 300.0,
            battery_design_cap: 50.0,
            battery_full_cap: 45.0,
            cpu_temp_max: 70.0,
            gpu_temp_max: 65.0,
            thermal_throttle_cnt: 2.0,
            smart_realloc: 0.0,
            smart_pending: 0.0,
            disk_errors_30d: 0.0,
            uptime_hours_7d: 80.0,
            patch_missing_cnt: 1.0,
            age_months: 43.4,
            in_warranty: 0,
            battery_health: 0.9,
            is_nvme: 1,
            is_mac: 0,
            label_failure_90d: 0,
            label_retire_180d: 0,
        }
    }

    #[test]
    fn clean_csv_round_trips() {
        let path = std::env::temp_dir().join(format!(
            "fleet-eda-export-{}.csv",
            std::process::id()
        ));
        let assets = vec![asset("A-1"), asset("A-2")];
        write_clean_csv(&path, &assets).unwrap();
        let loaded = read_clean_assets(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(assets, loaded);
    }
}
