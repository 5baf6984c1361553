//! Feature engineering over fully imputed rows.
//!
//! Every derived attribute is a deterministic function of cleaned base
//! attributes and the fixed reference date, so re-running the stage on its
//! own output is a no-op.

use chrono::NaiveDate;

use crate::domain::AssetRow;

/// Sensor noise can report a full capacity slightly above design capacity;
/// anything beyond this ratio is capped rather than trusted.
const BATTERY_HEALTH_CAP: f64 = 1.2;

/// Derived attributes for one asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Derived {
    pub age_months: f64,
    pub in_warranty: u8,
    pub battery_health: f64,
    pub is_nvme: u8,
    pub is_mac: u8,
}

/// Compute derived attributes for an imputed row.
///
/// Callers must run the impute passes first: `purchase_date` and the battery
/// capacities are assumed present.
pub fn derive(row: &AssetRow, reference: NaiveDate) -> Derived {
    let age_months = row
        .purchase_date
        .map(|d| age_months(reference, d))
        .unwrap_or(0.0);

    let in_warranty = match row.warranty_end {
        Some(end) if reference <= end => 1,
        _ => 0,
    };

    let battery_health = battery_health(
        row.battery_full_cap.unwrap_or(0.0),
        row.battery_design_cap.unwrap_or(0.0),
    );

    let is_nvme = row
        .storage_type
        .as_deref()
        .map(|s| s.to_uppercase().contains("NVME"))
        .unwrap_or(false) as u8;

    let is_mac = row
        .os_version
        .as_deref()
        .map(|s| s.to_lowercase().contains("macos"))
        .unwrap_or(false) as u8;

    Derived {
        age_months,
        in_warranty,
        battery_health,
        is_nvme,
        is_mac,
    }
}

/// Whole months (to one decimal) between purchase and the reference date,
/// floored at zero for future-dated purchases.
fn age_months(reference: NaiveDate, purchase: NaiveDate) -> f64 {
    let days = (reference - purchase).num_days().max(0) as f64;
    ((days / 30.0) * 10.0).round() / 10.0
}

/// Ratio of full to design capacity, capped at [`BATTERY_HEALTH_CAP`].
///
/// A non-positive design capacity yields 0.0 (treated as a dead reading).
fn battery_health(full: f64, design: f64) -> f64 {
    if design <= 0.0 || !full.is_finite() {
        return 0.0;
    }
    (full / design).min(BATTERY_HEALTH_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn age_months_rounds_to_one_decimal() {
        // 365 days / 30 = 12.1666... -> 12.2
        assert_eq!(age_months(d(2025, 8, 13), d(2024, 8, 13)), 12.2);
        assert_eq!(age_months(d(2025, 8, 13), d(2025, 8, 13)), 0.0);
    }

    #[test]
    fn age_months_floors_future_dates() {
        assert_eq!(age_months(d(2025, 8, 13), d(2026, 1, 1)), 0.0);
    }

    #[test]
    fn battery_health_exact_ratio() {
        assert_eq!(battery_health(45.0, 50.0), 0.9);
        assert_eq!(battery_health(50.0, 50.0), 1.0);
    }

    #[test]
    fn battery_health_capped_and_guarded() {
        assert_eq!(battery_health(100.0, 50.0), BATTERY_HEALTH_CAP);
        assert_eq!(battery_health(45.0, 0.0), 0.0);
    }

    #[test]
    fn storage_and_os_flags() {
        let mut row = AssetRow {
            asset_id: "A".to_string(),
            storage_type: Some("NVMe SSD".to_string()),
            os_version: Some("macOS 14.2".to_string()),
            ..AssetRow::default()
        };
        let derived = derive(&row, d(2025, 8, 13));
        assert_eq!(derived.is_nvme, 1);
        assert_eq!(derived.is_mac, 1);

        row.storage_type = Some("SATA SSD".to_string());
        row.os_version = Some("Windows 11".to_string());
        let derived = derive(&row, d(2025, 8, 13));
        assert_eq!(derived.is_nvme, 0);
        assert_eq!(derived.is_mac, 0);
    }

    #[test]
    fn warranty_boundary_is_inclusive() {
        let mut row = AssetRow {
            asset_id: "A".to_string(),
            warranty_end: Some(d(2025, 8, 13)),
            ..AssetRow::default()
        };
        assert_eq!(derive(&row, d(2025, 8, 13)).in_warranty, 1);
        row.warranty_end = Some(d(2025, 8, 12));
        assert_eq!(derive(&row, d(2025, 8, 13)).in_warranty, 0);
        row.warranty_end = None;
        assert_eq!(derive(&row, d(2025, 8, 13)).in_warranty, 0);
    }
}
