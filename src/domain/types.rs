//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during cleaning and imputation
//! - exported to CSV
//! - reloaded later for analysis and reporting

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fixed reference date for age/warranty features.
///
/// The pipeline is a batch job over a frozen telemetry extract, so derived
/// ages are computed against the extract date rather than the wall clock.
/// This keeps every stage deterministic and re-runnable.
pub fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 13).expect("static date is valid")
}

/// Numeric telemetry columns, in canonical output order.
///
/// Centralizing the column vocabulary in one enum keeps the impute/clip
/// passes generic: they iterate `NumericField::ALL` instead of hand-listing
/// struct fields in several places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    RamGb,
    StorageGb,
    TicketCountLast6m,
    BsodCnt30d,
    BatteryCycle,
    BatteryDesignCap,
    BatteryFullCap,
    CpuTempMax,
    GpuTempMax,
    ThermalThrottleCnt,
    SmartRealloc,
    SmartPending,
    DiskErrors30d,
    UptimeHours7d,
    PatchMissingCnt,
}

impl NumericField {
    pub const ALL: [NumericField; 15] = [
        NumericField::RamGb,
        NumericField::StorageGb,
        NumericField::TicketCountLast6m,
        NumericField::BsodCnt30d,
        NumericField::BatteryCycle,
        NumericField::BatteryDesignCap,
        NumericField::BatteryFullCap,
        NumericField::CpuTempMax,
        NumericField::GpuTempMax,
        NumericField::ThermalThrottleCnt,
        NumericField::SmartRealloc,
        NumericField::SmartPending,
        NumericField::DiskErrors30d,
        NumericField::UptimeHours7d,
        NumericField::PatchMissingCnt,
    ];

    /// CSV column name.
    pub fn name(self) -> &'static str {
        match self {
            NumericField::RamGb => "ram_gb",
            NumericField::StorageGb => "storage_gb",
            NumericField::TicketCountLast6m => "ticket_count_last_6m",
            NumericField::BsodCnt30d => "bsod_cnt_30d",
            NumericField::BatteryCycle => "battery_cycle",
            NumericField::BatteryDesignCap => "battery_design_cap",
            NumericField::BatteryFullCap => "battery_full_cap",
            NumericField::CpuTempMax => "cpu_temp_max",
            NumericField::GpuTempMax => "gpu_temp_max",
            NumericField::ThermalThrottleCnt => "thermal_throttle_cnt",
            NumericField::SmartRealloc => "smart_realloc",
            NumericField::SmartPending => "smart_pending",
            NumericField::DiskErrors30d => "disk_errors_30d",
            NumericField::UptimeHours7d => "uptime_hours_7d",
            NumericField::PatchMissingCnt => "patch_missing_cnt",
        }
    }

    /// Physically plausible [min, max] for this column, if any.
    ///
    /// Values outside the range are treated as sensor noise: set to absent
    /// and later imputed, never silently kept.
    pub fn plausible_range(self) -> Option<(f64, f64)> {
        match self {
            NumericField::CpuTempMax | NumericField::GpuTempMax => Some((20.0, 120.0)),
            NumericField::BatteryCycle => Some((0.0, f64::INFINITY)),
            _ => None,
        }
    }

    pub fn get(self, row: &AssetRow) -> Option<f64> {
        match self {
            NumericField::RamGb => row.ram_gb,
            NumericField::StorageGb => row.storage_gb,
            NumericField::TicketCountLast6m => row.ticket_count_last_6m,
            NumericField::BsodCnt30d => row.bsod_cnt_30d,
            NumericField::BatteryCycle => row.battery_cycle,
            NumericField::BatteryDesignCap => row.battery_design_cap,
            NumericField::BatteryFullCap => row.battery_full_cap,
            NumericField::CpuTempMax => row.cpu_temp_max,
            NumericField::GpuTempMax => row.gpu_temp_max,
            NumericField::ThermalThrottleCnt => row.thermal_throttle_cnt,
            NumericField::SmartRealloc => row.smart_realloc,
            NumericField::SmartPending => row.smart_pending,
            NumericField::DiskErrors30d => row.disk_errors_30d,
            NumericField::UptimeHours7d => row.uptime_hours_7d,
            NumericField::PatchMissingCnt => row.patch_missing_cnt,
        }
    }

    pub fn set(self, row: &mut AssetRow, value: Option<f64>) {
        match self {
            NumericField::RamGb => row.ram_gb = value,
            NumericField::StorageGb => row.storage_gb = value,
            NumericField::TicketCountLast6m => row.ticket_count_last_6m = value,
            NumericField::BsodCnt30d => row.bsod_cnt_30d = value,
            NumericField::BatteryCycle => row.battery_cycle = value,
            NumericField::BatteryDesignCap => row.battery_design_cap = value,
            NumericField::BatteryFullCap => row.battery_full_cap = value,
            NumericField::CpuTempMax => row.cpu_temp_max = value,
            NumericField::GpuTempMax => row.gpu_temp_max = value,
            NumericField::ThermalThrottleCnt => row.thermal_throttle_cnt = value,
            NumericField::SmartRealloc => row.smart_realloc = value,
            NumericField::SmartPending => row.smart_pending = value,
            NumericField::DiskErrors30d => row.disk_errors_30d = value,
            NumericField::UptimeHours7d => row.uptime_hours_7d = value,
            NumericField::PatchMissingCnt => row.patch_missing_cnt = value,
        }
    }

    /// Read the same column off a cleaned asset (always present there).
    pub fn get_clean(self, asset: &CleanAsset) -> f64 {
        match self {
            NumericField::RamGb => asset.ram_gb,
            NumericField::StorageGb => asset.storage_gb,
            NumericField::TicketCountLast6m => asset.ticket_count_last_6m,
            NumericField::BsodCnt30d => asset.bsod_cnt_30d,
            NumericField::BatteryCycle => asset.battery_cycle,
            NumericField::BatteryDesignCap => asset.battery_design_cap,
            NumericField::BatteryFullCap => asset.battery_full_cap,
            NumericField::CpuTempMax => asset.cpu_temp_max,
            NumericField::GpuTempMax => asset.gpu_temp_max,
            NumericField::ThermalThrottleCnt => asset.thermal_throttle_cnt,
            NumericField::SmartRealloc => asset.smart_realloc,
            NumericField::SmartPending => asset.smart_pending,
            NumericField::DiskErrors30d => asset.disk_errors_30d,
            NumericField::UptimeHours7d => asset.uptime_hours_7d,
            NumericField::PatchMissingCnt => asset.patch_missing_cnt,
        }
    }
}

/// Categorical columns, in canonical output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatField {
    Vendor,
    Model,
    Cpu,
    StorageType,
    OsVersion,
    Location,
    Status,
}

impl CatField {
    pub const ALL: [CatField; 7] = [
        CatField::Vendor,
        CatField::Model,
        CatField::Cpu,
        CatField::StorageType,
        CatField::OsVersion,
        CatField::Location,
        CatField::Status,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CatField::Vendor => "vendor",
            CatField::Model => "model",
            CatField::Cpu => "cpu",
            CatField::StorageType => "storage_type",
            CatField::OsVersion => "os_version",
            CatField::Location => "location",
            CatField::Status => "status",
        }
    }

    pub fn get<'a>(self, row: &'a AssetRow) -> Option<&'a str> {
        match self {
            CatField::Vendor => row.vendor.as_deref(),
            CatField::Model => row.model.as_deref(),
            CatField::Cpu => row.cpu.as_deref(),
            CatField::StorageType => row.storage_type.as_deref(),
            CatField::OsVersion => row.os_version.as_deref(),
            CatField::Location => row.location.as_deref(),
            CatField::Status => row.status.as_deref(),
        }
    }

    pub fn set(self, row: &mut AssetRow, value: Option<String>) {
        match self {
            CatField::Vendor => row.vendor = value,
            CatField::Model => row.model = value,
            CatField::Cpu => row.cpu = value,
            CatField::StorageType => row.storage_type = value,
            CatField::OsVersion => row.os_version = value,
            CatField::Location => row.location = value,
            CatField::Status => row.status = value,
        }
    }
}

/// A raw asset row after lenient parsing (absent where malformed).
///
/// This mirrors the raw CSV schema and allows us to:
/// - perform row-level cleanup with good notes about what was repaired
/// - keep the impute/clip passes generic over `NumericField` / `CatField`
#[derive(Debug, Clone, Default)]
pub struct AssetRow {
    pub asset_id: String,

    pub vendor: Option<String>,
    pub model: Option<String>,
    pub cpu: Option<String>,
    pub storage_type: Option<String>,
    pub os_version: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,

    pub purchase_date: Option<NaiveDate>,
    pub warranty_end: Option<NaiveDate>,
    pub retire_date: Option<NaiveDate>,

    pub ram_gb: Option<f64>,
    pub storage_gb: Option<f64>,
    pub ticket_count_last_6m: Option<f64>,
    pub bsod_cnt_30d: Option<f64>,
    pub battery_cycle: Option<f64>,
    pub battery_design_cap: Option<f64>,
    pub battery_full_cap: Option<f64>,
    pub cpu_temp_max: Option<f64>,
    pub gpu_temp_max: Option<f64>,
    pub thermal_throttle_cnt: Option<f64>,
    pub smart_realloc: Option<f64>,
    pub smart_pending: Option<f64>,
    pub disk_errors_30d: Option<f64>,
    pub uptime_hours_7d: Option<f64>,
    pub patch_missing_cnt: Option<f64>,

    pub label_failure_90d: Option<u8>,
    pub label_retire_180d: Option<u8>,
}

/// A fully cleaned asset: deduplicated, imputed, capped, feature-engineered.
///
/// Serialized field order defines the output CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanAsset {
    pub asset_id: String,

    pub vendor: String,
    pub model: String,
    pub cpu: String,
    pub storage_type: String,
    pub os_version: String,
    pub location: String,
    pub status: String,

    pub purchase_date: NaiveDate,
    pub warranty_end: Option<NaiveDate>,
    pub retire_date: Option<NaiveDate>,

    pub ram_gb: f64,
    pub storage_gb: f64,
    pub ticket_count_last_6m: f64,
    pub bsod_cnt_30d: f64,
    pub battery_cycle: f64,
    pub battery_design_cap: f64,
    pub battery_full_cap: f64,
    pub cpu_temp_max: f64,
    pub gpu_temp_max: f64,
    pub thermal_throttle_cnt: f64,
    pub smart_realloc: f64,
    pub smart_pending: f64,
    pub disk_errors_30d: f64,
    pub uptime_hours_7d: f64,
    pub patch_missing_cnt: f64,

    pub age_months: f64,
    pub in_warranty: u8,
    pub battery_health: f64,
    pub is_nvme: u8,
    pub is_mac: u8,

    pub label_failure_90d: u8,
    pub label_retire_180d: u8,
}

/// Modeling-ready projection of a cleaned asset.
///
/// Narrower than `CleanAsset`: drops raw dates and keeps only columns a
/// downstream model would consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRow {
    pub asset_id: String,
    pub vendor: String,
    pub model: String,
    pub cpu: String,
    pub ram_gb: f64,
    pub storage_gb: f64,
    pub storage_type: String,
    pub os_version: String,
    pub location: String,
    pub age_months: f64,
    pub in_warranty: u8,
    pub battery_health: f64,
    pub battery_cycle: f64,
    pub cpu_temp_max: f64,
    pub gpu_temp_max: f64,
    pub thermal_throttle_cnt: f64,
    pub smart_realloc: f64,
    pub smart_pending: f64,
    pub disk_errors_30d: f64,
    pub uptime_hours_7d: f64,
    pub patch_missing_cnt: f64,
    pub ticket_count_last_6m: f64,
    pub bsod_cnt_30d: f64,
    pub label_failure_90d: u8,
    pub label_retire_180d: u8,
}

impl From<&CleanAsset> for FeatureRow {
    fn from(a: &CleanAsset) -> Self {
        FeatureRow {
            asset_id: a.asset_id.clone(),
            vendor: a.vendor.clone(),
            model: a.model.clone(),
            cpu: a.cpu.clone(),
            ram_gb: a.ram_gb,
            storage_gb: a.storage_gb,
            storage_type: a.storage_type.clone(),
            os_version: a.os_version.clone(),
            location: a.location.clone(),
            age_months: a.age_months,
            in_warranty: a.in_warranty,
            battery_health: a.battery_health,
            battery_cycle: a.battery_cycle,
            cpu_temp_max: a.cpu_temp_max,
            gpu_temp_max: a.gpu_temp_max,
            thermal_throttle_cnt: a.thermal_throttle_cnt,
            smart_realloc: a.smart_realloc,
            smart_pending: a.smart_pending,
            disk_errors_30d: a.disk_errors_30d,
            uptime_hours_7d: a.uptime_hours_7d,
            patch_missing_cnt: a.patch_missing_cnt,
            ticket_count_last_6m: a.ticket_count_last_6m,
            bsod_cnt_30d: a.bsod_cnt_30d,
            label_failure_90d: a.label_failure_90d,
            label_retire_180d: a.label_retire_180d,
        }
    }
}

/// Generator stage configuration (derived from CLI flags plus defaults).
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub out_path: PathBuf,
    pub count: usize,
    pub seed: u64,

    /// Fraction of rows whose categorical value gets a known misspelling.
    pub typo_frac: f64,
    /// Fraction of rows whose dates use a non-ISO format.
    pub alt_date_frac: f64,
    /// Fraction of rows whose numeric fields carry a unit suffix (`65°C`).
    pub unit_frac: f64,
    /// Per-field probability of a missing value.
    pub missing_frac: f64,
    /// Per-field probability of an implausible outlier.
    pub outlier_frac: f64,
    /// Fraction of rows re-emitted later with the same `asset_id`.
    pub dup_frac: f64,
}

/// Preprocessor stage configuration.
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    pub raw_path: PathBuf,
    pub clean_path: PathBuf,
    pub features_path: PathBuf,
}

/// Analyzer stage configuration.
#[derive(Debug, Clone)]
pub struct AnalyzeConfig {
    pub clean_path: PathBuf,
    pub report_dir: PathBuf,
    /// How many columns to show in the missing-value summary.
    pub top_missing: usize,
}
