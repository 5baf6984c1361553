//! Synthetic "dirty" fleet telemetry generation.
//!
//! The generator produces plausible laptop records first, then corrupts a
//! configurable fraction of them the way real asset exports are corrupted:
//! vendor typos, mixed date formats, unit-suffixed numbers, blank cells,
//! implausible outliers, and duplicated asset ids (the duplicate is emitted
//! later so the preprocessor's keep-last rule wins).
//!
//! Everything is deterministic given the seed: the same `GenerateConfig`
//! always yields byte-identical CSV rows.

use chrono::{Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{reference_date, GenerateConfig};
use crate::error::AppError;

/// Raw CSV header, in output order.
pub const RAW_HEADER: [&str; 28] = [
    "asset_id",
    "vendor",
    "model",
    "cpu",
    "ram_gb",
    "storage_gb",
    "storage_type",
    "os_version",
    "location",
    "status",
    "purchase_date",
    "warranty_end",
    "retire_date",
    "battery_cycle",
    "battery_design_cap",
    "battery_full_cap",
    "cpu_temp_max",
    "gpu_temp_max",
    "thermal_throttle_cnt",
    "smart_realloc",
    "smart_pending",
    "disk_errors_30d",
    "uptime_hours_7d",
    "patch_missing_cnt",
    "ticket_count_last_6m",
    "bsod_cnt_30d",
    "label_failure_90d",
    "label_retire_180d",
];

const VENDORS: [&str; 7] = ["Lenovo", "Dell", "HP", "Apple", "Asus", "Acer", "MSI"];
const LOCATIONS: [&str; 5] = ["HQ", "Berlin", "Singapore", "Austin", "remote"];

/// Known misspellings planted by the typo corruption, per vendor.
fn typo_for(vendor: &str) -> Option<&'static [&'static str]> {
    match vendor {
        "Lenovo" => Some(&["lenov0", "lenvo", "LENOVO "]),
        "Dell" => Some(&["delll", " dell"]),
        "HP" => Some(&["h-p", "hp "]),
        "Apple" => Some(&["ap ple", "apple"]),
        "Asus" => Some(&["asuss"]),
        "Acer" => Some(&["\u{e2}cer"]),
        _ => None,
    }
}

/// A generated dataset: header plus stringly-typed rows, ready for CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedData {
    pub rows: Vec<Vec<String>>,
    pub duplicates: usize,
}

/// Generate `config.count` dirty records plus trailing duplicates.
pub fn generate(config: &GenerateConfig) -> Result<GeneratedData, AppError> {
    if config.count == 0 {
        return Err(AppError::new(2, "Record count must be > 0."));
    }
    for (name, frac) in [
        ("typo-frac", config.typo_frac),
        ("alt-date-frac", config.alt_date_frac),
        ("unit-frac", config.unit_frac),
        ("missing-frac", config.missing_frac),
        ("outlier-frac", config.outlier_frac),
        ("dup-frac", config.dup_frac),
    ] {
        if !(0.0..=1.0).contains(&frac) {
            return Err(AppError::new(2, format!("`--{name}` must be in [0, 1].")));
        }
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let temp_noise = Normal::new(0.0, 8.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;
    let cap_noise = Normal::new(0.0, 4.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut rows = Vec::with_capacity(config.count);
    let mut dup_pool = Vec::new();

    for i in 0..config.count {
        let asset = sample_asset(i, &mut rng, &temp_noise, &cap_noise);
        let row = render_dirty(&asset, config, &mut rng);

        // Remember a copy for possible duplication before pushing.
        if rng.gen::<f64>() < config.dup_frac {
            dup_pool.push(asset);
        }
        rows.push(row);
    }

    // Emit duplicates at the end with drifted telemetry, so the later row is
    // the more recent reading and keep-last deduplication is observable.
    let duplicates = dup_pool.len();
    for mut asset in dup_pool {
        asset.cpu_temp_max += 1.0 + rng.gen::<f64>() * 3.0;
        asset.uptime_hours_7d = (asset.uptime_hours_7d - 5.0).max(0.0);
        let row = render_dirty(&asset, config, &mut rng);
        rows.push(row);
    }

    Ok(GeneratedData { rows, duplicates })
}

/// One plausible (not yet corrupted) asset.
struct Asset {
    asset_id: String,
    vendor: &'static str,
    model: String,
    cpu: String,
    ram_gb: f64,
    storage_gb: f64,
    storage_type: &'static str,
    os_version: &'static str,
    location: &'static str,
    status: &'static str,
    purchase_date: NaiveDate,
    warranty_end: NaiveDate,
    retire_date: Option<NaiveDate>,
    battery_cycle: f64,
    battery_design_cap: f64,
    battery_full_cap: f64,
    cpu_temp_max: f64,
    gpu_temp_max: f64,
    thermal_throttle_cnt: f64,
    smart_realloc: f64,
    smart_pending: f64,
    disk_errors_30d: f64,
    uptime_hours_7d: f64,
    patch_missing_cnt: f64,
    ticket_count_last_6m: f64,
    bsod_cnt_30d: f64,
    label_failure_90d: u8,
    label_retire_180d: u8,
}

fn sample_asset(i: usize, rng: &mut StdRng, temp_noise: &Normal<f64>, cap_noise: &Normal<f64>) -> Asset {
    let vendor = VENDORS[rng.gen_range(0..VENDORS.len())];
    let is_apple = vendor == "Apple";

    let (model, cpu) = model_cpu_for(vendor, rng);
    let storage_type = if is_apple {
        "NVMe"
    } else {
        ["NVMe SSD", "SATA SSD", "HDD"][rng.gen_range(0..3)]
    };
    let os_version = if is_apple {
        ["macOS 13.6", "macOS 14.2"][rng.gen_range(0..2)]
    } else {
        ["Windows 10 22H2", "Windows 11 23H2", "Ubuntu 22.04"][rng.gen_range(0..3)]
    };

    let base = NaiveDate::from_ymd_opt(2019, 1, 1).expect("static date is valid");
    let purchase_date = base + Duration::days(rng.gen_range(0..2_300));
    let warranty_end = purchase_date + Duration::days(3 * 365);

    let battery_cycle = rng.gen_range(30.0_f64..1_200.0).round();
    let battery_design_cap = (52.0 + cap_noise.sample(rng)).clamp(40.0, 65.0).round();
    let wear = 1.0 - battery_cycle / 3_000.0 + cap_noise.sample(rng) / 100.0;
    let battery_full_cap = (battery_design_cap * wear.clamp(0.45, 1.05)).round();
    let battery_health = battery_full_cap / battery_design_cap;

    let cpu_temp_max = (72.0 + temp_noise.sample(rng)).clamp(45.0, 105.0).round();
    let gpu_temp_max = (cpu_temp_max - 4.0 + temp_noise.sample(rng) / 2.0)
        .clamp(40.0, 105.0)
        .round();

    let thermal_throttle_cnt = skewed_count(rng, 0.35, 12.0);
    let smart_realloc = skewed_count(rng, 0.12, 20.0);
    let smart_pending = skewed_count(rng, 0.08, 6.0);
    let disk_errors_30d = skewed_count(rng, 0.10, 9.0);
    let uptime_hours_7d = rng.gen_range(5.0_f64..168.0).round();
    let patch_missing_cnt = skewed_count(rng, 0.40, 10.0);
    let ticket_count_last_6m = skewed_count(rng, 0.45, 8.0);
    let bsod_cnt_30d = skewed_count(rng, 0.15, 5.0);

    // Labels lean on the telemetry so the EDA has visible structure.
    let mut p_fail = 0.04;
    if cpu_temp_max >= 88.0 {
        p_fail += 0.25;
    }
    if battery_health < 0.70 {
        p_fail += 0.18;
    }
    if smart_realloc > 0.0 || smart_pending > 0.0 {
        p_fail += 0.12;
    }
    if bsod_cnt_30d >= 2.0 {
        p_fail += 0.10;
    }
    let label_failure_90d = (rng.gen::<f64>() < p_fail) as u8;

    let age_days = (reference_date() - purchase_date).num_days();
    let mut p_retire = 0.03;
    if age_days > 4 * 365 {
        p_retire += 0.30;
    }
    if battery_health < 0.60 {
        p_retire += 0.15;
    }
    let label_retire_180d = (rng.gen::<f64>() < p_retire) as u8;

    let (status, retire_date) = if label_retire_180d == 1 && rng.gen::<f64>() < 0.5 {
        ("retired", Some(purchase_date + Duration::days(age_days.max(30))))
    } else {
        ("active", None)
    };

    Asset {
        asset_id: format!("A-{:04}", i + 1),
        vendor,
        model,
        cpu,
        ram_gb: [8.0, 16.0, 32.0][rng.gen_range(0..3)],
        storage_gb: [256.0, 512.0, 1024.0][rng.gen_range(0..3)],
        storage_type,
        os_version,
        location: LOCATIONS[rng.gen_range(0..LOCATIONS.len())],
        status,
        purchase_date,
        warranty_end,
        retire_date,
        battery_cycle,
        battery_design_cap,
        battery_full_cap,
        cpu_temp_max,
        gpu_temp_max,
        thermal_throttle_cnt,
        smart_realloc,
        smart_pending,
        disk_errors_30d,
        uptime_hours_7d,
        patch_missing_cnt,
        ticket_count_last_6m,
        bsod_cnt_30d,
        label_failure_90d,
        label_retire_180d,
    }
}

fn model_cpu_for(vendor: &str, rng: &mut StdRng) -> (String, String) {
    let (models, cpus): (&[&str], &[&str]) = match vendor {
        "Lenovo" => (&["ThinkPad T14", "ThinkPad X1", "Yoga 7"], &["i5-1335U", "i7-1260P", "Ryzen 7 PRO"]),
        "Dell" => (&["Latitude 5440", "XPS 13", "Precision 3580"], &["i5-1345U", "i7-1355U"]),
        "HP" => (&["EliteBook 840", "ProBook 450", "ZBook Firefly"], &["i5-1235U", "i7-1365U"]),
        "Apple" => (&["MacBook Air M2", "MacBook Pro 14"], &["Apple M2", "Apple M3 Pro"]),
        "Asus" => (&["ZenBook 14", "ExpertBook B5"], &["i5-1340P", "Ryzen 5 7530U"]),
        "Acer" => (&["TravelMate P4", "Swift 3"], &["i5-1235U", "Ryzen 5 5625U"]),
        _ => (&["Prestige 14", "Modern 15"], &["i7-1260P", "i5-1240P"]),
    };
    (
        models[rng.gen_range(0..models.len())].to_string(),
        cpus[rng.gen_range(0..cpus.len())].to_string(),
    )
}

/// Mostly-zero count with an exponential-ish tail.
fn skewed_count(rng: &mut StdRng, p_nonzero: f64, max: f64) -> f64 {
    if rng.gen::<f64>() >= p_nonzero {
        return 0.0;
    }
    let u: f64 = rng.gen();
    (u * u * max).ceil()
}

/// Render an asset into a raw CSV row, applying corruption along the way.
fn render_dirty(asset: &Asset, config: &GenerateConfig, rng: &mut StdRng) -> Vec<String> {
    let mut vendor = asset.vendor.to_string();
    if rng.gen::<f64>() < config.typo_frac {
        if let Some(typos) = typo_for(asset.vendor) {
            vendor = typos[rng.gen_range(0..typos.len())].to_string();
        }
    }

    let purchase = render_date(asset.purchase_date, config, rng);
    let warranty = render_date(asset.warranty_end, config, rng);
    let retire = asset
        .retire_date
        .map(|d| render_date(d, config, rng))
        .unwrap_or_default();

    let with_units = rng.gen::<f64>() < config.unit_frac;
    let mut cpu_temp = if with_units {
        format!("{}°C", asset.cpu_temp_max)
    } else {
        fmt_num(asset.cpu_temp_max)
    };
    let storage = if with_units {
        format!("{} GB", asset.storage_gb)
    } else {
        fmt_num(asset.storage_gb)
    };
    let mut uptime = if with_units {
        format!("{} h", asset.uptime_hours_7d)
    } else {
        fmt_num(asset.uptime_hours_7d)
    };

    let mut battery_cycle = fmt_num(asset.battery_cycle);
    if rng.gen::<f64>() < config.outlier_frac {
        // One implausible field per unlucky row.
        match rng.gen_range(0..3) {
            0 => cpu_temp = fmt_num(if rng.gen::<bool>() { 150.0 } else { -40.0 }),
            1 => battery_cycle = fmt_num(-5.0),
            _ => uptime = fmt_num(10_000.0),
        }
    }

    let mut row = vec![
        asset.asset_id.clone(),
        vendor,
        asset.model.clone(),
        asset.cpu.clone(),
        fmt_num(asset.ram_gb),
        storage,
        asset.storage_type.to_string(),
        asset.os_version.to_string(),
        asset.location.to_string(),
        asset.status.to_string(),
        purchase,
        warranty,
        retire,
        battery_cycle,
        fmt_num(asset.battery_design_cap),
        fmt_num(asset.battery_full_cap),
        cpu_temp,
        fmt_num(asset.gpu_temp_max),
        fmt_num(asset.thermal_throttle_cnt),
        fmt_num(asset.smart_realloc),
        fmt_num(asset.smart_pending),
        fmt_num(asset.disk_errors_30d),
        uptime,
        fmt_num(asset.patch_missing_cnt),
        fmt_num(asset.ticket_count_last_6m),
        fmt_num(asset.bsod_cnt_30d),
        asset.label_failure_90d.to_string(),
        asset.label_retire_180d.to_string(),
    ];

    // Blank out corruptible fields; ids and labels stay intact so every row
    // remains attributable and label-complete.
    const CORRUPTIBLE: [usize; 10] = [2, 4, 8, 10, 13, 14, 15, 17, 22, 23];
    for &idx in CORRUPTIBLE.iter() {
        if rng.gen::<f64>() < config.missing_frac {
            row[idx] = String::new();
        }
    }

    row
}

fn render_date(date: NaiveDate, config: &GenerateConfig, rng: &mut StdRng) -> String {
    if rng.gen::<f64>() < config.alt_date_frac {
        let fmt = ["%d/%m/%Y", "%Y/%m/%d", "%d-%b-%Y"][rng.gen_range(0..3)];
        date.format(fmt).to_string()
    } else {
        date.format("%Y-%m-%d").to_string()
    }
}

/// Integers render without a trailing `.0`, like spreadsheet exports.
fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(count: usize, seed: u64) -> GenerateConfig {
        GenerateConfig {
            out_path: PathBuf::from("unused.csv"),
            count,
            seed,
            typo_frac: 0.08,
            alt_date_frac: 0.25,
            unit_frac: 0.15,
            missing_frac: 0.06,
            outlier_frac: 0.03,
            dup_frac: 0.04,
        }
    }

    #[test]
    fn deterministic_for_a_seed() {
        let a = generate(&config(200, 42)).unwrap();
        let b = generate(&config(200, 42)).unwrap();
        assert_eq!(a, b);

        let c = generate(&config(200, 43)).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn emits_full_column_set() {
        let data = generate(&config(50, 7)).unwrap();
        assert!(data.rows.len() >= 50);
        for row in &data.rows {
            assert_eq!(row.len(), RAW_HEADER.len());
        }
    }

    #[test]
    fn corruption_kinds_all_present() {
        let data = generate(&config(500, 42)).unwrap();
        let rows = &data.rows;

        assert!(rows.iter().any(|r| r[16].contains("°C")), "unit suffix");
        assert!(rows.iter().any(|r| r[10].contains('/')), "alt date format");
        assert!(
            rows.iter().any(|r| r.iter().any(|cell| cell.is_empty())),
            "missing cell"
        );
        assert!(
            rows.iter()
                .any(|r| !r[1].is_empty() && !VENDORS.contains(&r[1].as_str())),
            "vendor typo"
        );
        assert!(data.duplicates > 0, "duplicate rows");
    }

    #[test]
    fn duplicates_share_asset_ids_and_come_last() {
        let data = generate(&config(500, 42)).unwrap();
        let n = data.rows.len() - data.duplicates;
        let originals: Vec<&str> = data.rows[..n].iter().map(|r| r[0].as_str()).collect();
        for dup in &data.rows[n..] {
            assert!(originals.contains(&dup[0].as_str()));
        }
    }

    #[test]
    fn rejects_bad_config() {
        let mut c = config(0, 1);
        assert!(generate(&c).is_err());
        c = config(10, 1);
        c.typo_frac = 1.5;
        assert!(generate(&c).is_err());
    }
}
