//! CSV ingest and row-level repair.
//!
//! This module turns the heterogeneous raw telemetry CSV into `AssetRow`s
//! that are safe to clean.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level leniency**: malformed field values degrade to absent and are
//!   recorded as notes, never aborting the run
//! - **Deterministic behavior** (no hidden randomness)
//! - **Separation of concerns**: no imputation logic here

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::clean::parse::{coerce_date, to_number};
use crate::domain::{AssetRow, CatField, CleanAsset, NumericField};
use crate::error::AppError;

/// A row-level repair note collected during ingest.
#[derive(Debug, Clone)]
pub struct RowNote {
    pub line: usize,
    pub id: Option<String>,
    pub message: String,
}

/// Ingest output: lenient rows + notes about what was repaired or skipped.
#[derive(Debug, Clone)]
pub struct IngestedRaw {
    pub rows: Vec<AssetRow>,
    pub notes: Vec<RowNote>,
    pub rows_read: usize,
}

/// Load the raw telemetry CSV.
pub fn load_raw_assets(path: &Path) -> Result<IngestedRaw, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open raw CSV '{}': {e}", path.display()))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    ensure_required_columns_exist(&header_map)?;

    let mut rows = Vec::new();
    let mut notes = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                notes.push(RowNote {
                    line,
                    id: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        if let Some(row) = parse_row(&record, &header_map, line, &mut notes) {
            rows.push(row);
        }
    }

    if rows.is_empty() {
        return Err(AppError::new(3, "No usable rows found in the raw CSV."));
    }

    Ok(IngestedRaw {
        rows,
        notes,
        rows_read,
    })
}

/// Load a cleaned CSV back for analysis.
pub fn read_clean_assets(path: &Path) -> Result<Vec<CleanAsset>, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open cleaned CSV '{}': {e}", path.display()),
        )
    })?;

    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let mut assets = Vec::new();
    for result in reader.deserialize::<CleanAsset>() {
        let asset = result
            .map_err(|e| AppError::new(2, format!("Malformed cleaned CSV row: {e}")))?;
        assets.push(asset);
    }

    if assets.is_empty() {
        return Err(AppError::new(3, "Cleaned CSV contains no rows."));
    }
    Ok(assets)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header (e.g. "﻿asset_id"). If we don't strip it, schema validation
    // will incorrectly report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    for required in ["asset_id", "vendor"] {
        if !header_map.contains_key(required) {
            return Err(AppError::new(
                2,
                format!("Missing required column: `{required}`"),
            ));
        }
    }
    Ok(())
}

/// Parse a single record leniently. Returns `None` only when the row is
/// unusable (no asset id); field-level problems become notes + absent values.
fn parse_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    line: usize,
    notes: &mut Vec<RowNote>,
) -> Option<AssetRow> {
    let Some(asset_id) = get_optional(record, header_map, "asset_id") else {
        notes.push(RowNote {
            line,
            id: None,
            message: "Missing `asset_id`; row skipped.".to_string(),
        });
        return None;
    };

    let mut row = AssetRow {
        asset_id: asset_id.to_string(),
        ..AssetRow::default()
    };

    for field in CatField::ALL {
        let value = get_optional(record, header_map, field.name()).map(str::to_string);
        field.set(&mut row, value);
    }

    for (name, slot) in [
        ("purchase_date", &mut row.purchase_date),
        ("warranty_end", &mut row.warranty_end),
        ("retire_date", &mut row.retire_date),
    ] {
        if let Some(raw) = get_optional(record, header_map, name) {
            *slot = coerce_date(raw);
            if slot.is_none() {
                notes.push(RowNote {
                    line,
                    id: Some(row.asset_id.clone()),
                    message: format!("Unparseable `{name}` value '{raw}'; treated as absent."),
                });
            }
        }
    }

    for field in NumericField::ALL {
        if let Some(raw) = get_optional(record, header_map, field.name()) {
            let parsed = to_number(raw);
            if parsed.is_none() {
                notes.push(RowNote {
                    line,
                    id: Some(row.asset_id.clone()),
                    message: format!(
                        "Unparseable `{}` value '{raw}'; treated as absent.",
                        field.name()
                    ),
                });
            }
            field.set(&mut row, parsed);
        }
    }

    row.label_failure_90d = parse_label(record, header_map, "label_failure_90d");
    row.label_retire_180d = parse_label(record, header_map, "label_retire_180d");

    Some(row)
}

fn parse_label(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Option<u8> {
    let raw = get_optional(record, header_map, name)?;
    to_number(raw).map(|v| (v != 0.0) as u8)
}

fn get_optional<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_csv(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("fleet-eda-ingest-{name}-{}.csv", std::process::id()));
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_and_repairs_dirty_rows() {
        let path = write_temp_csv(
            "dirty",
            "asset_id,vendor,cpu_temp_max,purchase_date,battery_cycle\n\
             A-1,lenov0,65°C,10/01/2022,\n\
             A-2,Dell,not-a-temp,2022-01-05,300\n",
        );
        let out = load_raw_assets(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(out.rows_read, 2);
        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[0].cpu_temp_max, Some(65.0));
        assert_eq!(out.rows[0].battery_cycle, None);
        // "not-a-temp" parsed leniently: no digits at all -> absent + note.
        assert_eq!(out.rows[1].cpu_temp_max, None);
        assert!(out
            .notes
            .iter()
            .any(|n| n.message.contains("cpu_temp_max")));
    }

    #[test]
    fn bom_on_first_header_is_tolerated() {
        let path = write_temp_csv("bom", "\u{feff}asset_id,vendor\nA-1,Dell\n");
        let out = load_raw_assets(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(out.rows[0].asset_id, "A-1");
    }

    #[test]
    fn missing_required_column_aborts() {
        let path = write_temp_csv("nocol", "asset_id,cpu_temp_max\nA-1,70\n");
        let err = load_raw_assets(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("vendor"));
    }

    #[test]
    fn empty_table_aborts_with_exit_3() {
        let path = write_temp_csv("empty", "asset_id,vendor\n");
        let err = load_raw_assets(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn unreadable_input_aborts() {
        let err = load_raw_assets(Path::new("/nonexistent/raw.csv")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
