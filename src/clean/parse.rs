//! Field-level repair: date coercion, unit stripping, vendor normalization.
//!
//! Everything here is lenient by design: a malformed value degrades to
//! `None` (absent, imputed later) instead of failing the row. Structural
//! problems are the ingest layer's job, not ours.

use chrono::NaiveDate;

/// Date formats seen in real fleet exports, tried in order.
const DATE_FMTS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%m-%d-%Y", "%Y/%m/%d", "%d-%b-%Y"];

/// Parse a date string tolerating the known format variants.
///
/// En/em dashes are normalized to ASCII hyphens first; some exports produce
/// them when users copy dates out of documents.
pub fn coerce_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim().replace(['\u{2013}', '\u{2014}'], "-");
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(&s, fmt) {
            return Some(d);
        }
    }
    None
}

/// Convert a possibly unit-suffixed numeric string into a plain number.
///
/// Strips thousands separators, placeholder dashes, and any trailing unit
/// token (`°C`, `GB`, `h`, `%`, ...). Returns `None` for empty/placeholder
/// values or anything that still fails to parse.
pub fn to_number(raw: &str) -> Option<f64> {
    let mut s: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    // `1,234` loses its comma above; placeholder dashes collapse to "-"/"--".
    while s.ends_with('-') && s.len() > 1 {
        s.pop();
    }
    if s.is_empty() || s == "-" {
        return None;
    }

    let v = s.parse::<f64>().ok()?;
    if v.is_finite() {
        Some(v)
    } else {
        None
    }
}

/// Canonical vendor spelling for a known misspelling, if any.
///
/// Matching is done on the lowercased, space-stripped form. Unmapped values
/// pass through trimmed but otherwise unchanged so that a genuinely new
/// vendor is not silently erased.
pub fn normalize_vendor(raw: &str) -> String {
    let key: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let canonical = match key.as_str() {
        "lenovo" | "lenov0" | "lenvo" => "Lenovo",
        "dell" | "delll" => "Dell",
        "hp" | "h-p" => "HP",
        "apple" => "Apple",
        "asus" | "asuss" => "Asus",
        "acer" | "\u{e2}cer" => "Acer",
        "msi" => "MSI",
        _ => return raw.trim().to_string(),
    };
    canonical.to_string()
}
