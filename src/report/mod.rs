//! Analysis summaries and formatted terminal output.
//!
//! The number crunching lives here and the rendering in `figures`/`html`, so
//! the statistics stay testable without touching the filesystem.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{CleanAsset, NumericField};
use crate::math::{mean, pearson, quantile, std_dev};

pub mod figures;
pub mod html;

/// Missing/unknown tally for one column.
#[derive(Debug, Clone, Serialize)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
    pub pct: f64,
}

/// Distribution summary for one numeric column.
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

/// Pairwise Pearson correlations over the numeric columns.
///
/// `matrix[i][j]` is `None` where a column is constant (zero variance).
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub matrix: Vec<Vec<Option<f64>>>,
}

/// Failure rate within one cohort (vendor or value bucket).
#[derive(Debug, Clone, Serialize)]
pub struct GroupRate {
    pub group: String,
    pub n: usize,
    pub failure_rate: f64,
}

/// Everything the report renderers need, computed in one pass.
#[derive(Debug, Clone)]
pub struct AnalysisSummary {
    pub rows: usize,
    pub missing: Vec<MissingCount>,
    pub describe: Vec<ColumnSummary>,
    pub correlation: CorrelationMatrix,
    pub fail_by_vendor: Vec<GroupRate>,
    pub fail_by_battery_bucket: Vec<GroupRate>,
    pub fail_by_temp_bucket: Vec<GroupRate>,
}

/// Numeric columns of the cleaned table, engineered ones included.
pub fn numeric_columns(assets: &[CleanAsset]) -> Vec<(String, Vec<f64>)> {
    let mut cols: Vec<(String, Vec<f64>)> = NumericField::ALL
        .iter()
        .map(|field| {
            (
                field.name().to_string(),
                assets.iter().map(|a| field.get_clean(a)).collect(),
            )
        })
        .collect();

    cols.push((
        "age_months".into(),
        assets.iter().map(|a| a.age_months).collect(),
    ));
    cols.push((
        "battery_health".into(),
        assets.iter().map(|a| a.battery_health).collect(),
    ));
    cols.push((
        "in_warranty".into(),
        assets.iter().map(|a| a.in_warranty as f64).collect(),
    ));
    cols.push((
        "is_nvme".into(),
        assets.iter().map(|a| a.is_nvme as f64).collect(),
    ));
    cols.push((
        "is_mac".into(),
        assets.iter().map(|a| a.is_mac as f64).collect(),
    ));
    cols.push((
        "label_failure_90d".into(),
        assets.iter().map(|a| a.label_failure_90d as f64).collect(),
    ));
    cols.push((
        "label_retire_180d".into(),
        assets.iter().map(|a| a.label_retire_180d as f64).collect(),
    ));
    cols
}

/// Compute the full analysis summary for a cleaned table.
pub fn analyze(assets: &[CleanAsset], top_missing: usize) -> AnalysisSummary {
    AnalysisSummary {
        rows: assets.len(),
        missing: missing_counts(assets, top_missing),
        describe: describe(assets),
        correlation: correlation_matrix(assets),
        fail_by_vendor: failure_rate_by_vendor(assets),
        fail_by_battery_bucket: failure_rate_by_bucket(
            assets,
            |a| a.battery_health,
            &[0.6, 0.8, 0.9],
        ),
        fail_by_temp_bucket: failure_rate_by_bucket(
            assets,
            |a| a.cpu_temp_max,
            &[60.0, 75.0, 85.0],
        ),
    }
}

/// Count sentinel/absent values per column, sorted descending, top-K.
///
/// On a cleaned table "missing" means the `"unknown"` sentinel for
/// categoricals and absent optional dates; the preprocessor guarantees the
/// numeric columns are fully imputed.
pub fn missing_counts(assets: &[CleanAsset], top: usize) -> Vec<MissingCount> {
    let n = assets.len().max(1);
    let cat_count = |get: fn(&CleanAsset) -> &str| -> usize {
        assets.iter().filter(|a| get(a) == "unknown").count()
    };

    let mut counts: Vec<(String, usize)> = vec![
        ("vendor".into(), cat_count(|a| &a.vendor)),
        ("model".into(), cat_count(|a| &a.model)),
        ("cpu".into(), cat_count(|a| &a.cpu)),
        ("storage_type".into(), cat_count(|a| &a.storage_type)),
        ("os_version".into(), cat_count(|a| &a.os_version)),
        ("location".into(), cat_count(|a| &a.location)),
        ("status".into(), cat_count(|a| &a.status)),
        (
            "warranty_end".into(),
            assets.iter().filter(|a| a.warranty_end.is_none()).count(),
        ),
        (
            "retire_date".into(),
            assets.iter().filter(|a| a.retire_date.is_none()).count(),
        ),
    ];
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    counts
        .into_iter()
        .take(top)
        .map(|(column, missing)| MissingCount {
            column,
            missing,
            pct: 100.0 * missing as f64 / n as f64,
        })
        .collect()
}

/// Per-column distribution summaries.
pub fn describe(assets: &[CleanAsset]) -> Vec<ColumnSummary> {
    numeric_columns(assets)
        .into_iter()
        .filter_map(|(column, values)| {
            Some(ColumnSummary {
                column,
                count: values.len(),
                mean: mean(&values)?,
                std: std_dev(&values).unwrap_or(0.0),
                min: quantile(&values, 0.0)?,
                p25: quantile(&values, 0.25)?,
                median: quantile(&values, 0.5)?,
                p75: quantile(&values, 0.75)?,
                max: quantile(&values, 1.0)?,
            })
        })
        .collect()
}

/// Pairwise Pearson correlation over the numeric columns.
pub fn correlation_matrix(assets: &[CleanAsset]) -> CorrelationMatrix {
    let cols = numeric_columns(assets);
    let names: Vec<String> = cols.iter().map(|(n, _)| n.clone()).collect();

    let mut matrix = vec![vec![None; cols.len()]; cols.len()];
    for i in 0..cols.len() {
        for j in i..cols.len() {
            let r = if i == j {
                // Constant columns have no self-correlation either.
                std_dev(&cols[i].1).filter(|s| *s > 0.0).map(|_| 1.0)
            } else {
                pearson(&cols[i].1, &cols[j].1)
            };
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }

    CorrelationMatrix {
        columns: names,
        matrix,
    }
}

/// Failure rate per vendor, sorted by rate descending.
pub fn failure_rate_by_vendor(assets: &[CleanAsset]) -> Vec<GroupRate> {
    let mut groups: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for a in assets {
        let entry = groups.entry(a.vendor.clone()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += a.label_failure_90d as usize;
    }

    let mut rates: Vec<GroupRate> = groups
        .into_iter()
        .map(|(group, (n, failures))| GroupRate {
            group,
            n,
            failure_rate: failures as f64 / n as f64,
        })
        .collect();
    rates.sort_by(|a, b| {
        b.failure_rate
            .partial_cmp(&a.failure_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.group.cmp(&b.group))
    });
    rates
}

/// Failure rate over value buckets of a numeric attribute.
///
/// `edges` are the inner cut points; buckets are labelled `<e0`, `e0-e1`, ...,
/// `>=eN`. Empty buckets are omitted so downstream charts never divide by
/// zero.
pub fn failure_rate_by_bucket(
    assets: &[CleanAsset],
    value: impl Fn(&CleanAsset) -> f64,
    edges: &[f64],
) -> Vec<GroupRate> {
    let label_for = |idx: usize| -> String {
        if idx == 0 {
            format!("<{}", edges[0])
        } else if idx == edges.len() {
            format!(">={}", edges[edges.len() - 1])
        } else {
            format!("{}-{}", edges[idx - 1], edges[idx])
        }
    };

    let mut buckets: Vec<(usize, usize)> = vec![(0, 0); edges.len() + 1];
    for a in assets {
        let v = value(a);
        let idx = edges.iter().position(|e| v < *e).unwrap_or(edges.len());
        buckets[idx].0 += 1;
        buckets[idx].1 += a.label_failure_90d as usize;
    }

    buckets
        .into_iter()
        .enumerate()
        .filter(|(_, (n, _))| *n > 0)
        .map(|(idx, (n, failures))| GroupRate {
            group: label_for(idx),
            n,
            failure_rate: failures as f64 / n as f64,
        })
        .collect()
}

/// Format the terminal run summary for the analyze stage.
pub fn format_run_summary(summary: &AnalysisSummary) -> String {
    let mut out = String::new();

    out.push_str("=== fleet - EDA summary ===\n");
    out.push_str(&format!("Rows: {}\n", summary.rows));

    out.push_str("\nMissing / unknown (top):\n");
    for m in summary.missing.iter().take(8) {
        out.push_str(&format!(
            "  {:<16} {:>6}  ({:>5.1}%)\n",
            m.column, m.missing, m.pct
        ));
    }

    out.push_str("\nFailure rate by vendor:\n");
    push_rates(&mut out, &summary.fail_by_vendor);

    out.push_str("\nFailure rate by battery health:\n");
    push_rates(&mut out, &summary.fail_by_battery_bucket);

    out.push_str("\nFailure rate by peak CPU temperature:\n");
    push_rates(&mut out, &summary.fail_by_temp_bucket);

    out
}

fn push_rates(out: &mut String, rates: &[GroupRate]) {
    for r in rates {
        out.push_str(&format!(
            "  {:<12} n={:<4} rate={:>5.1}%\n",
            r.group,
            r.n,
            100.0 * r.failure_rate
        ));
    }
}
