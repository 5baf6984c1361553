//! HTML report writers.
//!
//! Two artifacts:
//! - `eda.html`: self-contained static report with the SVG figures inlined
//!   plus the summary tables. Opens offline in any browser.
//! - `eda_interactive.html`: plotly.js (CDN) charts with hover tooltips for
//!   drilling into individual machines.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;

use crate::domain::CleanAsset;
use crate::error::AppError;
use crate::report::figures::Figure;
use crate::report::AnalysisSummary;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.32.0.min.js";

/// Write the static report and return its path.
pub fn write_static_report(
    dir: &Path,
    summary: &AnalysisSummary,
    figures: &[Figure],
) -> Result<PathBuf, AppError> {
    let mut body = String::new();

    body.push_str(&format!(
        "<p class=\"meta\">{} machines analyzed.</p>\n",
        summary.rows
    ));

    body.push_str("<h2>Contents</h2>\n<ul>\n");
    body.push_str("<li><a href=\"#missing\">Missing / unknown values</a></li>\n");
    body.push_str("<li><a href=\"#describe\">Numeric summaries</a></li>\n");
    for fig in figures {
        body.push_str(&format!(
            "<li><a href=\"#{}\">{}</a></li>\n",
            fig.slug,
            escape(&fig.title)
        ));
    }
    body.push_str("</ul>\n");

    body.push_str("<h2 id=\"missing\">Missing / unknown values</h2>\n");
    body.push_str("<table><tr><th>Column</th><th>Missing</th><th>%</th></tr>\n");
    for m in &summary.missing {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{:.1}</td></tr>\n",
            escape(&m.column),
            m.missing,
            m.pct
        ));
    }
    body.push_str("</table>\n");

    body.push_str("<h2 id=\"describe\">Numeric summaries</h2>\n");
    body.push_str(
        "<table><tr><th>Column</th><th>Count</th><th>Mean</th><th>Std</th>\
         <th>Min</th><th>P25</th><th>Median</th><th>P75</th><th>Max</th></tr>\n",
    );
    for c in &summary.describe {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{:.2}</td><td>{:.2}</td>\
             <td>{:.2}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td><td>{:.2}</td></tr>\n",
            escape(&c.column),
            c.count,
            c.mean,
            c.std,
            c.min,
            c.p25,
            c.median,
            c.p75,
            c.max
        ));
    }
    body.push_str("</table>\n");

    for fig in figures {
        body.push_str(&format!(
            "<h2 id=\"{}\">{}</h2>\n<div class=\"figure\">{}</div>\n",
            fig.slug,
            escape(&fig.title),
            fig.svg
        ));
    }

    let html = page("Laptop fleet EDA", &body);
    let path = dir.join("eda.html");
    write_html(&path, &html)?;
    Ok(path)
}

/// Write the interactive report and return its path.
pub fn write_interactive_report(
    dir: &Path,
    assets: &[CleanAsset],
    summary: &AnalysisSummary,
) -> Result<PathBuf, AppError> {
    // Hover text per machine, shared by the scatter traces.
    let hover: Vec<String> = assets
        .iter()
        .map(|a| {
            format!(
                "{}<br>{} {}<br>age: {} months<br>cycles: {}",
                a.asset_id, a.vendor, a.model, a.age_months, a.battery_cycle
            )
        })
        .collect();

    let scatter_data = json!({
        "health": assets.iter().map(|a| a.battery_health).collect::<Vec<_>>(),
        "temp": assets.iter().map(|a| a.cpu_temp_max).collect::<Vec<_>>(),
        "label": assets.iter().map(|a| a.label_failure_90d).collect::<Vec<_>>(),
        "hover": hover,
    });
    let vendor_data = json!({
        "vendors": summary.fail_by_vendor.iter().map(|r| r.group.clone()).collect::<Vec<_>>(),
        "rates": summary.fail_by_vendor.iter().map(|r| 100.0 * r.failure_rate).collect::<Vec<_>>(),
        "counts": summary.fail_by_vendor.iter().map(|r| r.n).collect::<Vec<_>>(),
    });
    let hist_data = json!({
        "age": assets.iter().map(|a| a.age_months).collect::<Vec<_>>(),
        "health": assets.iter().map(|a| a.battery_health).collect::<Vec<_>>(),
    });

    let mut body = String::new();
    body.push_str(&format!(
        "<p class=\"meta\">{} machines analyzed. Hover any point for details.</p>\n",
        summary.rows
    ));
    body.push_str("<div id=\"scatter\" class=\"plot\"></div>\n");
    body.push_str("<div id=\"vendors\" class=\"plot\"></div>\n");
    body.push_str("<div id=\"age\" class=\"plot\"></div>\n");
    body.push_str("<div id=\"health\" class=\"plot\"></div>\n");

    body.push_str(&format!(
        "<script src=\"{PLOTLY_CDN}\" charset=\"utf-8\"></script>\n"
    ));
    body.push_str(&format!(
        r##"<script>
const scatter = {scatter_data};
const vendors = {vendor_data};
const hists = {hist_data};

const byLabel = (flag) => scatter.label
  .map((l, i) => l === flag ? i : -1)
  .filter(i => i >= 0);

const trace = (flag, name, color) => {{
  const idx = byLabel(flag);
  return {{
    x: idx.map(i => scatter.health[i]),
    y: idx.map(i => scatter.temp[i]),
    text: idx.map(i => scatter.hover[i]),
    hovertemplate: "%{{text}}<br>health: %{{x:.2f}}<br>temp: %{{y:.0f}} C<extra></extra>",
    mode: "markers",
    type: "scatter",
    name: name,
    marker: {{ color: color, size: 7, opacity: 0.75 }},
  }};
}};

Plotly.newPlot("scatter",
  [trace(0, "no failure", "#34a853"), trace(1, "failed within 90d", "#ea4335")],
  {{ title: "Battery health vs peak CPU temperature",
     xaxis: {{ title: "battery_health" }}, yaxis: {{ title: "cpu_temp_max (C)" }} }});

Plotly.newPlot("vendors",
  [{{ x: vendors.vendors, y: vendors.rates,
      text: vendors.counts.map(n => "n=" + n),
      hovertemplate: "%{{x}}: %{{y:.1f}}% (%{{text}})<extra></extra>",
      type: "bar", marker: {{ color: "#4285f4" }} }}],
  {{ title: "Failure rate (90d) by vendor", yaxis: {{ title: "rate (%)" }} }});

Plotly.newPlot("age",
  [{{ x: hists.age, type: "histogram", nbinsx: 20, marker: {{ color: "#4285f4" }} }}],
  {{ title: "Fleet age (months)", xaxis: {{ title: "age_months" }} }});

Plotly.newPlot("health",
  [{{ x: hists.health, type: "histogram", nbinsx: 20, marker: {{ color: "#34a853" }} }}],
  {{ title: "Battery health", xaxis: {{ title: "battery_health" }} }});
</script>
"##
    ));

    let html = page("Laptop fleet EDA (interactive)", &body);
    let path = dir.join("eda_interactive.html");
    write_html(&path, &html)?;
    Ok(path)
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 960px; color: #202124; }}
h1 {{ border-bottom: 2px solid #4285f4; padding-bottom: 0.3rem; }}
table {{ border-collapse: collapse; margin: 1rem 0; }}
th, td {{ border: 1px solid #dadce0; padding: 0.3rem 0.6rem; text-align: right; }}
th:first-child, td:first-child {{ text-align: left; }}
.meta {{ color: #5f6368; }}
.figure {{ margin: 1rem 0; }}
.plot {{ height: 460px; margin: 1rem 0; }}
</style>
</head>
<body>
<h1>{title}</h1>
{body}</body>
</html>
"#
    )
}

fn write_html(path: &Path, html: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::new(
                2,
                format!("Failed to create directory '{}': {e}", parent.display()),
            )
        })?;
    }
    fs::write(path, html)
        .map_err(|e| AppError::new(2, format!("Failed to write '{}': {e}", path.display())))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::analyze;
    use chrono::NaiveDate;

    fn asset(id: usize) -> CleanAsset {
        CleanAsset {
            asset_id: format!("A-{id}"),
            vendor: "Lenovo".to_string(),
            model: "ThinkPad T14".to_string(),
            cpu: "i7-1260P".to_string(),
            storage_type: "NVMe".to_string(),
            os_version: "Windows 11 23H2".to_string(),
            location: "HQ".to_string(),
            status: "active".to_string(),
            purchase_date: NaiveDate::from_ymd_opt(2022, 1, 10).unwrap(),
            warranty_end: None,
            retire_date: None,
            ram_gb: 16.0,
            storage_gb: 512.0,
            ticket_count_last_6m: 0.0,
            bsod_cnt_30d: 0.0,
            battery_cycle: 300.0,
            battery_design_cap: 50.0,
            battery_full_cap: 45.0,
            cpu_temp_max: 60.0 + id as f64,
            gpu_temp_max: 55.0,
            thermal_throttle_cnt: 0.0,
            smart_realloc: 0.0,
            smart_pending: 0.0,
            disk_errors_30d: 0.0,
            uptime_hours_7d: 80.0,
            patch_missing_cnt: 0.0,
            age_months: 30.0,
            in_warranty: 0,
            battery_health: 0.9,
            is_nvme: 1,
            is_mac: 0,
            label_failure_90d: (id % 3 == 0) as u8,
            label_retire_180d: 0,
        }
    }

    #[test]
    fn static_report_inlines_figures_and_tables() {
        let dir = std::env::temp_dir().join(format!("fleet-eda-html-{}", std::process::id()));
        let assets: Vec<CleanAsset> = (0..10).map(asset).collect();
        let summary = analyze(&assets, 25);
        let figures = vec![Figure {
            slug: "demo".to_string(),
            title: "Demo <chart>".to_string(),
            svg: "<svg id=\"demo-svg\"></svg>".to_string(),
        }];

        let path = write_static_report(&dir, &summary, &figures).unwrap();
        let html = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert!(html.contains("demo-svg"));
        // Title is escaped, not interpreted as markup.
        assert!(html.contains("Demo &lt;chart&gt;"));
        assert!(html.contains("battery_health"));
        assert!(html.contains("Missing / unknown"));
    }

    #[test]
    fn interactive_report_embeds_data_and_plotly() {
        let dir = std::env::temp_dir().join(format!("fleet-eda-htmli-{}", std::process::id()));
        let assets: Vec<CleanAsset> = (0..10).map(asset).collect();
        let summary = analyze(&assets, 25);

        let path = write_interactive_report(&dir, &assets, &summary).unwrap();
        let html = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert!(html.contains("plotly"));
        assert!(html.contains("A-3"));
        assert!(html.contains("Battery health vs peak CPU temperature"));
    }
}
