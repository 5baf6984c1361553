//! Static chart rendering (SVG via Plotters).
//!
//! Why SVG and not PNG?
//! - the SVG backend has no native font/raster dependencies, so the binary
//!   builds everywhere
//! - SVG embeds directly into the static HTML report
//!
//! Every renderer draws into a `String` so the same markup can be written to
//! `reports/figures/` and inlined into the report without a second pass.

use std::fs;
use std::path::Path;

use plotters::prelude::*;

use crate::domain::CleanAsset;
use crate::error::AppError;
use crate::report::{AnalysisSummary, GroupRate};

const FIG_SIZE: (u32, u32) = (760, 440);
const HEATMAP_SIZE: (u32, u32) = (860, 760);
const BAR_FILL: RGBColor = RGBColor(66, 133, 244);
const HIST_FILL: RGBColor = RGBColor(52, 168, 83);

/// One rendered chart, ready to write to disk or inline into HTML.
#[derive(Debug, Clone)]
pub struct Figure {
    pub slug: String,
    pub title: String,
    pub svg: String,
}

type DrawResult = Result<(), Box<dyn std::error::Error>>;

/// Render the full figure set for a cleaned table.
///
/// Figures whose underlying group is empty are skipped with a warning rather
/// than rendered as degenerate charts.
pub fn render_all(
    assets: &[CleanAsset],
    summary: &AnalysisSummary,
) -> Result<Vec<Figure>, AppError> {
    let mut figures = Vec::new();

    let mut push = |slug: &str, title: &str, svg: Result<Option<String>, AppError>| {
        match svg {
            Ok(Some(svg)) => {
                figures.push(Figure {
                    slug: slug.to_string(),
                    title: title.to_string(),
                    svg,
                });
                Ok(())
            }
            Ok(None) => {
                log::warn!("Skipping figure '{slug}': no data to plot");
                Ok(())
            }
            Err(e) => Err(e),
        }
    };

    push(
        "missing_top",
        "Missing / unknown values per column",
        missing_bar(summary),
    )?;
    push(
        "age_months_hist",
        "Fleet age distribution (months)",
        histogram(
            "age_months_hist",
            "Age (months)",
            &values(assets, |a| a.age_months),
            20,
        ),
    )?;
    push(
        "battery_health_hist",
        "Battery health distribution",
        histogram(
            "battery_health_hist",
            "Battery health (full / design)",
            &values(assets, |a| a.battery_health),
            20,
        ),
    )?;
    push(
        "battery_health_by_label",
        "Battery health by failure label",
        split_histogram(assets),
    )?;
    push(
        "failure_rate_by_vendor",
        "Failure rate (90d) by vendor",
        rate_bar("failure_rate_by_vendor", &summary.fail_by_vendor),
    )?;
    push(
        "failure_rate_by_battery",
        "Failure rate (90d) by battery health bucket",
        rate_bar("failure_rate_by_battery", &summary.fail_by_battery_bucket),
    )?;
    push(
        "failure_rate_by_temp",
        "Failure rate (90d) by peak CPU temperature bucket",
        rate_bar("failure_rate_by_temp", &summary.fail_by_temp_bucket),
    )?;
    push(
        "correlation_heatmap",
        "Numeric feature correlation (Pearson)",
        heatmap(summary),
    )?;

    Ok(figures)
}

/// Write every figure as `<dir>/<slug>.svg`.
pub fn write_figures(dir: &Path, figures: &[Figure]) -> Result<(), AppError> {
    fs::create_dir_all(dir).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create figure directory '{}': {e}", dir.display()),
        )
    })?;
    for fig in figures {
        let path = dir.join(format!("{}.svg", fig.slug));
        fs::write(&path, &fig.svg).map_err(|e| {
            AppError::new(2, format!("Failed to write '{}': {e}", path.display()))
        })?;
    }
    Ok(())
}

fn values(assets: &[CleanAsset], get: impl Fn(&CleanAsset) -> f64) -> Vec<f64> {
    assets.iter().map(get).filter(|v| v.is_finite()).collect()
}

fn render(slug: &str, draw: impl FnOnce(&mut String) -> DrawResult) -> Result<String, AppError> {
    let mut buf = String::new();
    draw(&mut buf)
        .map_err(|e| AppError::new(4, format!("Failed to render figure '{slug}': {e}")))?;
    Ok(buf)
}

fn missing_bar(summary: &AnalysisSummary) -> Result<Option<String>, AppError> {
    let bars: Vec<(String, f64)> = summary
        .missing
        .iter()
        .map(|m| (m.column.clone(), m.missing as f64))
        .collect();
    if bars.is_empty() {
        return Ok(None);
    }
    labelled_bar("missing_top", "Missing / unknown count", &bars).map(Some)
}

fn rate_bar(slug: &str, rates: &[GroupRate]) -> Result<Option<String>, AppError> {
    if rates.is_empty() {
        return Ok(None);
    }
    let bars: Vec<(String, f64)> = rates
        .iter()
        .map(|r| (format!("{} (n={})", r.group, r.n), 100.0 * r.failure_rate))
        .collect();
    labelled_bar(slug, "Failure rate (%)", &bars).map(Some)
}

/// Vertical bar chart over labelled categories.
fn labelled_bar(slug: &str, y_desc: &str, bars: &[(String, f64)]) -> Result<String, AppError> {
    let n = bars.len();
    let y_max = bars.iter().map(|(_, v)| *v).fold(0.0f64, f64::max).max(1e-9) * 1.1;
    let labels: Vec<String> = bars.iter().map(|(l, _)| l.clone()).collect();

    render(slug, |buf| {
        let root = SVGBackend::with_string(buf, FIG_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(12)
            .set_label_area_size(LabelAreaPosition::Left, 50)
            .set_label_area_size(LabelAreaPosition::Bottom, 60)
            .build_cartesian_2d(0f64..n as f64, 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .y_desc(y_desc)
            .x_labels(n)
            .x_label_formatter(&|v| {
                let idx = v.floor() as usize;
                labels.get(idx).cloned().unwrap_or_default()
            })
            .label_style(("sans-serif", 12))
            .draw()?;

        chart.draw_series(bars.iter().enumerate().map(|(i, (_, v))| {
            Rectangle::new(
                [(i as f64 + 0.15, 0.0), (i as f64 + 0.85, *v)],
                BAR_FILL.filled(),
            )
        }))?;

        root.present()?;
        Ok(())
    })
}

/// Equal-width histogram with `bins` buckets.
fn histogram(
    slug: &str,
    x_desc: &str,
    values: &[f64],
    bins: usize,
) -> Result<Option<String>, AppError> {
    let Some((min, max, counts)) = bin_counts(values, bins) else {
        return Ok(None);
    };
    let width = (max - min) / bins as f64;
    let y_max = counts.iter().copied().max().unwrap_or(1).max(1) as f64 * 1.1;

    let svg = render(slug, |buf| {
        let root = SVGBackend::with_string(buf, FIG_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(12)
            .set_label_area_size(LabelAreaPosition::Left, 50)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(min..max, 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(x_desc)
            .y_desc("Count")
            .label_style(("sans-serif", 12))
            .draw()?;

        chart.draw_series(counts.iter().enumerate().map(|(i, c)| {
            let x0 = min + i as f64 * width;
            Rectangle::new([(x0, 0.0), (x0 + width, *c as f64)], HIST_FILL.filled())
        }))?;

        root.present()?;
        Ok(())
    })?;
    Ok(Some(svg))
}

/// Battery health histogram split by `label_failure_90d`.
///
/// The failed cohort is drawn second with transparency so both distributions
/// stay readable where they overlap.
fn split_histogram(assets: &[CleanAsset]) -> Result<Option<String>, AppError> {
    let healthy: Vec<f64> = assets
        .iter()
        .filter(|a| a.label_failure_90d == 0)
        .map(|a| a.battery_health)
        .collect();
    let failed: Vec<f64> = assets
        .iter()
        .filter(|a| a.label_failure_90d == 1)
        .map(|a| a.battery_health)
        .collect();

    let all: Vec<f64> = assets.iter().map(|a| a.battery_health).collect();
    let Some((min, max, _)) = bin_counts(&all, 20) else {
        return Ok(None);
    };
    let bins = 20usize;
    let width = (max - min) / bins as f64;

    let count_into = |vals: &[f64]| -> Vec<usize> {
        let mut counts = vec![0usize; bins];
        for v in vals {
            let idx = (((v - min) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        counts
    };
    let healthy_counts = count_into(&healthy);
    let failed_counts = count_into(&failed);
    let y_max = healthy_counts
        .iter()
        .chain(failed_counts.iter())
        .copied()
        .max()
        .unwrap_or(1)
        .max(1) as f64
        * 1.1;

    let svg = render("battery_health_by_label", |buf| {
        let root = SVGBackend::with_string(buf, FIG_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(12)
            .set_label_area_size(LabelAreaPosition::Left, 50)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(min..max, 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Battery health (full / design)")
            .y_desc("Count")
            .label_style(("sans-serif", 12))
            .draw()?;

        let healthy_style = HIST_FILL.mix(0.6).filled();
        chart
            .draw_series(healthy_counts.iter().enumerate().map(|(i, c)| {
                let x0 = min + i as f64 * width;
                Rectangle::new([(x0, 0.0), (x0 + width, *c as f64)], healthy_style)
            }))?
            .label("no failure")
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], healthy_style));

        let failed_style = RED.mix(0.6).filled();
        chart
            .draw_series(failed_counts.iter().enumerate().map(|(i, c)| {
                let x0 = min + i as f64 * width;
                Rectangle::new([(x0, 0.0), (x0 + width, *c as f64)], failed_style)
            }))?
            .label("failed within 90d")
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], failed_style));

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    })?;
    Ok(Some(svg))
}

fn heatmap(summary: &AnalysisSummary) -> Result<Option<String>, AppError> {
    let corr = &summary.correlation;
    let n = corr.columns.len();
    if n == 0 {
        return Ok(None);
    }
    let columns = corr.columns.clone();
    let matrix = corr.matrix.clone();

    let svg = render("correlation_heatmap", |buf| {
        let root = SVGBackend::with_string(buf, HEATMAP_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .margin(12)
            .set_label_area_size(LabelAreaPosition::Left, 150)
            .set_label_area_size(LabelAreaPosition::Bottom, 150)
            .build_cartesian_2d(0f64..n as f64, 0f64..n as f64)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_labels(n)
            .y_labels(n)
            .x_label_formatter(&|v| {
                let idx = v.floor() as usize;
                columns.get(idx).cloned().unwrap_or_default()
            })
            .y_label_formatter(&|v| {
                let idx = v.floor() as usize;
                columns.get(idx).cloned().unwrap_or_default()
            })
            .x_label_style(("sans-serif", 10).into_font().transform(FontTransform::Rotate90))
            .y_label_style(("sans-serif", 10))
            .draw()?;

        chart.draw_series((0..n).flat_map(|i| {
            let matrix = &matrix;
            (0..n).map(move |j| {
                let color = match matrix[i][j] {
                    Some(r) => correlation_color(r),
                    // Undefined (constant column): neutral grey.
                    None => RGBColor(220, 220, 220),
                };
                // Row 0 at the top.
                let y = (n - 1 - i) as f64;
                Rectangle::new(
                    [(j as f64, y), (j as f64 + 1.0, y + 1.0)],
                    color.filled(),
                )
            })
        }))?;

        root.present()?;
        Ok(())
    })?;
    Ok(Some(svg))
}

/// Map r in [-1, 1] to a blue/white/red diverging palette.
fn correlation_color(r: f64) -> RGBColor {
    let r = r.clamp(-1.0, 1.0);
    let t = r.abs();
    let blend = |c: u8| (255.0 + (c as f64 - 255.0) * t) as u8;
    if r >= 0.0 {
        RGBColor(255, blend(64), blend(64))
    } else {
        RGBColor(blend(64), blend(64), 255)
    }
}

/// Bucket `values` into `bins` equal-width bins. Returns `None` when there is
/// nothing to plot, and widens degenerate (constant) ranges so a single-valued
/// column still renders.
fn bin_counts(values: &[f64], bins: usize) -> Option<(f64, f64, Vec<usize>)> {
    if values.is_empty() || bins == 0 {
        return None;
    }
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(*v);
        max = max.max(*v);
    }
    if !min.is_finite() || !max.is_finite() {
        return None;
    }
    if max - min < 1e-12 {
        min -= 0.5;
        max += 0.5;
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Some((min, max, counts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::analyze;
    use chrono::NaiveDate;

    fn asset(id: usize, failed: u8) -> CleanAsset {
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
            battery_cycle: 200.0 + id as f64,
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
            age_months: 30.0 + id as f64,
            in_warranty: 0,
            battery_health: 0.7 + 0.01 * id as f64,
            is_nvme: 1,
            is_mac: 0,
            label_failure_90d: failed,
            label_retire_180d: 0,
        }
    }

    #[test]
    fn bin_counts_cover_all_values() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let (min, max, counts) = bin_counts(&values, 4).unwrap();
        assert_eq!(min, 1.0);
        assert_eq!(max, 5.0);
        assert_eq!(counts.iter().sum::<usize>(), values.len());
        // Top value lands in the last bin, not out of range.
        assert!(counts[3] >= 1);
    }

    #[test]
    fn bin_counts_widen_constant_range() {
        let values = [3.0; 10];
        let (min, max, counts) = bin_counts(&values, 5).unwrap();
        assert!(min < 3.0 && max > 3.0);
        assert_eq!(counts.iter().sum::<usize>(), 10);
    }

    #[test]
    fn render_all_emits_every_figure() {
        let assets: Vec<CleanAsset> = (0..30).map(|i| asset(i, (i % 5 == 0) as u8)).collect();
        let summary = analyze(&assets, 25);
        let figures = render_all(&assets, &summary).unwrap();

        let slugs: Vec<&str> = figures.iter().map(|f| f.slug.as_str()).collect();
        for expected in [
            "missing_top",
            "age_months_hist",
            "battery_health_hist",
            "battery_health_by_label",
            "failure_rate_by_vendor",
            "failure_rate_by_battery",
            "failure_rate_by_temp",
            "correlation_heatmap",
        ] {
            assert!(slugs.contains(&expected), "missing figure {expected}");
        }
        // SVG markup actually materialized.
        assert!(figures.iter().all(|f| f.svg.contains("<svg")));
    }

    #[test]
    fn figures_land_on_disk() {
        let dir = std::env::temp_dir().join(format!("fleet-eda-figs-{}", std::process::id()));
        let figures = vec![Figure {
            slug: "demo".to_string(),
            title: "Demo".to_string(),
            svg: "<svg></svg>".to_string(),
        }];
        write_figures(&dir, &figures).unwrap();
        let written = std::fs::read_to_string(dir.join("demo.svg")).unwrap();
        std::fs::remove_dir_all(&dir).ok();
        assert_eq!(written, "<svg></svg>");
    }
}
