//! Small statistics toolkit: medians, quantiles, moments, correlation.
//!
//! All functions ignore non-finite inputs and return `None` when no finite
//! values remain, so callers can layer their own fallbacks (e.g. vendor
//! median -> global median) without special-casing NaN.

/// Arithmetic mean over finite values.
pub fn mean(values: &[f64]) -> Option<f64> {
    let mut sum = 0.0;
    let mut n = 0usize;
    for &v in values {
        if v.is_finite() {
            sum += v;
            n += 1;
        }
    }
    if n == 0 {
        return None;
    }
    Some(sum / n as f64)
}

/// Sample standard deviation (n-1 denominator) over finite values.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let mut acc = 0.0;
    let mut n = 0usize;
    for &v in values {
        if v.is_finite() {
            let d = v - m;
            acc += d * d;
            n += 1;
        }
    }
    if n < 2 {
        return None;
    }
    Some((acc / (n - 1) as f64).sqrt())
}

/// Median over finite values.
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Quantile with linear interpolation between order statistics.
///
/// `q` is in [0, 1]. Matches the convention used by common dataframe
/// libraries, so capping at [0.01, 0.99] reproduces the original bounds.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = pos - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Percentile capping bounds as actual order statistics.
///
/// Lower bound takes the floor index, upper bound the ceiling index, so both
/// bounds are values present in the data. This makes clamping idempotent:
/// re-running the cap on already-capped data computes the same bounds and
/// changes nothing (an interpolated quantile would keep creeping inward).
pub fn clip_bounds(values: &[f64], lo_q: f64, hi_q: f64) -> Option<(f64, f64)> {
    if !(0.0..=1.0).contains(&lo_q) || !(0.0..=1.0).contains(&hi_q) || lo_q > hi_q {
        return None;
    }
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let last = (sorted.len() - 1) as f64;
    let lo = sorted[(lo_q * last).floor() as usize];
    let hi = sorted[(hi_q * last).ceil() as usize];
    Some((lo, hi))
}

/// Pearson correlation between two equally long columns.
///
/// Pairs where either side is non-finite are dropped. Returns `None` for
/// fewer than two usable pairs or zero variance on either side.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    debug_assert_eq!(xs.len(), ys.len());

    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys.iter())
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| (x, y))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let my = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in &pairs {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}
