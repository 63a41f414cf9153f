//! Descriptive statistics used by the analytics endpoints
//!
//! Every function returns `None` when the input cannot produce a meaningful
//! value (empty input, zero variance) instead of NaN.

use std::collections::BTreeMap;

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median (average of the two middle values for even lengths)
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Most frequent value. Ties resolve to the highest value.
pub fn mode(values: &[i32]) -> Option<i32> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(*v).or_default() += 1;
    }
    // BTreeMap iterates ascending, max_by_key keeps the last maximum
    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(value, _)| value)
}

/// Least-squares slope of y over x
pub fn linear_regression_slope(points: &[(f64, f64)]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let mut num = 0.0;
    let mut den = 0.0;
    for (x, y) in points {
        num += (x - mean_x) * (y - mean_y);
        den += (x - mean_x) * (x - mean_x);
    }
    if den == 0.0 {
        return None;
    }
    Some(num / den)
}

/// Pearson correlation coefficient of two equally long series
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mean_x = mean(xs)?;
    let mean_y = mean(ys)?;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Round to two decimals for presentation
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn mean_and_median() {
        assert_eq!(mean(&[]), None);
        assert!(approx(mean(&[1.0, 2.0, 6.0]).unwrap(), 3.0));
        assert_eq!(median(&[]), None);
        assert!(approx(median(&[5.0, 1.0, 3.0]).unwrap(), 3.0));
        assert!(approx(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5));
    }

    #[test]
    fn mode_prefers_highest_on_tie() {
        assert_eq!(mode(&[]), None);
        assert_eq!(mode(&[5, 4, 4, 3]), Some(4));
        assert_eq!(mode(&[2, 5, 2, 5, 1]), Some(5));
    }

    #[test]
    fn regression_slope() {
        let points = [(0.0, 1.0), (1.0, 3.0), (2.0, 5.0), (3.0, 7.0)];
        assert!(approx(linear_regression_slope(&points).unwrap(), 2.0));
        assert_eq!(linear_regression_slope(&[(1.0, 1.0)]), None);
        assert_eq!(linear_regression_slope(&[(1.0, 1.0), (1.0, 4.0)]), None);
    }

    #[test]
    fn pearson_correlation() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert!(approx(pearson(&xs, &[2.0, 4.0, 6.0, 8.0]).unwrap(), 1.0));
        assert!(approx(pearson(&xs, &[8.0, 6.0, 4.0, 2.0]).unwrap(), -1.0));
        assert_eq!(pearson(&xs, &[3.0, 3.0, 3.0, 3.0]), None);
        assert_eq!(pearson(&xs, &[1.0]), None);
    }

    #[test]
    fn rounding() {
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(-1.236), -1.24);
    }
}
