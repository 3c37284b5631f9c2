//! Descriptive statistics over float series.
//!
//! Every function is total: empty input yields zero rather than NaN so that
//! a trial aborted before its first epoch still produces well-formed output.

/// Arithmetic mean, 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased sample variance (n - 1 denominator), 0 for fewer than two values.
pub fn variance(values: &[f64]) -> f64 {
    mean_variance(values).1
}

/// Mean and unbiased variance in one pass over the data.
pub fn mean_variance(values: &[f64]) -> (f64, f64) {
    let m = mean(values);
    if values.len() < 2 {
        return (m, 0.0);
    }
    let (ss, comp) = values.iter().fold((0.0, 0.0), |(ss, comp), &v| {
        let d = v - m;
        (ss + d * d, comp + d)
    });
    let n = values.len() as f64;
    // Compensated form; removes the rounding error of the mean estimate.
    (m, ((ss - comp * comp / n) / (n - 1.0)).max(0.0))
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

/// Median of the values, 0 for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
