/// Percentile of `values` using linear interpolation between order
/// statistics.
///
/// With the values sorted ascending as `x[0..n]`, the rank is
/// `h = (n - 1) * p / 100` and the result is
/// `x[floor(h)] + (h - floor(h)) * (x[floor(h) + 1] - x[floor(h)])`.
/// Returns `None` for an empty input or a `p` outside `[0, 100]`.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let h = (sorted.len() - 1) as f64 * p / 100.0;
    let lower = h.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = h - lower as f64;

    Some(sorted[lower] + fraction * (sorted[upper] - sorted[lower]))
}

/// Arithmetic mean, `None` when there is nothing to average
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (count, total) = values
        .into_iter()
        .fold((0usize, 0.0), |(count, total), value| (count + 1, total + value));
    (count > 0).then(|| total / count as f64)
}
