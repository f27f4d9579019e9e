//! Empirical distribution comparison between two samples.

/// Two-sample Kolmogorov-Smirnov statistic.
///
/// Returns the largest absolute difference between the empirical cumulative
/// distribution functions of `left` and `right`, a value in \[0.0, 1.0\].
/// NaN values are ignored.
///
/// # Returns
///
/// * `Some(statistic)` - if both samples contain at least one value
/// * `None` - if either sample is empty
///
/// # Examples
///
/// ```
/// use segscope_stats::distribution::ks_statistic;
///
/// let left = [1.0, 2.0, 3.0];
/// let right = [10.0, 11.0, 12.0];
/// assert_eq!(ks_statistic(&left, &right), Some(1.0));
/// ```
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn ks_statistic(left: &[f64], right: &[f64]) -> Option<f64> {
    let left = sorted_finite(left);
    let right = sorted_finite(right);
    if left.is_empty() || right.is_empty() {
        return None;
    }

    let (n_left, n_right) = (left.len() as f64, right.len() as f64);
    let (mut i, mut j) = (0, 0);
    let mut max_diff = 0.0_f64;
    while i < left.len() && j < right.len() {
        let value = f64::min(left[i], right[j]);
        while i < left.len() && left[i] <= value {
            i += 1;
        }
        while j < right.len() && right[j] <= value {
            j += 1;
        }
        let diff = (i as f64 / n_left - j as f64 / n_right).abs();
        max_diff = max_diff.max(diff);
    }
    Some(max_diff)
}

fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut values = values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .collect::<Vec<_>>();
    values.sort_by(f64::total_cmp);
    values
}
