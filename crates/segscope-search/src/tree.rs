//! Shallow regression trees over encoded columns
//!
//! Trees minimize squared error of the per-sample score. Every split is an
//! exhaustive scan of midpoints between adjacent distinct values, so training
//! is deterministic: the first best split in (feature, threshold) order wins.

/// Minimum reduction of squared error for a split to be taken.
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    pub max_depth: usize,
    /// Smallest number of rows either side of a split may hold.
    pub min_samples_leaf: usize,
}

/// Bound on one feature collected along the path to a leaf.
///
/// Rows satisfy `lower < value <= upper`; a missing bound is unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureBound {
    pub feature: usize,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Leaf {
    /// Bounds in order of first use on the path from the root.
    pub bounds: Vec<FeatureBound>,
    /// Training rows reaching this leaf, ascending.
    pub rows: Vec<usize>,
    /// Mean target of `rows`.
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct RegressionTree {
    leaves: Vec<Leaf>,
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl RegressionTree {
    /// Fits a tree on `rows`.
    ///
    /// `features[f][row]` is the value of feature `f` for `row`, and
    /// `target[row]` the value to predict.
    #[must_use]
    pub fn fit(features: &[&[f64]], target: &[f64], rows: Vec<usize>, params: TreeParams) -> Self {
        let mut leaves = vec![];
        grow(features, target, rows, vec![], 0, params, &mut leaves);
        Self { leaves }
    }

    /// Leaves in depth-first order, left (lower values) first.
    #[must_use]
    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    #[must_use]
    pub fn into_leaves(self) -> Vec<Leaf> {
        self.leaves
    }
}

#[expect(clippy::cast_precision_loss)]
fn mean_of(target: &[f64], rows: &[usize]) -> f64 {
    rows.iter().map(|&r| target[r]).sum::<f64>() / rows.len() as f64
}

fn grow(
    features: &[&[f64]],
    target: &[f64],
    rows: Vec<usize>,
    bounds: Vec<FeatureBound>,
    depth: usize,
    params: TreeParams,
    leaves: &mut Vec<Leaf>,
) {
    let split = if depth < params.max_depth {
        best_split(features, target, &rows, params.min_samples_leaf)
    } else {
        None
    };
    let Some(split) = split else {
        let value = mean_of(target, &rows);
        leaves.push(Leaf {
            bounds,
            rows,
            value,
        });
        return;
    };

    let (left, right): (Vec<_>, Vec<_>) = rows
        .into_iter()
        .partition(|&r| features[split.feature][r] <= split.threshold);
    let left_bounds = narrow(&bounds, split.feature, None, Some(split.threshold));
    let right_bounds = narrow(&bounds, split.feature, Some(split.threshold), None);
    grow(features, target, left, left_bounds, depth + 1, params, leaves);
    grow(features, target, right, right_bounds, depth + 1, params, leaves);
}

fn narrow(
    bounds: &[FeatureBound],
    feature: usize,
    lower: Option<f64>,
    upper: Option<f64>,
) -> Vec<FeatureBound> {
    let mut bounds = bounds.to_vec();
    let index = bounds
        .iter()
        .position(|b| b.feature == feature)
        .unwrap_or_else(|| {
            bounds.push(FeatureBound {
                feature,
                lower: None,
                upper: None,
            });
            bounds.len() - 1
        });
    let bound = &mut bounds[index];
    if let Some(lower) = lower {
        bound.lower = Some(bound.lower.map_or(lower, |l| l.max(lower)));
    }
    if let Some(upper) = upper {
        bound.upper = Some(bound.upper.map_or(upper, |u| u.min(upper)));
    }
    bounds
}

#[expect(clippy::cast_precision_loss)]
fn best_split(
    features: &[&[f64]],
    target: &[f64],
    rows: &[usize],
    min_samples_leaf: usize,
) -> Option<Split> {
    let min_samples_leaf = min_samples_leaf.max(1);
    let n = rows.len();
    if n < 2 * min_samples_leaf {
        return None;
    }

    let total_sum = rows.iter().map(|&r| target[r]).sum::<f64>();
    let base = total_sum * total_sum / n as f64;

    let mut best: Option<Split> = None;
    let mut sorted = rows.to_vec();
    for (feature, values) in features.iter().enumerate() {
        sorted.sort_by(|&a, &b| values[a].total_cmp(&values[b]).then(a.cmp(&b)));
        let mut left_sum = 0.0;
        for i in 1..n {
            left_sum += target[sorted[i - 1]];
            if i < min_samples_leaf || n - i < min_samples_leaf {
                continue;
            }
            let (prev, next) = (values[sorted[i - 1]], values[sorted[i]]);
            if prev >= next {
                continue;
            }
            let right_sum = total_sum - left_sum;
            let gain =
                left_sum * left_sum / i as f64 + right_sum * right_sum / (n - i) as f64 - base;
            if gain > MIN_GAIN && best.is_none_or(|b| gain > b.gain) {
                best = Some(Split {
                    feature,
                    threshold: prev + (next - prev) / 2.0,
                    gain,
                });
            }
        }
    }
    best
}
