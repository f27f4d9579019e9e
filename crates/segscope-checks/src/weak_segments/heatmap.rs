//! Heatmap over the two columns most implicated in the weakest segments
//!
//! Each axis is cut at every bound the top segments place on its column, so
//! each top segment covers a block of whole cells.

use std::collections::HashMap;

use segscope_dataset::encoding::EncodedTable;
use segscope_scoring::scorer::SampleScores;
use segscope_search::segment::Segment;
use serde::Serialize;

use super::report::PredicateRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapAxis {
    pub column: String,
    /// Bins in ascending order; together they cover every row.
    pub bins: Vec<PredicateRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub count: usize,
    /// Segment score of the cell's rows; `None` for an empty cell.
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub x: HeatmapAxis,
    /// Absent when the top segments use a single column.
    pub y: Option<HeatmapAxis>,
    /// Row-major: `cells[y_bin][x_bin]`.
    pub cells: Vec<Vec<HeatmapCell>>,
}

/// Encoded bin edges of one column: bin `i` is `(edges[i - 1], edges[i]]`.
struct Axis {
    column: usize,
    edges: Vec<f64>,
}

impl Axis {
    fn new(column: usize, segments: &[Segment]) -> Self {
        let mut edges = segments
            .iter()
            .flat_map(|s| &s.predicates)
            .filter(|p| p.column == column)
            .flat_map(|p| [p.lower, p.upper])
            .flatten()
            .collect::<Vec<_>>();
        edges.sort_by(f64::total_cmp);
        edges.dedup();
        Self { column, edges }
    }

    fn num_bins(&self) -> usize {
        self.edges.len() + 1
    }

    fn bin_of(&self, value: f64) -> usize {
        self.edges.partition_point(|&edge| edge < value)
    }

    fn bounds(&self, bin: usize) -> (Option<f64>, Option<f64>) {
        let lower = bin.checked_sub(1).map(|i| self.edges[i]);
        let upper = self.edges.get(bin).copied();
        (lower, upper)
    }

    fn to_record(&self, table: &EncodedTable) -> HeatmapAxis {
        let descriptor = &table.column(self.column).descriptor;
        let bins = (0..self.num_bins())
            .map(|bin| {
                let (lower, upper) = self.bounds(bin);
                PredicateRecord::from_range(descriptor, lower, upper)
            })
            .collect();
        HeatmapAxis {
            column: descriptor.name.clone(),
            bins,
        }
    }
}

/// Columns used most often by `segments`, at most two.
///
/// Ties go to the column used first.
fn top_columns(segments: &[Segment]) -> Vec<usize> {
    let mut counts = HashMap::<usize, (usize, usize)>::new();
    for (order, predicate) in segments.iter().flat_map(|s| &s.predicates).enumerate() {
        counts.entry(predicate.column).or_insert((0, order)).0 += 1;
    }
    let mut columns = counts.into_iter().collect::<Vec<_>>();
    columns.sort_by(|(_, (ca, fa)), (_, (cb, fb))| cb.cmp(ca).then(fa.cmp(fb)));
    columns.into_iter().take(2).map(|(column, _)| column).collect()
}

/// Builds the heatmap for `top_segments`; `None` if they have no predicates.
pub(crate) fn build(
    table: &EncodedTable,
    scores: &SampleScores,
    top_segments: &[Segment],
) -> Option<Heatmap> {
    let columns = top_columns(top_segments);
    let x = Axis::new(*columns.first()?, top_segments);
    let y = columns.get(1).map(|&c| Axis::new(c, top_segments));

    let y_bins = y.as_ref().map_or(1, Axis::num_bins);
    let mut rows = vec![vec![vec![]; x.num_bins()]; y_bins];
    let x_values = &table.column(x.column).values;
    for (row, &value) in x_values.iter().enumerate() {
        let yi = y
            .as_ref()
            .map_or(0, |y| y.bin_of(table.column(y.column).values[row]));
        rows[yi][x.bin_of(value)].push(row);
    }

    let cells = rows
        .into_iter()
        .map(|line| {
            line.into_iter()
                .map(|rows| HeatmapCell {
                    count: rows.len(),
                    score: (!rows.is_empty()).then(|| scores.segment_score(&rows)),
                })
                .collect()
        })
        .collect();

    Some(Heatmap {
        x: x.to_record(table),
        y: y.map(|y| y.to_record(table)),
        cells,
    })
}

#[cfg(test)]
mod tests {
    use arrayvec::ArrayVec;
    use segscope_search::segment::Predicate;

    use super::*;

    fn segment(predicates: &[Predicate]) -> Segment {
        Segment {
            predicates: predicates.iter().copied().collect::<ArrayVec<_, 2>>(),
            rows: vec![0],
            score: 0.0,
            weakness: 1.0,
        }
    }

    fn predicate(column: usize, lower: Option<f64>, upper: Option<f64>) -> Predicate {
        Predicate {
            column,
            lower,
            upper,
        }
    }

    #[test]
    fn test_top_columns_by_frequency() {
        let segments = [
            segment(&[predicate(3, Some(1.0), None), predicate(1, None, Some(2.0))]),
            segment(&[predicate(1, Some(0.0), None), predicate(2, None, Some(2.0))]),
            segment(&[predicate(2, Some(0.0), None)]),
        ];
        // 1 and 2 are used twice; 1 first
        assert_eq!(top_columns(&segments), [1, 2]);
        assert!(top_columns(&[]).is_empty());
    }

    #[test]
    fn test_axis_bins() {
        let segments = [
            segment(&[predicate(0, Some(5.0), None)]),
            segment(&[predicate(0, Some(2.0), Some(5.0))]),
        ];
        let axis = Axis::new(0, &segments);
        assert_eq!(axis.edges, [2.0, 5.0]);
        assert_eq!(axis.num_bins(), 3);
        assert_eq!(axis.bin_of(2.0), 0);
        assert_eq!(axis.bin_of(2.1), 1);
        assert_eq!(axis.bin_of(5.0), 1);
        assert_eq!(axis.bin_of(9.0), 2);
        assert_eq!(axis.bounds(0), (None, Some(2.0)));
        assert_eq!(axis.bounds(2), (Some(5.0), None));
    }
}
