//! Column subsets for ensemble members
//!
//! Each member of the ensemble trains one tree on a pair of columns. Pairs are
//! enumerated in feature-rank order; when there are more pairs than members
//! allowed, pairs are drawn without replacement with weights favoring
//! higher-ranked columns.

use rand::seq::index;
use segscope_dataset::seed::{RngStream, Seed};

pub use rand::distr::weighted::Error as WeightError;

/// Columns used by one ensemble member, as indices into the encoded table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub columns: Vec<usize>,
}

/// Chooses the column subsets of the ensemble.
///
/// `feature_rank` lists column indices from most to least important. A
/// single ranked column yields one single-column member; an empty rank yields
/// no members.
pub fn select_members(
    feature_rank: &[usize],
    max_members: usize,
    seed: Seed,
) -> Result<Vec<Member>, WeightError> {
    if feature_rank.len() == 1 {
        let columns = feature_rank.to_vec();
        return Ok(if max_members == 0 {
            vec![]
        } else {
            vec![Member { columns }]
        });
    }

    let pairs = (0..feature_rank.len())
        .flat_map(|i| (i + 1..feature_rank.len()).map(move |j| (i, j)))
        .collect::<Vec<_>>();
    let chosen = if pairs.len() <= max_members {
        (0..pairs.len()).collect::<Vec<_>>()
    } else {
        let mut rng = seed.rng(RngStream::EnsembleMembers);
        #[expect(clippy::cast_precision_loss)]
        let weight = |p: usize| {
            let (i, j) = pairs[p];
            1.0 / ((i + 1) * (j + 1)) as f64
        };
        let mut chosen =
            index::sample_weighted(&mut rng, pairs.len(), weight, max_members)?.into_vec();
        chosen.sort_unstable();
        chosen
    };

    Ok(chosen
        .into_iter()
        .map(|p| {
            let (i, j) = pairs[p];
            Member {
                columns: vec![feature_rank[i], feature_rank[j]],
            }
        })
        .collect())
}
