//! Recommender interaction data
//!
//! An [`InteractionSet`] holds one row per user/item interaction. Per-user
//! aggregates are computed once, when the set is built.

use std::collections::BTreeMap;

/// User/item interactions of one data split.
#[derive(Debug, Clone)]
pub struct InteractionSet {
    user_ids: Vec<String>,
    session_lengths: BTreeMap<String, usize>,
}

impl InteractionSet {
    #[must_use]
    pub fn new(user_ids: Vec<String>) -> Self {
        let mut session_lengths = BTreeMap::new();
        for user in &user_ids {
            *session_lengths.entry(user.clone()).or_default() += 1;
        }
        Self {
            user_ids,
            session_lengths,
        }
    }

    #[must_use]
    pub fn num_interactions(&self) -> usize {
        self.user_ids.len()
    }

    #[must_use]
    pub fn num_users(&self) -> usize {
        self.session_lengths.len()
    }

    /// Number of interactions of each user, longest session first.
    ///
    /// Users with equal session lengths are ordered by user id.
    #[must_use]
    pub fn session_lengths(&self) -> Vec<usize> {
        let mut lengths = self.session_lengths.iter().collect::<Vec<_>>();
        lengths.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        lengths.into_iter().map(|(_, &len)| len).collect()
    }
}
