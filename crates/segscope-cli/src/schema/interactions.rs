use segscope_dataset::interaction::InteractionSet;
use serde::{Deserialize, Serialize};

/// Recommender interactions of one split, one user id per interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionsFile {
    pub user_ids: Vec<String>,
}

impl InteractionsFile {
    pub fn into_interaction_set(self) -> InteractionSet {
        InteractionSet::new(self.user_ids)
    }
}
