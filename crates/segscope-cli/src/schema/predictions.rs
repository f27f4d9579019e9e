use anyhow::Context;
use segscope_scoring::model::PrecomputedModel;
use serde::{Deserialize, Serialize};

/// Model output over a whole sample set, aligned with its rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionsFile {
    /// Class names; probability columns follow this order.
    pub classes: Vec<String>,
    pub predictions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<Vec<f64>>>,
}

impl PredictionsFile {
    pub fn into_model(self) -> anyhow::Result<PrecomputedModel> {
        let model = PrecomputedModel::new(self.classes, self.predictions);
        match self.probabilities {
            Some(probabilities) => model
                .with_probabilities(probabilities)
                .context("Invalid class probabilities"),
            None => Ok(model),
        }
    }
}
