use std::path::PathBuf;

use anyhow::Context;
use segscope_checks::weak_segments::{WeakSegmentsCheck, WeakSegmentsConfig};
use segscope_dataset::{sample::ColumnGroup, seed::Seed};
use segscope_scoring::{metric::Metric, model::Model};

use crate::{
    schema::report::CheckReport,
    util::{self, Output},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct WeakSegmentsArg {
    /// Sample set JSON file
    #[arg(long)]
    data: PathBuf,
    /// Model predictions JSON file
    #[arg(long)]
    predictions: Option<PathBuf>,
    /// Per-sample scores JSON file; takes precedence over predictions
    #[arg(long)]
    scores: Option<PathBuf>,
    /// Check configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Column group to search (features, properties or metadata)
    #[arg(long, default_value = "features")]
    segment_by: ColumnGroup,
    /// Random seed
    #[arg(long)]
    seed: Option<u64>,
    /// Maximum number of samples used
    #[arg(long)]
    n_samples: Option<usize>,
    /// Smallest segment as a fraction of the samples
    #[arg(long)]
    min_size_ratio: Option<f64>,
    /// Number of segments in the display section
    #[arg(long)]
    n_to_show: Option<usize>,
    /// Segment metric (accuracy, neg_log_loss or f1_macro)
    #[arg(long)]
    alternative_scorer: Option<Metric>,
    /// Omit the display section
    #[arg(long)]
    no_display: bool,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

impl WeakSegmentsArg {
    fn load_config(&self) -> anyhow::Result<WeakSegmentsConfig> {
        let mut config = match &self.config {
            Some(path) => util::read_json_file("weak segments config", path)?,
            None => WeakSegmentsConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.random_state = Seed(seed);
        }
        if let Some(n_samples) = self.n_samples {
            config.n_samples = n_samples;
        }
        if let Some(ratio) = self.min_size_ratio {
            config.segment_minimum_size_ratio = ratio;
        }
        if let Some(n_to_show) = self.n_to_show {
            config.n_to_show = n_to_show;
        }
        if let Some(metric) = self.alternative_scorer {
            config.alternative_scorer = Some(metric);
        }
        if self.no_display {
            config.with_display = false;
        }
        Ok(config)
    }
}

pub(crate) fn run(arg: &WeakSegmentsArg) -> anyhow::Result<()> {
    let config = arg.load_config()?;

    eprintln!("Loading samples from {}...", arg.data.display());
    let samples = util::read_samples_file(&arg.data)?;
    eprintln!("Loaded {} samples ({})", samples.len(), samples.task_type());

    let model = arg
        .predictions
        .as_ref()
        .map(util::read_predictions_file)
        .transpose()?;
    let scores = arg
        .scores
        .as_ref()
        .map(util::read_scores_file)
        .transpose()?;
    match (&scores, &model) {
        (Some(scores), _) => eprintln!("Using {} provided scores", scores.len()),
        (None, Some(model)) => {
            eprintln!("Scoring with model over {} classes", model.classes().len());
        }
        (None, None) => {}
    }

    eprintln!(
        "Searching {} for weak segments (up to {} samples, seed {})...",
        arg.segment_by, config.n_samples, config.random_state.0
    );
    let n_to_show = config.n_to_show;
    let check = WeakSegmentsCheck::new(arg.segment_by).with_config(config);
    let result = check
        .run(
            &samples,
            model.as_ref().map(|m| m as &dyn Model),
            scores.as_deref(),
        )
        .context("Weak segments check failed")?;

    eprintln!(
        "Found {} weak segments in {} samples ({}: {:.3})",
        result.weak_segments.len(),
        result.num_samples,
        result.scorer,
        result.avg_score
    );
    for (i, segment) in result.weak_segments.iter().take(n_to_show).enumerate() {
        eprintln!(
            "  {i:2}: {} => {:.3} ({} samples)",
            segment.description(),
            segment.score,
            segment.size
        );
    }

    Output::save_json(&CheckReport::new("weak_segments", result), arg.output.clone())?;
    if let Some(path) = &arg.output {
        eprintln!("Result saved to {}", path.display());
    }
    Ok(())
}
