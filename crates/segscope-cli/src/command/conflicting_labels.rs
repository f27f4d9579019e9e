use std::path::PathBuf;

use anyhow::Context;
use segscope_checks::conflicting_labels::{
    ConflictingLabelsCheck, ConflictingLabelsConfig, IdentityNormalizer,
};
use segscope_dataset::seed::Seed;

use crate::{
    schema::report::CheckReport,
    util::{self, Output},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ConflictingLabelsArg {
    /// Sample set JSON file with texts and labels
    #[arg(long)]
    data: PathBuf,
    /// Number of conflict groups in the display section
    #[arg(long)]
    n_to_show: Option<usize>,
    /// Maximum number of samples used
    #[arg(long)]
    n_samples: Option<usize>,
    /// Random seed
    #[arg(long)]
    seed: Option<u64>,
    /// Omit the display section
    #[arg(long)]
    no_display: bool,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ConflictingLabelsArg) -> anyhow::Result<()> {
    let ConflictingLabelsArg {
        data,
        n_to_show,
        n_samples,
        seed,
        no_display,
        output,
    } = arg;

    let defaults = ConflictingLabelsConfig::default();
    let config = ConflictingLabelsConfig {
        n_to_show: n_to_show.unwrap_or(defaults.n_to_show),
        n_samples: n_samples.unwrap_or(defaults.n_samples),
        random_state: seed.map_or(defaults.random_state, Seed),
        with_display: !no_display,
        ..defaults
    };

    eprintln!("Loading samples from {}...", data.display());
    let samples = util::read_samples_file(data)?;
    eprintln!("Loaded {} samples ({})", samples.len(), samples.task_type());

    eprintln!("Grouping identical texts...");
    let check = ConflictingLabelsCheck::new(config, IdentityNormalizer);
    let result = check
        .run(&samples)
        .context("Conflicting labels check failed")?;
    eprintln!(
        "Found {} conflict groups ({:.1}% of samples)",
        result.conflicting_samples.len(),
        result.percent_of_conflicting_samples * 100.0
    );

    Output::save_json(&CheckReport::new("conflicting_labels", result), output.clone())?;
    if let Some(path) = output {
        eprintln!("Result saved to {}", path.display());
    }
    Ok(())
}
