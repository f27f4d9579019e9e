use clap::{Parser, Subcommand};

use self::{
    conflicting_labels::ConflictingLabelsArg, generate_samples::GenerateSamplesArg,
    session_drift::SessionDriftArg, weak_segments::WeakSegmentsArg,
};

mod conflicting_labels;
mod generate_samples;
mod session_drift;
mod weak_segments;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Check to run
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Find data segments where the model performs worst
    WeakSegments(#[clap(flatten)] WeakSegmentsArg),
    /// Find identical texts carrying different labels
    ConflictingLabels(#[clap(flatten)] ConflictingLabelsArg),
    /// Measure drift of per-user session lengths between two splits
    SessionDrift(#[clap(flatten)] SessionDriftArg),
    /// Generate a synthetic sample set with a known weak segment
    GenerateSamples(#[clap(flatten)] GenerateSamplesArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::WeakSegments(arg) => weak_segments::run(&arg)?,
        Mode::ConflictingLabels(arg) => conflicting_labels::run(&arg)?,
        Mode::SessionDrift(arg) => session_drift::run(&arg)?,
        Mode::GenerateSamples(arg) => generate_samples::run(&arg)?,
    }
    Ok(())
}
