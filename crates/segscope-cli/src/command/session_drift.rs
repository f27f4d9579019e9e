use std::path::PathBuf;

use anyhow::Context;
use segscope_checks::session_drift::{KsDriftCalculator, UserSessionDriftCheck};

use crate::{
    schema::report::CheckReport,
    util::{self, Output},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct SessionDriftArg {
    /// Train interactions JSON file
    #[arg(long)]
    train: PathBuf,
    /// Test interactions JSON file
    #[arg(long)]
    test: PathBuf,
    /// Fewest users either split may have
    #[arg(long, default_value_t = 10)]
    min_samples: usize,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &SessionDriftArg) -> anyhow::Result<()> {
    let SessionDriftArg {
        train,
        test,
        min_samples,
        output,
    } = arg;

    eprintln!("Loading interactions...");
    let train = util::read_interactions_file(train)?;
    let test = util::read_interactions_file(test)?;
    eprintln!(
        "  Train: {} interactions, {} users",
        train.num_interactions(),
        train.num_users()
    );
    eprintln!(
        "  Test:  {} interactions, {} users",
        test.num_interactions(),
        test.num_users()
    );

    let check = UserSessionDriftCheck::new(KsDriftCalculator {
        min_samples: *min_samples,
    });
    let result = check
        .run(&train, &test)
        .context("Session drift check failed")?;
    eprintln!(
        "Session length drift ({}): {:.3}",
        result.drift.method, result.drift.score
    );

    Output::save_json(&CheckReport::new("session_drift", result), output.clone())?;
    if let Some(path) = output {
        eprintln!("Result saved to {}", path.display());
    }
    Ok(())
}
