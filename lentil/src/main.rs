mod common;
mod run_retrain;
mod run_simulate;
mod run_train;

use crate::common::*;
use run_retrain::*;
use run_simulate::*;
use run_train::*;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "LENTIL",
    long_about = "Latent topic Estimation by EM for sparse counts\n\
		  Probabilistic latent semantic analysis on `.mtx` data\n\
		  with words (features) in rows and documents in columns."
)]
struct Cli {
    #[arg(long, short, global = true, help = "Log every iteration")]
    verbose: bool,

    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Learn document-topic and topic-word tables",
        long_about = "Estimate a PLSA model in three stages: \n\
		      (1) Draw random row-stochastic tables\n\
		      (2) Alternate E- and M-steps until the mean log-likelihood\n\
		      changes by less than `--tol` or `--max-iter` is reached\n\
		      (3) Write both tables and the likelihood trace.\n"
    )]
    Train(TrainArgs),

    #[command(
        about = "Fold new documents into learned topics",
        long_about = "Estimate document-topic proportions of new documents\n\
		      while keeping a topic-word table fixed.\n\
		      The data must use the vocabulary of the topic-word table.\n",
        visible_alias = "fold-in"
    )]
    Retrain(RetrainArgs),

    /// Simulate a corpus from a random PLSA model
    Simulate(SimulateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match &cli.commands {
        Commands::Train(args) => {
            fit_plsa(args)?;
        }
        Commands::Retrain(args) => {
            fold_in_plsa(args)?;
        }
        Commands::Simulate(args) => {
            simulate_plsa(args)?;
        }
    }

    info!("done");
    Ok(())
}
