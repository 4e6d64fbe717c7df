use blackjack_lib::DealerRule;
use blackjack_sim::prelude::*;
use blackjack_sim::write;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

/// Estimates the player's return at blackjack played by a fixed strategy against an infinite deck.
#[derive(Debug, Parser)]
#[command(name = "blackjack_sim", version)]
struct Cli {
    /// Number of rounds played by each simulation
    #[arg(short, long, default_value_t = 100_000)]
    rounds: u32,

    /// Flat bet placed on every round
    #[arg(short, long, default_value_t = 1.0)]
    bet: f64,

    /// Dealer hits soft 17 instead of standing on it
    #[arg(long)]
    hit_soft_17: bool,

    /// Number of independent simulations
    #[arg(short = 'n', long, default_value_t = 1)]
    simulations: u32,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Directory holding optimal_strategy_hard.csv and optimal_strategy_soft.csv, the built-in tables are used otherwise
    #[arg(long)]
    strategy_dir: Option<PathBuf>,

    /// Fail when the strategy asks to double or surrender on more than two cards instead of hitting
    #[arg(long)]
    strict: bool,

    /// Print the summaries as JSON
    #[arg(long)]
    json: bool,

    /// Write the round by round series of the first simulation to this CSV file
    #[arg(long)]
    series: Option<PathBuf>,
}

fn run(cli: Cli) -> Result<(), SimulationError> {
    let mut builder = BlackjackSimulatorConfig::new();
    builder
        .rounds(cli.rounds)
        .bet(cli.bet)
        .soft_seventeen(cli.hit_soft_17)
        .num_simulations(cli.simulations)
        .strict_actions(cli.strict)
        .silent(cli.json);
    if let Some(seed) = cli.seed {
        builder.seed(seed);
    }
    let config = builder.build();

    let simulator = match &cli.strategy_dir {
        Some(dir) => {
            let strategy = BasicStrategy::from_dir(dir, DealerRule::from_soft_seventeen(cli.hit_soft_17))?;
            BlackjackSimulator::with_strategy(config, strategy)?
        }
        None => BlackjackSimulator::new(config)?,
    };

    let all_stats = simulator.run(Box::new(io::stdout()))?;

    if cli.json {
        let summaries: Vec<SimulationSummary> = all_stats
            .iter()
            .enumerate()
            .map(|(i, stats)| {
                SimulationSummary::new(format!("simulation #{}", i + 1), config.rule(), stats)
            })
            .collect();
        write::write_json(&summaries, io::stdout().lock())?;
    }

    if let (Some(path), Some(stats)) = (&cli.series, all_stats.first()) {
        let file = BufWriter::new(File::create(path)?);
        write::write_series(stats, file)?;
        log::info!("wrote round series to {}", path.display());
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
