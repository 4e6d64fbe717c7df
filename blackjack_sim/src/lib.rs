pub mod game;
pub mod stats;
pub mod write;

use blackjack_lib::{BlackjackGameError, DealerRule, InfiniteDeck};
pub use game::prelude::*;
use game::strategy::{BasicStrategy, DecisionStrategy};
use log::{info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Display;
use std::io::{self, Write};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use thiserror::Error;

pub mod prelude {
    pub use super::{
        game::strategy::prelude::*, BlackjackSimulator, BlackjackSimulatorConfig,
        BlackjackSimulatorConfigBuilder, SimulationError, SimulationSummary,
    };
}

/// Simple struct for recording all of the interesting data points accumulated during a simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub label: String,
    pub rule: DealerRule,
    pub rounds: usize,
    pub bet: f64,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub surrenders: u32,
    pub blackjacks: u32,
    pub doubles: u32,
    pub total_profit: f64,
    pub win_percent: f64,
    pub max_balance: f64,
    pub min_balance: f64,
    pub running_time_secs: f64,
}

impl SimulationSummary {
    pub fn new<S: Into<String>>(label: S, rule: DealerRule, stats: &SimulationStats) -> Self {
        SimulationSummary {
            label: label.into(),
            rule,
            rounds: stats.rounds(),
            bet: stats.bet_value,
            wins: stats.wins,
            losses: stats.losses,
            ties: stats.ties,
            surrenders: stats.surrenders,
            blackjacks: stats.blackjacks,
            doubles: stats.doubles,
            total_profit: stats.total_profit,
            win_percent: stats.win_percent,
            max_balance: stats.max_balance().unwrap_or(0.0),
            min_balance: stats.min_balance().unwrap_or(0.0),
            running_time_secs: stats.running_time.as_secs_f64(),
        }
    }
}

impl Display for SimulationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const WIDTH: usize = 80;
        const TEXT_WIDTH: usize = "number of player blackjacks".len() + 20;
        const NUM_WIDTH: usize = WIDTH - TEXT_WIDTH;
        let body = format!(
            "{} rounds played by basic strategy (infinite deck, no splitting, {}) with a bet of {}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}\n\
        {:<TEXT_WIDTH$}{:>NUM_WIDTH$.3}\n",
            self.rounds,
            self.rule,
            self.bet,
            "wins",
            self.wins,
            "losses",
            self.losses,
            "ties",
            self.ties,
            "surrenders",
            self.surrenders,
            "number of player blackjacks",
            self.blackjacks,
            "doubles",
            self.doubles,
            "win amount",
            self.total_profit,
            "win percent",
            self.win_percent,
            "max balance",
            self.max_balance,
            "min balance",
            self.min_balance,
            "running time (s)",
            self.running_time_secs,
        );
        write!(f, "{}", body)
    }
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Game(#[from] BlackjackGameError),

    #[error("malformed strategy data: {0}")]
    Strategy(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sending error: {0}")]
    Sending(String),

    #[error("write error: {0}")]
    Write(String),
}

/// Struct for running a number of independent simulations of the same configuration, each on its own thread.
/// Every simulation draws from its own random stream, so a seeded run is reproducible no matter how the
/// threads get scheduled.
pub struct BlackjackSimulator {
    pub config: BlackjackSimulatorConfig,
    strategy: Arc<BasicStrategy>,
}

impl BlackjackSimulator {
    /// Creates a simulator playing the built-in strategy for the configured dealer rule.
    pub fn new(config: BlackjackSimulatorConfig) -> Result<Self, SimulationError> {
        let strategy = BasicStrategy::builtin(config.rule()).clone();
        BlackjackSimulator::with_strategy(config, strategy)
    }

    /// Creates a simulator playing `strategy`, which must have been built for the configured dealer rule.
    pub fn with_strategy(
        config: BlackjackSimulatorConfig,
        strategy: BasicStrategy,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        if strategy.rule() != config.rule() {
            return Err(SimulationError::Config(format!(
                "strategy was built for `{}` but the table plays `{}`",
                strategy.rule(),
                config.rule()
            )));
        }
        Ok(BlackjackSimulator {
            config,
            strategy: Arc::new(strategy),
        })
    }

    pub fn strategy(&self) -> &BasicStrategy {
        &self.strategy
    }

    /// The random stream for simulation `id`. With a seed every simulation gets its own stream of the same key.
    fn rng_for(seed: Option<u64>, id: usize) -> ChaCha8Rng {
        match seed {
            Some(seed) => {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                rng.set_stream(id as u64);
                rng
            }
            None => ChaCha8Rng::from_entropy(),
        }
    }

    /// Runs every simulation, each in a new thread. The summary of each finished simulation is sent to a writer
    /// thread that writes all of them, in simulation order, to `out` once every simulation is done.
    /// Returns the statistics of each simulation in simulation order.
    pub fn run(
        &self,
        out: Box<dyn Write + Send + 'static>,
    ) -> Result<Vec<SimulationStats>, SimulationError> {
        let num_simulations = self.config.num_simulations as usize;
        let rule = self.config.rule();
        info!("running {} simulations, {}", num_simulations, rule);

        let (write_sender, write_receiver) = mpsc::channel::<(Option<SimulationSummary>, usize)>();
        let ids: HashSet<usize> = (1..=num_simulations).collect();
        let out: Box<dyn Write + Send + 'static> = if self.config.silent {
            Box::new(io::sink())
        } else {
            out
        };
        let write_handle =
            thread::spawn(move || write::write_summaries(write_receiver, ids, out));

        let mut handles = vec![];
        for id in 1..=num_simulations {
            let write_sender = write_sender.clone();
            let strategy = Arc::clone(&self.strategy);
            let config = self.config;

            let handle = thread::spawn(move || -> Result<SimulationStats, SimulationError> {
                let table = BlackjackTableSim::new(strategy).strict_actions(config.strict_actions);
                let deck = InfiniteDeck::new(BlackjackSimulator::rng_for(config.seed, id));
                let mut game = BlackjackGameSim::new(table, deck, config.rounds, config.bet);
                let result = game.run().map(|_| ());

                if let Err(e) = result {
                    // Tell the writer we are finished with this simulation regardless
                    let _ = write_sender.send((None, id));
                    return Err(e.into());
                }

                let stats = game.into_stats();
                let summary = SimulationSummary::new(format!("simulation #{}", id), rule, &stats);
                write_sender
                    .send((Some(summary), id))
                    .and_then(|_| write_sender.send((None, id)))
                    .map_err(|e| SimulationError::Sending(e.to_string()))?;
                Ok(stats)
            });
            handles.push(handle);
        }
        drop(write_sender);

        let mut all_stats = Vec::with_capacity(num_simulations);
        let mut first_error = None;
        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle.join().unwrap_or_else(|_| {
                Err(SimulationError::Sending(format!(
                    "simulation #{} panicked",
                    i + 1
                )))
            });
            match result {
                Ok(stats) => all_stats.push(stats),
                Err(e) => {
                    warn!("error occured for simulation #{}: {}", i + 1, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        // Make sure the writer has finished as well
        match write_handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(SimulationError::Write(e.to_string())),
            Err(_) => return Err(SimulationError::Write("writer thread panicked".to_string())),
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(all_stats),
        }
    }
}

/// Struct for configuring a `BlackjackSimulator`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlackjackSimulatorConfig {
    pub rounds: u32,
    pub bet: f64,
    pub soft_seventeen: bool,
    pub num_simulations: u32,
    pub seed: Option<u64>,
    pub strict_actions: bool,
    pub silent: bool,
}

impl BlackjackSimulatorConfig {
    /// Associated method for returning a new `BlackjackSimulatorConfigBuilder`, allows the user to choose the
    /// parameters of the simulation such as the number of rounds, the bet and the dealer's house rule.
    pub fn new() -> BlackjackSimulatorConfigBuilder {
        BlackjackSimulatorConfigBuilder {
            rounds: None,
            bet: None,
            soft_seventeen: None,
            num_simulations: None,
            seed: None,
            strict_actions: None,
            silent: None,
        }
    }

    pub fn rule(&self) -> DealerRule {
        DealerRule::from_soft_seventeen(self.soft_seventeen)
    }

    /// Checks that the configuration describes a simulation that can be run.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.rounds == 0 {
            return Err(SimulationError::Config(
                "number of rounds must be positive".to_string(),
            ));
        }
        if !self.bet.is_finite() || self.bet <= 0.0 {
            return Err(SimulationError::Config(format!(
                "bet must be a positive amount, got {}",
                self.bet
            )));
        }
        if self.num_simulations == 0 {
            return Err(SimulationError::Config(
                "number of simulations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BlackjackSimulatorConfig {
    /// Returns the standard configuration, 100 000 rounds of a unit bet with the dealer standing on soft 17.
    fn default() -> Self {
        BlackjackSimulatorConfig::new().build()
    }
}

/// Struct to implement builder pattern for `BlackjackSimulatorConfig`
#[derive(Debug, Clone, Copy)]
pub struct BlackjackSimulatorConfigBuilder {
    rounds: Option<u32>,
    bet: Option<f64>,
    soft_seventeen: Option<bool>,
    num_simulations: Option<u32>,
    seed: Option<u64>,
    strict_actions: Option<bool>,
    silent: Option<bool>,
}

impl BlackjackSimulatorConfigBuilder {
    /// Method for setting the number of rounds played by each simulation.
    pub fn rounds(&mut self, rounds: u32) -> &mut Self {
        self.rounds = Some(rounds);
        self
    }

    /// Method for setting the flat bet placed on every round
    pub fn bet(&mut self, bet: f64) -> &mut Self {
        self.bet = Some(bet);
        self
    }

    /// Method for setting the flag that determines if the dealer must hit soft seventeens, default is false
    pub fn soft_seventeen(&mut self, seventeen: bool) -> &mut Self {
        self.soft_seventeen = Some(seventeen);
        self
    }

    /// Method for setting the number of independent simulations run.
    pub fn num_simulations(&mut self, n: u32) -> &mut Self {
        self.num_simulations = Some(n);
        self
    }

    /// Method for seeding the random streams, without a seed every run draws different cards.
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = Some(seed);
        self
    }

    /// Method for setting a flag that makes a double or surrender on more than two cards an error
    pub fn strict_actions(&mut self, strict: bool) -> &mut Self {
        self.strict_actions = Some(strict);
        self
    }

    /// Method for setting a boolean flag, if set to false the summary of every simulation is written out, otherwise
    /// the simulator remains silent.
    pub fn silent(&mut self, silent: bool) -> &mut Self {
        self.silent = Some(silent);
        self
    }

    /// Method for building a `BlackjackSimulatorConfig` from the given builder.
    pub fn build(&mut self) -> BlackjackSimulatorConfig {
        BlackjackSimulatorConfig {
            rounds: self.rounds.unwrap_or(100_000),
            bet: self.bet.unwrap_or(1.0),
            soft_seventeen: self.soft_seventeen.unwrap_or(false),
            num_simulations: self.num_simulations.unwrap_or(1),
            seed: self.seed,
            strict_actions: self.strict_actions.unwrap_or(false),
            silent: self.silent.unwrap_or(true),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use blackjack_lib::HandShape;
    use std::sync::Mutex;

    /// A writer that keeps everything written to it, shared with the test.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = BlackjackSimulatorConfig::default();
        assert_eq!(config.rounds, 100_000);
        assert_eq!(config.bet, 1.0);
        assert_eq!(config.rule(), DealerRule::StandSoft17);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_configs_rejected() {
        let no_rounds = BlackjackSimulatorConfig::new().rounds(0).build();
        assert!(matches!(
            BlackjackSimulator::new(no_rounds),
            Err(SimulationError::Config(_))
        ));
        let negative_bet = BlackjackSimulatorConfig::new().bet(-1.0).build();
        assert!(negative_bet.validate().is_err());
        let nan_bet = BlackjackSimulatorConfig::new().bet(f64::NAN).build();
        assert!(nan_bet.validate().is_err());
    }

    #[test]
    fn test_strategy_rule_must_match_table() {
        let config = BlackjackSimulatorConfig::new().soft_seventeen(true).build();
        let strategy = BasicStrategy::builtin(DealerRule::StandSoft17).clone();
        assert!(BlackjackSimulator::with_strategy(config, strategy).is_err());
    }

    #[test]
    fn test_seeded_simulations_reproduce() {
        let config = BlackjackSimulatorConfig::new()
            .rounds(2_000)
            .bet(10.0)
            .num_simulations(3)
            .seed(17)
            .build();
        let first = BlackjackSimulator::new(config)
            .unwrap()
            .run(Box::new(io::sink()))
            .unwrap();
        let second = BlackjackSimulator::new(config)
            .unwrap()
            .run(Box::new(io::sink()))
            .unwrap();

        assert_eq!(first.len(), 3);
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.round_results, b.round_results);
        }
        // Independent streams per simulation
        assert_ne!(first[0].round_results, first[1].round_results);
    }

    #[test]
    fn test_summaries_written_in_order() {
        let config = BlackjackSimulatorConfig::new()
            .rounds(500)
            .num_simulations(3)
            .seed(1)
            .silent(false)
            .build();
        let buffer = SharedBuffer::default();
        BlackjackSimulator::new(config)
            .unwrap()
            .run(Box::new(buffer.clone()))
            .unwrap();

        let text = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let first = text.find("simulation #1").unwrap();
        let second = text.find("simulation #2").unwrap();
        let third = text.find("simulation #3").unwrap();
        assert!(first < second && second < third);
        assert!(text.contains("win percent"));
    }

    #[test]
    fn test_incomplete_strategy_rejected_before_running() {
        use blackjack_lib::{Action, Card};
        use game::strategy::StrategyTable;
        let rule = DealerRule::StandSoft17;
        let mut hard = StrategyTable::empty(rule, HandShape::Hard);
        hard.set(19, Card::Ace, Action::Stand).unwrap();
        let result = BasicStrategy::from_tables(hard, StrategyTable::empty(rule, HandShape::Soft));
        assert!(matches!(
            result,
            Err(SimulationError::Game(BlackjackGameError::MissingStrategyEntry { .. }))
        ));

        // A complete strategy still starts
        let config = BlackjackSimulatorConfig::new().rounds(10).seed(2).build();
        let strategy = BasicStrategy::builtin(rule).clone();
        assert!(BlackjackSimulator::with_strategy(config, strategy).is_ok());
    }

    #[test]
    fn test_summary_from_stats() {
        let mut game = BlackjackGameSim::seeded(1_000, 2.0, DealerRule::HitSoft17, 8);
        let stats = game.run().unwrap().clone();
        let summary = SimulationSummary::new("h17", DealerRule::HitSoft17, &stats);
        assert_eq!(summary.rounds, 1_000);
        assert_eq!(summary.total_profit, stats.total_profit);
        assert!(summary.max_balance >= summary.min_balance);
        assert!(format!("{}", summary).contains("dealer hits soft 17"));
    }
}
