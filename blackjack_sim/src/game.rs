//! Module that focuses on the simulation of a batch of independent rounds of blackjack. In other words,
//! this module provides all the functionality needed to estimate the player's return for a given strategy.

pub mod player;
pub mod strategy;
pub mod table;

pub mod prelude {
    pub use super::BlackjackGameSim;
    pub use crate::game::player::{PlayerResponse, PlayerSim};
    pub use crate::game::strategy;
    pub use crate::game::table::{BlackjackTableSim, PlayerFinish, RoundResult};
    pub use crate::stats::{RoundCategory, SimulationStats};
    pub use blackjack_lib::{BlackjackGameError, CardSource, DealerRule, InfiniteDeck};
}

pub use prelude::*;
use log::info;
use std::time::Instant;
use strategy::{BasicStrategy, DecisionStrategy};

/// Struct that runs a fixed number of independent rounds at one table with a flat bet,
/// and records the outcome of every round in a `SimulationStats`.
pub struct BlackjackGameSim<D, C>
where
    D: DecisionStrategy,
    C: CardSource,
{
    table: BlackjackTableSim<D>,
    source: C,
    num_rounds: u32,
    bet: f64,
    stats: SimulationStats,
}

impl<D, C> BlackjackGameSim<D, C>
where
    D: DecisionStrategy,
    C: CardSource,
{
    /// Associated method for building a new simulation.
    /// `table` plays the rounds, every card is drawn from `source`, `num_rounds` is the number of rounds played
    /// by a single call to `self.run()`, each one with the same `bet`.
    pub fn new(
        table: BlackjackTableSim<D>,
        source: C,
        num_rounds: u32,
        bet: f64,
    ) -> BlackjackGameSim<D, C> {
        BlackjackGameSim {
            table,
            source,
            num_rounds,
            bet,
            stats: SimulationStats::new(bet),
        }
    }

    /// Plays every round, recording each outcome. Statistics from a previous run are discarded first.
    /// Any error aborts the whole run, since substituting a default action would skew the statistics.
    pub fn run(&mut self) -> Result<&SimulationStats, BlackjackGameError> {
        info!(
            "playing {} rounds with a bet of {}, {}",
            self.num_rounds,
            self.bet,
            self.table.rule()
        );
        self.stats = SimulationStats::with_capacity(self.bet, self.num_rounds as usize);

        let start = Instant::now();
        for _ in 0..self.num_rounds {
            let result = self.table.play_round(&mut self.source, self.bet)?;
            self.stats.record(result.outcome, result.doubled);
        }
        self.stats.finish(start.elapsed());

        info!(
            "finished {} rounds in {:.3}s, total profit {}, win percent {:.3}%",
            self.stats.rounds(),
            self.stats.running_time.as_secs_f64(),
            self.stats.total_profit,
            self.stats.win_percent
        );
        Ok(&self.stats)
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn into_stats(self) -> SimulationStats {
        self.stats
    }

    pub fn table(&self) -> &BlackjackTableSim<D> {
        &self.table
    }

    pub fn num_rounds(&self) -> u32 {
        self.num_rounds
    }

    pub fn bet(&self) -> f64 {
        self.bet
    }
}

impl BlackjackGameSim<&'static BasicStrategy, InfiniteDeck> {
    /// A simulation playing the built-in strategy for `rule` against a freshly seeded infinite deck.
    pub fn with_rule(num_rounds: u32, bet: f64, rule: DealerRule) -> Self {
        BlackjackGameSim::new(
            BlackjackTableSim::new(BasicStrategy::builtin(rule)),
            InfiniteDeck::from_entropy(),
            num_rounds,
            bet,
        )
    }

    /// Like `with_rule`, but every card drawn is determined by `seed`.
    pub fn seeded(num_rounds: u32, bet: f64, rule: DealerRule, seed: u64) -> Self {
        BlackjackGameSim::new(
            BlackjackTableSim::new(BasicStrategy::builtin(rule)),
            InfiniteDeck::from_seed(seed),
            num_rounds,
            bet,
        )
    }
}
