//! Running statistics of a batch of rounds.

use serde::Serialize;
use std::time::Duration;

/// The category a round falls in, decided from its outcome relative to the bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoundCategory {
    /// A natural blackjack paid at 3 to 2, also counted as a win.
    Blackjack,
    Win,
    Tie,
    Surrender,
    Loss,
}

impl RoundCategory {
    /// Classifies `outcome` by exact comparison against the payouts for `bet`. Doubled rounds pay twice the bet
    /// either way and are classified by their sign.
    pub fn classify(outcome: f64, bet: f64) -> RoundCategory {
        if outcome == 1.5 * bet {
            RoundCategory::Blackjack
        } else if outcome == 0.0 {
            RoundCategory::Tie
        } else if outcome == -0.5 * bet {
            RoundCategory::Surrender
        } else if outcome > 0.0 {
            // A doubled win counts as a win rather than falling through to the loss counter
            RoundCategory::Win
        } else {
            RoundCategory::Loss
        }
    }
}

/// Accumulated results of one simulation. Append only, every recorded round extends the outcome and
/// cumulative profit sequences and bumps exactly one category counter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationStats {
    pub bet_value: f64,
    pub round_results: Vec<f64>,
    pub cumulative_profit: Vec<f64>,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub surrenders: u32,
    pub blackjacks: u32,
    pub doubles: u32,
    pub total_profit: f64,
    pub win_percent: f64,
    pub running_time: Duration,
}

impl SimulationStats {
    pub fn new(bet_value: f64) -> SimulationStats {
        SimulationStats::with_capacity(bet_value, 0)
    }

    pub fn with_capacity(bet_value: f64, rounds: usize) -> SimulationStats {
        SimulationStats {
            bet_value,
            round_results: Vec::with_capacity(rounds),
            cumulative_profit: Vec::with_capacity(rounds),
            wins: 0,
            losses: 0,
            ties: 0,
            surrenders: 0,
            blackjacks: 0,
            doubles: 0,
            total_profit: 0.0,
            win_percent: 0.0,
            running_time: Duration::ZERO,
        }
    }

    /// Records the outcome of one round and returns the category it was counted under. `doubled` marks a round
    /// in which the player doubled down, whatever its result.
    pub fn record(&mut self, outcome: f64, doubled: bool) -> RoundCategory {
        self.round_results.push(outcome);
        self.total_profit += outcome;
        self.cumulative_profit.push(self.total_profit);

        if doubled {
            self.doubles += 1;
        }

        let category = RoundCategory::classify(outcome, self.bet_value);
        match category {
            RoundCategory::Blackjack => {
                self.blackjacks += 1;
                self.wins += 1;
            }
            RoundCategory::Win => self.wins += 1,
            RoundCategory::Tie => self.ties += 1,
            RoundCategory::Surrender => self.surrenders += 1,
            RoundCategory::Loss => self.losses += 1,
        }
        category
    }

    /// Computes the derived statistics once every round has been recorded.
    pub fn finish(&mut self, running_time: Duration) {
        self.running_time = running_time;
        self.win_percent = SimulationStats::percent(self.total_profit, self.rounds(), self.bet_value);
    }

    fn percent(profit: f64, rounds: usize, bet_value: f64) -> f64 {
        if rounds == 0 {
            return 0.0;
        }
        profit / (rounds as f64 * bet_value) * 100.0
    }

    pub fn rounds(&self) -> usize {
        self.round_results.len()
    }

    /// The win percent after every round, i.e. cumulative profit over the total amount bet so far.
    pub fn profit_percent(&self) -> Vec<f64> {
        self.cumulative_profit
            .iter()
            .enumerate()
            .map(|(i, profit)| SimulationStats::percent(*profit, i + 1, self.bet_value))
            .collect()
    }

    /// Highest running balance reached during the simulation.
    pub fn max_balance(&self) -> Option<f64> {
        self.cumulative_profit.iter().copied().reduce(f64::max)
    }

    /// Lowest running balance reached during the simulation.
    pub fn min_balance(&self) -> Option<f64> {
        self.cumulative_profit.iter().copied().reduce(f64::min)
    }

    /// Appends the rounds of `other`, played after the rounds of `self`, as if both had been a single run.
    /// Both must have been played with the same bet.
    pub fn merge(&mut self, other: &SimulationStats) {
        let offset = self.total_profit;
        self.round_results.extend_from_slice(&other.round_results);
        self.cumulative_profit
            .extend(other.cumulative_profit.iter().map(|profit| profit + offset));
        self.wins += other.wins;
        self.losses += other.losses;
        self.ties += other.ties;
        self.surrenders += other.surrenders;
        self.blackjacks += other.blackjacks;
        self.doubles += other.doubles;
        self.total_profit += other.total_profit;
        self.finish(self.running_time + other.running_time);
    }
}
