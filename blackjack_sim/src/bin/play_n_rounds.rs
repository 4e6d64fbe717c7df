use blackjack_lib::{BlackjackGameError, CardSource, DealerRule, InfiniteDeck};
use blackjack_sim::game::strategy::{BasicStrategy, DecisionStrategy};
use blackjack_sim::game::table::{BlackjackTableSim, RoundResult};
use blackjack_sim::stats::{RoundCategory, SimulationStats};
use std::time::Instant;

/// Plays `numb_rounds` rounds at `table`, handing every result to `on_round`, and returns the timed statistics.
fn play_rounds<D, S, F>(
    table: &mut BlackjackTableSim<D>,
    deck: &mut S,
    numb_rounds: u32,
    bet: f64,
    mut on_round: F,
) -> Result<SimulationStats, BlackjackGameError>
where
    D: DecisionStrategy,
    S: CardSource,
    F: FnMut(u32, &RoundResult, RoundCategory),
{
    let mut stats = SimulationStats::with_capacity(bet, numb_rounds as usize);
    let start = Instant::now();
    for round in 1..=numb_rounds {
        let result = table.play_round(deck, bet)?;
        let category = stats.record(result.outcome, result.doubled);
        on_round(round, &result, category);
    }
    stats.finish(start.elapsed());
    Ok(stats)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut args = std::env::args().skip(1);
    let numb_rounds_result = if let Some(n) = args.next() {
        n.parse::<u32>()
    } else {
        eprintln!("usage: play_n_rounds ROUNDS [--hit-soft-17]");
        std::process::exit(1);
    };

    let numb_rounds = match numb_rounds_result {
        Ok(n) => n,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    let rule = DealerRule::from_soft_seventeen(args.any(|a| a == "--hit-soft-17"));

    const BET: f64 = 1.0;
    let mut table = BlackjackTableSim::new(BasicStrategy::builtin(rule));
    let mut deck = InfiniteDeck::from_entropy();

    println!("{}", rule);
    let stats = match play_rounds(&mut table, &mut deck, numb_rounds, BET, |round, result, category| {
        println!("round {:>4}: {} [{:?}]", round, result, category)
    }) {
        Ok(stats) => stats,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let width = "number of player blackjacks:".len() + 20;
    let numeric_display_width = 80 - width;
    println!("{}", "-".repeat(80));
    println!("{:-^80}", "stats");
    let result_str = format!(
        "{:<width$}{:>numeric_display_width$}\n{:<width$}{:>numeric_display_width$}\n{:<width$}{:>numeric_display_width$}\n{:<width$}{:>numeric_display_width$}\n{:<width$}{:>numeric_display_width$}",
        "total wins:",
        stats.wins,
        "total ties:",
        stats.ties,
        "total losses:",
        stats.losses,
        "total surrenders:",
        stats.surrenders,
        "total winnings:",
        stats.total_profit
    );
    println!("{result_str}");
    println!(
        "{:<width$}{:>numeric_display_width$}",
        "number of player blackjacks:", stats.blackjacks,
    );
    println!(
        "{:<width$}{:>numeric_display_width$.3}",
        "running time (s):",
        stats.running_time.as_secs_f64(),
    );
    println!("{}", "-".repeat(80));
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_play_rounds_reports_every_round() {
        let mut table = BlackjackTableSim::new(BasicStrategy::builtin(DealerRule::HitSoft17));
        let mut deck = InfiniteDeck::from_seed(12);
        let mut seen = Vec::new();
        let stats = play_rounds(&mut table, &mut deck, 2_000, 1.0, |round, result, _| {
            seen.push((round, result.outcome))
        })
        .unwrap();

        assert_eq!(seen.len(), 2_000);
        assert_eq!(seen.first().map(|(round, _)| *round), Some(1));
        let outcomes: Vec<f64> = seen.iter().map(|(_, outcome)| *outcome).collect();
        assert_eq!(outcomes, stats.round_results);
        assert!(stats.running_time > std::time::Duration::ZERO);
    }
}
