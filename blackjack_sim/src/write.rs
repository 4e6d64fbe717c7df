use crate::{SimulationError, SimulationStats, SimulationSummary};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::mpsc::Receiver;

fn format_summaries(summaries: HashMap<usize, SimulationSummary>) -> Vec<String> {
    const WIDTH: usize = 80;
    let mut summaries: Vec<(usize, SimulationSummary)> = summaries.into_iter().collect();
    summaries.sort_by_key(|(id, _)| *id);
    summaries
        .into_iter()
        .map(|(id, summary)| {
            let sim_num = format!("simulation #{}", id);
            let header = format!("{:-^WIDTH$}\n", sim_num);
            format!("{}{}{}\n", header, summary, "-".repeat(WIDTH))
        })
        .collect()
}

/// Receives `(summary, id)` pairs until every simulation in `ids` has reported in with a `None` summary,
/// then writes the summaries to `writer` ordered by id.
pub fn write_summaries(
    receiver: Receiver<(Option<SimulationSummary>, usize)>,
    mut ids: HashSet<usize>,
    mut writer: impl Write,
) -> std::io::Result<()> {
    let mut summaries: HashMap<usize, SimulationSummary> = HashMap::new();
    while !ids.is_empty() {
        // Every sender is gone, nothing more is coming
        let Ok((cur_summary, id)) = receiver.recv() else {
            break;
        };
        match cur_summary {
            Some(summary) => {
                summaries.insert(id, summary);
            }
            None => {
                ids.remove(&id);
            }
        }
    }

    for summary_str in format_summaries(summaries) {
        writer.write_all(summary_str.as_bytes())?;
    }
    writer.flush()
}

/// Writes the per round series of a simulation as CSV: the round number, its outcome, the cumulative profit and
/// the running win percent after the round.
pub fn write_series<W: Write>(stats: &SimulationStats, writer: W) -> Result<(), SimulationError> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(["round", "outcome", "cumulative_profit", "win_percent"])?;
    let percents = stats.profit_percent();
    for (i, ((outcome, profit), percent)) in stats
        .round_results
        .iter()
        .zip(stats.cumulative_profit.iter())
        .zip(percents.iter())
        .enumerate()
    {
        writer.write_record(&[
            (i + 1).to_string(),
            outcome.to_string(),
            profit.to_string(),
            percent.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the summaries as a pretty printed JSON array.
pub fn write_json<W: Write>(
    summaries: &[SimulationSummary],
    mut writer: W,
) -> Result<(), SimulationError> {
    serde_json::to_writer_pretty(&mut writer, summaries)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use blackjack_lib::DealerRule;
    use std::sync::mpsc;
    use std::time::Duration;

    fn stats_from(outcomes: &[f64]) -> SimulationStats {
        let mut stats = SimulationStats::new(1.0);
        for outcome in outcomes {
            stats.record(*outcome, false);
        }
        stats.finish(Duration::ZERO);
        stats
    }

    #[test]
    fn test_write_series() {
        let stats = stats_from(&[1.0, -0.5, 1.5]);
        let mut out = Vec::new();
        write_series(&stats, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "round,outcome,cumulative_profit,win_percent");
        assert_eq!(lines[1], "1,1,1,100");
        assert_eq!(lines[2], "2,-0.5,0.5,25");
        assert!(lines[3].starts_with("3,1.5,2,66.666"));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_write_summaries_waits_for_every_id() {
        let (sender, receiver) = mpsc::channel();
        let ids: HashSet<usize> = [1, 2].into_iter().collect();
        let second = SimulationSummary::new("b", DealerRule::StandSoft17, &stats_from(&[1.0]));
        let first = SimulationSummary::new("a", DealerRule::StandSoft17, &stats_from(&[-1.0]));
        sender.send((Some(second), 2)).unwrap();
        sender.send((None, 2)).unwrap();
        sender.send((Some(first), 1)).unwrap();
        sender.send((None, 1)).unwrap();

        let mut out = Vec::new();
        write_summaries(receiver, ids, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.find("simulation #1").unwrap() < text.find("simulation #2").unwrap());
    }

    #[test]
    fn test_write_json() {
        let summary = SimulationSummary::new("a", DealerRule::HitSoft17, &stats_from(&[1.0, 0.0]));
        let mut out = Vec::new();
        write_json(&[summary], &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["wins"], 1);
        assert_eq!(value[0]["ties"], 1);
        assert_eq!(value[0]["rule"], "HitSoft17");
    }
}
