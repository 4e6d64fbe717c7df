//! Strategy tables and the decision strategy that plays from them. Tables are read from tab delimited files,
//! one per hand shape and dealer rule, and are fully validated at load time so that a round can never reach a
//! decision point the data does not cover.

use crate::SimulationError;
use blackjack_lib::{Action, BlackjackGameError, Card, DealerRule, HandShape, HandTotal};
use lazy_static::lazy_static;
use log::debug;
use std::collections::{BTreeMap, HashSet};
use std::fmt::Display;
use std::fs::File;
use std::io::Read;
use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::Arc;

pub mod prelude {
    pub use super::{
        BasicStrategy, DecisionStrategy, StrategyTable, TableState, HARD_FILE, SOFT_FILE,
    };
}

/// Smallest player total a table row may hold.
pub const MIN_TOTAL: u8 = 2;
/// Largest player total a table row may hold.
pub const MAX_TOTAL: u8 = 21;
const NUM_TOTALS: usize = (MAX_TOTAL - MIN_TOTAL + 1) as usize;

/// File name of the hard totals table inside a strategy directory.
pub const HARD_FILE: &str = "optimal_strategy_hard.csv";
/// File name of the soft totals table inside a strategy directory.
pub const SOFT_FILE: &str = "optimal_strategy_soft.csv";

const S17_HARD: &str = include_str!("../../strategy/s17/optimal_strategy_hard.csv");
const S17_SOFT: &str = include_str!("../../strategy/s17/optimal_strategy_soft.csv");
const H17_HARD: &str = include_str!("../../strategy/h17/optimal_strategy_hard.csv");
const H17_SOFT: &str = include_str!("../../strategy/h17/optimal_strategy_soft.csv");

lazy_static! {
    static ref S17_STRATEGY: BasicStrategy =
        BasicStrategy::from_strs(DealerRule::StandSoft17, S17_HARD, S17_SOFT)
            .expect("built-in stand on soft 17 tables are complete");
    static ref H17_STRATEGY: BasicStrategy =
        BasicStrategy::from_strs(DealerRule::HitSoft17, H17_HARD, H17_SOFT)
            .expect("built-in hit soft 17 tables are complete");
}

/// The player totals a hand of the given shape can take at a decision point. A soft hand holds an ace worth 11
/// next to at least one more card, so it is never below 12, and the smallest hard hand is a pair of twos.
pub fn reachable_totals(shape: HandShape) -> RangeInclusive<u8> {
    match shape {
        HandShape::Hard => 4..=MAX_TOTAL,
        HandShape::Soft => 12..=MAX_TOTAL,
    }
}

/// Struct for encapsulating all the information a `DecisionStrategy` needs to make a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableState {
    pub hand_total: HandTotal,
    pub num_cards: usize,
    pub dealers_up_card: Card,
}

impl TableState {
    pub fn new(hand_total: HandTotal, num_cards: usize, dealers_up_card: Card) -> TableState {
        TableState {
            hand_total,
            num_cards,
            dealers_up_card,
        }
    }
}

/// Trait for a decision strategy, i.e. something that takes the state of the table, the player's hand and the dealer's
/// up card, and returns the action to play. A strategy is tied to the dealer rule it was built for.
pub trait DecisionStrategy {
    /// The dealer rule this strategy was computed against.
    fn rule(&self) -> DealerRule;
    fn decide_option(&self, state: &TableState) -> Result<Action, BlackjackGameError>;
}

impl<D: DecisionStrategy + ?Sized> DecisionStrategy for &D {
    fn rule(&self) -> DealerRule {
        (**self).rule()
    }

    fn decide_option(&self, state: &TableState) -> Result<Action, BlackjackGameError> {
        (**self).decide_option(state)
    }
}

impl<D: DecisionStrategy + ?Sized> DecisionStrategy for Arc<D> {
    fn rule(&self) -> DealerRule {
        (**self).rule()
    }

    fn decide_option(&self, state: &TableState) -> Result<Action, BlackjackGameError> {
        (**self).decide_option(state)
    }
}

/// A lookup table from (player total, dealer up card) to an action, for one hand shape under one dealer rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyTable {
    rule: DealerRule,
    shape: HandShape,
    cells: [[Option<Action>; 10]; NUM_TOTALS],
}

impl StrategyTable {
    /// A table with no entries.
    pub fn empty(rule: DealerRule, shape: HandShape) -> StrategyTable {
        StrategyTable {
            rule,
            shape,
            cells: [[None; 10]; NUM_TOTALS],
        }
    }

    pub fn rule(&self) -> DealerRule {
        self.rule
    }

    pub fn shape(&self) -> HandShape {
        self.shape
    }

    fn row_index(total: u8) -> Option<usize> {
        if (MIN_TOTAL..=MAX_TOTAL).contains(&total) {
            Some((total - MIN_TOTAL) as usize)
        } else {
            None
        }
    }

    /// Sets the action for `total` against `upcard`, overwriting any previous entry.
    pub fn set(&mut self, total: u8, upcard: Card, action: Action) -> Result<(), SimulationError> {
        let row = StrategyTable::row_index(total).ok_or_else(|| {
            SimulationError::Strategy(format!(
                "player total {} outside of {}..={}",
                total, MIN_TOTAL, MAX_TOTAL
            ))
        })?;
        self.cells[row][upcard.index()] = Some(action);
        Ok(())
    }

    pub fn get(&self, total: u8, upcard: Card) -> Option<Action> {
        StrategyTable::row_index(total).and_then(|row| self.cells[row][upcard.index()])
    }

    /// Returns the prescribed action, or a configuration error if the table has no entry for the pair.
    pub fn lookup(&self, total: u8, upcard: Card) -> Result<Action, BlackjackGameError> {
        self.get(total, upcard)
            .ok_or(BlackjackGameError::MissingStrategyEntry {
                rule: self.rule,
                shape: self.shape,
                total,
                upcard,
            })
    }

    /// Checks that every reachable total has an entry against every up card.
    pub fn validate(&self) -> Result<(), BlackjackGameError> {
        for total in reachable_totals(self.shape) {
            for upcard in Card::ALL {
                self.lookup(total, upcard)?;
            }
        }
        Ok(())
    }

    /// Reads a tab delimited table. The first row holds the dealer's up cards after a corner cell, every following
    /// row a player total followed by one action code per up card. The table is validated before it is returned.
    pub fn from_reader<R: Read>(
        reader: R,
        rule: DealerRule,
        shape: HandShape,
    ) -> Result<StrategyTable, SimulationError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let upcards = reader
            .headers()?
            .iter()
            .skip(1)
            .map(|symbol| symbol.parse::<Card>())
            .collect::<Result<Vec<Card>, BlackjackGameError>>()?;

        let mut seen = HashSet::new();
        for upcard in &upcards {
            if !seen.insert(*upcard) {
                return Err(SimulationError::Strategy(format!(
                    "dealer card {} appears in more than one column",
                    upcard
                )));
            }
        }

        let mut table = StrategyTable::empty(rule, shape);
        for record in reader.records() {
            let record = record?;
            let mut fields = record.iter();
            let total_field = fields.next().unwrap_or_default();
            let total = total_field.parse::<u8>().map_err(|_| {
                SimulationError::Strategy(format!("invalid player total `{}`", total_field))
            })?;

            for (upcard, code) in upcards.iter().zip(fields) {
                table.set(total, *upcard, code.parse::<Action>()?)?;
            }
        }

        table.validate()?;
        Ok(table)
    }

    pub fn from_path<P: AsRef<Path>>(
        path: P,
        rule: DealerRule,
        shape: HandShape,
    ) -> Result<StrategyTable, SimulationError> {
        debug!("loading {} strategy table from {}", shape, path.as_ref().display());
        let file = File::open(path)?;
        StrategyTable::from_reader(file, rule, shape)
    }

    /// The table in the nested map form of the strategy files: player total, then dealer card symbol, then action code.
    pub fn to_nested_map(&self) -> BTreeMap<u8, BTreeMap<&'static str, char>> {
        let mut rows = BTreeMap::new();
        for total in MIN_TOTAL..=MAX_TOTAL {
            let row: BTreeMap<&'static str, char> = Card::ALL
                .iter()
                .filter_map(|card| self.get(total, *card).map(|a| (card.symbol(), a.code())))
                .collect();
            if !row.is_empty() {
                rows.insert(total, row);
            }
        }
        rows
    }
}

impl Display for StrategyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:>4}", self.shape)?;
        // Up cards in the usual order, ace last
        let columns = Card::ALL.iter().skip(1).chain(Card::ALL.iter().take(1));
        for card in columns.clone() {
            write!(f, "{:>4}", card.symbol())?;
        }
        writeln!(f)?;
        for total in MIN_TOTAL..=MAX_TOTAL {
            if Card::ALL.iter().all(|c| self.get(total, *c).is_none()) {
                continue;
            }
            write!(f, "{:>4}", total)?;
            for card in columns.clone() {
                let code = self.get(total, *card).map(|a| a.code()).unwrap_or('-');
                write!(f, "{:>4}", code)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// A struct that implements `DecisionStrategy` by playing strictly from a pair of hard and soft tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicStrategy {
    rule: DealerRule,
    hard: StrategyTable,
    soft: StrategyTable,
}

impl BasicStrategy {
    /// Pairs a hard and a soft table, both must have been built for the same dealer rule and cover every
    /// reachable total.
    pub fn from_tables(
        hard: StrategyTable,
        soft: StrategyTable,
    ) -> Result<BasicStrategy, SimulationError> {
        if hard.shape() != HandShape::Hard || soft.shape() != HandShape::Soft {
            return Err(SimulationError::Strategy(
                "expected one hard and one soft table".to_string(),
            ));
        }
        if hard.rule() != soft.rule() {
            return Err(SimulationError::Strategy(format!(
                "hard table is for `{}` but soft table is for `{}`",
                hard.rule(),
                soft.rule()
            )));
        }
        hard.validate()?;
        soft.validate()?;
        Ok(BasicStrategy {
            rule: hard.rule(),
            hard,
            soft,
        })
    }

    fn from_strs(rule: DealerRule, hard: &str, soft: &str) -> Result<BasicStrategy, SimulationError> {
        BasicStrategy::from_tables(
            StrategyTable::from_reader(hard.as_bytes(), rule, HandShape::Hard)?,
            StrategyTable::from_reader(soft.as_bytes(), rule, HandShape::Soft)?,
        )
    }

    /// Loads `HARD_FILE` and `SOFT_FILE` from `dir`.
    pub fn from_dir<P: AsRef<Path>>(dir: P, rule: DealerRule) -> Result<BasicStrategy, SimulationError> {
        let dir = dir.as_ref();
        BasicStrategy::from_tables(
            StrategyTable::from_path(dir.join(HARD_FILE), rule, HandShape::Hard)?,
            StrategyTable::from_path(dir.join(SOFT_FILE), rule, HandShape::Soft)?,
        )
    }

    /// The infinite deck strategy shipped with the crate for `rule`. Parsed once and shared by every round.
    pub fn builtin(rule: DealerRule) -> &'static BasicStrategy {
        match rule {
            DealerRule::StandSoft17 => &S17_STRATEGY,
            DealerRule::HitSoft17 => &H17_STRATEGY,
        }
    }

    pub fn table(&self, shape: HandShape) -> &StrategyTable {
        match shape {
            HandShape::Hard => &self.hard,
            HandShape::Soft => &self.soft,
        }
    }

    pub fn lookup(
        &self,
        shape: HandShape,
        total: u8,
        upcard: Card,
    ) -> Result<Action, BlackjackGameError> {
        self.table(shape).lookup(total, upcard)
    }
}

impl DecisionStrategy for BasicStrategy {
    fn rule(&self) -> DealerRule {
        self.rule
    }

    fn decide_option(&self, state: &TableState) -> Result<Action, BlackjackGameError> {
        self.lookup(
            state.hand_total.shape(),
            state.hand_total.total,
            state.dealers_up_card,
        )
    }
}

impl Display for BasicStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "basic strategy, {}", self.rule)?;
        write!(f, "{}\n{}", self.hard, self.soft)
    }
}

/// Looks up the action for a decision point in the built-in tables of `rule`.
pub fn lookup(
    rule: DealerRule,
    shape: HandShape,
    total: u8,
    upcard: Card,
) -> Result<Action, BlackjackGameError> {
    BasicStrategy::builtin(rule).lookup(shape, total, upcard)
}

#[cfg(test)]
mod test {
    use super::*;

    const HEADER: &str = "\t2\t3\t4\t5\t6\t7\t8\t9\t10\tAce\n";

    fn soft_table_text(override_row: Option<&str>) -> String {
        let mut text = HEADER.to_string();
        for total in 12..=21 {
            match override_row {
                Some(row) if total == 21 => text.push_str(row),
                _ => text.push_str(&format!("{}\tS\tS\tS\tS\tS\tS\tS\tS\tS\tS\n", total)),
            }
        }
        text
    }

    #[test]
    fn test_builtin_tables_load() {
        for rule in [DealerRule::StandSoft17, DealerRule::HitSoft17] {
            let strategy = BasicStrategy::builtin(rule);
            assert_eq!(strategy.rule(), rule);
            assert!(strategy.table(HandShape::Hard).validate().is_ok());
            assert!(strategy.table(HandShape::Soft).validate().is_ok());
        }
    }

    #[test]
    fn test_builtin_lookups() {
        use Card::*;
        let s17 = DealerRule::StandSoft17;
        let h17 = DealerRule::HitSoft17;
        assert_eq!(lookup(s17, HandShape::Hard, 19, Ace), Ok(Action::Stand));
        assert_eq!(lookup(s17, HandShape::Hard, 11, Six), Ok(Action::Double));
        assert_eq!(lookup(s17, HandShape::Hard, 16, Ten), Ok(Action::Surrender));
        assert_eq!(lookup(s17, HandShape::Hard, 12, Two), Ok(Action::Hit));
        assert_eq!(lookup(s17, HandShape::Soft, 18, Two), Ok(Action::Stand));
        assert_eq!(lookup(h17, HandShape::Soft, 18, Two), Ok(Action::Double));
        assert_eq!(lookup(s17, HandShape::Hard, 11, Ace), Ok(Action::Hit));
        assert_eq!(lookup(h17, HandShape::Hard, 11, Ace), Ok(Action::Double));
    }

    #[test]
    fn test_missing_entry_is_configuration_error() {
        let table = StrategyTable::empty(DealerRule::StandSoft17, HandShape::Soft);
        let err = table.lookup(18, Card::Nine).unwrap_err();
        assert!(err.is_configuration_error());
        assert_eq!(
            err,
            BlackjackGameError::MissingStrategyEntry {
                rule: DealerRule::StandSoft17,
                shape: HandShape::Soft,
                total: 18,
                upcard: Card::Nine,
            }
        );
        // Soft totals below 12 cannot be reached, a table without them is complete
        let text = soft_table_text(None);
        let table =
            StrategyTable::from_reader(text.as_bytes(), DealerRule::StandSoft17, HandShape::Soft)
                .unwrap();
        assert_eq!(table.get(11, Card::Two), None);
    }

    #[test]
    fn test_reader_rejects_bad_codes() {
        let text = soft_table_text(Some("21\tS\tS\tS\tS\tS\tS\tS\tS\tS\tP\n"));
        let result =
            StrategyTable::from_reader(text.as_bytes(), DealerRule::StandSoft17, HandShape::Soft);
        assert!(matches!(
            result,
            Err(SimulationError::Game(BlackjackGameError::InvalidAction(ref code))) if code == "P"
        ));
    }

    #[test]
    fn test_reader_rejects_coverage_gaps() {
        let mut text = HEADER.to_string();
        for total in 13..=21 {
            text.push_str(&format!("{}\tS\tS\tS\tS\tS\tS\tS\tS\tS\tS\n", total));
        }
        let result =
            StrategyTable::from_reader(text.as_bytes(), DealerRule::HitSoft17, HandShape::Soft);
        assert!(matches!(
            result,
            Err(SimulationError::Game(BlackjackGameError::MissingStrategyEntry { total: 12, .. }))
        ));
    }

    #[test]
    fn test_reader_rejects_out_of_range_totals() {
        let mut text = soft_table_text(None);
        text.push_str("22\tS\tS\tS\tS\tS\tS\tS\tS\tS\tS\n");
        let result =
            StrategyTable::from_reader(text.as_bytes(), DealerRule::StandSoft17, HandShape::Soft);
        assert!(matches!(result, Err(SimulationError::Strategy(_))));
    }

    #[test]
    fn test_tables_for_different_rules_do_not_pair() {
        let hard = BasicStrategy::builtin(DealerRule::StandSoft17)
            .table(HandShape::Hard)
            .clone();
        let soft = BasicStrategy::builtin(DealerRule::HitSoft17)
            .table(HandShape::Soft)
            .clone();
        assert!(BasicStrategy::from_tables(hard, soft).is_err());
    }

    #[test]
    fn test_tables_with_gaps_do_not_pair() {
        let rule = DealerRule::StandSoft17;
        let mut hard = StrategyTable::empty(rule, HandShape::Hard);
        hard.set(19, Card::Ace, Action::Stand).unwrap();
        let soft = BasicStrategy::builtin(rule).table(HandShape::Soft).clone();
        assert!(matches!(
            BasicStrategy::from_tables(hard, soft),
            Err(SimulationError::Game(BlackjackGameError::MissingStrategyEntry {
                shape: HandShape::Hard,
                total: 4,
                ..
            }))
        ));

        let hard = BasicStrategy::builtin(rule).table(HandShape::Hard).clone();
        let soft = StrategyTable::empty(rule, HandShape::Soft);
        assert!(matches!(
            BasicStrategy::from_tables(hard, soft),
            Err(SimulationError::Game(BlackjackGameError::MissingStrategyEntry {
                shape: HandShape::Soft,
                total: 12,
                ..
            }))
        ));
    }

    #[test]
    fn test_nested_map_matches_lookup() {
        let table = BasicStrategy::builtin(DealerRule::StandSoft17).table(HandShape::Hard);
        let map = table.to_nested_map();
        assert_eq!(map[&16]["10"], 'R');
        assert_eq!(map[&19]["Ace"], 'S');
        assert_eq!(map.len(), 20);
    }
}
