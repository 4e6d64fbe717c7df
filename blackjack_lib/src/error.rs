use crate::card::Card;
use crate::rules::{Action, DealerRule, HandShape};
use thiserror::Error;

/// Errors that abort a round of blackjack. None of them are recoverable mid round, continuing with a
/// substituted action would corrupt the statistics being gathered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlackjackGameError {
    /// The strategy data has no entry for a reachable decision point.
    #[error("no {shape} strategy entry for total {total} against dealer {upcard} ({rule})")]
    MissingStrategyEntry {
        rule: DealerRule,
        shape: HandShape,
        total: u8,
        upcard: Card,
    },

    /// An action code outside of H, S, D and R.
    #[error("invalid action code `{0}`, expected one of H, S, D, R")]
    InvalidAction(String),

    /// Double or surrender chosen for a hand that is no longer the initial two card hand.
    #[error("{action} is only legal on the initial two card hand, hand has {cards} cards")]
    IllegalAction { action: Action, cards: usize },

    #[error("unknown card symbol `{0}`")]
    InvalidCard(String),
}

impl BlackjackGameError {
    /// Returns true if the error points at incomplete or malformed strategy data rather than at the engine.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            BlackjackGameError::MissingStrategyEntry { .. }
                | BlackjackGameError::InvalidAction(_)
                | BlackjackGameError::InvalidCard(_)
        )
    }
}
