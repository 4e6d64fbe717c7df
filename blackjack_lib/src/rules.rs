use crate::hand::HandTotal;
use crate::BlackjackGameError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// A playing decision prescribed by a strategy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Hit,
    Stand,
    Double,
    Surrender,
}

impl Action {
    /// The single character code used for the action in strategy files.
    pub fn code(&self) -> char {
        match self {
            Action::Hit => 'H',
            Action::Stand => 'S',
            Action::Double => 'D',
            Action::Surrender => 'R',
        }
    }

    /// Returns true for the actions only allowed on the initial two card hand.
    pub fn requires_initial_hand(&self) -> bool {
        matches!(self, Action::Double | Action::Surrender)
    }
}

impl TryFrom<char> for Action {
    type Error = BlackjackGameError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            'H' => Ok(Action::Hit),
            'S' => Ok(Action::Stand),
            'D' => Ok(Action::Double),
            'R' => Ok(Action::Surrender),
            other => Err(BlackjackGameError::InvalidAction(other.to_string())),
        }
    }
}

impl FromStr for Action {
    type Err = BlackjackGameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Action::try_from(c),
            _ => Err(BlackjackGameError::InvalidAction(trimmed.to_string())),
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Action::Hit => "hit",
            Action::Stand => "stand",
            Action::Double => "double down",
            Action::Surrender => "surrender",
        };
        write!(f, "{}", name)
    }
}

/// Whether a hand is played from the soft or the hard strategy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandShape {
    Hard,
    Soft,
}

impl Display for HandShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandShape::Hard => write!(f, "hard"),
            HandShape::Soft => write!(f, "soft"),
        }
    }
}

/// The house rule governing the dealer's play. The same rule selects the strategy tables the player consults,
/// since optimal play depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DealerRule {
    /// Dealer stands on every 17, soft or hard.
    #[default]
    StandSoft17,
    /// Dealer draws to a soft 17.
    HitSoft17,
}

impl DealerRule {
    /// Maps the usual `soft_seventeen` flag, true meaning the dealer hits soft 17, onto a rule.
    pub fn from_soft_seventeen(hits_soft_17: bool) -> Self {
        if hits_soft_17 {
            DealerRule::HitSoft17
        } else {
            DealerRule::StandSoft17
        }
    }

    pub fn hits_soft_17(&self) -> bool {
        *self == DealerRule::HitSoft17
    }

    /// Returns true if a dealer holding `hand` must take another card under this rule.
    pub fn dealer_draws(&self, hand: HandTotal) -> bool {
        match self {
            DealerRule::StandSoft17 => hand.total <= 16,
            DealerRule::HitSoft17 => hand.total <= 16 || (hand.soft && hand.total == 17),
        }
    }
}

impl Display for DealerRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DealerRule::StandSoft17 => write!(f, "dealer stands on soft 17"),
            DealerRule::HitSoft17 => write!(f, "dealer hits soft 17"),
        }
    }
}
