//! Core primitives for simulating blackjack against an infinite deck: cards, card sources,
//! hands and their valuation, the player's actions and the dealer's house rules.

pub mod card;
pub mod deck;
pub mod error;
pub mod hand;
pub mod rules;

pub use card::Card;
pub use deck::{CardSource, InfiniteDeck, ScriptedDeck, CARD_DECK};
pub use error::BlackjackGameError;
pub use hand::{hand_value, is_soft, Hand, HandTotal, HandValuator};
pub use rules::{Action, DealerRule, HandShape};
