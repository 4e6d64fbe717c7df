use crate::BlackjackGameError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// A card rank. Suits play no part in blackjack so they are not modeled, and `Ten` stands in
/// for every ten valued card i.e. 10, J, Q and K.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Card {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
}

impl Card {
    /// Every rank in table column order, ace first.
    pub const ALL: [Card; 10] = [
        Card::Ace,
        Card::Two,
        Card::Three,
        Card::Four,
        Card::Five,
        Card::Six,
        Card::Seven,
        Card::Eight,
        Card::Nine,
        Card::Ten,
    ];

    /// The face value of the card, an ace counts as 1 here, see `hand_value` for how it becomes 11.
    pub fn val(&self) -> u8 {
        match self {
            Card::Ace => 1,
            Card::Two => 2,
            Card::Three => 3,
            Card::Four => 4,
            Card::Five => 5,
            Card::Six => 6,
            Card::Seven => 7,
            Card::Eight => 8,
            Card::Nine => 9,
            Card::Ten => 10,
        }
    }

    pub fn is_ace(&self) -> bool {
        *self == Card::Ace
    }

    /// Position of the card in `Card::ALL`.
    pub fn index(&self) -> usize {
        (self.val() - 1) as usize
    }

    /// The symbol used for the card in strategy files.
    pub fn symbol(&self) -> &'static str {
        match self {
            Card::Ace => "Ace",
            Card::Two => "2",
            Card::Three => "3",
            Card::Four => "4",
            Card::Five => "5",
            Card::Six => "6",
            Card::Seven => "7",
            Card::Eight => "8",
            Card::Nine => "9",
            Card::Ten => "10",
        }
    }
}

impl Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Card {
    type Err = BlackjackGameError;

    /// Parses a card symbol. Accepts `Ace`/`A`, the numbers 2 through 10 and the face card letters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let card = match s.trim() {
            "Ace" | "ace" | "ACE" | "A" | "a" => Card::Ace,
            "2" => Card::Two,
            "3" => Card::Three,
            "4" => Card::Four,
            "5" => Card::Five,
            "6" => Card::Six,
            "7" => Card::Seven,
            "8" => Card::Eight,
            "9" => Card::Nine,
            "10" | "T" | "J" | "Q" | "K" => Card::Ten,
            other => return Err(BlackjackGameError::InvalidCard(other.to_string())),
        };
        Ok(card)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_symbols() {
        assert_eq!("Ace".parse::<Card>(), Ok(Card::Ace));
        assert_eq!(" 7 ".parse::<Card>(), Ok(Card::Seven));
        assert_eq!("K".parse::<Card>(), Ok(Card::Ten));
        assert_eq!(
            "1".parse::<Card>(),
            Err(BlackjackGameError::InvalidCard("1".to_string()))
        );
    }

    #[test]
    fn test_symbol_round_trips_through_parse() {
        for card in Card::ALL {
            assert_eq!(card.symbol().parse::<Card>(), Ok(card));
            assert_eq!(Card::ALL[card.index()], card);
        }
    }
}
