use crate::card::Card;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The thirteen ranks of a suit. Ten valued cards appear four times so that uniform sampling from
/// this list reproduces the rank distribution of a real deck.
pub const CARD_DECK: [Card; 13] = [
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
    Card::Ten,
    Card::Ten,
    Card::Ten,
];

/// Anything that can deal cards to a round of blackjack.
pub trait CardSource {
    fn draw(&mut self) -> Card;
}

impl<C: CardSource + ?Sized> CardSource for &mut C {
    fn draw(&mut self) -> Card {
        (**self).draw()
    }
}

impl<C: CardSource + ?Sized> CardSource for Box<C> {
    fn draw(&mut self) -> Card {
        (**self).draw()
    }
}

/// A continuously reshuffled deck, every draw samples with replacement from `CARD_DECK`.
/// There is no shoe to deplete, so counting cards gives the player nothing.
#[derive(Debug, Clone)]
pub struct InfiniteDeck<R: Rng = StdRng> {
    rng: R,
    cards_drawn: u64,
}

impl<R: Rng> InfiniteDeck<R> {
    /// Associated function to create a new deck that draws from `rng`.
    pub fn new(rng: R) -> Self {
        InfiniteDeck {
            rng,
            cards_drawn: 0,
        }
    }

    /// The number of cards dealt by this deck so far.
    pub fn cards_drawn(&self) -> u64 {
        self.cards_drawn
    }
}

impl InfiniteDeck<StdRng> {
    /// A deck whose sequence of cards is fully determined by `seed`.
    pub fn from_seed(seed: u64) -> Self {
        InfiniteDeck::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        InfiniteDeck::new(StdRng::from_entropy())
    }
}

impl<R: Rng> CardSource for InfiniteDeck<R> {
    fn draw(&mut self) -> Card {
        self.cards_drawn += 1;
        CARD_DECK[self.rng.gen_range(0..CARD_DECK.len())]
    }
}

/// A card source that replays a fixed sequence of cards, starting over once the sequence runs out.
/// Used to reproduce exact rounds.
#[derive(Debug, Clone)]
pub struct ScriptedDeck {
    cards: Vec<Card>,
    position: usize,
}

impl ScriptedDeck {
    /// Creates a new scripted deck, panics if `cards` is empty since such a deck could never deal.
    pub fn new<I: IntoIterator<Item = Card>>(cards: I) -> Self {
        let cards: Vec<Card> = cards.into_iter().collect();
        assert!(!cards.is_empty(), "a scripted deck needs at least one card");
        ScriptedDeck { cards, position: 0 }
    }

    /// The number of cards drawn so far, counting from the start of the script.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl CardSource for ScriptedDeck {
    fn draw(&mut self) -> Card {
        let card = self.cards[self.position % self.cards.len()];
        self.position += 1;
        card
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_seeded_decks_agree() {
        let mut a = InfiniteDeck::from_seed(42);
        let mut b = InfiniteDeck::from_seed(42);
        let first: Vec<Card> = (0..50).map(|_| a.draw()).collect();
        let second: Vec<Card> = (0..50).map(|_| b.draw()).collect();
        assert_eq!(first, second);
        assert_eq!(a.cards_drawn(), 50);
    }

    #[test]
    fn test_ten_valued_cards_weighted_four_times() {
        let mut deck = InfiniteDeck::from_seed(7);
        let mut counts: HashMap<Card, u32> = HashMap::new();
        const DRAWS: u32 = 130_000;
        for _ in 0..DRAWS {
            *counts.entry(deck.draw()).or_insert(0) += 1;
        }

        // Expected 40_000 tens and 10_000 of every other rank
        let tens = counts[&Card::Ten] as f64;
        assert!((tens - 40_000.0).abs() < 1_500.0, "tens drawn: {tens}");
        for card in Card::ALL.iter().filter(|c| **c != Card::Ten) {
            let n = counts[card] as f64;
            assert!((n - 10_000.0).abs() < 800.0, "{card} drawn {n} times");
        }
    }

    #[test]
    fn test_scripted_deck_wraps_around() {
        let mut deck = ScriptedDeck::new(vec![Card::Ten, Card::Nine]);
        assert_eq!(deck.draw(), Card::Ten);
        assert_eq!(deck.draw(), Card::Nine);
        assert_eq!(deck.draw(), Card::Ten);
        assert_eq!(deck.position(), 3);
    }
}
