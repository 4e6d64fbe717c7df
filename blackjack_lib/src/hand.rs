use crate::card::Card;
use crate::deck::CardSource;
use crate::rules::HandShape;
use log::trace;
use std::collections::HashMap;
use std::fmt::Display;

/// Sum of the non ace cards in `cards`.
fn non_ace_sum(cards: &[Card]) -> u32 {
    cards
        .iter()
        .filter(|c| !c.is_ace())
        .map(|c| c.val() as u32)
        .sum()
}

/// Computes the best total of `cards`. Non aces are summed first, then every ace adds 11 if the running
/// total is at most 10 and 1 otherwise. The result may exceed 21, which the caller reads as a bust.
pub fn hand_value(cards: &[Card]) -> u8 {
    let mut value = non_ace_sum(cards);
    for _ in cards.iter().filter(|c| c.is_ace()) {
        if value <= 10 {
            value += 11;
        } else {
            value += 1;
        }
    }
    value as u8
}

/// A hand is soft when it holds an ace and its non ace cards sum to at most 10.
pub fn is_soft(cards: &[Card]) -> bool {
    cards.iter().any(|c| c.is_ace()) && non_ace_sum(cards) <= 10
}

/// The valuation of a hand at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandTotal {
    pub total: u8,
    pub soft: bool,
}

impl HandTotal {
    pub fn of(cards: &[Card]) -> Self {
        HandTotal {
            total: hand_value(cards),
            soft: is_soft(cards),
        }
    }

    pub fn is_bust(&self) -> bool {
        self.total > 21
    }

    pub fn shape(&self) -> HandShape {
        if self.soft {
            HandShape::Soft
        } else {
            HandShape::Hard
        }
    }
}

impl Display for HandTotal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.shape(), self.total)
    }
}

/// An ordered sequence of cards owned by a single round. A hand only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Hand { cards: Vec::new() }
    }

    /// Method to receive a card, appends it to the end of the hand.
    pub fn receive_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Draws one card from `source` into the hand and returns it.
    pub fn draw_from<S: CardSource + ?Sized>(&mut self, source: &mut S) -> Card {
        let card = source.draw();
        self.receive_card(card);
        card
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// The first card dealt to the hand, for the dealer this is the up card.
    pub fn first(&self) -> Option<Card> {
        self.cards.first().copied()
    }

    /// True while the hand holds exactly the two cards it was dealt.
    pub fn is_initial(&self) -> bool {
        self.cards.len() == 2
    }
}

impl From<Vec<Card>> for Hand {
    fn from(cards: Vec<Card>) -> Self {
        Hand { cards }
    }
}

impl Display for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cards = self
            .cards
            .iter()
            .map(|c| c.symbol())
            .collect::<Vec<&str>>()
            .join(", ");
        write!(f, "[{}]", cards)
    }
}

/// Number of cards of each rank, indexed by `Card::index`.
type RankCounts = [u8; 10];

/// Values hands and memoizes the results. The valuation does not depend on the order of the cards, so the cache
/// is keyed on the count of each rank in the hand, which also lets permutations of the same hand share an entry.
/// The key is a snapshot of the hand's content, so growing a hand can never produce a stale hit.
#[derive(Debug, Default)]
pub struct HandValuator {
    cache: HashMap<RankCounts, HandTotal>,
    hits: u64,
    misses: u64,
}

impl HandValuator {
    pub fn new() -> Self {
        HandValuator::default()
    }

    /// Total and shape of `hand`.
    pub fn evaluate(&mut self, hand: &Hand) -> HandTotal {
        let mut counts: RankCounts = [0; 10];
        for card in hand.cards() {
            counts[card.index()] = counts[card.index()].saturating_add(1);
        }

        if let Some(total) = self.cache.get(&counts) {
            self.hits += 1;
            return *total;
        }

        self.misses += 1;
        let total = HandTotal::of(hand.cards());
        trace!("valued {} as {}, {} hands cached", hand, total, self.cache.len() + 1);
        self.cache.insert(counts, total);
        total
    }

    pub fn value(&mut self, hand: &Hand) -> u8 {
        self.evaluate(hand).total
    }

    pub fn is_soft(&mut self, hand: &Hand) -> bool {
        self.evaluate(hand).soft
    }

    /// Number of distinct hands cached so far.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Returns the (hits, misses) of the cache.
    pub fn cache_stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use Card::*;

    #[test]
    fn test_hand_values() {
        assert_eq!(hand_value(&[Ten, Ten]), 20);
        assert_eq!(hand_value(&[Ace, Ten]), 21);
        assert_eq!(hand_value(&[Ace, Ace, Nine]), 21);
        assert_eq!(hand_value(&[Ace, Ace]), 12);
        assert_eq!(hand_value(&[Ace, Six, Ten]), 17);
        assert_eq!(hand_value(&[Ten, Six, Eight]), 24);
    }

    #[test]
    fn test_value_ignores_card_order() {
        assert_eq!(hand_value(&[Nine, Ace, Ace]), hand_value(&[Ace, Nine, Ace]));
        assert_eq!(hand_value(&[Five, Ace, Four]), 20);
        assert_eq!(hand_value(&[Ace, Five, Four]), 20);
    }

    #[test]
    fn test_soft_hands() {
        assert!(is_soft(&[Ace, Six]));
        assert!(!is_soft(&[Ace, Six, Ten]));
        assert!(is_soft(&[Ace, Ace, Nine]));
        assert!(!is_soft(&[Ace, Ace, Ten, Five]));
    }

    #[test]
    fn test_hands_without_aces_are_hard() {
        for first in Card::ALL.iter().filter(|c| !c.is_ace()) {
            for second in Card::ALL.iter().filter(|c| !c.is_ace()) {
                assert!(!is_soft(&[*first, *second]));
                assert!(!is_soft(&[*first, *second, Two]));
            }
        }
    }

    #[test]
    fn test_valuator_recomputes_after_every_draw() {
        let mut valuator = HandValuator::new();
        let mut hand = Hand::from(vec![Ace, Six]);
        assert_eq!(valuator.evaluate(&hand), HandTotal { total: 17, soft: true });

        hand.receive_card(Ten);
        assert_eq!(valuator.evaluate(&hand), HandTotal { total: 17, soft: false });

        hand.receive_card(Five);
        assert!(valuator.evaluate(&hand).is_bust());
        assert_eq!(valuator.cached(), 3);
    }

    #[test]
    fn test_valuator_shares_permutations() {
        let mut valuator = HandValuator::new();
        let a = valuator.evaluate(&Hand::from(vec![Ace, Nine, Ace]));
        let b = valuator.evaluate(&Hand::from(vec![Ace, Ace, Nine]));
        assert_eq!(a, b);
        assert_eq!(valuator.cache_stats(), (1, 1));
    }
}
