use blackjack_lib::{Action, BlackjackGameError, Hand, HandTotal};
use log::trace;

/// What applying one strategy decision does to the player's hand and bet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerResponse {
    /// The player gave up half of the bet, which now holds the halved amount.
    Surrendered(f64),
    /// The player's turn is over. A two card 21 is a natural blackjack and its bet is already multiplied by 1.5.
    Stood { bet: f64, blackjack: bool },
    /// The player takes another card and decides again.
    Hit,
    /// The bet is doubled, the player takes exactly one more card and then stands.
    Doubled(f64),
}

/// Struct for a simulated player, holds the player's hand and current bet for a single round.
#[derive(Debug, Clone)]
pub struct PlayerSim {
    pub hand: Hand,
    pub bet: f64,
    strict_actions: bool,
}

impl PlayerSim {
    /// Associated function to create a new `PlayerSim` with an empty hand. With `strict_actions` set,
    /// a double or surrender prescribed for a hand past its first two cards is an error instead of a hit.
    pub fn new(bet: f64, strict_actions: bool) -> PlayerSim {
        PlayerSim {
            hand: Hand::new(),
            bet,
            strict_actions,
        }
    }

    /// Applies `action` to the current hand, whose valuation is `hand_total`. Does not draw any cards,
    /// the caller deals according to the returned response.
    pub fn respond(
        &self,
        action: Action,
        hand_total: HandTotal,
    ) -> Result<PlayerResponse, BlackjackGameError> {
        let initial = self.hand.is_initial();
        if action.requires_initial_hand() && !initial {
            if self.strict_actions {
                return Err(BlackjackGameError::IllegalAction {
                    action,
                    cards: self.hand.len(),
                });
            }
            trace!("{} on {} cards played as a hit", action, self.hand.len());
            return Ok(PlayerResponse::Hit);
        }

        let response = match action {
            Action::Surrender => PlayerResponse::Surrendered(self.bet / 2.0),
            Action::Stand if initial && hand_total.total == 21 => PlayerResponse::Stood {
                bet: self.bet * 1.5,
                blackjack: true,
            },
            Action::Stand => PlayerResponse::Stood {
                bet: self.bet,
                blackjack: false,
            },
            Action::Double => PlayerResponse::Doubled(self.bet * 2.0),
            Action::Hit => PlayerResponse::Hit,
        };
        Ok(response)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use blackjack_lib::Card::{self, *};

    fn player_with(cards: Vec<Card>, strict: bool) -> (PlayerSim, HandTotal) {
        let mut player = PlayerSim::new(10.0, strict);
        player.hand = Hand::from(cards);
        let total = HandTotal::of(player.hand.cards());
        (player, total)
    }

    #[test]
    fn test_two_card_responses() {
        let (player, total) = player_with(vec![Ten, Six], false);
        assert_eq!(
            player.respond(Action::Surrender, total),
            Ok(PlayerResponse::Surrendered(5.0))
        );
        assert_eq!(
            player.respond(Action::Double, total),
            Ok(PlayerResponse::Doubled(20.0))
        );
        assert_eq!(
            player.respond(Action::Stand, total),
            Ok(PlayerResponse::Stood {
                bet: 10.0,
                blackjack: false
            })
        );
        assert_eq!(player.respond(Action::Hit, total), Ok(PlayerResponse::Hit));
    }

    #[test]
    fn test_natural_blackjack_pays_three_to_two() {
        let (player, total) = player_with(vec![Ace, Ten], false);
        assert_eq!(
            player.respond(Action::Stand, total),
            Ok(PlayerResponse::Stood {
                bet: 15.0,
                blackjack: true
            })
        );

        // Three card 21 is not a blackjack
        let (player, total) = player_with(vec![Seven, Seven, Seven], false);
        assert_eq!(
            player.respond(Action::Stand, total),
            Ok(PlayerResponse::Stood {
                bet: 10.0,
                blackjack: false
            })
        );
    }

    #[test]
    fn test_multi_card_double_and_surrender() {
        let (player, total) = player_with(vec![Two, Three, Six], false);
        assert_eq!(player.respond(Action::Double, total), Ok(PlayerResponse::Hit));
        assert_eq!(
            player.respond(Action::Surrender, total),
            Ok(PlayerResponse::Hit)
        );

        let (player, total) = player_with(vec![Two, Three, Six], true);
        assert_eq!(
            player.respond(Action::Double, total),
            Err(BlackjackGameError::IllegalAction {
                action: Action::Double,
                cards: 3
            })
        );
        assert!(player.respond(Action::Surrender, total).is_err());
        assert_eq!(player.respond(Action::Hit, total), Ok(PlayerResponse::Hit));
    }
}
