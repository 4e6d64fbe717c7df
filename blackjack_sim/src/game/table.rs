use crate::game::player::{PlayerResponse, PlayerSim};
use crate::game::strategy::{DecisionStrategy, TableState};
use blackjack_lib::{
    BlackjackGameError, Card, CardSource, DealerRule, Hand, HandTotal, HandValuator,
};
use log::trace;
use std::fmt::Display;

/// How the player's turn came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerFinish {
    Stood,
    Bust,
    Surrendered,
}

/// Everything that happened during one round. Only `outcome` feeds the statistics, the rest is kept for tracing.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundResult {
    /// Signed winnings relative to the original bet.
    pub outcome: f64,
    pub finish: PlayerFinish,
    pub player_hand: Hand,
    pub player_total: u8,
    pub dealer_hand: Hand,
    /// `None` when the dealer never played because the player busted or surrendered.
    pub dealer_total: Option<u8>,
    pub blackjack: bool,
    pub doubled: bool,
}

impl RoundResult {
    pub fn dealer_bust(&self) -> bool {
        matches!(self.dealer_total, Some(total) if total > 21)
    }
}

impl Display for RoundResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player {} ({})", self.player_hand, self.player_total)?;
        if self.blackjack {
            write!(f, " blackjack")?;
        }
        if self.doubled {
            write!(f, " doubled")?;
        }
        match self.finish {
            PlayerFinish::Bust => write!(f, " bust")?,
            PlayerFinish::Surrendered => write!(f, " surrendered")?,
            PlayerFinish::Stood => {}
        }
        write!(f, ", dealer {}", self.dealer_hand)?;
        if let Some(total) = self.dealer_total {
            write!(f, " ({})", total)?;
        }
        write!(f, ", outcome {:+}", self.outcome)
    }
}

/// Struct that plays single rounds of blackjack: one player hand against the dealer's up card, played from a
/// `DecisionStrategy`, followed by the dealer's draw under the strategy's house rule.
#[derive(Debug)]
pub struct BlackjackTableSim<D: DecisionStrategy> {
    strategy: D,
    valuator: HandValuator,
    strict_actions: bool,
}

impl<D: DecisionStrategy> BlackjackTableSim<D> {
    /// Associated function to create a new table. The dealer plays under the rule `strategy` was built for.
    pub fn new(strategy: D) -> Self {
        BlackjackTableSim {
            strategy,
            valuator: HandValuator::new(),
            strict_actions: false,
        }
    }

    /// Makes a double or surrender prescribed for a hand of more than two cards an error instead of a hit.
    pub fn strict_actions(mut self, strict: bool) -> Self {
        self.strict_actions = strict;
        self
    }

    pub fn rule(&self) -> DealerRule {
        self.strategy.rule()
    }

    pub fn strategy(&self) -> &D {
        &self.strategy
    }

    /// Plays one round to completion with the given bet, drawing every card from `source`.
    /// The player receives two cards and the dealer one, the dealer's second card is never dealt.
    pub fn play_round<S: CardSource + ?Sized>(
        &mut self,
        source: &mut S,
        bet: f64,
    ) -> Result<RoundResult, BlackjackGameError> {
        let mut player = PlayerSim::new(bet, self.strict_actions);
        let mut dealers_hand = Hand::new();
        player.hand.draw_from(source);
        player.hand.draw_from(source);
        let dealers_up_card = dealers_hand.draw_from(source);

        let (finish, blackjack, doubled) =
            self.play_player_hand(&mut player, dealers_up_card, source)?;
        let player_total = self.valuator.value(&player.hand);

        let (outcome, dealer_total) = match finish {
            PlayerFinish::Bust | PlayerFinish::Surrendered => (-player.bet, None),
            PlayerFinish::Stood => {
                let dealer_total = self.play_dealer_hand(&mut dealers_hand, source).total;
                let outcome = if dealer_total > 21 || player_total > dealer_total {
                    player.bet
                } else if player_total < dealer_total {
                    -player.bet
                } else {
                    0.0
                };
                (outcome, Some(dealer_total))
            }
        };

        let result = RoundResult {
            outcome,
            finish,
            player_hand: player.hand,
            player_total,
            dealer_hand: dealers_hand,
            dealer_total,
            blackjack,
            doubled,
        };
        trace!("{}", result);
        Ok(result)
    }

    /// Runs the player's decision loop. Returns how the turn ended, and whether the hand was a blackjack or doubled.
    /// `player.bet` holds the adjusted bet afterwards.
    fn play_player_hand<S: CardSource + ?Sized>(
        &mut self,
        player: &mut PlayerSim,
        dealers_up_card: Card,
        source: &mut S,
    ) -> Result<(PlayerFinish, bool, bool), BlackjackGameError> {
        loop {
            let hand_total = self.valuator.evaluate(&player.hand);
            if hand_total.is_bust() {
                return Ok((PlayerFinish::Bust, false, false));
            }

            let state = TableState::new(hand_total, player.hand.len(), dealers_up_card);
            let action = self.strategy.decide_option(&state)?;
            match player.respond(action, hand_total)? {
                PlayerResponse::Surrendered(bet) => {
                    player.bet = bet;
                    return Ok((PlayerFinish::Surrendered, false, false));
                }
                PlayerResponse::Stood { bet, blackjack } => {
                    player.bet = bet;
                    return Ok((PlayerFinish::Stood, blackjack, false));
                }
                PlayerResponse::Doubled(bet) => {
                    player.bet = bet;
                    player.hand.draw_from(source);
                    let finish = if self.valuator.evaluate(&player.hand).is_bust() {
                        PlayerFinish::Bust
                    } else {
                        PlayerFinish::Stood
                    };
                    return Ok((finish, false, true));
                }
                PlayerResponse::Hit => {
                    player.hand.draw_from(source);
                }
            }
        }
    }

    /// Draws cards to `dealers_hand` until the house rule says stop, and returns the final valuation.
    pub fn play_dealer_hand<S: CardSource + ?Sized>(
        &mut self,
        dealers_hand: &mut Hand,
        source: &mut S,
    ) -> HandTotal {
        let rule = self.strategy.rule();
        let mut hand_total = self.valuator.evaluate(dealers_hand);
        while rule.dealer_draws(hand_total) {
            dealers_hand.draw_from(source);
            hand_total = self.valuator.evaluate(dealers_hand);
        }
        hand_total
    }

    /// The valuator shared by every round played at this table.
    pub fn valuator(&self) -> &HandValuator {
        &self.valuator
    }
}
