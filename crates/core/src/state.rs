// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Round state machine.
//!
//! A round is a chain of immutable [RoundState] nodes, each created from the
//! previous one by [RoundState::proceed], and ends with a [TerminalState] that
//! holds the chips won or lost by each player. Every node owns the node it was
//! created from so the whole round history can be walked back to the blinds.
use std::{cmp::Ordering, sync::Arc};

use crate::{
    action::{Action, ActionKind, LegalActions},
    poker::{Card, Chips, Deck, HandValue, Rules},
};

/// The preflop street.
pub const PREFLOP: u8 = 0;
/// The flop street.
pub const FLOP: u8 = 3;
/// The turn street.
pub const TURN: u8 = 4;
/// The river street.
pub const RIVER: u8 = 5;

/// A node in the round game tree.
#[derive(Debug, Clone)]
pub enum State {
    /// A player has to act.
    Round(RoundState),
    /// The round is over.
    Terminal(TerminalState),
}

impl State {
    /// The legal actions for this state, a terminal state only allows check.
    pub fn legal_actions(&self) -> LegalActions {
        match self {
            State::Round(state) => state.legal_actions(),
            State::Terminal(_) => LegalActions::CHECK_ONLY,
        }
    }

    /// Checks if the round is over.
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Terminal(_))
    }

    /// Advances a round state by one action, a terminal state is returned as is.
    pub fn proceed(self, action: Action) -> State {
        match self {
            State::Round(state) => state.proceed(action),
            terminal => terminal,
        }
    }
}

/// The end of a round.
#[derive(Debug, Clone)]
pub struct TerminalState {
    /// The chips won by each player, they sum to zero.
    pub deltas: [i32; 2],
    /// The state whose action ended the round.
    pub previous: Box<RoundState>,
}

impl TerminalState {
    fn new(delta: i32, previous: RoundState) -> Self {
        Self {
            deltas: [delta, -delta],
            previous: Box::new(previous),
        }
    }

    /// Checks if the round ended at showdown, that is nobody folded.
    pub fn showdown_reached(&self) -> bool {
        !self.previous.legal_actions().contains(ActionKind::Fold)
    }
}

/// The state of a round while players are betting.
#[derive(Debug, Clone)]
pub struct RoundState {
    button: u32,
    street: u8,
    pips: [Chips; 2],
    stacks: [Chips; 2],
    hands: [[Card; 2]; 2],
    deck: Arc<Deck>,
    rules: Rules,
    previous: Option<Box<RoundState>>,
}

impl RoundState {
    /// Starts a round, deals the players hands and posts the blinds.
    ///
    /// Seat 0 posts the small blind and acts first preflop.
    pub fn new(rules: Rules, mut deck: Deck) -> Self {
        let hands = [[deck.deal(), deck.deal()], [deck.deal(), deck.deal()]];
        let pips = [rules.small_blind, rules.big_blind];
        let stacks = [
            rules.starting_stack - rules.small_blind,
            rules.starting_stack - rules.big_blind,
        ];

        Self::from_parts(rules, 0, PREFLOP, pips, stacks, hands, Arc::new(deck))
    }

    /// Creates a state from its parts, the state has no history.
    pub fn from_parts(
        rules: Rules,
        button: u32,
        street: u8,
        pips: [Chips; 2],
        stacks: [Chips; 2],
        hands: [[Card; 2]; 2],
        deck: Arc<Deck>,
    ) -> Self {
        Self {
            button,
            street,
            pips,
            stacks,
            hands,
            deck,
            rules,
            previous: None,
        }
    }

    /// The move counter, its parity is the active player.
    pub fn button(&self) -> u32 {
        self.button
    }

    /// The number of board cards revealed.
    pub fn street(&self) -> u8 {
        self.street
    }

    /// Chips committed by each player in this street.
    pub fn pips(&self) -> [Chips; 2] {
        self.pips
    }

    /// Chips behind for each player.
    pub fn stacks(&self) -> [Chips; 2] {
        self.stacks
    }

    /// The players hole cards.
    pub fn hands(&self) -> [[Card; 2]; 2] {
        self.hands
    }

    /// The match rules.
    pub fn rules(&self) -> Rules {
        self.rules
    }

    /// The state this state was created from.
    pub fn previous(&self) -> Option<&RoundState> {
        self.previous.as_deref()
    }

    /// The active player index.
    pub fn active(&self) -> usize {
        (self.button % 2) as usize
    }

    /// The board cards revealed in this street.
    pub fn board(&self) -> Vec<Card> {
        self.deck.peek(self.street as usize)
    }

    /// Chips each player has put in the pot in this round.
    pub fn contributions(&self) -> [Chips; 2] {
        let start = self.rules.starting_stack;
        [start - self.stacks[0], start - self.stacks[1]]
    }

    /// Iterates from this state back to the first state of the round.
    pub fn history(&self) -> impl Iterator<Item = &RoundState> {
        std::iter::successors(Some(self), |s| s.previous())
    }

    fn continue_cost(&self) -> Chips {
        let active = self.active();
        self.pips[1 - active] - self.pips[active]
    }

    /// Returns the active player legal actions.
    pub fn legal_actions(&self) -> LegalActions {
        let active = self.active();
        let continue_cost = self.continue_cost();

        if continue_cost == Chips::ZERO {
            // Bets are only allowed if both players have chips.
            if self.stacks[0] == Chips::ZERO || self.stacks[1] == Chips::ZERO {
                LegalActions::new(&[ActionKind::Check])
            } else {
                LegalActions::new(&[ActionKind::Check, ActionKind::Raise])
            }
        } else if continue_cost == self.stacks[active] || self.stacks[1 - active] == Chips::ZERO {
            LegalActions::new(&[ActionKind::Fold, ActionKind::Call])
        } else {
            LegalActions::new(&[ActionKind::Fold, ActionKind::Call, ActionKind::Raise])
        }
    }

    /// Returns the minimum and maximum pip for a raise by the active player.
    pub fn raise_bounds(&self) -> (Chips, Chips) {
        let active = self.active();
        let continue_cost = self.continue_cost();
        let max_contribution = self.stacks[active].min(self.stacks[1 - active] + continue_cost);
        let min_contribution =
            max_contribution.min(continue_cost + continue_cost.max(self.rules.big_blind));

        (
            self.pips[active] + min_contribution,
            self.pips[active] + max_contribution,
        )
    }

    /// Checks if a raise to `amount` is within the raise bounds.
    pub fn is_valid_raise(&self, amount: Chips) -> bool {
        let (min, max) = self.raise_bounds();
        self.legal_actions().contains(ActionKind::Raise) && min <= amount && amount <= max
    }

    /// Advances the round by one action from the active player.
    ///
    /// The action must be legal and a raise amount within [Self::raise_bounds],
    /// they are not checked here.
    pub fn proceed(self, action: Action) -> State {
        let active = self.active();
        let button = self.button + 1;
        match action {
            Action::Fold => {
                let start = self.rules.starting_stack;
                let delta = if active == 0 {
                    self.stacks[0].delta(start)
                } else {
                    start.delta(self.stacks[1])
                };

                State::Terminal(TerminalState::new(delta, self))
            }
            Action::Call if self.button == 0 => {
                // The small blind completes, the big blind acts next.
                let mut state = self.next(button);
                state.commit(active, state.pips[1 - active]);
                State::Round(state)
            }
            Action::Call => {
                let mut state = self.next(button);
                state.commit(active, state.pips[1 - active]);
                state.proceed_street()
            }
            Action::Check => {
                if (self.street == PREFLOP && self.button > 0) || self.button > 1 {
                    // Both players have acted.
                    self.proceed_street()
                } else {
                    State::Round(self.next(button))
                }
            }
            Action::Raise(amount) => {
                let mut state = self.next(button);
                state.commit(active, amount);
                State::Round(state)
            }
        }
    }

    /// Resets the pips and moves to the next street or to showdown after the river.
    pub fn proceed_street(self) -> State {
        if self.street == RIVER {
            return self.showdown();
        }

        let street = if self.street == PREFLOP {
            FLOP
        } else {
            self.street + 1
        };

        let mut state = self.next(1);
        state.street = street;
        state.pips = [Chips::ZERO; 2];
        State::Round(state)
    }

    /// Compares the players hands and computes the payoffs.
    ///
    /// On a tie the stacks difference is split with floor division so an odd
    /// difference loses one chip.
    pub fn showdown(self) -> State {
        let board = self.deck.peek(5);
        let score = |hand: &[Card; 2]| {
            let mut cards = board.clone();
            cards.extend_from_slice(hand);
            HandValue::eval(&cards)
        };

        let start = self.rules.starting_stack;
        let delta = match score(&self.hands[0]).cmp(&score(&self.hands[1])) {
            Ordering::Greater => start.delta(self.stacks[1]),
            Ordering::Less => self.stacks[0].delta(start),
            Ordering::Equal => self.stacks[0].delta(self.stacks[1]).div_euclid(2),
        };

        State::Terminal(TerminalState::new(delta, self))
    }

    /// Creates the successor of this state with the given button.
    fn next(self, button: u32) -> RoundState {
        RoundState {
            button,
            street: self.street,
            pips: self.pips,
            stacks: self.stacks,
            hands: self.hands,
            deck: self.deck.clone(),
            rules: self.rules,
            previous: Some(Box::new(self)),
        }
    }

    /// Moves chips from a player stack to its pip so that the pip is `pip`.
    fn commit(&mut self, player: usize, pip: Chips) {
        let contribution = pip - self.pips[player];
        self.stacks[player] -= contribution;
        self.pips[player] += contribution;
    }
}
