// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Type definitions for the messages sent by the engine to a bot.
//!
//! A message is a single line of space separated tokens. The first token is
//! always the remaining game clock, the following tokens are everything that
//! happened since the last message sent to the same bot.
use std::fmt;

use crate::{
    action::Action,
    poker::{Card, join_cards},
};

/// A token in a message sent to a bot.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// The bot remaining game clock in seconds.
    Time(f64),
    /// The bot seat for this round.
    Seat(usize),
    /// The bot hole cards.
    Hand([Card; 2]),
    /// The board cards at the start of a street.
    Board(Vec<Card>),
    /// The opponent hole cards revealed at showdown.
    Opponent([Card; 2]),
    /// The chips won or lost by the bot in this round.
    Delta(i32),
    /// An action taken by either player.
    Action(Action),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Time(secs) => write!(f, "T{secs:.3}"),
            Token::Seat(seat) => write!(f, "P{seat}"),
            Token::Hand(cards) => write!(f, "H{}", join_cards(cards, ",")),
            Token::Board(cards) => write!(f, "B{}", join_cards(cards, ",")),
            Token::Opponent(cards) => write!(f, "O{}", join_cards(cards, ",")),
            Token::Delta(delta) => write!(f, "D{delta}"),
            Token::Action(action) => write!(f, "{action}"),
        }
    }
}

/// The line sent to a bot to request its shutdown.
pub const QUIT: &str = "Q";

/// A queue of tokens for one bot that have not been sent yet.
///
/// The first token is a clock placeholder replaced when the message is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    tokens: Vec<Token>,
}

impl Message {
    /// Creates a message for the start of a round.
    pub fn new_round(seat: usize, hand: [Card; 2]) -> Self {
        Self {
            tokens: vec![Token::Time(0.0), Token::Seat(seat), Token::Hand(hand)],
        }
    }

    /// Appends a token.
    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Returns the tokens, including the clock placeholder.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Encodes the pending tokens with the given clock and clears them.
    pub fn take_line(&mut self, clock: f64) -> String {
        match self.tokens.first_mut() {
            Some(first) => *first = Token::Time(clock),
            None => self.tokens.push(Token::Time(clock)),
        }

        let line = self
            .tokens
            .iter()
            .map(Token::to_string)
            .collect::<Vec<_>>()
            .join(" ");

        // Only the clock placeholder is kept, the bot has seen the rest.
        self.tokens.truncate(1);

        line
    }
}

impl Default for Message {
    fn default() -> Self {
        Self {
            tokens: vec![Token::Time(0.0)],
        }
    }
}
