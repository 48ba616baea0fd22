// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Types used in a Poker game.
use serde::{Deserialize, Serialize};
use std::{fmt, ops};

pub use headsup_cards::{Card, Deck, Rank, Suit};
pub use headsup_eval::{HandRank, HandValue};

/// Chips amount.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Chips(u32);

impl Chips {
    /// The zero chips.
    pub const ZERO: Chips = Chips(0);

    /// Creates chips with the given value.
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// The integer amount.
    pub fn amount(&self) -> u32 {
        self.0
    }

    /// The signed difference `self - rhs`, saturated to the `i32` range.
    pub fn delta(self, rhs: Chips) -> i32 {
        let delta = i64::from(self.0) - i64::from(rhs.0);
        delta.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }
}

impl From<u32> for Chips {
    fn from(val: u32) -> Self {
        Chips(val)
    }
}

impl From<Chips> for u32 {
    fn from(val: Chips) -> Self {
        val.0
    }
}

impl ops::Add for Chips {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Chips(self.0 + rhs.0)
    }
}

impl ops::AddAssign for Chips {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl ops::Sub<Chips> for Chips {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl ops::SubAssign for Chips {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

impl fmt::Display for Chips {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The betting rules of a match.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    /// The small blind posted by the first seat.
    pub small_blind: Chips,
    /// The big blind posted by the second seat.
    pub big_blind: Chips,
    /// The stack each player starts every round with.
    pub starting_stack: Chips,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            small_blind: Chips::new(1),
            big_blind: Chips::new(2),
            starting_stack: Chips::new(200),
        }
    }
}

/// Formats cards separated by `sep`.
pub fn join_cards(cards: &[Card], sep: &str) -> String {
    cards
        .iter()
        .map(Card::to_string)
        .collect::<Vec<_>>()
        .join(sep)
}
