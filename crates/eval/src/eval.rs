// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Poker hand evaluator.
//!
//! A hand value is a 32 bits integer with the following layout:
//!
//! ```text
//!   +--------+--------+--------+--------+
//!   |xxxxxxxx|cccc1111|22223333|44445555|
//!   +--------+--------+--------+--------+
//!   c = hand category (high card=0,...,straight flush=8)
//!   1..5 = ranks of the five best cards ordered by importance
//! ```
//!
//! so that a better hand always has a greater value and equal hands have equal
//! values regardless of suits.
use serde::{Deserialize, Serialize};
use std::fmt;

use headsup_cards::{Card, Rank};

/// Ranks mask for the A-2-3-4-5 straight.
const WHEEL: u16 = 0b1_0000_0000_1111;

/// All ranks bits.
const ALL_RANKS: u16 = 0b1_1111_1111_1111;

/// The category of a poker hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HandRank {
    /// High card.
    HighCard = 0,
    /// One pair.
    OnePair,
    /// Two pairs.
    TwoPair,
    /// Three of a kind.
    ThreeOfAKind,
    /// Straight.
    Straight,
    /// Flush.
    Flush,
    /// Full house.
    FullHouse,
    /// Four of a kind.
    FourOfAKind,
    /// Straight flush.
    StraightFlush,
}

impl HandRank {
    fn from_bits(bits: u32) -> HandRank {
        use HandRank::*;
        match bits {
            0 => HighCard,
            1 => OnePair,
            2 => TwoPair,
            3 => ThreeOfAKind,
            4 => Straight,
            5 => Flush,
            6 => FullHouse,
            7 => FourOfAKind,
            _ => StraightFlush,
        }
    }
}

impl fmt::Display for HandRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandRank::HighCard => "High Card",
            HandRank::OnePair => "One Pair",
            HandRank::TwoPair => "Two Pairs",
            HandRank::ThreeOfAKind => "Three of a Kind",
            HandRank::Straight => "Straight",
            HandRank::Flush => "Flush",
            HandRank::FullHouse => "Full House",
            HandRank::FourOfAKind => "Four of a Kind",
            HandRank::StraightFlush => "Straight Flush",
        };

        write!(f, "{name}")
    }
}

/// The value of a poker hand, greater is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HandValue(u32);

impl HandValue {
    /// Evaluates a 5, 6 or 7 cards hand.
    ///
    /// Panics if the hand has fewer than 5 or more than 7 cards.
    pub fn eval(cards: &[Card]) -> HandValue {
        assert!(
            (5..=7).contains(&cards.len()),
            "hand must have 5 to 7 cards, got {}",
            cards.len()
        );

        Ranks::new(cards).value()
    }

    /// The hand category.
    pub fn rank(&self) -> HandRank {
        HandRank::from_bits(self.0 >> 20)
    }

    /// The raw value.
    pub fn value(&self) -> u32 {
        self.0
    }

    fn new(rank: HandRank, kickers: &[u8]) -> Self {
        let packed = kickers
            .iter()
            .chain(std::iter::repeat(&0))
            .take(5)
            .fold(0u32, |acc, &r| (acc << 4) | r as u32);
        Self(((rank as u32) << 20) | packed)
    }
}

/// Per rank and per suit bitmasks of a hand.
struct Ranks {
    /// Cards count for each rank.
    counts: [u8; 13],
    /// Ranks bitmask for each suit.
    suits: [u16; 4],
    /// Ranks bitmask for all suits.
    all: u16,
}

impl Ranks {
    fn new(cards: &[Card]) -> Self {
        let mut ranks = Ranks {
            counts: [0; 13],
            suits: [0; 4],
            all: 0,
        };

        for card in cards {
            let rank = card.rank_bits();
            let suit = card.suit_bits().trailing_zeros() as usize;
            ranks.counts[rank as usize] += 1;
            ranks.suits[suit] |= 1 << rank;
            ranks.all |= 1 << rank;
        }

        ranks
    }

    fn value(&self) -> HandValue {
        let flush = self.suits.iter().copied().find(|m| m.count_ones() >= 5);

        if let Some(high) = flush.and_then(straight_high) {
            return HandValue::new(HandRank::StraightFlush, &[high]);
        }

        if let Some(quads) = self.highest_with_count(4, ALL_RANKS) {
            let kicker = highest(self.all & !(1 << quads));
            return HandValue::new(HandRank::FourOfAKind, &[quads, kicker]);
        }

        let trips = self.highest_with_count(3, ALL_RANKS);
        if let Some(trips) = trips {
            if let Some(pair) = self.highest_with_count(2, ALL_RANKS & !(1 << trips)) {
                return HandValue::new(HandRank::FullHouse, &[trips, pair]);
            }
        }

        if let Some(mask) = flush {
            return HandValue::new(HandRank::Flush, &top_ranks(mask, 5));
        }

        if let Some(high) = straight_high(self.all) {
            return HandValue::new(HandRank::Straight, &[high]);
        }

        if let Some(trips) = trips {
            let mut kickers = vec![trips];
            kickers.extend(top_ranks(self.all & !(1 << trips), 2));
            return HandValue::new(HandRank::ThreeOfAKind, &kickers);
        }

        if let Some(high_pair) = self.highest_with_count(2, ALL_RANKS) {
            let rest = ALL_RANKS & !(1 << high_pair);
            if let Some(low_pair) = self.highest_with_count(2, rest) {
                let kicker = highest(self.all & !(1 << high_pair) & !(1 << low_pair));
                return HandValue::new(HandRank::TwoPair, &[high_pair, low_pair, kicker]);
            }

            let mut kickers = vec![high_pair];
            kickers.extend(top_ranks(self.all & rest, 3));
            return HandValue::new(HandRank::OnePair, &kickers);
        }

        HandValue::new(HandRank::HighCard, &top_ranks(self.all, 5))
    }

    /// The highest rank in `mask` with at least `count` cards.
    fn highest_with_count(&self, count: u8, mask: u16) -> Option<u8> {
        (0..13u8)
            .rev()
            .find(|&r| mask & (1 << r) != 0 && self.counts[r as usize] >= count)
    }
}

/// The highest rank of a straight in the ranks mask.
fn straight_high(mask: u16) -> Option<u8> {
    let mut bits = mask;
    bits &= bits << 1;
    bits &= bits << 1;
    bits &= bits << 1;
    bits &= bits << 1;

    if bits != 0 {
        Some(15 - bits.leading_zeros() as u8)
    } else if mask & WHEEL == WHEEL {
        Some(Rank::Five as u8)
    } else {
        None
    }
}

/// The highest rank in the mask, or 0 if empty.
fn highest(mask: u16) -> u8 {
    top_ranks(mask, 1).first().copied().unwrap_or_default()
}

/// The `n` highest ranks in the mask.
fn top_ranks(mask: u16, n: usize) -> Vec<u8> {
    (0..13u8).rev().filter(|r| mask & (1 << r) != 0).take(n).collect()
}
