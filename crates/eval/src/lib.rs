// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Headsup Poker hand evaluator.
//!
//! Poker hand evaluator for 5, 6 and 7 cards hands. The evaluator computes the
//! best five cards hand using ranks bitmasks and packs the hand category and its
//! kickers in a single integer so that hand values compare with `Ord`.
//!
//! To use the evaluator create a hand and use [HandValue] to evaluate the hand
//! and get its rank:
//!
//! ```
//! # use headsup_eval::*;
//! let hand = |s: &str| {
//!     s.split_whitespace()
//!         .map(|c| c.parse::<Card>().unwrap())
//!         .collect::<Vec<_>>()
//! };
//!
//! let v1 = HandValue::eval(&hand("Ah Kh 7d 7c 2s 3s 9h"));
//! let v2 = HandValue::eval(&hand("5h 6h 7d 8c 9s Kd Qd"));
//! assert_eq!(v1.rank(), HandRank::OnePair);
//! assert_eq!(v2.rank(), HandRank::Straight);
//! assert!(v2 > v1);
//! ```
#![warn(clippy::all, rust_2018_idioms, missing_docs)]
pub mod eval;
pub use eval::{HandRank, HandValue};

// Reexport cards types.
pub use headsup_cards::{Card, Deck, Rank, Suit};
