// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Headsup Poker cards types.
//!
//! This crate define types to create cards:
//!
//! ```
//! # use headsup_cards::{Card, Rank, Suit};
//! let ah = Card::new(Rank::Ace, Suit::Hearts);
//! assert_eq!(ah.to_string(), "Ah");
//! assert_eq!("Ah".parse::<Card>(), Ok(ah));
//! ```
//!
//! and a [Deck] type for shuffling and dealing cards, the board cards are read
//! with [Deck::peek] that returns the next cards without dealing them:
//!
//! ```
//! # use headsup_cards::Deck;
//! let mut deck = Deck::new_and_shuffled(&mut rand::rng());
//! let hand = [deck.deal(), deck.deal()];
//! let board = deck.peek(5);
//! assert_eq!(board.len(), 5);
//! assert!(!board.contains(&hand[0]));
//! ```
#![warn(clippy::all, rust_2018_idioms, missing_docs)]
mod deck;
pub use deck::{Card, Deck, ParseCardError, Rank, Suit};
