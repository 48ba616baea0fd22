// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Headsup Poker engine.
//!
//! Referees a match between two bots: each bot is a process that connects to
//! the engine and answers every request with an action. Bots that crash, time
//! out or misbehave get a check or a fold and the match keeps going.
#![warn(clippy::all, rust_2018_idioms, missing_docs)]

pub mod commands;
pub mod config;
pub mod connection;
pub mod game;
pub mod output;
pub mod session;
pub mod transcript;

pub use config::{Config, PlayerConfig};
pub use game::{Match, MatchSummary};
pub use session::PlayerSession;
