// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Headsup Poker core types: the round state machine and the bot protocol.
#![warn(clippy::all, rust_2018_idioms, missing_docs)]

pub mod action;
pub mod message;
pub mod poker;
pub mod state;
