// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Match orchestrator.
use anyhow::{Result, anyhow};
use log::info;
use rand::{Rng, SeedableRng, rngs::StdRng};

use headsup_core::{
    poker::{Chips, Deck},
    state::{RoundState, State},
};

use crate::{config::Config, session::PlayerSession, transcript::Transcript};

/// The result of a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSummary {
    /// The players names in config order.
    pub names: [String; 2],
    /// The players bankrolls in config order.
    pub bankrolls: [i64; 2],
    /// The number of rounds played.
    pub rounds: u32,
}

/// A match between two bots.
#[derive(Debug)]
pub struct Match {
    config: Config,
    /// The sessions in config order.
    players: [PlayerSession; 2],
    /// The player index for each seat, reversed after every round.
    seats: [usize; 2],
    transcript: Transcript,
    rng: StdRng,
}

impl Match {
    /// Creates a match, the deck is seeded from the config seed if set.
    pub fn new(config: Config) -> Self {
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        info!("Deck seed {seed}");

        let players = [
            PlayerSession::new(&config.players[0], &config),
            PlayerSession::new(&config.players[1], &config),
        ];
        let names = players.each_ref().map(|p| p.name().to_string());

        Self {
            transcript: Transcript::new(&names),
            players,
            seats: [0, 1],
            rng: StdRng::seed_from_u64(seed),
            config,
        }
    }

    /// Builds and starts the bots, plays all the rounds, stops the bots and
    /// writes the transcript.
    pub async fn run(mut self) -> Result<MatchSummary> {
        tokio::fs::create_dir_all(&self.config.log_dir)
            .await
            .map_err(|e| anyhow!("Cannot create {}: {e}", self.config.log_dir.display()))?;

        for player in &mut self.players {
            player.build().await;
            player.start().await;
        }

        for round in 1..=self.config.num_rounds {
            self.transcript.log_round_start(round, &self.status());
            self.run_round().await;
            self.seats.reverse();
        }

        self.transcript.log_final(&self.status());

        for player in &mut self.players {
            player.stop().await;
        }

        let path = self.config.game_log_path();
        info!("Writing {}", path.display());
        self.transcript.write(&path).await?;

        Ok(MatchSummary {
            names: self.players.each_ref().map(|p| p.name().to_string()),
            bankrolls: self.players.each_ref().map(|p| p.bankroll()),
            rounds: self.config.num_rounds,
        })
    }

    /// Plays one round, seat 0 posts the small blind.
    async fn run_round(&mut self) {
        let seats = self.seats;
        let names = seats.map(|idx| self.players[idx].name().to_string());
        let deck = Deck::new_and_shuffled(&mut self.rng);
        let mut state = State::Round(RoundState::new(self.config.rules, deck));

        while let State::Round(round) = &state {
            self.transcript.log_round_state(&names, round);

            let active = round.active();
            let is_bet = round.pips() == [Chips::ZERO; 2];
            let (message, log) = self.transcript.split(active);
            let action = self.players[seats[active]].query(&state, message, log).await;

            self.transcript.log_action(&names[active], action, is_bet);
            state = state.proceed(action);
        }

        if let State::Terminal(terminal) = &state {
            self.transcript.log_terminal_state(&names, terminal);

            // The last query lets the bots see the round outcome.
            for (seat, &idx) in seats.iter().enumerate() {
                let (message, log) = self.transcript.split(seat);
                self.players[idx].query(&state, message, log).await;
                self.players[idx].update_bankroll(terminal.deltas[seat]);
            }
        }
    }

    /// The players names and bankrolls in seat order.
    fn status(&self) -> [(String, i64); 2] {
        self.seats.map(|idx| {
            let player = &self.players[idx];
            (player.name().to_string(), player.bankroll())
        })
    }
}
