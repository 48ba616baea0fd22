// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Match configuration.
use std::{path::PathBuf, time::Duration};

use headsup_core::poker::Rules;

/// A bot taking part in a match.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// The name used in logs and in the transcript.
    pub name: String,
    /// The bot directory, it must contain a `commands.json` file.
    pub path: PathBuf,
}

impl PlayerConfig {
    /// Creates a player config.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Match config.
#[derive(Debug, Clone)]
pub struct Config {
    /// The betting rules.
    pub rules: Rules,
    /// Number of rounds to play.
    pub num_rounds: u32,
    /// The thinking time budget of each bot for the whole match, in seconds.
    pub starting_game_clock: f64,
    /// Charge the bots for the time spent answering.
    pub enforce_game_clock: bool,
    /// Time limit for a bot build command.
    pub build_timeout: Duration,
    /// Time limit for a bot to connect and to quit.
    pub connect_timeout: Duration,
    /// Time limit for a single bot response.
    pub read_timeout: Duration,
    /// Maximum size of a bot output log in bytes.
    pub player_log_size_limit: usize,
    /// The two bots, the first one is seat 0 in the first round.
    pub players: [PlayerConfig; 2],
    /// The transcript file name without extension.
    pub game_log_filename: String,
    /// The directory for the transcript and the bots logs.
    pub log_dir: PathBuf,
    /// Seed for the deck shuffling, random if not set.
    pub seed: Option<u64>,
}

impl Config {
    /// The transcript file path.
    pub fn game_log_path(&self) -> PathBuf {
        self.log_dir.join(format!("{}.txt", self.game_log_filename))
    }
}

impl Default for Config {
    fn default() -> Self {
        let connect_timeout = Duration::from_secs(10);
        Self {
            rules: Rules::default(),
            num_rounds: 1000,
            starting_game_clock: 30.0,
            enforce_game_clock: true,
            build_timeout: Duration::from_secs(10),
            connect_timeout,
            read_timeout: connect_timeout,
            player_log_size_limit: 524_288,
            players: [
                PlayerConfig::new("A", "./A"),
                PlayerConfig::new("B", "./B"),
            ],
            game_log_filename: "gamelog".to_string(),
            log_dir: PathBuf::from("."),
            seed: None,
        }
    }
}
