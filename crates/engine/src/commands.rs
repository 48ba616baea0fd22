// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Bot build and run commands.
use serde::Deserialize;
use std::{fs, io, path::Path};
use thiserror::Error;

/// The file in a bot directory with the bot commands.
pub const COMMANDS_FILE: &str = "commands.json";

/// The commands to build and run a bot, each one a program and its arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Commands {
    /// The build command, empty if the bot needs no build.
    pub build: Vec<String>,
    /// The run command, the engine appends the port to connect to.
    pub run: Vec<String>,
}

/// Errors loading a commands file.
#[derive(Debug, Error)]
pub enum CommandsError {
    /// The file doesn't exist or cannot be read.
    #[error("commands.json not found - check the player path")]
    NotFound(#[source] io::Error),
    /// The file is not valid JSON.
    #[error("commands.json misformatted")]
    Misformatted(#[source] serde_json::Error),
    /// A command is missing or it is not a list of strings.
    #[error("commands.json missing command")]
    MissingCommand(#[source] serde_json::Error),
}

impl Commands {
    /// Loads the commands file in the bot directory.
    pub fn load(dir: &Path) -> Result<Self, CommandsError> {
        let text = fs::read_to_string(dir.join(COMMANDS_FILE)).map_err(CommandsError::NotFound)?;
        Self::parse(&text)
    }

    /// Parses the commands file contents.
    pub fn parse(text: &str) -> Result<Self, CommandsError> {
        serde_json::from_str(text).map_err(|e| {
            if e.is_data() {
                CommandsError::MissingCommand(e)
            } else {
                CommandsError::Misformatted(e)
            }
        })
    }
}
