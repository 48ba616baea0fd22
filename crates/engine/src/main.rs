// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0
use clap::Parser;
use headsup_core::poker::{Chips, Rules};
use headsup_engine::{Config, Match, PlayerConfig};
use log::{error, info};
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Parser)]
struct Cli {
    /// The first player name.
    #[clap(long, default_value = "A")]
    player1_name: String,
    /// The first player directory.
    #[clap(long, default_value = "./A")]
    player1_path: PathBuf,
    /// The second player name.
    #[clap(long, default_value = "B")]
    player2_name: String,
    /// The second player directory.
    #[clap(long, default_value = "./B")]
    player2_path: PathBuf,
    /// Number of rounds.
    #[clap(long, short = 'n', default_value_t = 1000, value_parser = clap::value_parser!(u32).range(1..))]
    rounds: u32,
    /// The small blind.
    #[clap(long, default_value_t = 1, value_parser = chips_parser())]
    small_blind: u32,
    /// The big blind.
    #[clap(long, default_value_t = 2, value_parser = chips_parser())]
    big_blind: u32,
    /// The stack each player starts a round with.
    #[clap(long, default_value_t = 200, value_parser = chips_parser())]
    starting_stack: u32,
    /// The bots thinking time for the whole match in seconds.
    #[clap(long, default_value_t = 30.0)]
    game_clock: f64,
    /// Don't charge the bots for their thinking time.
    #[clap(long)]
    no_game_clock: bool,
    /// Bot build time limit in seconds.
    #[clap(long, default_value_t = 10.0)]
    build_timeout: f64,
    /// Bot connection and response time limit in seconds.
    #[clap(long, default_value_t = 10.0)]
    connect_timeout: f64,
    /// Maximum size of a bot log in bytes.
    #[clap(long, default_value_t = 524_288)]
    player_log_size_limit: usize,
    /// The transcript file name without extension.
    #[clap(long, default_value = "gamelog")]
    game_log: String,
    /// The directory for the transcript and the bots logs.
    #[clap(long, default_value = ".")]
    log_dir: PathBuf,
    /// Seed for shuffling the deck.
    #[clap(long)]
    seed: Option<u64>,
}

/// Chips amounts must fit the signed payoffs.
fn chips_parser() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=i64::from(i32::MAX))
}

#[tokio::main]
async fn main() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    if cli.small_blind >= cli.big_blind || cli.big_blind > cli.starting_stack {
        error!("Blinds must be increasing and not greater than the starting stack");
        return;
    }

    let (Ok(build_timeout), Ok(connect_timeout)) = (
        Duration::try_from_secs_f64(cli.build_timeout),
        Duration::try_from_secs_f64(cli.connect_timeout),
    ) else {
        error!("Invalid timeout");
        return;
    };

    let config = Config {
        rules: Rules {
            small_blind: Chips::new(cli.small_blind),
            big_blind: Chips::new(cli.big_blind),
            starting_stack: Chips::new(cli.starting_stack),
        },
        num_rounds: cli.rounds,
        starting_game_clock: cli.game_clock,
        enforce_game_clock: !cli.no_game_clock,
        build_timeout,
        connect_timeout,
        read_timeout: connect_timeout,
        player_log_size_limit: cli.player_log_size_limit,
        players: [
            PlayerConfig::new(cli.player1_name, cli.player1_path),
            PlayerConfig::new(cli.player2_name, cli.player2_path),
        ],
        game_log_filename: cli.game_log,
        log_dir: cli.log_dir,
        seed: cli.seed,
    };

    info!("Starting the Headsup engine...");
    match Match::new(config).run().await {
        Ok(summary) => {
            for (name, bankroll) in summary.names.iter().zip(summary.bankrolls) {
                info!("{name} finished with {bankroll}");
            }
        }
        Err(e) => error!("{e}"),
    }
}
