// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Bot process supervisor.
//!
//! A [PlayerSession] builds and launches a bot, accepts its connection, asks it
//! for actions and shuts it down. None of its operations fail, errors are logged
//! and the bot gets the default action from then on.
use anyhow::{Result, anyhow, bail};
use log::{error, info, warn};
use std::{
    io,
    net::Ipv4Addr,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};
use thiserror::Error;
use tokio::{
    net::TcpListener,
    process::{Child, Command},
    task::JoinHandle,
    time::{self, Instant},
};

use headsup_core::{
    action::{Action, ActionKind, DecodeError},
    message::Message,
    state::State,
};

use crate::{
    commands::Commands,
    config::{Config, PlayerConfig},
    connection::Connection,
    output::OutputLog,
};

/// Errors while asking a bot for an action.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The bot took too long or its game clock is exhausted.
    #[error("ran out of time")]
    Timeout,
    /// The connection failed or the bot closed it.
    #[error("disconnected")]
    Disconnected,
    /// The response is not an action.
    #[error("response misformatted")]
    Misformatted(#[from] DecodeError),
    /// The action is not legal in the current state.
    #[error("attempted illegal {0}")]
    Illegal(ActionKind),
}

impl QueryError {
    /// Checks if the bot should not be queried anymore.
    fn is_fatal(&self) -> bool {
        matches!(self, QueryError::Timeout | QueryError::Disconnected)
    }
}

/// Decodes a bot response and checks it is legal in `state`.
pub fn decode_action(reply: &str, state: &State) -> Result<Action, QueryError> {
    let code = reply.trim().chars().next().ok_or(DecodeError::Empty)?;
    let kind = ActionKind::from_code(code).ok_or(DecodeError::UnknownCode(code))?;
    if !state.legal_actions().contains(kind) {
        return Err(QueryError::Illegal(kind));
    }

    let action = reply.parse::<Action>()?;
    match (action, state) {
        (Action::Raise(amount), State::Round(round)) if !round.is_valid_raise(amount) => {
            Err(QueryError::Illegal(kind))
        }
        _ => Ok(action),
    }
}

/// A bot taking part in a match.
#[derive(Debug)]
pub struct PlayerSession {
    name: String,
    path: PathBuf,
    bankroll: i64,
    game_clock: f64,
    enforce_game_clock: bool,
    build_timeout: Duration,
    connect_timeout: Duration,
    read_timeout: Duration,
    log_path: PathBuf,
    commands: Option<Commands>,
    child: Option<Child>,
    conn: Option<Connection>,
    output: OutputLog,
    drains: Vec<JoinHandle<()>>,
}

impl PlayerSession {
    /// Creates a session for a bot, the bot is not started.
    pub fn new(player: &PlayerConfig, config: &Config) -> Self {
        Self {
            name: player.name.clone(),
            path: player.path.clone(),
            bankroll: 0,
            game_clock: config.starting_game_clock,
            enforce_game_clock: config.enforce_game_clock,
            build_timeout: config.build_timeout,
            connect_timeout: config.connect_timeout,
            read_timeout: config.read_timeout,
            log_path: config.log_dir.join(format!("{}.txt", player.name)),
            commands: None,
            child: None,
            conn: None,
            output: OutputLog::new(config.player_log_size_limit),
            drains: Vec::new(),
        }
    }

    /// The bot name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The chips won or lost so far.
    pub fn bankroll(&self) -> i64 {
        self.bankroll
    }

    /// Adds the chips won or lost in a round.
    pub fn update_bankroll(&mut self, delta: i32) {
        self.bankroll += i64::from(delta);
    }

    /// The remaining game clock in seconds.
    pub fn game_clock(&self) -> f64 {
        self.game_clock
    }

    /// The commands loaded by [Self::build].
    pub fn commands(&self) -> Option<&Commands> {
        self.commands.as_ref()
    }

    /// Checks if the bot is connected.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// The bot output log file.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Loads the bot commands and runs the build command.
    pub async fn build(&mut self) {
        let commands = match Commands::load(&self.path) {
            Ok(commands) => commands,
            Err(e) => {
                warn!("{} {e}", self.name);
                return;
            }
        };

        let build = commands.build.clone();
        self.commands = Some(commands);

        if !build.is_empty() {
            if let Err(e) = self.run_build(&build).await {
                warn!("{} {e}", self.name);
            }
        }
    }

    async fn run_build(&mut self, build: &[String]) -> Result<()> {
        let mut child = spawn("build", build, &self.path, None)?;
        let drains = self.drain_output(&mut child);

        let res = time::timeout(self.build_timeout, child.wait()).await;
        if res.is_err() {
            if let Err(e) = child.kill().await {
                warn!("Could not kill {} build: {e}", self.name);
            }
        }

        self.join_drains(drains).await;

        match res {
            Ok(status) => {
                let status = status?;
                if !status.success() {
                    info!("{} build exited with {status}", self.name);
                }

                Ok(())
            }
            Err(_) => {
                self.output
                    .push_line(&format!("Timed out waiting for {} to build", self.name));
                bail!("build timed out")
            }
        }
    }

    /// Launches the bot and waits for its connection.
    pub async fn start(&mut self) {
        let Some(run) = self.commands.as_ref().map(|c| c.run.clone()) else {
            return;
        };

        if run.is_empty() {
            return;
        }

        match self.launch(&run).await {
            Ok(conn) => {
                info!("{} connected successfully", self.name);
                self.conn = Some(conn);
            }
            Err(e) => warn!("{} {e}", self.name),
        }
    }

    async fn launch(&mut self, run: &[String]) -> Result<Connection> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .map_err(|e| anyhow!("Tcp listener bind error: {e}"))?;
        let port = listener.local_addr()?.port();

        let mut child = spawn("run", run, &self.path, Some(port.to_string()))?;
        let drains = self.drain_output(&mut child);
        self.drains.extend(drains);
        self.child = Some(child);

        let (stream, _) = time::timeout(self.connect_timeout, listener.accept())
            .await
            .map_err(|_| anyhow!("timed out waiting to connect"))??;

        Ok(Connection::new(stream))
    }

    /// Asks the bot for an action.
    ///
    /// Sends the pending tokens in `message` and returns the bot action if it
    /// is legal in `state`. Failures are appended to `log` and the bot gets the
    /// default action. After a timeout or a disconnection the bot game clock is
    /// zero and the bot is not contacted anymore.
    pub async fn query(
        &mut self,
        state: &State,
        message: &mut Message,
        log: &mut Vec<String>,
    ) -> Action {
        if self.game_clock > 0.0 && self.conn.is_some() {
            match self.request(state, message).await {
                Ok(action) => return action,
                Err(e) => {
                    let line = format!("{} {e}", self.name);
                    if e.is_fatal() {
                        warn!("{line}");
                        self.game_clock = 0.0;
                    }

                    log.push(line);
                }
            }
        }

        state.legal_actions().default_action()
    }

    async fn request(&mut self, state: &State, message: &mut Message) -> Result<Action, QueryError> {
        let Some(conn) = self.conn.as_mut() else {
            return Err(QueryError::Disconnected);
        };

        let line = message.take_line(self.game_clock);

        let start = Instant::now();
        let res = time::timeout(self.read_timeout, conn.exchange(&line)).await;
        if self.enforce_game_clock {
            self.game_clock -= start.elapsed().as_secs_f64();
        }

        let reply = match res {
            Err(_) => return Err(QueryError::Timeout),
            Ok(Err(_)) | Ok(Ok(None)) => return Err(QueryError::Disconnected),
            Ok(Ok(Some(reply))) => reply,
        };

        if self.game_clock <= 0.0 {
            return Err(QueryError::Timeout);
        }

        decode_action(&reply, state)
    }

    /// Asks the bot to quit and writes its output log.
    pub async fn stop(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            match time::timeout(self.connect_timeout, conn.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("Could not close socket connection with {}: {e}", self.name),
                Err(_) => warn!("Timed out waiting for {} to disconnect", self.name),
            }
        }

        if let Some(mut child) = self.child.take() {
            if time::timeout(self.connect_timeout, child.wait()).await.is_err() {
                warn!("Timed out waiting for {} to quit", self.name);
                if let Err(e) = child.kill().await {
                    warn!("Could not kill {}: {e}", self.name);
                }
            }
        }

        let drains = std::mem::take(&mut self.drains);
        self.join_drains(drains).await;

        if let Err(e) = self.output.write_to(&self.log_path).await {
            error!("Cannot write {}: {e}", self.log_path.display());
        }
    }

    fn drain_output(&self, child: &mut Child) -> Vec<JoinHandle<()>> {
        let mut drains = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            drains.push(self.output.drain(stdout));
        }

        if let Some(stderr) = child.stderr.take() {
            drains.push(self.output.drain(stderr));
        }

        drains
    }

    /// Waits for the drain tasks, a process started by the bot may keep its
    /// output open after the bot exits.
    async fn join_drains(&self, drains: Vec<JoinHandle<()>>) {
        for handle in drains {
            let abort = handle.abort_handle();
            if time::timeout(self.connect_timeout, handle).await.is_err() {
                abort.abort();
            }
        }
    }
}

/// Spawns a bot command in `dir` with its output piped.
fn spawn(what: &str, cmd: &[String], dir: &Path, port: Option<String>) -> Result<Child> {
    let (program, args) = cmd
        .split_first()
        .ok_or_else(|| anyhow!("{what} command misformatted"))?;

    Command::new(program)
        .args(args)
        .args(port)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            io::ErrorKind::InvalidInput => anyhow!("{what} command misformatted"),
            _ => anyhow!("{what} failed - check \"{what}\" in commands.json: {e}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use headsup_core::{
        message::{QUIT, Token},
        poker::{Chips, Deck, Rules},
        state::RoundState,
    };
    use rand::{SeedableRng, rngs::StdRng};
    use tempfile::TempDir;
    use tokio::{
        io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
        net::TcpStream,
    };

    fn config(dir: &TempDir) -> Config {
        Config {
            build_timeout: Duration::from_millis(500),
            connect_timeout: Duration::from_millis(500),
            read_timeout: Duration::from_millis(500),
            players: [
                PlayerConfig::new("A", dir.path().join("a")),
                PlayerConfig::new("B", dir.path().join("b")),
            ],
            log_dir: dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    fn session(config: &Config) -> PlayerSession {
        PlayerSession::new(&config.players[0], config)
    }

    fn write_commands(dir: &Path, json: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join("commands.json"), json).unwrap();
    }

    fn initial_state() -> RoundState {
        let mut rng = StdRng::seed_from_u64(7);
        RoundState::new(Rules::default(), Deck::new_and_shuffled(&mut rng))
    }

    /// Connects the session to a fake bot that sends `replies` in order, one
    /// for each line it receives, and closes the connection when they run out.
    async fn fake_bot(session: &mut PlayerSession, replies: Vec<&'static str>) -> JoinHandle<Vec<String>> {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let bot = TcpStream::connect(listener.local_addr().unwrap())
            .await
            .unwrap();
        let (stream, _) = listener.accept().await.unwrap();
        session.conn = Some(Connection::new(stream));

        tokio::spawn(async move {
            let (rd, mut wr) = bot.into_split();
            let mut lines = BufReader::new(rd).lines();
            let mut replies = replies.into_iter();
            let mut received = Vec::new();

            while let Ok(Some(line)) = lines.next_line().await {
                let quit = line == QUIT;
                received.push(line);
                if quit {
                    break;
                }

                match replies.next() {
                    Some(reply) => wr.write_all(format!("{reply}\n").as_bytes()).await.unwrap(),
                    None => break,
                }
            }

            received
        })
    }

    #[test]
    fn decode_responses() {
        let state = State::Round(initial_state());

        assert_eq!(decode_action("C\n", &state).unwrap(), Action::Call);
        assert_eq!(decode_action("F", &state).unwrap(), Action::Fold);
        assert_eq!(
            decode_action("R4", &state).unwrap(),
            Action::Raise(Chips::new(4))
        );
        assert_eq!(
            decode_action("R200", &state).unwrap(),
            Action::Raise(Chips::new(200))
        );

        // Check is not legal facing the big blind.
        assert!(matches!(
            decode_action("K", &state),
            Err(QueryError::Illegal(ActionKind::Check))
        ));

        // Raises out of bounds are illegal.
        assert!(matches!(
            decode_action("R3", &state),
            Err(QueryError::Illegal(ActionKind::Raise))
        ));
        assert!(matches!(
            decode_action("R201", &state),
            Err(QueryError::Illegal(ActionKind::Raise))
        ));

        assert!(matches!(
            decode_action("", &state),
            Err(QueryError::Misformatted(DecodeError::Empty))
        ));
        assert!(matches!(
            decode_action("Z", &state),
            Err(QueryError::Misformatted(DecodeError::UnknownCode('Z')))
        ));
        assert!(matches!(
            decode_action("Rabc", &state),
            Err(QueryError::Misformatted(DecodeError::InvalidAmount(_)))
        ));
    }

    #[test]
    fn decode_terminal_responses() {
        let state = initial_state().proceed(Action::Fold);
        assert!(state.is_terminal());

        assert_eq!(decode_action("K", &state).unwrap(), Action::Check);
        assert!(matches!(
            decode_action("F", &state),
            Err(QueryError::Illegal(ActionKind::Fold))
        ));

        // The kind is checked before the amount.
        assert!(matches!(
            decode_action("Rxyz", &state),
            Err(QueryError::Illegal(ActionKind::Raise))
        ));
    }

    #[tokio::test]
    async fn query_exchanges_messages() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let mut session = session(&config);
        let bot = fake_bot(&mut session, vec!["C", "R4", "R300", "X", ""]).await;

        let round = initial_state();
        let mut msg = Message::new_round(0, round.hands()[0]);
        let mut log = Vec::new();

        let state = State::Round(round.clone());
        assert_eq!(session.query(&state, &mut msg, &mut log).await, Action::Call);
        assert_eq!(msg.tokens().len(), 1);

        let state = round.proceed(Action::Call);
        msg.push(Token::Action(Action::Call));

        assert_eq!(
            session.query(&state, &mut msg, &mut log).await,
            Action::Raise(Chips::new(4))
        );
        assert!(log.is_empty());

        // Out of bounds raise, unknown code and empty line get the default.
        for expected in ["A attempted illegal Raise", "A response misformatted", "A response misformatted"] {
            assert_eq!(session.query(&state, &mut msg, &mut log).await, Action::Check);
            assert_eq!(log.last().map(String::as_str), Some(expected));
        }

        let clock = session.game_clock();
        assert!(clock > 0.0 && clock < 30.0);

        // No more replies, the bot closes the connection.
        assert_eq!(session.query(&state, &mut msg, &mut log).await, Action::Check);
        assert_eq!(log.last().map(String::as_str), Some("A disconnected"));
        assert_eq!(session.game_clock(), 0.0);

        // A disconnected bot is not contacted anymore.
        let n = log.len();
        msg.push(Token::Action(Action::Check));
        assert_eq!(session.query(&state, &mut msg, &mut log).await, Action::Check);
        assert_eq!(log.len(), n);
        assert_eq!(msg.tokens().len(), 2);

        let received = bot.await.unwrap();
        assert_eq!(received.len(), 6);
        assert!(received[0].starts_with("T30.000 P0 H"));
        assert!(received[1].starts_with('T') && received[1].ends_with(" C"));
        assert!(!received[2].contains(' '));
    }

    #[tokio::test]
    async fn long_reply_keeps_replies_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let mut session = session(&config);
        let long: &'static str = format!("C{}", " ".repeat(5000)).leak();
        let _bot = fake_bot(&mut session, vec![long, "R4", "K"]).await;

        let state = initial_state().proceed(Action::Call);
        let mut msg = Message::default();
        let mut log = Vec::new();

        assert_eq!(session.query(&state, &mut msg, &mut log).await, Action::Check);
        assert_eq!(log, vec!["A response misformatted".to_string()]);

        // Each reply answers its own request.
        assert_eq!(
            session.query(&state, &mut msg, &mut log).await,
            Action::Raise(Chips::new(4))
        );
        assert_eq!(session.query(&state, &mut msg, &mut log).await, Action::Check);
        assert_eq!(log.len(), 1);
        assert!(session.game_clock() > 0.0);
    }

    #[tokio::test]
    async fn query_with_exhausted_clock() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let mut session = session(&config);
        let bot = fake_bot(&mut session, vec!["C"]).await;
        session.game_clock = 0.0;

        let state = State::Round(initial_state());
        let mut msg = Message::new_round(0, initial_state().hands()[0]);
        let mut log = Vec::new();

        assert_eq!(session.query(&state, &mut msg, &mut log).await, Action::Fold);
        assert!(log.is_empty());
        assert_eq!(msg.tokens().len(), 3);

        // The bot only gets the quit message.
        session.stop().await;
        assert_eq!(bot.await.unwrap(), vec![QUIT.to_string()]);
        assert!(session.log_path().exists());
    }

    #[tokio::test]
    async fn query_read_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(&dir);
        config.read_timeout = Duration::from_millis(100);
        let mut session = session(&config);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let _bot = TcpStream::connect(listener.local_addr().unwrap())
            .await
            .unwrap();
        let (stream, _) = listener.accept().await.unwrap();
        session.conn = Some(Connection::new(stream));

        let state = State::Round(initial_state());
        let mut msg = Message::default();
        let mut log = Vec::new();

        assert_eq!(session.query(&state, &mut msg, &mut log).await, Action::Fold);
        assert_eq!(log, vec!["A ran out of time".to_string()]);
        assert_eq!(session.game_clock(), 0.0);
    }

    #[tokio::test]
    async fn query_game_clock() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(&dir);
        config.starting_game_clock = 0.05;
        let mut session = session(&config);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let bot = TcpStream::connect(listener.local_addr().unwrap())
            .await
            .unwrap();
        let (stream, _) = listener.accept().await.unwrap();
        session.conn = Some(Connection::new(stream));

        // A slow bot exhausts its clock even if it answers within the read timeout.
        tokio::spawn(async move {
            let (rd, mut wr) = bot.into_split();
            let mut lines = BufReader::new(rd).lines();
            while let Ok(Some(_)) = lines.next_line().await {
                time::sleep(Duration::from_millis(200)).await;
                if wr.write_all(b"C\n").await.is_err() {
                    break;
                }
            }
        });

        let state = State::Round(initial_state());
        let mut msg = Message::default();
        let mut log = Vec::new();

        assert_eq!(session.query(&state, &mut msg, &mut log).await, Action::Fold);
        assert_eq!(log, vec!["A ran out of time".to_string()]);
        assert_eq!(session.game_clock(), 0.0);
    }

    #[tokio::test]
    async fn query_without_clock_enforcement() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(&dir);
        config.enforce_game_clock = false;
        let mut session = session(&config);
        let _bot = fake_bot(&mut session, vec!["C"]).await;

        let state = State::Round(initial_state());
        let mut msg = Message::default();
        let mut log = Vec::new();

        assert_eq!(session.query(&state, &mut msg, &mut log).await, Action::Call);
        assert_eq!(session.game_clock(), config.starting_game_clock);
    }

    #[tokio::test]
    async fn missing_commands() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let mut session = session(&config);

        session.build().await;
        session.start().await;
        assert!(session.commands().is_none());
        assert!(!session.is_connected());

        let state = State::Round(initial_state());
        let mut log = Vec::new();
        let action = session.query(&state, &mut Message::default(), &mut log).await;
        assert_eq!(action, Action::Fold);
        assert!(log.is_empty());

        session.stop().await;
    }

    #[tokio::test]
    async fn build_output_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        write_commands(
            &config.players[0].path,
            r#"{"build": ["sh", "-c", "echo building; echo warning >&2"], "run": []}"#,
        );

        let mut session = session(&config);
        session.build().await;
        session.start().await;
        assert!(session.commands().is_some());
        assert!(!session.is_connected());

        session.stop().await;
        let log = std::fs::read_to_string(session.log_path()).unwrap();
        assert!(log.contains("building\n"));
        assert!(log.contains("warning\n"));
    }

    #[tokio::test]
    async fn build_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(&dir);
        config.build_timeout = Duration::from_millis(100);
        write_commands(
            &config.players[0].path,
            r#"{"build": ["sleep", "5"], "run": []}"#,
        );

        let mut session = session(&config);
        let start = Instant::now();
        session.build().await;
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(session.commands().is_some());

        session.stop().await;
        let log = std::fs::read_to_string(session.log_path()).unwrap();
        assert!(log.contains("Timed out waiting for A to build"));
    }

    #[tokio::test]
    async fn run_failures() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);

        for run in [r#"[]"#, r#"["./no-such-bot"]"#] {
            write_commands(
                &config.players[0].path,
                &format!(r#"{{"build": [], "run": {run}}}"#),
            );

            let mut session = session(&config);
            session.build().await;
            session.start().await;
            assert!(session.commands().is_some());
            assert!(!session.is_connected());
            session.stop().await;
        }
    }

    #[tokio::test]
    async fn bot_never_connects() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(&dir);
        config.connect_timeout = Duration::from_millis(200);
        write_commands(
            &config.players[0].path,
            r#"{"build": [], "run": ["sh", "-c", "echo started; exec sleep 5"]}"#,
        );

        let mut session = session(&config);
        session.build().await;
        session.start().await;
        assert!(!session.is_connected());

        let state = State::Round(initial_state());
        let mut log = Vec::new();
        let action = session.query(&state, &mut Message::default(), &mut log).await;
        assert_eq!(action, Action::Fold);
        assert!(log.is_empty());

        // The bot doesn't quit and it is killed.
        let start = Instant::now();
        session.stop().await;
        assert!(start.elapsed() < Duration::from_secs(5));

        let log = std::fs::read_to_string(session.log_path()).unwrap();
        assert!(log.contains("started"));
    }
}
