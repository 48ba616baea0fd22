// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Match transcript and bot messages.
//!
//! The transcript is the human readable log of a match, the messages are the
//! tokens each bot has not seen yet. Both are updated from the round states.
use anyhow::{Result, anyhow};
use std::path::Path;

use headsup_core::{
    action::Action,
    message::{Message, Token},
    poker::join_cards,
    state::{FLOP, PREFLOP, RIVER, RoundState, TURN, TerminalState},
};

/// A match transcript.
#[derive(Debug)]
pub struct Transcript {
    lines: Vec<String>,
    messages: [Message; 2],
}

impl Transcript {
    /// Creates a transcript with the match header.
    pub fn new(names: &[String; 2]) -> Self {
        Self {
            lines: vec![
                format!("Headsup Poker - {} vs {}", names[0], names[1]),
                "---------------------------".to_string(),
            ],
            messages: Default::default(),
        }
    }

    /// The transcript lines.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The message for the bot in `seat` and the transcript lines.
    pub fn split(&mut self, seat: usize) -> (&mut Message, &mut Vec<String>) {
        (&mut self.messages[seat], &mut self.lines)
    }

    /// Logs the start of a round with the players bankrolls.
    pub fn log_round_start(&mut self, round: u32, status: &[(String, i64); 2]) {
        self.lines.push(String::new());
        self.lines.push(format!("Round #{round}{}", format_status(status)));
    }

    /// Logs blinds and hands at the start of a round and the board at the
    /// start of a street.
    pub fn log_round_state(&mut self, names: &[String; 2], state: &RoundState) {
        if state.street() == PREFLOP && state.button() == 0 {
            let rules = state.rules();
            let hands = state.hands();
            self.lines.push(format!("{} posts the blind of {}", names[0], rules.small_blind));
            self.lines.push(format!("{} posts the blind of {}", names[1], rules.big_blind));
            for (name, hand) in names.iter().zip(&hands) {
                self.lines.push(format!("{name} dealt {}", join_cards(hand, " ")));
            }

            self.messages = [0, 1].map(|seat| Message::new_round(seat, hands[seat]));
        } else if state.street() > PREFLOP && state.button() == 1 {
            let board = state.board();
            let contributions = state.contributions();
            self.lines.push(format!(
                "{} {}, {} ({}), {} ({})",
                street_name(state.street()),
                join_cards(&board, " "),
                names[0],
                contributions[0],
                names[1],
                contributions[1],
            ));

            for msg in &mut self.messages {
                msg.push(Token::Board(board.clone()));
            }
        }
    }

    /// Logs a player action, a raise when no chips are in the street is a bet.
    pub fn log_action(&mut self, name: &str, action: Action, is_bet: bool) {
        let phrase = match action {
            Action::Fold => "folds".to_string(),
            Action::Call => "calls".to_string(),
            Action::Check => "checks".to_string(),
            Action::Raise(amount) if is_bet => format!("bets {amount}"),
            Action::Raise(amount) => format!("raises to {amount}"),
        };

        self.lines.push(format!("{name} {phrase}"));
        for msg in &mut self.messages {
            msg.push(Token::Action(action));
        }
    }

    /// Logs the hands at showdown and the chips won by each player.
    pub fn log_terminal_state(&mut self, names: &[String; 2], state: &TerminalState) {
        if state.showdown_reached() {
            let hands = state.previous.hands();
            for (name, hand) in names.iter().zip(&hands) {
                self.lines.push(format!("{name} shows {}", join_cards(hand, " ")));
            }

            self.messages[0].push(Token::Opponent(hands[1]));
            self.messages[1].push(Token::Opponent(hands[0]));
        }

        for ((name, delta), msg) in names.iter().zip(state.deltas).zip(&mut self.messages) {
            self.lines.push(format!("{name} awarded {delta}"));
            msg.push(Token::Delta(delta));
        }
    }

    /// Logs the final bankrolls.
    pub fn log_final(&mut self, status: &[(String, i64); 2]) {
        self.lines.push(String::new());
        self.lines.push(String::new());
        self.lines.push(format!("Final{}", format_status(status)));
    }

    /// Writes the transcript to a file.
    pub async fn write(&self, path: &Path) -> Result<()> {
        tokio::fs::write(path, self.lines.join("\n"))
            .await
            .map_err(|e| anyhow!("Cannot write {}: {e}", path.display()))
    }
}

fn street_name(street: u8) -> &'static str {
    match street {
        FLOP => "Flop",
        TURN => "Turn",
        RIVER => "River",
        _ => "Preflop",
    }
}

fn format_status(status: &[(String, i64); 2]) -> String {
    status
        .iter()
        .map(|(name, bankroll)| format!(", {name} ({bankroll})"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use headsup_core::{
        poker::{Card, Chips, Deck, Rules},
        state::State,
    };

    fn names() -> [String; 2] {
        ["A".to_string(), "B".to_string()]
    }

    /// A deck that deals `A: Ah Ad`, `B: 2c 7d` and the board `Kh Qs 3d 9c 4s`.
    fn deck() -> Deck {
        let cards = ["Ah", "Ad", "2c", "7d", "Kh", "Qs", "3d", "9c", "4s"]
            .map(|c| c.parse::<Card>().unwrap());
        Deck::from_cards(&cards)
    }

    /// Plays the actions logging everything like a match does.
    fn play(transcript: &mut Transcript, actions: &[Action]) -> TerminalState {
        let names = names();
        let mut state = State::Round(RoundState::new(Rules::default(), deck()));
        for &action in actions {
            let State::Round(round) = &state else {
                panic!("round is over");
            };

            transcript.log_round_state(&names, round);
            let is_bet = round.pips() == [Chips::ZERO; 2];
            transcript.log_action(&names[round.active()], action, is_bet);
            state = state.proceed(action);
        }

        match state {
            State::Terminal(t) => {
                transcript.log_terminal_state(&names, &t);
                t
            }
            State::Round(_) => panic!("round is not over"),
        }
    }

    #[test]
    fn fold_transcript() {
        let mut transcript = Transcript::new(&names());
        transcript.log_round_start(1, &[("A".to_string(), 0), ("B".to_string(), 0)]);
        let t = play(&mut transcript, &[Action::Raise(Chips::new(6)), Action::Fold]);
        assert_eq!(t.deltas, [2, -2]);

        assert_eq!(
            transcript.lines(),
            [
                "Headsup Poker - A vs B",
                "---------------------------",
                "",
                "Round #1, A (0), B (0)",
                "A posts the blind of 1",
                "B posts the blind of 2",
                "A dealt Ah Ad",
                "B dealt 2c 7d",
                "A raises to 6",
                "B folds",
                "A awarded 2",
                "B awarded -2",
            ]
        );

        let (msg, _) = transcript.split(0);
        assert_eq!(msg.take_line(30.0), "T30.000 P0 HAh,Ad R6 F D2");
        let (msg, _) = transcript.split(1);
        assert_eq!(msg.take_line(30.0), "T30.000 P1 H2c,7d R6 F D-2");
    }

    #[test]
    fn showdown_transcript() {
        let mut transcript = Transcript::new(&names());
        let t = play(
            &mut transcript,
            &[
                Action::Call,
                Action::Check,
                // Flop
                Action::Raise(Chips::new(4)),
                Action::Call,
                // Turn
                Action::Check,
                Action::Check,
                // River
                Action::Check,
                Action::Check,
            ],
        );

        assert!(t.showdown_reached());
        assert_eq!(t.deltas, [6, -6]);

        let lines = transcript.lines();
        assert!(lines.contains(&"Flop Kh Qs 3d, A (2), B (2)".to_string()));
        assert!(lines.contains(&"B bets 4".to_string()));
        assert!(lines.contains(&"Turn Kh Qs 3d 9c, A (6), B (6)".to_string()));
        assert!(lines.contains(&"River Kh Qs 3d 9c 4s, A (6), B (6)".to_string()));
        assert!(lines.contains(&"A shows Ah Ad".to_string()));
        assert!(lines.contains(&"B shows 2c 7d".to_string()));
        assert_eq!(lines.last().unwrap(), "B awarded -6");

        let (msg, _) = transcript.split(0);
        assert_eq!(
            msg.take_line(1.5),
            "T1.500 P0 HAh,Ad C K BKh,Qs,3d R4 C BKh,Qs,3d,9c K K BKh,Qs,3d,9c,4s K K O2c,7d D6"
        );
    }

    #[tokio::test]
    async fn write_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gamelog.txt");

        let mut transcript = Transcript::new(&names());
        transcript.log_final(&[("A".to_string(), 10), ("B".to_string(), -10)]);
        transcript.write(&path).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Headsup Poker - A vs B\n"));
        assert!(text.ends_with("\n\n\nFinal, A (10), B (-10)"));
    }
}
