// Copyright (C) 2025 Vince Vasta
// SPDX-License-Identifier: Apache-2.0

//! Player actions and their wire encoding.
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

use crate::poker::Chips;

/// A player action.
///
/// The raise amount is the total chips the player has committed in the current
/// street after the raise, not the increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Give up the hand.
    Fold,
    /// Match the opponent pip.
    Call,
    /// Pass without betting.
    Check,
    /// Bet or raise to the given pip.
    Raise(Chips),
}

impl Action {
    /// The action kind.
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Fold => ActionKind::Fold,
            Action::Call => ActionKind::Call,
            Action::Check => ActionKind::Check,
            Action::Raise(_) => ActionKind::Raise,
        }
    }
}

/// Encodes an action as sent on the wire: `F`, `C`, `K` or `R<amount>`.
impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Raise(amount) => write!(f, "R{amount}"),
            _ => write!(f, "{}", self.kind().code()),
        }
    }
}

/// Errors decoding an action line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The line is empty.
    #[error("empty action")]
    Empty,
    /// The first character is not an action code.
    #[error("unknown action code {0:?}")]
    UnknownCode(char),
    /// The raise amount is not an integer.
    #[error("invalid raise amount {0:?}")]
    InvalidAmount(String),
}

/// Decodes a bot response line.
///
/// Only the first character is significant for fold, call, and check, a raise
/// must be followed by the amount with no separator.
impl FromStr for Action {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let code = s.chars().next().ok_or(DecodeError::Empty)?;
        match ActionKind::from_code(code).ok_or(DecodeError::UnknownCode(code))? {
            ActionKind::Fold => Ok(Action::Fold),
            ActionKind::Call => Ok(Action::Call),
            ActionKind::Check => Ok(Action::Check),
            ActionKind::Raise => {
                let amount = &s[code.len_utf8()..];
                amount
                    .parse::<u32>()
                    .map(|v| Action::Raise(Chips::new(v)))
                    .map_err(|_| DecodeError::InvalidAmount(amount.to_string()))
            }
        }
    }
}

/// An action without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Fold.
    Fold,
    /// Call.
    Call,
    /// Check.
    Check,
    /// Bet or raise.
    Raise,
}

impl ActionKind {
    /// The wire code for this action.
    pub fn code(self) -> char {
        match self {
            ActionKind::Fold => 'F',
            ActionKind::Call => 'C',
            ActionKind::Check => 'K',
            ActionKind::Raise => 'R',
        }
    }

    /// The action for a wire code.
    pub fn from_code(code: char) -> Option<ActionKind> {
        match code {
            'F' => Some(ActionKind::Fold),
            'C' => Some(ActionKind::Call),
            'K' => Some(ActionKind::Check),
            'R' => Some(ActionKind::Raise),
            _ => None,
        }
    }

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Fold => "Fold",
            ActionKind::Call => "Call",
            ActionKind::Check => "Check",
            ActionKind::Raise => "Raise",
        };

        write!(f, "{name}")
    }
}

/// A set of legal action kinds.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct LegalActions(u8);

impl LegalActions {
    /// Check is the only legal action, used for round end notifications.
    pub const CHECK_ONLY: LegalActions = LegalActions(1 << ActionKind::Check as u8);

    /// Creates a set from action kinds.
    pub fn new(kinds: &[ActionKind]) -> Self {
        Self(kinds.iter().fold(0, |acc, k| acc | k.bit()))
    }

    /// Checks if the set contains an action kind.
    pub fn contains(&self, kind: ActionKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Checks if the action kind of `action` is in the set.
    pub fn allows(&self, action: &Action) -> bool {
        self.contains(action.kind())
    }

    /// The fallback action, check if legal otherwise fold.
    pub fn default_action(&self) -> Action {
        if self.contains(ActionKind::Check) {
            Action::Check
        } else {
            Action::Fold
        }
    }

    /// Checks if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns an iterator over the kinds in this set.
    pub fn iter(&self) -> impl Iterator<Item = ActionKind> + '_ {
        [
            ActionKind::Fold,
            ActionKind::Call,
            ActionKind::Check,
            ActionKind::Raise,
        ]
        .into_iter()
        .filter(|k| self.contains(*k))
    }
}

impl fmt::Debug for LegalActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_actions() {
        assert_eq!(Action::Fold.to_string(), "F");
        assert_eq!(Action::Call.to_string(), "C");
        assert_eq!(Action::Check.to_string(), "K");
        assert_eq!(Action::Raise(Chips::new(450)).to_string(), "R450");
    }

    #[test]
    fn decode_actions() {
        assert_eq!("F".parse(), Ok(Action::Fold));
        assert_eq!("C\n".parse(), Ok(Action::Call));
        assert_eq!("K".parse(), Ok(Action::Check));
        assert_eq!("R450".parse(), Ok(Action::Raise(Chips::new(450))));

        // Only the first character matters for non raise actions.
        assert_eq!("Kxyz".parse(), Ok(Action::Check));

        assert_eq!("".parse::<Action>(), Err(DecodeError::Empty));
        assert_eq!("  ".parse::<Action>(), Err(DecodeError::Empty));
        assert_eq!("X".parse::<Action>(), Err(DecodeError::UnknownCode('X')));
        assert_eq!("f".parse::<Action>(), Err(DecodeError::UnknownCode('f')));
        assert_eq!(
            "R 450".parse::<Action>(),
            Err(DecodeError::InvalidAmount(" 450".to_string()))
        );
        assert_eq!(
            "R".parse::<Action>(),
            Err(DecodeError::InvalidAmount(String::new()))
        );
        assert_eq!(
            "R-5".parse::<Action>(),
            Err(DecodeError::InvalidAmount("-5".to_string()))
        );
    }

    #[test]
    fn legal_actions_set() {
        let set = LegalActions::new(&[ActionKind::Fold, ActionKind::Call]);
        assert!(set.contains(ActionKind::Fold));
        assert!(set.contains(ActionKind::Call));
        assert!(!set.contains(ActionKind::Check));
        assert!(!set.allows(&Action::Raise(Chips::new(10))));
        assert_eq!(set.default_action(), Action::Fold);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![ActionKind::Fold, ActionKind::Call]
        );

        assert_eq!(LegalActions::CHECK_ONLY.default_action(), Action::Check);
        assert!(LegalActions::default().is_empty());
    }
}
