// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Stack Action Value Object
//!
//! The control-flow language spoken between processing modules and the
//! dispatcher. Each module resolves to one action which the stack engine
//! interprets:
//!
//! - **`next`** - continue with the following module
//! - **`stop`** - abort processing of the request (no finish hooks fire)
//! - **`finish`** - processing is complete (terminal success)
//! - **`return`** - return from the current stack to the caller
//! - **`jump <stack>`** - transfer control to another named stack
//!
//! ## Serialization
//!
//! Actions serialize textually in stack definition files, exactly as listed
//! above. The JSON round-trip is identity for all five forms. A `ModuleDef`
//! that omits an action gets the default, `next`.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::EventError;

/// Control-flow outcome returned by a module to the stack engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StackAction {
    /// Continue with the next module
    #[default]
    Next,
    /// Abort processing of this request
    Stop,
    /// Processing is complete
    Finish,
    /// Return from the current stack
    Return,
    /// Transfer control to the named stack
    Jump(String),
}

impl StackAction {
    /// True for actions that end a request successfully at dispatcher level.
    ///
    /// `Next` falling off the end of the main stack, `Finish`, and `Return`
    /// are all terminal successes; only `Stop` aborts. `Jump` never surfaces
    /// to the dispatcher.
    pub fn is_terminal_success(&self) -> bool {
        matches!(self, StackAction::Next | StackAction::Finish | StackAction::Return)
    }
}

impl fmt::Display for StackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackAction::Next => write!(f, "next"),
            StackAction::Stop => write!(f, "stop"),
            StackAction::Finish => write!(f, "finish"),
            StackAction::Return => write!(f, "return"),
            StackAction::Jump(label) => write!(f, "jump {}", label),
        }
    }
}

impl FromStr for StackAction {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "next" => return Ok(StackAction::Next),
            "stop" => return Ok(StackAction::Stop),
            "finish" => return Ok(StackAction::Finish),
            "return" => return Ok(StackAction::Return),
            _ => {}
        }
        let parts: Vec<&str> = s.split(' ').collect();
        if parts.len() == 2 && parts[0] == "jump" && !parts[1].is_empty() {
            return Ok(StackAction::Jump(parts[1].to_string()));
        }
        Err(EventError::validation_error(format!("cannot parse action '{}'", s)))
    }
}

impl Serialize for StackAction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for StackAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip_identity() {
        let actions = [
            StackAction::Next,
            StackAction::Stop,
            StackAction::Finish,
            StackAction::Return,
            StackAction::Jump("aux".to_string()),
        ];
        for action in actions {
            let json = serde_json::to_string(&action).unwrap();
            let back: StackAction = serde_json::from_str(&json).unwrap();
            assert_eq!(back, action);
        }
    }

    #[test]
    fn test_textual_forms() {
        assert_eq!(serde_json::to_string(&StackAction::Next).unwrap(), r#""next""#);
        assert_eq!(
            serde_json::to_string(&StackAction::Jump("aux".into())).unwrap(),
            r#""jump aux""#
        );
    }

    #[test]
    fn test_parse_rejects_malformed_jump() {
        assert!("jump".parse::<StackAction>().is_err());
        assert!("jump ".parse::<StackAction>().is_err());
        assert!("jump a b".parse::<StackAction>().is_err());
        assert!("leap aux".parse::<StackAction>().is_err());
    }

    #[test]
    fn test_default_is_next() {
        assert_eq!(StackAction::default(), StackAction::Next);
    }

    #[test]
    fn test_terminal_success() {
        assert!(StackAction::Next.is_terminal_success());
        assert!(StackAction::Finish.is_terminal_success());
        assert!(StackAction::Return.is_terminal_success());
        assert!(!StackAction::Stop.is_terminal_success());
        assert!(!StackAction::Jump("x".into()).is_terminal_success());
    }
}
