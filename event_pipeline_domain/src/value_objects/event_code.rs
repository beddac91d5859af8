// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Event Code Value Object
//!
//! Type-safe numeric identifier for an event class. The code is the key into
//! the schema catalog and the subject of relational filters, so it carries a
//! total order.
//!
//! # Benefits Over Raw Numbers
//!
//! - **Type Safety**: An `EventCode` cannot be confused with other numeric
//!   values travelling through the engine
//! - **Domain Semantics**: Clear intent in signatures and filter expressions
//! - **Serialization**: Transparent numeric representation on the wire

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EventError;

/// Numeric identifier of an event class, resolved through the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct EventCode(u32);

impl EventCode {
    /// Creates a new event code
    pub fn new(code: u32) -> Self {
        Self(code)
    }

    /// Gets the underlying numeric value
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EventCode {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

impl FromStr for EventCode {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>()
            .map(Self)
            .map_err(|_| EventError::validation_error(format!("invalid event code: '{}'", s)))
    }
}
