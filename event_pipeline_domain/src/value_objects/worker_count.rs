// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Worker Count Value Object
//!
//! Validated number of dispatcher workers. Events are mostly I/O-bound while
//! inside plugins (archival RPCs, subprocess execution, file writes), so the
//! default oversubscribes the CPU: four workers per available core. Each
//! blocked plugin occupies one worker; operators size the pool accordingly.
//!
//! # Benefits Over Raw Numbers
//!
//! - **Type Safety**: A `WorkerCount` cannot be confused with buffer sizes or
//!   other numeric configuration
//! - **Bounded**: Enforces minimum and maximum limits for reliable operation
//! - **Resource-Aware**: The default derives from detected parallelism

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EventError;

/// Validated count of dispatcher workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerCount(usize);

impl WorkerCount {
    /// Minimum number of workers
    pub const MIN: usize = 1;
    /// Maximum number of workers
    pub const MAX: usize = 512;

    /// Oversubscription factor applied to detected CPU parallelism
    const CPU_FACTOR: usize = 4;

    /// Creates a worker count, enforcing bounds
    pub fn new(count: usize) -> Result<Self, EventError> {
        if !(Self::MIN..=Self::MAX).contains(&count) {
            return Err(EventError::invalid_config(format!(
                "worker count {} outside valid range {}..={}",
                count,
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(count))
    }

    /// Default worker count for this system: 4 x detected CPU cores
    pub fn default_for_system() -> Self {
        let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self((cores * Self::CPU_FACTOR).clamp(Self::MIN, Self::MAX))
    }

    /// Gets the underlying count
    pub fn value(&self) -> usize {
        self.0
    }
}

impl Default for WorkerCount {
    fn default() -> Self {
        Self::default_for_system()
    }
}

impl fmt::Display for WorkerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<usize> for WorkerCount {
    type Error = EventError;

    fn try_from(count: usize) -> Result<Self, Self::Error> {
        Self::new(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(WorkerCount::new(0).is_err());
        assert!(WorkerCount::new(1).is_ok());
        assert!(WorkerCount::new(WorkerCount::MAX).is_ok());
        assert!(WorkerCount::new(WorkerCount::MAX + 1).is_err());
    }

    #[test]
    fn test_default_within_bounds() {
        let count = WorkerCount::default_for_system();
        assert!((WorkerCount::MIN..=WorkerCount::MAX).contains(&count.value()));
    }

    #[test]
    fn test_default_oversubscribes() {
        let cores = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        let count = WorkerCount::default_for_system();
        assert_eq!(count.value(), (cores * 4).clamp(1, WorkerCount::MAX));
    }
}
