// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Processor Configuration
//!
//! TOML configuration for the daemon and the producer tool:
//!
//! ```toml
//! [stack]
//! files = ["stacks.json"]
//! dirs = ["/etc/event-pipeline/stacks.d"]
//! main = "main"
//!
//! [event_db]
//! files = ["events.json"]
//! dirs = ["/etc/event-pipeline/events.d"]
//!
//! [processor]
//! workers = 16
//! buffer_size = 100
//!
//! [paths]
//! certs_dir = "/etc/event-pipeline/certs"
//! data_dir = "/var/lib/event-pipeline"
//! cache_dir = "/var/cache/event-pipeline"
//! ```
//!
//! Every section is optional except the catalog sources; `validate` enforces
//! the minimum a processor needs to start.

pub mod stack_config;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use event_pipeline_domain::EventError;

fn default_main_stack() -> String {
    "main".to_string()
}

/// Stack graph sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackSources {
    #[serde(default)]
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub dirs: Vec<PathBuf>,
    /// Name of the entry stack
    #[serde(default = "default_main_stack")]
    pub main: String,
}

impl Default for StackSources {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            dirs: Vec::new(),
            main: default_main_stack(),
        }
    }
}

/// Schema catalog sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EventDbSources {
    #[serde(default)]
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub dirs: Vec<PathBuf>,
}

/// Dispatcher tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DispatchSettings {
    /// Worker count; defaults to 4 x detected cores when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    /// Queue capacity; defaults to 100 when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<usize>,
}

/// Path roots handed to the stack builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PathRoots {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certs_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

/// Complete configuration of an event processor instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProcessorConfig {
    #[serde(default)]
    pub stack: StackSources,
    #[serde(default)]
    pub event_db: EventDbSources,
    #[serde(default)]
    pub processor: DispatchSettings,
    #[serde(default)]
    pub paths: PathRoots,
}

impl ProcessorConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EventError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|err| EventError::io_error(format!("opening config '{}': {}", path.display(), err)))?;
        toml::from_str(&text).map_err(|err| {
            EventError::invalid_config(format!("parsing config '{}': {}", path.display(), err))
        })
    }

    /// Checks the minimum required to start a processor.
    pub fn validate(&self) -> Result<(), EventError> {
        if self.event_db.files.is_empty() && self.event_db.dirs.is_empty() {
            return Err(EventError::invalid_config("event_db requires files or dirs"));
        }
        if self.stack.files.is_empty() && self.stack.dirs.is_empty() {
            return Err(EventError::invalid_config("stack requires files or dirs"));
        }
        if self.stack.main.is_empty() {
            return Err(EventError::invalid_config("stack.main must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_text = r#"
            [stack]
            files = ["stacks.json"]
            main = "main"

            [event_db]
            files = ["events.json"]

            [processor]
            workers = 8
            buffer_size = 50

            [paths]
            data_dir = "/var/lib/event-pipeline"
        "#;
        let cfg: ProcessorConfig = toml::from_str(toml_text).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.processor.workers, Some(8));
        assert_eq!(cfg.processor.buffer_size, Some(50));
        assert_eq!(cfg.paths.data_dir.as_deref(), Some(Path::new("/var/lib/event-pipeline")));
        assert_eq!(cfg.stack.main, "main");
    }

    #[test]
    fn test_defaults() {
        let cfg: ProcessorConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.stack.main, "main");
        assert!(cfg.processor.workers.is_none());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_missing_stack_sources_rejected() {
        let cfg: ProcessorConfig = toml::from_str(
            r#"
            [event_db]
            files = ["events.json"]
        "#,
        )
        .unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("stack"));
    }
}
