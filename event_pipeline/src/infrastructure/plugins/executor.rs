// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Executor Plugin
//!
//! Runs a subprocess for each event. Args: `[app, argTemplate...]`. Before
//! spawning, any template argument that is exactly a bracketed token is
//! replaced with the corresponding event field:
//!
//! - `[code]`, `[codename]`, `[type]`, `[level]`
//! - `[source.hostname]`, `[source.program]`
//! - `[data.<name>]`
//!
//! An absent field substitutes the empty string. The subprocess runs to
//! completion inside the worker; a spawn failure or a non-success exit
//! status resolves the module to its `onError` action.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use event_pipeline_domain::{Event, EventError};

use crate::application::services::stack::EventPlugin;
use crate::infrastructure::builder::registry::PluginBuilder;
use crate::infrastructure::builder::stack_builder::StackBuilder;
use crate::infrastructure::config::stack_config::ItemDef;

/// Default class name of the component builder
pub const BUILD_CLASS: &str = "executor";

/// Returns the registry builder for the executor plugin
pub fn builder() -> PluginBuilder {
    Box::new(build)
}

fn build(_builder: &mut StackBuilder, def: &ItemDef) -> Result<Arc<dyn EventPlugin>, EventError> {
    debug!(args = ?def.args, "building executor plugin");
    if def.args.is_empty() {
        return Err(EventError::build_error("required arg"));
    }
    let app = def.args[0].clone();
    let args = def.args[1..].to_vec();
    Ok(Arc::new(ExecutorPlugin { app, args }))
}

struct ExecutorPlugin {
    app: String,
    args: Vec<String>,
}

#[async_trait]
impl EventPlugin for ExecutorPlugin {
    async fn apply(&self, event: &mut Event) -> Result<(), EventError> {
        let args: Vec<String> = self.args.iter().map(|arg| expand_arg(arg, event)).collect();
        debug!(app = %self.app, ?args, "exec");
        let status = Command::new(&self.app)
            .args(&args)
            .status()
            .await
            .map_err(|err| EventError::plugin_error(format!("spawning '{}': {}", self.app, err)))?;
        if !status.success() {
            return Err(EventError::plugin_error(format!(
                "'{}' exited with {}",
                self.app, status
            )));
        }
        Ok(())
    }
}

fn expand_arg(arg: &str, event: &Event) -> String {
    match arg.strip_prefix('[').and_then(|inner| inner.strip_suffix(']')) {
        Some(token) => field_value(token, event),
        None => arg.to_string(),
    }
}

fn field_value(field: &str, event: &Event) -> String {
    match field {
        "code" => return event.code.to_string(),
        "codename" => return event.codename.clone(),
        "type" => return event.event_type.to_string(),
        "level" => return event.level.to_string(),
        "source.hostname" => return event.source.hostname.clone(),
        "source.program" => return event.source.program.clone(),
        _ => {}
    }
    if let Some(name) = field.strip_prefix("data.") {
        if !name.contains('.') {
            if let Some(value) = event.data_field(name) {
                return value.to_string();
            }
        }
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_pipeline_domain::{EventCode, EventLevel, EventSource};

    fn sample_event() -> Event {
        let mut event = Event::new(EventCode::new(1234), EventLevel::Medium);
        event.codename = "login_fail".to_string();
        event.source = EventSource::new("node1", "sshguard", "9");
        event.set_data("ip", "10.0.0.1");
        event.set_data("score", 7i64);
        event
    }

    #[test]
    fn test_expand_known_tokens() {
        let event = sample_event();
        assert_eq!(expand_arg("[code]", &event), "1234");
        assert_eq!(expand_arg("[codename]", &event), "login_fail");
        assert_eq!(expand_arg("[type]", &event), "security");
        assert_eq!(expand_arg("[level]", &event), "medium");
        assert_eq!(expand_arg("[source.hostname]", &event), "node1");
        assert_eq!(expand_arg("[source.program]", &event), "sshguard");
        assert_eq!(expand_arg("[data.ip]", &event), "10.0.0.1");
        assert_eq!(expand_arg("[data.score]", &event), "7");
    }

    #[test]
    fn test_unknown_and_plain_args() {
        let event = sample_event();
        assert_eq!(expand_arg("[data.absent]", &event), "");
        assert_eq!(expand_arg("[uptime]", &event), "");
        assert_eq!(expand_arg("--flag", &event), "--flag");
        assert_eq!(expand_arg("[partial", &event), "[partial");
    }

    #[tokio::test]
    async fn test_exec_success_and_failure() {
        let ok = ExecutorPlugin {
            app: "true".to_string(),
            args: Vec::new(),
        };
        let mut event = sample_event();
        ok.apply(&mut event).await.unwrap();

        let fail = ExecutorPlugin {
            app: "false".to_string(),
            args: Vec::new(),
        };
        let err = fail.apply(&mut event).await.unwrap_err();
        assert!(matches!(err, EventError::PluginError(_)));
    }
}
