// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Stack Definitions
//!
//! Declarative JSON form of the stack graph. A stack file is an array of
//! [`StackDef`]:
//!
//! ```json
//! [{"name":"main","modules":[
//!   {"name":"m1",
//!    "filters":[{"class":"basicexpr","args":["level",">=","high"]}],
//!    "plugins":[{"class":"archiver","args":["archive-svc"]}],
//!    "onsuccess":"next","onerror":"stop"}
//! ]}]
//! ```
//!
//! Omitted `onsuccess`/`onerror` actions default to `next`. The `class` of
//! every filter and plugin item must be known to the plugin registry when
//! the builder runs.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use event_pipeline_domain::{EventError, StackAction};

/// Declarative configuration of one stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackDef {
    pub name: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<ModuleDef>,
}

/// Declarative configuration of one module within a stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<ItemDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<ItemDef>,
    #[serde(rename = "onsuccess", default)]
    pub on_success: StackAction,
    #[serde(rename = "onerror", default)]
    pub on_error: StackAction,
    #[serde(default)]
    pub disabled: bool,
}

/// Generic configuration item for filters and plugins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub class: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub opts: HashMap<String, Value>,
}

/// Reads stack definitions from a JSON array file.
pub fn defs_from_file(path: impl AsRef<Path>) -> Result<Vec<StackDef>, EventError> {
    let path = path.as_ref();
    let bytes = fs::read(path)
        .map_err(|err| EventError::io_error(format!("opening file '{}': {}", path.display(), err)))?;
    serde_json::from_slice(&bytes).map_err(|err| {
        EventError::SerializationError(format!(
            "unmarshalling stacks from json file '{}': {}",
            path.display(),
            err
        ))
    })
}

/// Reads stack definitions from every `*.json` file in a directory, in
/// lexical order.
pub fn defs_from_dir(path: impl AsRef<Path>) -> Result<Vec<StackDef>, EventError> {
    let path = path.as_ref();
    let entries = fs::read_dir(path)
        .map_err(|err| EventError::io_error(format!("reading dir '{}': {}", path.display(), err)))?;
    let mut files: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    let mut defs = Vec::new();
    for file in files {
        defs.extend(defs_from_file(&file)?);
    }
    Ok(defs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stack_file_form() {
        let json = r#"[{"name":"main","modules":[
            {"name":"m1",
             "filters":[{"class":"basicexpr","args":["level",">=","high"]}],
             "plugins":[{"class":"archiver","args":["archive-svc"]}],
             "onsuccess":"next","onerror":"stop"}
        ]}]"#;
        let defs: Vec<StackDef> = serde_json::from_str(json).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "main");
        let module = &defs[0].modules[0];
        assert_eq!(module.filters[0].class, "basicexpr");
        assert_eq!(module.on_success, StackAction::Next);
        assert_eq!(module.on_error, StackAction::Stop);
    }

    #[test]
    fn test_omitted_actions_default_to_next() {
        let json = r#"[{"name":"main","modules":[{"name":"m1"}]}]"#;
        let defs: Vec<StackDef> = serde_json::from_str(json).unwrap();
        let module = &defs[0].modules[0];
        assert_eq!(module.on_success, StackAction::Next);
        assert_eq!(module.on_error, StackAction::Next);
        assert!(!module.disabled);
    }

    #[test]
    fn test_jump_action_in_file() {
        let json = r#"[{"name":"main","modules":[{"name":"m1","onsuccess":"jump aux"}]}]"#;
        let defs: Vec<StackDef> = serde_json::from_str(json).unwrap();
        assert_eq!(defs[0].modules[0].on_success, StackAction::Jump("aux".to_string()));
    }
}
