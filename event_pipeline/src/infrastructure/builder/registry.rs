// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Plugin Registry
//!
//! Named registries of filter and plugin builders. Every `class` referenced
//! in a stack definition file must be registered here before the stack
//! builder runs; an unknown class is a build error.
//!
//! The registry is an explicit value handed to the builder rather than
//! process-global mutable state, so tests and embedders can wire exactly the
//! classes they want. [`PluginRegistry::standard`] wires the well-known
//! classes shipped with this crate.

use std::collections::HashMap;
use std::sync::Arc;

use event_pipeline_domain::EventError;

use crate::application::services::stack::{EventFilter, EventPlugin};
use crate::infrastructure::builder::stack_builder::StackBuilder;
use crate::infrastructure::config::stack_config::ItemDef;
use crate::infrastructure::filters::basic_expr;
use crate::infrastructure::plugins::{archiver, executor, forwarder, json_writer};

/// Constructor for a filter class.
pub type FilterBuilder =
    Box<dyn Fn(&mut StackBuilder, &ItemDef) -> Result<Arc<dyn EventFilter>, EventError> + Send + Sync>;

/// Constructor for a plugin class.
pub type PluginBuilder =
    Box<dyn Fn(&mut StackBuilder, &ItemDef) -> Result<Arc<dyn EventPlugin>, EventError> + Send + Sync>;

/// Class name to builder mappings for filters and plugins.
#[derive(Default)]
pub struct PluginRegistry {
    filters: HashMap<String, FilterBuilder>,
    plugins: HashMap<String, PluginBuilder>,
}

impl PluginRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the well-known classes wired:
    /// `basicexpr`, `archiver`, `forwarder`, `executor`, and `jsonwriter`.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register_filter(basic_expr::BUILD_CLASS, basic_expr::builder());
        registry.register_plugin(archiver::BUILD_CLASS, archiver::builder());
        registry.register_plugin(forwarder::BUILD_CLASS, forwarder::builder());
        registry.register_plugin(executor::BUILD_CLASS, executor::builder());
        registry.register_plugin(json_writer::BUILD_CLASS, json_writer::builder());
        registry
    }

    /// Registers a filter builder for a class name
    pub fn register_filter(&mut self, class: impl Into<String>, builder: FilterBuilder) {
        self.filters.insert(class.into(), builder);
    }

    /// Registers a plugin builder for a class name
    pub fn register_plugin(&mut self, class: impl Into<String>, builder: PluginBuilder) {
        self.plugins.insert(class.into(), builder);
    }

    /// Looks up a filter builder
    pub fn filter(&self, class: &str) -> Option<&FilterBuilder> {
        self.filters.get(class)
    }

    /// Looks up a plugin builder
    pub fn plugin(&self, class: &str) -> Option<&PluginBuilder> {
        self.plugins.get(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_classes_present() {
        let registry = PluginRegistry::standard();
        assert!(registry.filter("basicexpr").is_some());
        for class in ["archiver", "forwarder", "executor", "jsonwriter"] {
            assert!(registry.plugin(class).is_some(), "missing class {}", class);
        }
        assert!(registry.filter("archiver").is_none());
        assert!(registry.plugin("basicexpr").is_none());
    }
}
