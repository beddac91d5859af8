// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Stack Builder
//!
//! Resolves declarative stack definitions into executable stacks using the
//! registered filter and plugin builders.
//!
//! ## Build Algorithm
//!
//! For each [`StackDef`]:
//!
//! 1. Reject empty, duplicate, and disabled stack names
//! 2. Create an empty stack
//! 3. For each module definition (skipping disabled, rejecting empty or
//!    within-stack duplicate names): resolve every filter and plugin class
//!    through the registry and invoke its builder
//! 4. Store the finished stack in the builder's map
//!
//! Any error aborts construction and propagates; partially constructed
//! stacks are discarded.
//!
//! ## Plugin Lifecycle
//!
//! Plugins may register startup and shutdown callbacks during construction
//! (a shared JSON file plugin opens its output once at startup, not per
//! module). [`StackBuilder::start`] runs startup callbacks in registration
//! order and stops at the first error; [`StackBuilder::shutdown`] runs every
//! shutdown callback and reports the last error.
//!
//! ## Path Resolution
//!
//! `cert_path`, `data_path`, and `cache_path` return the name unchanged when
//! absolute, otherwise they prepend the corresponding configured root.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, info};

use event_pipeline_domain::EventError;

use crate::application::services::stack::{Module, Stack};
use crate::infrastructure::builder::registry::PluginRegistry;
use crate::infrastructure::config::stack_config::{ModuleDef, StackDef};
use crate::infrastructure::services::registry::{ApiService, ServiceDiscovery};

/// Deferred plugin lifecycle action, run once by `start` or `shutdown`.
pub type LifecycleCallback = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), EventError>> + Send>;

/// Path roots for builder path resolution.
#[derive(Debug, Clone, Default)]
pub struct StackBuilderOptions {
    pub certs_dir: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
}

/// Builds executable stacks from declarative definitions.
pub struct StackBuilder {
    services: Arc<dyn ServiceDiscovery>,
    registry: Arc<PluginRegistry>,
    options: StackBuilderOptions,
    stacks: HashMap<String, Arc<Stack>>,
    startup: Vec<LifecycleCallback>,
    shutdown: Vec<LifecycleCallback>,
}

impl StackBuilder {
    /// Creates a builder over a service discovery and a plugin registry
    pub fn new(
        services: Arc<dyn ServiceDiscovery>,
        registry: Arc<PluginRegistry>,
        options: StackBuilderOptions,
    ) -> Self {
        Self {
            services,
            registry,
            options,
            stacks: HashMap::new(),
            startup: Vec::new(),
            shutdown: Vec::new(),
        }
    }

    /// Builds one stack and stores it under its name.
    pub fn build(&mut self, def: &StackDef) -> Result<Arc<Stack>, EventError> {
        if def.name.is_empty() {
            return Err(EventError::build_error("stack name empty"));
        }
        if def.disabled {
            return Err(EventError::build_error(format!("stack '{}' is disabled", def.name)));
        }
        if self.stacks.contains_key(&def.name) {
            return Err(EventError::build_error(format!("stack name '{}' exists", def.name)));
        }

        let mut stack = Stack::new(&def.name);
        let mut names = HashSet::new();
        for module_def in &def.modules {
            if module_def.name.is_empty() {
                return Err(EventError::build_error("module name empty"));
            }
            if module_def.disabled {
                continue;
            }
            if !names.insert(module_def.name.clone()) {
                return Err(EventError::build_error(format!(
                    "module name '{}' duplicated",
                    module_def.name
                )));
            }
            let module = self.build_module(module_def).map_err(|err| {
                EventError::build_error(format!("building module '{}': {}", module_def.name, err))
            })?;
            stack.add(module);
        }

        let stack = Arc::new(stack);
        self.stacks.insert(def.name.clone(), Arc::clone(&stack));
        Ok(stack)
    }

    /// Builds every non-disabled stack in a definition list.
    pub fn build_all(&mut self, defs: &[StackDef]) -> Result<(), EventError> {
        for def in defs {
            if def.disabled {
                debug!(stack = %def.name, "skipping disabled stack");
                continue;
            }
            self.build(def)?;
        }
        Ok(())
    }

    fn build_module(&mut self, def: &ModuleDef) -> Result<Module, EventError> {
        let registry = Arc::clone(&self.registry);

        let mut module = Module::new(&def.name)
            .on_success(def.on_success.clone())
            .on_error(def.on_error.clone());
        for item in &def.filters {
            let builder = registry
                .filter(&item.class)
                .ok_or_else(|| EventError::build_error(format!("filter builder for '{}' not found", item.class)))?;
            module.filters.push(builder(self, item)?);
        }
        for item in &def.plugins {
            let builder = registry
                .plugin(&item.class)
                .ok_or_else(|| EventError::build_error(format!("plugin builder for '{}' not found", item.class)))?;
            module.plugins.push(builder(self, item)?);
        }
        Ok(module)
    }

    /// Checks the built graph: the entry stack must exist.
    pub fn validate(&self, main: &str) -> Result<(), EventError> {
        if !self.stacks.contains_key(main) {
            return Err(EventError::build_error(format!("main stack '{}' not found", main)));
        }
        Ok(())
    }

    /// Returns the stack with the given name, when built
    pub fn stack(&self, name: &str) -> Option<Arc<Stack>> {
        self.stacks.get(name).cloned()
    }

    /// Names of the stacks built so far
    pub fn names(&self) -> Vec<String> {
        self.stacks.keys().cloned().collect()
    }

    /// Every stack built so far
    pub fn all_stacks(&self) -> Vec<Arc<Stack>> {
        self.stacks.values().cloned().collect()
    }

    /// Looks a service up in the discovery registry
    pub fn service(&self, id: &str) -> Option<ApiService> {
        self.services.get_service(id)
    }

    /// Resolves a certificate path against the certs root
    pub fn cert_path(&self, name: &str) -> PathBuf {
        resolve(self.options.certs_dir.as_deref(), name)
    }

    /// Resolves a data path against the data root
    pub fn data_path(&self, name: &str) -> PathBuf {
        resolve(self.options.data_dir.as_deref(), name)
    }

    /// Resolves a cache path against the cache root
    pub fn cache_path(&self, name: &str) -> PathBuf {
        resolve(self.options.cache_dir.as_deref(), name)
    }

    /// Registers a callback run during startup
    pub fn on_startup(&mut self, callback: LifecycleCallback) {
        self.startup.push(callback);
    }

    /// Registers a callback run during shutdown
    pub fn on_shutdown(&mut self, callback: LifecycleCallback) {
        self.shutdown.push(callback);
    }

    /// Runs the registered startup callbacks, stopping at the first error.
    pub async fn start(&mut self) -> Result<(), EventError> {
        info!("starting stack-builder registered services");
        for callback in self.startup.drain(..) {
            callback().await?;
        }
        Ok(())
    }

    /// Runs every registered shutdown callback, reporting the last error.
    pub async fn shutdown(&mut self) -> Result<(), EventError> {
        info!("shutting down stack-builder registered services");
        let mut result = Ok(());
        for callback in self.shutdown.drain(..) {
            if let Err(err) = callback().await {
                result = Err(err);
            }
        }
        result
    }
}

fn resolve(root: Option<&Path>, name: &str) -> PathBuf {
    let path = Path::new(name);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match root {
        Some(root) => root.join(path),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::stack_config::ItemDef;
    use crate::infrastructure::services::registry::ServiceRegistry;
    use event_pipeline_domain::StackAction;

    fn empty_builder(registry: PluginRegistry) -> StackBuilder {
        StackBuilder::new(
            Arc::new(ServiceRegistry::new()),
            Arc::new(registry),
            StackBuilderOptions::default(),
        )
    }

    fn stack_def(name: &str, modules: Vec<ModuleDef>) -> StackDef {
        StackDef {
            name: name.to_string(),
            disabled: false,
            modules,
        }
    }

    fn module_def(name: &str) -> ModuleDef {
        ModuleDef {
            name: name.to_string(),
            filters: Vec::new(),
            plugins: Vec::new(),
            on_success: StackAction::Next,
            on_error: StackAction::Next,
            disabled: false,
        }
    }

    #[test]
    fn test_build_and_lookup() {
        let mut builder = empty_builder(PluginRegistry::new());
        builder
            .build(&stack_def("main", vec![module_def("m1"), module_def("m2")]))
            .unwrap();

        assert!(builder.stack("main").is_some());
        assert_eq!(builder.stack("main").unwrap().len(), 2);
        assert!(builder.validate("main").is_ok());
        assert!(builder.validate("other").is_err());
    }

    #[test]
    fn test_duplicate_stack_rejected() {
        let mut builder = empty_builder(PluginRegistry::new());
        builder.build(&stack_def("main", Vec::new())).unwrap();
        assert!(builder.build(&stack_def("main", Vec::new())).is_err());
    }

    #[test]
    fn test_duplicate_module_rejected() {
        let mut builder = empty_builder(PluginRegistry::new());
        let def = stack_def("main", vec![module_def("m1"), module_def("m1")]);
        let err = builder.build(&def).unwrap_err();
        assert!(err.to_string().contains("duplicated"));
    }

    #[test]
    fn test_disabled_module_skipped() {
        let mut builder = empty_builder(PluginRegistry::new());
        let mut disabled = module_def("off");
        disabled.disabled = true;
        let stack = builder
            .build(&stack_def("main", vec![module_def("m1"), disabled]))
            .unwrap();
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_unknown_class_rejected() {
        let mut builder = empty_builder(PluginRegistry::new());
        let mut module = module_def("m1");
        module.filters.push(ItemDef {
            class: "nope".to_string(),
            args: Vec::new(),
            opts: Default::default(),
        });
        let err = builder.build(&stack_def("main", vec![module])).unwrap_err();
        assert!(err.to_string().contains("'nope' not found"));
        // failed construction leaves no partial stack behind
        assert!(builder.stack("main").is_none());
    }

    #[test]
    fn test_build_all_skips_disabled_stacks() {
        let mut builder = empty_builder(PluginRegistry::new());
        let mut off = stack_def("off", Vec::new());
        off.disabled = true;
        builder
            .build_all(&[stack_def("main", Vec::new()), off])
            .unwrap();
        assert!(builder.stack("main").is_some());
        assert!(builder.stack("off").is_none());
    }

    #[test]
    fn test_path_resolution() {
        let builder = StackBuilder::new(
            Arc::new(ServiceRegistry::new()),
            Arc::new(PluginRegistry::new()),
            StackBuilderOptions {
                certs_dir: Some(PathBuf::from("/etc/certs")),
                data_dir: Some(PathBuf::from("/var/data")),
                cache_dir: None,
            },
        );
        assert_eq!(builder.cert_path("svc.pem"), PathBuf::from("/etc/certs/svc.pem"));
        assert_eq!(builder.data_path("/abs/out.json"), PathBuf::from("/abs/out.json"));
        assert_eq!(builder.cache_path("tmp.bin"), PathBuf::from("tmp.bin"));
    }
}
