// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Processing Hooks
//!
//! Observability callbacks fired at request and module boundaries. Five
//! families exist:
//!
//! - **`before_proc`** - a worker picked up a request
//! - **`after_proc`** - the main stack finished, regardless of outcome
//! - **`finish_proc`** - the terminal action was a success (`next`, `finish`,
//!   or `return`); never fires for `stop`
//! - **`before_module`** - a module is about to run, after its trace entry is
//!   recorded and before its filters are evaluated (it fires even when every
//!   filter rejects)
//! - **`after_module`** - a module's plugins have run, before jump resolution
//!
//! Hooks are registered before the workers start and the lists are never
//! mutated afterwards, so execution needs no locking. Callbacks run
//! synchronously in the worker: they are intended for metrics and tracing,
//! must not block indefinitely, and must not mutate the event.

use crate::application::services::processor::Request;

/// Callback over an in-flight request.
pub type RequestCallback = Box<dyn Fn(&Request) + Send + Sync>;

/// Ordered hook registrations for a processor.
#[derive(Default)]
pub struct Hooks {
    before_proc: Vec<RequestCallback>,
    after_proc: Vec<RequestCallback>,
    finish_proc: Vec<RequestCallback>,
    before_module: Vec<RequestCallback>,
    after_module: Vec<RequestCallback>,
}

impl Hooks {
    /// Creates an empty hook set
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a callback fired when a worker picks up a request
    pub fn before_proc(&mut self, callback: RequestCallback) {
        self.before_proc.push(callback);
    }

    /// Adds a callback fired when the main stack completes
    pub fn after_proc(&mut self, callback: RequestCallback) {
        self.after_proc.push(callback);
    }

    /// Adds a callback fired only when processing ends successfully
    pub fn finish_proc(&mut self, callback: RequestCallback) {
        self.finish_proc.push(callback);
    }

    /// Adds a callback fired before each module executes
    pub fn before_module(&mut self, callback: RequestCallback) {
        self.before_module.push(callback);
    }

    /// Adds a callback fired after each module executes
    pub fn after_module(&mut self, callback: RequestCallback) {
        self.after_module.push(callback);
    }
}

/// Runs registered hooks in registration order.
///
/// Owned by the processor; shared read-only with the stack engine.
pub(crate) struct HooksRunner {
    hooks: Hooks,
}

impl HooksRunner {
    pub(crate) fn new(hooks: Hooks) -> Self {
        Self { hooks }
    }

    pub(crate) fn before_proc(&self, request: &Request) {
        for callback in &self.hooks.before_proc {
            callback(request);
        }
    }

    pub(crate) fn after_proc(&self, request: &Request) {
        for callback in &self.hooks.after_proc {
            callback(request);
        }
    }

    pub(crate) fn finish_proc(&self, request: &Request) {
        for callback in &self.hooks.finish_proc {
            callback(request);
        }
    }

    pub(crate) fn before_module(&self, request: &Request) {
        for callback in &self.hooks.before_module {
            callback(request);
        }
    }

    pub(crate) fn after_module(&self, request: &Request) {
        for callback in &self.hooks.after_module {
            callback(request);
        }
    }
}
