// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Stack Execution Engine
//!
//! The control-flow core of the processor. A stack is an ordered sequence of
//! modules; a module is a filter-guarded block of action plugins with two
//! outcome actions. For each module the engine:
//!
//! 1. Appends `"<stack>.<module>"` to the request's trace
//! 2. Fires `before_module` hooks
//! 3. Evaluates filters in order, short-circuiting on the first `false`
//! 4. When all filters pass: runs plugins in order; the first plugin error
//!    logs a warning and resolves the module to its `onError` action,
//!    otherwise the module resolves to `onSuccess`. When a filter rejected,
//!    the module resolves to `next` without running plugins
//! 5. Fires `after_module` hooks
//! 6. Resolves `jump` actions: an autoreference, a jump to a stack already
//!    on the active jump path, or a jump to an unknown stack each degrade to
//!    `stop` with an error log; otherwise control recurses into the target
//!    stack
//! 7. Any action other than `next` ends the stack
//!
//! A `next` returned by a jumped stack continues the *calling* stack at the
//! module after the jump site; the jump site is not re-evaluated.
//!
//! ## Concurrency
//!
//! Stacks and modules are immutable after construction and shared across
//! workers. All per-request mutability lives in the [`Request`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use tracing::{error, warn};

use event_pipeline_domain::{Event, EventError, StackAction};

use crate::application::services::hooks::HooksRunner;
use crate::application::services::processor::Request;

/// Pure predicate over an event.
///
/// Filters must not retain references to the event, must not panic, and
/// must complete quickly; they run synchronously inside the worker.
pub trait EventFilter: Send + Sync {
    fn matches(&self, event: &Event) -> bool;
}

/// Side-effecting action over an event.
///
/// Plugins may mutate the event in place and may perform I/O. A returned
/// error resolves the enclosing module to its `onError` action; it never
/// bubbles past the stack engine.
#[async_trait]
pub trait EventPlugin: Send + Sync {
    async fn apply(&self, event: &mut Event) -> Result<(), EventError>;
}

/// A filter-guarded block of action plugins with two outcome actions.
pub struct Module {
    /// Name of the module, unique within its stack
    pub name: String,
    /// Evaluated in order before the plugins; the first returning false
    /// skips the plugins and resolves the module to `next`
    pub filters: Vec<Arc<dyn EventFilter>>,
    /// Executed in order when every filter passes
    pub plugins: Vec<Arc<dyn EventPlugin>>,
    /// Resolved when all filters pass and no plugin errors
    pub on_success: StackAction,
    /// Resolved on the first plugin error
    pub on_error: StackAction,
}

impl Module {
    /// Creates a module with no filters or plugins and default actions
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filters: Vec::new(),
            plugins: Vec::new(),
            on_success: StackAction::Next,
            on_error: StackAction::Next,
        }
    }

    /// Adds a filter
    pub fn with_filter(mut self, filter: Arc<dyn EventFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Adds a plugin
    pub fn with_plugin(mut self, plugin: Arc<dyn EventPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Sets the success action
    pub fn on_success(mut self, action: StackAction) -> Self {
        self.on_success = action;
        self
    }

    /// Sets the error action
    pub fn on_error(mut self, action: StackAction) -> Self {
        self.on_error = action;
        self
    }
}

/// Shared read-only state the stack engine needs while processing: the
/// jump-target stack graph and the hook runner.
pub(crate) struct ProcessContext {
    pub(crate) stacks: HashMap<String, Arc<Stack>>,
    pub(crate) hooks: HooksRunner,
}

/// An ordered, named sequence of modules.
///
/// Constructed once by the stack builder and immutable during processing.
pub struct Stack {
    name: String,
    modules: Vec<Module>,
}

impl std::fmt::Debug for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stack")
            .field("name", &self.name)
            .field("modules", &self.modules.len())
            .finish()
    }
}

impl Stack {
    /// Creates an empty stack
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modules: Vec::new(),
        }
    }

    /// Name of the stack
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a module
    pub fn add(&mut self, module: Module) {
        self.modules.push(module);
    }

    /// Number of modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// True when the stack has no modules
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Runs the request through this stack's modules.
    ///
    /// Returns the resolved action together with the index of the last
    /// module executed. Boxed because cross-stack jumps recurse.
    pub(crate) fn process<'a>(
        &'a self,
        ctx: &'a ProcessContext,
        request: &'a mut Request,
    ) -> BoxFuture<'a, (StackAction, usize)> {
        async move {
            let mut last = 0;
            for (index, module) in self.modules.iter().enumerate() {
                last = index;
                request.stack_trace.push(format!("{}.{}", self.name, module.name));
                ctx.hooks.before_module(request);

                let mut status = StackAction::Next;
                let mut apply = true;
                for filter in &module.filters {
                    apply = filter.matches(&request.event);
                    if !apply {
                        break; // stop filtering
                    }
                }
                if apply {
                    status = module.on_success.clone();
                    for (plugin_index, plugin) in module.plugins.iter().enumerate() {
                        if let Err(err) = plugin.apply(&mut request.event).await {
                            warn!(
                                trace = ?request.stack_trace,
                                plugin = plugin_index,
                                %err,
                                "plugin execution failed"
                            );
                            status = module.on_error.clone();
                            break; // stop exec
                        }
                    }
                }
                ctx.hooks.after_module(request);

                // resolve jumps before deciding the module outcome
                loop {
                    let label = match &status {
                        StackAction::Jump(label) => label.clone(),
                        _ => break,
                    };
                    if label == self.name {
                        error!(
                            stack = %self.name,
                            trace = ?request.stack_trace,
                            "jump autoreference"
                        );
                        status = StackAction::Stop;
                        break;
                    }
                    if request.jumps.contains(&label) {
                        error!(
                            stack = %self.name,
                            jump = %label,
                            trace = ?request.stack_trace,
                            "jump loop detected"
                        );
                        status = StackAction::Stop;
                        break;
                    }
                    let target = match ctx.stacks.get(&label) {
                        Some(target) => Arc::clone(target),
                        None => {
                            error!(
                                jump = %label,
                                trace = ?request.stack_trace,
                                "jump target stack not found"
                            );
                            status = StackAction::Stop;
                            break;
                        }
                    };
                    request.jumps.push(self.name.clone());
                    let (jumped_status, _) = target.process(ctx, request).await;
                    request.jumps.pop();
                    status = jumped_status;
                }

                if status != StackAction::Next {
                    return (status, last);
                }
            }
            (StackAction::Next, last)
        }
        .boxed()
    }
}
