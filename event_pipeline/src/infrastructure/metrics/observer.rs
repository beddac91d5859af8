// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics Observer
//!
//! Bridges the hook system into the metrics service. Registration happens
//! before the processor starts:
//!
//! - `before_proc` increments the in-flight gauge
//! - `after_proc` decrements it, counts the event, and observes the
//!   processing duration
//! - `finish_proc` counts successful terminal actions
//!
//! Hook callbacks run synchronously in the worker; everything here is a
//! couple of atomic operations.

use std::sync::Arc;

use crate::application::services::hooks::Hooks;
use crate::infrastructure::metrics::service::MetricsService;

/// Installs metrics collection over a processor's hooks.
pub struct MetricsObserver {
    service: Arc<MetricsService>,
}

impl MetricsObserver {
    /// Creates an observer over a metrics service
    pub fn new(service: Arc<MetricsService>) -> Self {
        Self { service }
    }

    /// Registers the observer's callbacks into a hook set.
    pub fn register(&self, hooks: &mut Hooks) {
        let service = Arc::clone(&self.service);
        hooks.before_proc(Box::new(move |_request| {
            service.record_started();
        }));

        let service = Arc::clone(&self.service);
        hooks.after_proc(Box::new(move |request| {
            let seconds = match (request.started, request.finished) {
                (Some(started), Some(finished)) => (finished - started)
                    .to_std()
                    .map(|d| d.as_secs_f64())
                    .unwrap_or(0.0),
                _ => 0.0,
            };
            service.record_processed(seconds);
        }));

        let service = Arc::clone(&self.service);
        hooks.finish_proc(Box::new(move |_request| {
            service.record_finished();
        }));
    }
}
