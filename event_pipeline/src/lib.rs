// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Event Pipeline
//!
//! A security-event processor built with Rust. Events arrive from clients or
//! peer processors, validate against a schema catalog, and flow through a
//! programmable pipeline of filters and side-effecting action plugins
//! (archive, forward, exec, write to file) composed from declarative JSON.
//!
//! ## Architecture Overview
//!
//! The workspace follows the same layering as the rest of our services:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Application Layer                          │
//! │  (Processor, Stack Engine, Hooks)                           │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Domain Layer                             │
//! │  (Event, Catalog, StackAction, Capability Traits)           │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Infrastructure Layer                         │
//! │  (Builder, Registries, Plugins, Filters, Config, Metrics)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Core Concepts
//!
//! ### Stacks and Modules
//! A stack is an ordered, named sequence of modules; a module is a
//! filter-guarded block of action plugins with two outcome actions
//! (`onsuccess`, `onerror`). Modules speak a small control-flow language to
//! the dispatcher: `next`, `stop`, `finish`, `return`, and `jump <stack>`
//! with loop detection.
//!
//! ### The Processor
//! The dispatcher owns a bounded request queue and a static worker pool.
//! Ingress validates and enriches events against the schema catalog before
//! anything enqueues; backpressure falls on producers when the queue fills.
//!
//! ### Plugins
//! Everything side-effecting is a plugin behind a registry: archival,
//! forwarding to peer processors, subprocess execution with event-derived
//! arguments, and shared JSON file output. Filters are pure predicates; the
//! `basicexpr` class covers the common field comparisons.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use event_pipeline::application::services::{Processor, ProcessorOptions};
//! use event_pipeline::infrastructure::builder::{PluginRegistry, StackBuilder, StackBuilderOptions};
//! use event_pipeline::infrastructure::config::stack_config::defs_from_file;
//! use event_pipeline::infrastructure::services::registry::ServiceRegistry;
//! use event_pipeline_domain::{load_database, Event, EventCode, EventLevel};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let db = Arc::new(load_database(&["events.json"], &[] as &[&str])?);
//! let mut builder = StackBuilder::new(
//!     Arc::new(ServiceRegistry::new()),
//!     Arc::new(PluginRegistry::standard()),
//!     StackBuilderOptions::default(),
//! );
//! builder.build_all(&defs_from_file("stacks.json")?)?;
//! builder.validate("main")?;
//! builder.start().await?;
//!
//! let main = builder.stack("main").expect("validated");
//! let others = builder.all_stacks();
//! let processor = Processor::new(main, others, db, ProcessorOptions::default());
//!
//! let id = processor
//!     .notify_event(None, Event::new(EventCode::new(1000), EventLevel::Info))
//!     .await?;
//! println!("accepted {id}");
//!
//! processor.close().await;
//! builder.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod infrastructure;

pub use application::services::{
    EventFilter, EventPlugin, Hooks, Module, Processor, ProcessorOptions, Request, Stack,
};
pub use infrastructure::builder::{PluginRegistry, StackBuilder, StackBuilderOptions};
