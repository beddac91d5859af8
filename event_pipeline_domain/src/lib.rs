// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Event Pipeline Domain
//!
//! The event pipeline domain represents the core business logic and rules of
//! the security event processing system. It implements Domain-Driven Design
//! (DDD) patterns and is completely independent of external concerns like
//! transports, file systems, or process management.
//!
//! ## Core Concepts
//!
//! ### Events
//! A security event is a typed, structured record flowing through the
//! processor. Every event carries a numeric code resolving to a catalog
//! entry, an ordered severity level, a source identity, a free-form data
//! map of scalar values, and the audit trail of processors that have
//! handled it.
//!
//! ### Schema Catalog
//! The catalog maps event codes to definitions: required data fields and
//! their types, a description template, a symbolic codename, and tags.
//! Validation and enrichment of incoming events live here so that the
//! processing engine stays oblivious to domain schema.
//!
//! ### Stack Actions
//! Processing modules communicate with the dispatcher through a small
//! control-flow language: `next`, `stop`, `finish`, `return`, and
//! `jump <stack>`. The `StackAction` value object carries that language and
//! its textual serialization.
//!
//! ## Module Structure
//!
//! - [`entities`] - The event record and its constituent parts
//! - [`value_objects`] - `EventCode`, `StackAction`, `WorkerCount`
//! - [`catalog`] - Event definitions, validation, enrichment, and loading
//! - [`services`] - Capability and ingress trait seams
//! - [`error`] - The domain error type
//!
//! ## Layering
//!
//! This crate sits below the engine crate (`event-pipeline`), which owns
//! orchestration, plugins, and infrastructure. Nothing here performs I/O
//! beyond reading catalog definition files.

pub mod catalog;
pub mod entities;
pub mod error;
pub mod services;
pub mod value_objects;

pub use catalog::{defs_from_dir, defs_from_file, load_database, EventDatabase, EventDef, FieldDef, MemoryDatabase};
pub use entities::{DataValue, Event, EventLevel, EventSource, EventType, ProcessInfo};
pub use error::EventError;
pub use services::{EventArchiver, EventForwarder, EventNotifier};
pub use value_objects::{EventCode, StackAction, WorkerCount};
