// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Application services: event dispatch and stack execution.

pub mod hooks;
pub mod processor;
pub mod stack;

pub use hooks::{Hooks, RequestCallback};
pub use processor::{GuidGenerator, Processor, ProcessorOptions, Request, DEFAULT_BUFFER_SIZE};
pub use stack::{EventFilter, EventPlugin, Module, Stack};
