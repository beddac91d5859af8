// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Service Seams
//!
//! Async trait boundaries between the engine and its external collaborators.
//!
//! ## Ingress Contracts
//!
//! [`EventNotifier`] and [`EventForwarder`] are the two ingress operations a
//! transport layer invokes on the processor. Notification carries a locally
//! originated event with an empty audit trail; forwarding carries an event
//! already processed by a peer, with a non-empty trail used for loop
//! detection.
//!
//! ## Capability Contracts
//!
//! [`EventArchiver`] and [`EventForwarder`] also describe the capabilities a
//! discovered service may expose to action plugins: an archival backend that
//! persists events and returns storage ids, and a peer processor that
//! accepts forwarded events.
//!
//! # Thread Safety
//!
//! Implementations must be `Send + Sync`; plugins hold shared references and
//! invoke them concurrently from multiple workers.

pub mod contracts;

pub use contracts::{EventArchiver, EventForwarder, EventNotifier};
