// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Ingress and capability trait definitions.

use async_trait::async_trait;

use crate::entities::Event;
use crate::error::EventError;

/// Accepts locally originated events.
///
/// Implemented by the processor. The event must carry an empty id and an
/// empty audit trail; the returned string is the globally unique id assigned
/// to the accepted event.
#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn notify_event(&self, event: Event) -> Result<String, EventError>;
}

/// Accepts events forwarded from a peer processor.
///
/// The event must carry a non-empty id and a non-empty audit trail. Also the
/// capability exposed by peer-processor services to the forwarder plugin.
#[async_trait]
pub trait EventForwarder: Send + Sync {
    async fn forward_event(&self, event: Event) -> Result<(), EventError>;
}

/// Archival backend capability.
///
/// Persists an event and returns its storage id.
#[async_trait]
pub trait EventArchiver: Send + Sync {
    async fn save_event(&self, event: Event) -> Result<String, EventError>;
}
