// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Forwarder Plugin
//!
//! Re-injects events into a peer processor. One arg: the id of a discovered
//! service exposing the forwarder capability. The peer performs its own
//! loop detection against the event's audit trail.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use event_pipeline_domain::{Event, EventError, EventForwarder};

use crate::application::services::stack::EventPlugin;
use crate::infrastructure::builder::registry::PluginBuilder;
use crate::infrastructure::builder::stack_builder::StackBuilder;
use crate::infrastructure::config::stack_config::ItemDef;

/// Default class name of the component builder
pub const BUILD_CLASS: &str = "forwarder";

/// Returns the registry builder for the forwarder plugin
pub fn builder() -> PluginBuilder {
    Box::new(build)
}

fn build(builder: &mut StackBuilder, def: &ItemDef) -> Result<Arc<dyn EventPlugin>, EventError> {
    debug!(args = ?def.args, "building forwarder plugin");
    if def.args.len() != 1 {
        return Err(EventError::build_error("required arg"));
    }
    let service_id = def.args[0].clone();
    let service = builder
        .service(&service_id)
        .ok_or_else(|| EventError::build_error(format!("service '{}' doesn't exist", service_id)))?;
    let forward = service
        .as_forwarder()
        .ok_or_else(|| EventError::build_error(format!("service '{}' is not a forwarder instance", service_id)))?;
    Ok(Arc::new(ForwarderPlugin { service_id, forward }))
}

struct ForwarderPlugin {
    service_id: String,
    forward: Arc<dyn EventForwarder>,
}

#[async_trait]
impl EventPlugin for ForwarderPlugin {
    async fn apply(&self, event: &mut Event) -> Result<(), EventError> {
        self.forward.forward_event(event.clone()).await?;
        debug!(event = %event.id, service = %self.service_id, "forwarded event");
        Ok(())
    }
}
