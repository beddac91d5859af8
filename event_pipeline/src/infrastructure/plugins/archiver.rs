// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Archiver Plugin
//!
//! Saves events to an archival backend. One arg: the id of a discovered
//! service exposing the archiver capability. The storage id returned by the
//! backend goes to the debug log.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use event_pipeline_domain::{Event, EventArchiver, EventError};

use crate::application::services::stack::EventPlugin;
use crate::infrastructure::builder::registry::PluginBuilder;
use crate::infrastructure::builder::stack_builder::StackBuilder;
use crate::infrastructure::config::stack_config::ItemDef;

/// Default class name of the component builder
pub const BUILD_CLASS: &str = "archiver";

/// Returns the registry builder for the archiver plugin
pub fn builder() -> PluginBuilder {
    Box::new(build)
}

fn build(builder: &mut StackBuilder, def: &ItemDef) -> Result<Arc<dyn EventPlugin>, EventError> {
    debug!(args = ?def.args, "building archiver plugin");
    if def.args.len() != 1 {
        return Err(EventError::build_error("required arg"));
    }
    let service_id = &def.args[0];
    let service = builder
        .service(service_id)
        .ok_or_else(|| EventError::build_error(format!("service '{}' doesn't exist", service_id)))?;
    let archive = service
        .as_archiver()
        .ok_or_else(|| EventError::build_error(format!("service '{}' is not an archiver instance", service_id)))?;
    Ok(Arc::new(ArchiverPlugin { archive }))
}

struct ArchiverPlugin {
    archive: Arc<dyn EventArchiver>,
}

#[async_trait]
impl EventPlugin for ArchiverPlugin {
    async fn apply(&self, event: &mut Event) -> Result<(), EventError> {
        let storage_id = self.archive.save_event(event.clone()).await?;
        debug!(event = %event.id, storage = %storage_id, "saved event");
        Ok(())
    }
}
