// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Service Discovery
//!
//! The stack builder resolves external capabilities - archival backends and
//! peer processors - through an abstract discovery interface. A discovered
//! service is a capability record: it may expose an archiver handle, a
//! forwarder handle, or both, and plugins ask for exactly the capability
//! they need. A missing id or a missing capability is a build-time error,
//! never a runtime surprise.
//!
//! Wiring concrete transports into the registry is deployment-specific and
//! happens in the composition root.

use std::collections::HashMap;
use std::sync::Arc;

use event_pipeline_domain::{EventArchiver, EventForwarder};

/// A capability-bearing service handle.
///
/// Plugins assert the capabilities they need through the typed accessors.
#[derive(Clone, Default)]
pub struct ApiService {
    archiver: Option<Arc<dyn EventArchiver>>,
    forwarder: Option<Arc<dyn EventForwarder>>,
}

impl ApiService {
    /// Creates a service exposing only the archiver capability
    pub fn archiver(archiver: Arc<dyn EventArchiver>) -> Self {
        Self {
            archiver: Some(archiver),
            forwarder: None,
        }
    }

    /// Creates a service exposing only the forwarder capability
    pub fn forwarder(forwarder: Arc<dyn EventForwarder>) -> Self {
        Self {
            archiver: None,
            forwarder: Some(forwarder),
        }
    }

    /// Adds the archiver capability
    pub fn with_archiver(mut self, archiver: Arc<dyn EventArchiver>) -> Self {
        self.archiver = Some(archiver);
        self
    }

    /// Adds the forwarder capability
    pub fn with_forwarder(mut self, forwarder: Arc<dyn EventForwarder>) -> Self {
        self.forwarder = Some(forwarder);
        self
    }

    /// The archiver capability, when exposed
    pub fn as_archiver(&self) -> Option<Arc<dyn EventArchiver>> {
        self.archiver.clone()
    }

    /// The forwarder capability, when exposed
    pub fn as_forwarder(&self) -> Option<Arc<dyn EventForwarder>> {
        self.forwarder.clone()
    }
}

/// Abstract service discovery consumed by the stack builder.
pub trait ServiceDiscovery: Send + Sync {
    /// Looks a service up by id
    fn get_service(&self, id: &str) -> Option<ApiService>;
}

/// In-memory service registry.
#[derive(Default)]
pub struct ServiceRegistry {
    services: HashMap<String, ApiService>,
}

impl ServiceRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service under an id, replacing any previous entry
    pub fn register(&mut self, id: impl Into<String>, service: ApiService) {
        self.services.insert(id.into(), service);
    }
}

impl ServiceDiscovery for ServiceRegistry {
    fn get_service(&self, id: &str) -> Option<ApiService> {
        self.services.get(id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use event_pipeline_domain::{Event, EventError};

    struct NullArchiver;

    #[async_trait]
    impl EventArchiver for NullArchiver {
        async fn save_event(&self, _event: Event) -> Result<String, EventError> {
            Ok("stored".to_string())
        }
    }

    #[test]
    fn test_capability_lookup() {
        let mut registry = ServiceRegistry::new();
        registry.register("archive-svc", ApiService::archiver(Arc::new(NullArchiver)));

        let service = registry.get_service("archive-svc").unwrap();
        assert!(service.as_archiver().is_some());
        assert!(service.as_forwarder().is_none());
        assert!(registry.get_service("missing").is_none());
    }
}
