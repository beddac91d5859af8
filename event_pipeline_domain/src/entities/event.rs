// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Security Event Entity
//!
//! This module provides the core event record flowing through the pipeline,
//! together with its constituent parts: the type and level enumerations, the
//! dynamically typed data values, the source identity, and the processor
//! audit trail.
//!
//! ## Entity Characteristics
//!
//! - **Identity**: The globally unique `id` is assigned by the processor on
//!   notify and inherited unchanged on forward
//! - **Enrichment**: `type`, `codename`, `description`, and `tags` are filled
//!   from the schema catalog at ingress
//! - **Audit Trail**: `processors` records, in order, every processor that
//!   has handled the event; it is append-only and is the basis for
//!   forward-loop detection
//!
//! ## Wire Format
//!
//! Events serialize to JSON with lowercase enum values and RFC 3339
//! timestamps:
//!
//! ```json
//! {
//!   "id": "9f0c...","code": 1234, "type": "security", "level": "high",
//!   "codename": "login_fail", "description": "bad login from 10.0.0.1",
//!   "source": {"hostname": "node1", "program": "sshguard", "instance": "433"},
//!   "data": {"ip": "10.0.0.1"},
//!   "created": "2025-06-01T10:30:00Z", "received": "2025-06-01T10:30:01Z",
//!   "processors": [{"processor": {...}, "received": "..."}]
//! }
//! ```
//!
//! Absent `created`/`received` timestamps are represented as `None`, which
//! corresponds to an event not yet stamped by a producer or processor.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EventError;
use crate::value_objects::EventCode;

/// Represents the class of an event.
///
/// Only security events exist today; the enumeration leaves room for other
/// classes without changing the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Security-relevant events
    #[default]
    Security,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Security => write!(f, "security"),
        }
    }
}

impl FromStr for EventType {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "security" => Ok(EventType::Security),
            _ => Err(EventError::validation_error(format!("unknown event type: {}", s))),
        }
    }
}

/// Ordered severity of an event.
///
/// The ordering `info < low < medium < high < critical` is part of the
/// contract: level filters use the full set of relational operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    #[default]
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventLevel::Info => "info",
            EventLevel::Low => "low",
            EventLevel::Medium => "medium",
            EventLevel::High => "high",
            EventLevel::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for EventLevel {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(EventLevel::Info),
            "low" => Ok(EventLevel::Low),
            "medium" => Ok(EventLevel::Medium),
            "high" => Ok(EventLevel::High),
            "critical" => Ok(EventLevel::Critical),
            _ => Err(EventError::validation_error(format!("unknown event level: {}", s))),
        }
    }
}

/// Dynamically typed scalar stored in an event's data map.
///
/// JSON numbers without a fractional part deserialize as `Int`, numbers with
/// one as `Float`. The catalog's field definitions type-check these at
/// ingress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataValue {
    Str(String),
    Int(i64),
    Float(f64),
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Str(s) => write!(f, "{}", s),
            DataValue::Int(i) => write!(f, "{}", i),
            DataValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::Str(value.to_string())
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::Str(value)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Int(value)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Float(value)
    }
}

/// Identity of the producer or processor of an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct EventSource {
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub program: String,
    #[serde(default)]
    pub instance: String,
}

impl EventSource {
    /// Creates a source with explicit identity fields
    pub fn new(hostname: impl Into<String>, program: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            program: program.into(),
            instance: instance.into(),
        }
    }

    /// Builds the identity of the running process.
    ///
    /// Hostname comes from the `HOSTNAME` environment variable (falling back
    /// to `localhost`), program from the executable name, and instance from
    /// the process id.
    pub fn default_source() -> Self {
        let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let program = std::env::args()
            .next()
            .and_then(|arg0| {
                Path::new(&arg0)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .unwrap_or_default();
        let instance = std::process::id().to_string();
        Self {
            hostname,
            program,
            instance,
        }
    }

    /// True when the identity carries neither hostname nor program
    pub fn is_unset(&self) -> bool {
        self.hostname.is_empty() || self.program.is_empty()
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}[{}]", self.hostname, self.program, self.instance)
    }
}

/// One entry of an event's processor audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub processor: EventSource,
    pub received: DateTime<Utc>,
}

/// A security event flowing through the pipeline.
///
/// Constructed by producers with [`Event::new`], validated and enriched on
/// ingress by the processor, then handed to the stack engine inside a
/// request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub id: String,
    pub code: EventCode,
    #[serde(rename = "type", default)]
    pub event_type: EventType,
    #[serde(default)]
    pub level: EventLevel,
    #[serde(default)]
    pub codename: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source: EventSource,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, DataValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub processors: Vec<ProcessInfo>,
}

impl Event {
    /// Creates a bare event with the given code and level.
    ///
    /// All enrichment fields start empty; the processor fills them from the
    /// catalog at ingress.
    pub fn new(code: EventCode, level: EventLevel) -> Self {
        Self {
            id: String::new(),
            code,
            event_type: EventType::default(),
            level,
            codename: String::new(),
            description: String::new(),
            tags: Vec::new(),
            source: EventSource::default(),
            data: HashMap::new(),
            created: None,
            received: None,
            processors: Vec::new(),
        }
    }

    /// Sets a data field
    pub fn set_data(&mut self, name: impl Into<String>, value: impl Into<DataValue>) {
        self.data.insert(name.into(), value.into());
    }

    /// Gets a data field if present
    pub fn data_field(&self, name: &str) -> Option<&DataValue> {
        self.data.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(EventLevel::Info < EventLevel::Low);
        assert!(EventLevel::Low < EventLevel::Medium);
        assert!(EventLevel::Medium < EventLevel::High);
        assert!(EventLevel::High < EventLevel::Critical);
    }

    #[test]
    fn test_level_round_trip() {
        for level in [
            EventLevel::Info,
            EventLevel::Low,
            EventLevel::Medium,
            EventLevel::High,
            EventLevel::Critical,
        ] {
            let parsed: EventLevel = level.to_string().parse().unwrap();
            assert_eq!(parsed, level);
        }
        assert!("severe".parse::<EventLevel>().is_err());
    }

    #[test]
    fn test_data_value_json_types() {
        let mut event = Event::new(EventCode::new(1234), EventLevel::Low);
        event.set_data("message", "hello");
        event.set_data("score", 100i64);
        event.set_data("prob", 0.25f64);

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back.data_field("message"), Some(&DataValue::Str("hello".into())));
        assert_eq!(back.data_field("score"), Some(&DataValue::Int(100)));
        assert_eq!(back.data_field("prob"), Some(&DataValue::Float(0.25)));
    }

    #[test]
    fn test_data_value_display() {
        assert_eq!(DataValue::Str("x".into()).to_string(), "x");
        assert_eq!(DataValue::Int(100).to_string(), "100");
        assert_eq!(DataValue::Float(0.2).to_string(), "0.2");
    }

    #[test]
    fn test_event_wire_defaults() {
        let event: Event = serde_json::from_str(r#"{"code":1000,"level":"info"}"#).unwrap();
        assert_eq!(event.code, EventCode::new(1000));
        assert_eq!(event.level, EventLevel::Info);
        assert!(event.id.is_empty());
        assert!(event.processors.is_empty());
        assert!(event.created.is_none());
    }

    #[test]
    fn test_source_equality() {
        let a = EventSource::new("node1", "proc", "1");
        let b = EventSource::new("node1", "proc", "1");
        let c = EventSource::new("node2", "proc", "1");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_default_source_is_set() {
        let source = EventSource::default_source();
        assert!(!source.hostname.is_empty());
        assert!(!source.instance.is_empty());
        assert!(!source.is_unset() || source.program.is_empty());
    }
}
