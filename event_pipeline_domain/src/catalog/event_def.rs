// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Event Definitions
//!
//! An [`EventDef`] describes one event class: the fields its data map may
//! carry, which of them are required and of what type, the description
//! template, the symbolic codename, and the tags applied on enrichment.
//!
//! ## Validation
//!
//! [`EventDef::validate_data`] rejects, in order of precedence:
//!
//! 1. Data keys absent from the definition (undefined field)
//! 2. Required fields absent from the data map
//! 3. Present fields whose runtime type does not match the declared type
//!
//! Declared types are open-ended: `string`, `int`, and `float` are checked,
//! anything else passes through without a type check.
//!
//! ## Enrichment
//!
//! [`EventDef::complete`] returns a copy of the event with `type`,
//! `codename`, and `tags` taken from the definition, and the description
//! produced by substituting every `[data.<field>]` token with the stringified
//! value of that data field (or the empty string when absent). Bracketed
//! tokens without the `data.` prefix are left unchanged.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::entities::{DataValue, Event, EventType};
use crate::error::EventError;
use crate::value_objects::EventCode;

static BRACKET_TOKEN: Lazy<Regex> = Lazy::new(|| {
    // matches [token] with no nested brackets
    Regex::new(r"\[([^\[\]]*)\]").expect("bracket token pattern is valid")
});

/// Declaration of one data field of an event class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    /// Declared type: `string`, `int`, or `float`; other values are accepted
    /// but not type-checked
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub required: bool,
}

/// Definition of an event class in the schema catalog.
///
/// Immutable after load; the catalog hands out clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    pub code: EventCode,
    #[serde(rename = "type", default)]
    pub event_type: EventType,
    #[serde(default)]
    pub codename: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDef>,
    #[serde(rename = "raised_by", default, skip_serializing_if = "Vec::is_empty")]
    pub raised_by: Vec<String>,
}

impl EventDef {
    /// Validates an event's data map against this definition.
    pub fn validate_data(&self, event: &Event) -> Result<(), EventError> {
        for field in event.data.keys() {
            if !self.fields.iter().any(|def| def.name == *field) {
                return Err(EventError::validation_error(format!(
                    "data field '{}' undefined",
                    field
                )));
            }
        }
        for def in &self.fields {
            let value = match event.data_field(&def.name) {
                Some(value) => value,
                None => {
                    if def.required {
                        return Err(EventError::validation_error(format!(
                            "data field '{}' is required",
                            def.name
                        )));
                    }
                    continue;
                }
            };
            match def.kind.as_str() {
                "string" => {
                    if !matches!(value, DataValue::Str(_)) {
                        return Err(EventError::validation_error(format!(
                            "data field '{}' is not a valid string",
                            def.name
                        )));
                    }
                }
                "int" => {
                    if !matches!(value, DataValue::Int(_)) {
                        return Err(EventError::validation_error(format!(
                            "data field '{}' is not a valid int",
                            def.name
                        )));
                    }
                }
                "float" => {
                    if !matches!(value, DataValue::Float(_)) {
                        return Err(EventError::validation_error(format!(
                            "data field '{}' is not a valid float",
                            def.name
                        )));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns a copy of the event enriched from this definition.
    pub fn complete(&self, event: &Event) -> Event {
        let mut enriched = event.clone();
        enriched.event_type = self.event_type;
        enriched.codename = self.codename.clone();
        enriched.description = self.render_description(event);
        enriched.tags = self.tags.clone();
        enriched
    }

    fn render_description(&self, event: &Event) -> String {
        if !BRACKET_TOKEN.is_match(&self.description) {
            return self.description.clone();
        }
        BRACKET_TOKEN
            .replace_all(&self.description, |caps: &Captures| {
                let token = &caps[1];
                match token.strip_prefix("data.") {
                    Some(field) => event
                        .data_field(field)
                        .map(|value| value.to_string())
                        .unwrap_or_default(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EventLevel;

    fn def_with_fields(fields: Vec<FieldDef>, description: &str) -> EventDef {
        EventDef {
            code: EventCode::new(1234),
            event_type: EventType::Security,
            codename: "probe".to_string(),
            tags: vec!["test".to_string()],
            description: description.to_string(),
            fields,
            raised_by: Vec::new(),
        }
    }

    fn field(name: &str, kind: &str, required: bool) -> FieldDef {
        FieldDef {
            name: name.to_string(),
            kind: kind.to_string(),
            required,
        }
    }

    #[test]
    fn test_complete_basic() {
        let def = def_with_fields(Vec::new(), "");
        let event = Event::new(EventCode::new(1234), EventLevel::Low);
        def.validate_data(&event).unwrap();

        let enriched = def.complete(&event);
        assert_eq!(enriched.event_type, EventType::Security);
        assert_eq!(enriched.codename, "probe");
        assert_eq!(enriched.level, EventLevel::Low);
        assert_eq!(enriched.tags, vec!["test".to_string()]);
    }

    #[test]
    fn test_undefined_field_rejected() {
        let def = def_with_fields(Vec::new(), "");
        let mut event = Event::new(EventCode::new(1234), EventLevel::Info);
        event.set_data("message", "surprise");

        let err = def.validate_data(&event).unwrap_err();
        assert!(err.to_string().contains("undefined"));
    }

    #[test]
    fn test_description_substitution() {
        let def = def_with_fields(
            vec![field("message", "string", true)],
            "this is the message: [data.message]",
        );
        let mut event = Event::new(EventCode::new(1234), EventLevel::Info);
        event.set_data("message", "it broke");
        def.validate_data(&event).unwrap();

        let enriched = def.complete(&event);
        assert_eq!(enriched.description, "this is the message: it broke");
    }

    #[test]
    fn test_required_and_type_checks() {
        let def = def_with_fields(
            vec![field("message", "string", true), field("score", "int", true)],
            "",
        );
        let mut event = Event::new(EventCode::new(1234), EventLevel::Info);
        event.set_data("message", "it broke");

        let err = def.validate_data(&event).unwrap_err();
        assert!(err.to_string().contains("required"));

        event.set_data("score", "not a number");
        let err = def.validate_data(&event).unwrap_err();
        assert!(err.to_string().contains("valid int"));

        event.set_data("score", 100i64);
        def.validate_data(&event).unwrap();
    }

    #[test]
    fn test_absent_field_substitutes_empty() {
        let def = def_with_fields(
            vec![
                field("message", "string", true),
                field("score", "int", true),
                field("prob", "float", false),
            ],
            "[data.score] [data.prob]",
        );
        let mut event = Event::new(EventCode::new(1234), EventLevel::Info);
        event.set_data("message", "it broke");
        event.set_data("score", 100i64);
        def.validate_data(&event).unwrap();

        let enriched = def.complete(&event);
        assert_eq!(enriched.description, "100 ");

        event.set_data("prob", 0.2f64);
        def.validate_data(&event).unwrap();
        let enriched = def.complete(&event);
        assert_eq!(enriched.description, "100 0.2");
    }

    #[test]
    fn test_non_data_tokens_untouched() {
        let def = def_with_fields(vec![field("ip", "string", false)], "[keep] from [data.ip]");
        let mut event = Event::new(EventCode::new(1234), EventLevel::Info);
        event.set_data("ip", "10.0.0.1");

        let enriched = def.complete(&event);
        assert_eq!(enriched.description, "[keep] from 10.0.0.1");
    }

    #[test]
    fn test_unrecognized_kind_passes() {
        let def = def_with_fields(vec![field("blob", "bytes", false)], "");
        let mut event = Event::new(EventCode::new(1234), EventLevel::Info);
        event.set_data("blob", 7i64);
        def.validate_data(&event).unwrap();
    }
}
