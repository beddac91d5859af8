// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Basic Expression Filter
//!
//! A filter class for simple field comparisons, configured with three args:
//! `[field, op, value]`.
//!
//! | Field               | Operators                     | Value            |
//! |---------------------|-------------------------------|------------------|
//! | `code`              | `== != < <= > >=`             | numeric code     |
//! | `type`              | `== !=`                       | type name        |
//! | `level`             | `== != < <= > >=`             | level name       |
//! | `source.hostname`   | `== !=`                       | string           |
//! | `source.program`    | `== !=`                       | string           |
//! | `data.<name>`       | `isset`, `== !=` (strings), `eq ne lt le gt ge` (integers) | string / integer |
//!
//! Data comparisons duck-type at runtime: a missing field or a value of the
//! wrong runtime type yields `false` for affirmative operators and `true`
//! for negative ones (`!=`, `ne`).

use std::sync::Arc;

use tracing::debug;

use event_pipeline_domain::{DataValue, Event, EventCode, EventError, EventLevel, EventType};

use crate::application::services::stack::EventFilter;
use crate::infrastructure::builder::registry::FilterBuilder;
use crate::infrastructure::builder::stack_builder::StackBuilder;
use crate::infrastructure::config::stack_config::ItemDef;

/// Default class name of the component builder
pub const BUILD_CLASS: &str = "basicexpr";

/// Returns the registry builder for basic expressions
pub fn builder() -> FilterBuilder {
    Box::new(build)
}

fn build(_builder: &mut StackBuilder, def: &ItemDef) -> Result<Arc<dyn EventFilter>, EventError> {
    debug!(args = ?def.args, "building basicexpr filter");
    if def.args.len() != 3 {
        return Err(EventError::build_error("args must be 3"));
    }
    let field = def.args[0].as_str();
    let op = def.args[1].as_str();
    let value = def.args[2].as_str();

    let expr = match field {
        "code" => {
            let code: EventCode = value
                .parse()
                .map_err(|_| EventError::build_error("invalid value"))?;
            Expr::Code(parse_ord_op(op)?, code)
        }
        "type" => {
            let event_type: EventType = value
                .parse()
                .map_err(|_| EventError::build_error("invalid value"))?;
            Expr::Type(parse_eq_op(op)?, event_type)
        }
        "level" => {
            let level: EventLevel = value
                .parse()
                .map_err(|_| EventError::build_error("invalid value"))?;
            Expr::Level(parse_ord_op(op)?, level)
        }
        "source.hostname" => Expr::SourceHostname(parse_eq_op(op)?, value.to_string()),
        "source.program" => Expr::SourceProgram(parse_eq_op(op)?, value.to_string()),
        _ => match data_field_name(field) {
            Some(name) => build_data_expr(name, op, value)?,
            None => return Err(EventError::build_error("invalid field")),
        },
    };
    Ok(Arc::new(BasicExpr { expr }))
}

fn data_field_name(field: &str) -> Option<String> {
    let name = field.strip_prefix("data.")?;
    if name.is_empty() || name.contains('.') {
        return None;
    }
    Some(name.to_string())
}

fn build_data_expr(name: String, op: &str, value: &str) -> Result<Expr, EventError> {
    match op {
        "isset" => Ok(Expr::DataIsSet(name)),
        "==" | "!=" => Ok(Expr::DataStr(parse_eq_op(op)?, name, value.to_string())),
        "eq" | "ne" | "lt" | "le" | "gt" | "ge" => {
            let number: i64 = value
                .parse()
                .map_err(|_| EventError::build_error("invalid value"))?;
            let cmp = match op {
                "eq" => CmpOp::Eq,
                "ne" => CmpOp::Ne,
                "lt" => CmpOp::Lt,
                "le" => CmpOp::Le,
                "gt" => CmpOp::Gt,
                _ => CmpOp::Ge,
            };
            Ok(Expr::DataInt(cmp, name, number))
        }
        _ => Err(EventError::build_error("invalid operator")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    /// Negative operators succeed when a runtime value is missing or of the
    /// wrong type
    fn is_negative(self) -> bool {
        matches!(self, CmpOp::Ne)
    }
}

fn parse_ord_op(op: &str) -> Result<CmpOp, EventError> {
    match op {
        "==" => Ok(CmpOp::Eq),
        "!=" => Ok(CmpOp::Ne),
        "<" => Ok(CmpOp::Lt),
        "<=" => Ok(CmpOp::Le),
        ">" => Ok(CmpOp::Gt),
        ">=" => Ok(CmpOp::Ge),
        _ => Err(EventError::build_error("invalid operator")),
    }
}

fn parse_eq_op(op: &str) -> Result<CmpOp, EventError> {
    match op {
        "==" => Ok(CmpOp::Eq),
        "!=" => Ok(CmpOp::Ne),
        _ => Err(EventError::build_error("invalid operator")),
    }
}

fn compare_ord<T: Ord>(op: CmpOp, left: &T, right: &T) -> bool {
    match op {
        CmpOp::Eq => left == right,
        CmpOp::Ne => left != right,
        CmpOp::Lt => left < right,
        CmpOp::Le => left <= right,
        CmpOp::Gt => left > right,
        CmpOp::Ge => left >= right,
    }
}

fn compare_eq<T: PartialEq>(op: CmpOp, left: &T, right: &T) -> bool {
    match op {
        CmpOp::Eq => left == right,
        _ => left != right,
    }
}

#[derive(Debug, Clone)]
enum Expr {
    Code(CmpOp, EventCode),
    Type(CmpOp, EventType),
    Level(CmpOp, EventLevel),
    SourceHostname(CmpOp, String),
    SourceProgram(CmpOp, String),
    DataIsSet(String),
    DataStr(CmpOp, String, String),
    DataInt(CmpOp, String, i64),
}

/// Compiled basic expression.
pub struct BasicExpr {
    expr: Expr,
}

impl EventFilter for BasicExpr {
    fn matches(&self, event: &Event) -> bool {
        match &self.expr {
            Expr::Code(op, value) => compare_ord(*op, &event.code, value),
            Expr::Type(op, value) => compare_eq(*op, &event.event_type, value),
            Expr::Level(op, value) => compare_ord(*op, &event.level, value),
            Expr::SourceHostname(op, value) => compare_eq(*op, &event.source.hostname, value),
            Expr::SourceProgram(op, value) => compare_eq(*op, &event.source.program, value),
            Expr::DataIsSet(name) => event.data_field(name).is_some(),
            Expr::DataStr(op, name, value) => match event.data_field(name) {
                Some(DataValue::Str(actual)) => compare_eq(*op, actual, value),
                _ => op.is_negative(),
            },
            Expr::DataInt(op, name, value) => match event.data_field(name) {
                Some(DataValue::Int(actual)) => compare_ord(*op, actual, value),
                _ => op.is_negative(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::builder::registry::PluginRegistry;
    use crate::infrastructure::builder::stack_builder::{StackBuilder, StackBuilderOptions};
    use crate::infrastructure::services::registry::ServiceRegistry;
    use event_pipeline_domain::EventSource;

    fn make(args: &[&str]) -> Result<Arc<dyn EventFilter>, EventError> {
        let mut builder = StackBuilder::new(
            Arc::new(ServiceRegistry::new()),
            Arc::new(PluginRegistry::new()),
            StackBuilderOptions::default(),
        );
        let def = ItemDef {
            class: BUILD_CLASS.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            opts: Default::default(),
        };
        build(&mut builder, &def)
    }

    fn sample_event() -> Event {
        let mut event = Event::new(EventCode::new(1000), EventLevel::High);
        event.source = EventSource::new("node1", "sshguard", "77");
        event.set_data("ip", "10.0.0.1");
        event.set_data("score", 42i64);
        event
    }

    #[test]
    fn test_code_operators() {
        let event = sample_event();
        assert!(make(&["code", "==", "1000"]).unwrap().matches(&event));
        assert!(make(&["code", "!=", "1001"]).unwrap().matches(&event));
        assert!(make(&["code", "<", "1001"]).unwrap().matches(&event));
        assert!(make(&["code", "<=", "1000"]).unwrap().matches(&event));
        assert!(make(&["code", ">", "999"]).unwrap().matches(&event));
        assert!(make(&["code", ">=", "1000"]).unwrap().matches(&event));
        assert!(!make(&["code", ">", "1000"]).unwrap().matches(&event));
    }

    #[test]
    fn test_level_ordering() {
        let event = sample_event();
        assert!(make(&["level", ">=", "high"]).unwrap().matches(&event));
        assert!(make(&["level", ">", "medium"]).unwrap().matches(&event));
        assert!(!make(&["level", "<", "high"]).unwrap().matches(&event));
        assert!(make(&["level", "!=", "critical"]).unwrap().matches(&event));
    }

    #[test]
    fn test_type_and_source() {
        let event = sample_event();
        assert!(make(&["type", "==", "security"]).unwrap().matches(&event));
        assert!(!make(&["type", "!=", "security"]).unwrap().matches(&event));
        assert!(make(&["source.hostname", "==", "node1"]).unwrap().matches(&event));
        assert!(make(&["source.program", "!=", "nginx"]).unwrap().matches(&event));
    }

    #[test]
    fn test_data_string_ops() {
        let event = sample_event();
        assert!(make(&["data.ip", "isset"]).is_err()); // needs 3 args
        assert!(make(&["data.ip", "isset", ""]).unwrap().matches(&event));
        assert!(!make(&["data.missing", "isset", ""]).unwrap().matches(&event));
        assert!(make(&["data.ip", "==", "10.0.0.1"]).unwrap().matches(&event));
        assert!(make(&["data.ip", "!=", "10.0.0.2"]).unwrap().matches(&event));
    }

    #[test]
    fn test_data_int_ops() {
        let event = sample_event();
        assert!(make(&["data.score", "eq", "42"]).unwrap().matches(&event));
        assert!(make(&["data.score", "ge", "42"]).unwrap().matches(&event));
        assert!(make(&["data.score", "lt", "50"]).unwrap().matches(&event));
        assert!(!make(&["data.score", "gt", "50"]).unwrap().matches(&event));
    }

    #[test]
    fn test_duck_typing_on_mismatch() {
        let event = sample_event();
        // ip holds a string: affirmative int ops fail, negative succeed
        assert!(!make(&["data.ip", "eq", "1"]).unwrap().matches(&event));
        assert!(make(&["data.ip", "ne", "1"]).unwrap().matches(&event));
        // score holds an int: string equality fails, inequality succeeds
        assert!(!make(&["data.score", "==", "42"]).unwrap().matches(&event));
        assert!(make(&["data.score", "!=", "42"]).unwrap().matches(&event));
        // missing fields behave the same way
        assert!(!make(&["data.absent", "==", "x"]).unwrap().matches(&event));
        assert!(make(&["data.absent", "!=", "x"]).unwrap().matches(&event));
        assert!(!make(&["data.absent", "ge", "1"]).unwrap().matches(&event));
        assert!(make(&["data.absent", "ne", "1"]).unwrap().matches(&event));
    }

    #[test]
    fn test_build_rejections() {
        assert!(make(&["code", "==", "abc"]).is_err());
        assert!(make(&["type", "<", "security"]).is_err());
        assert!(make(&["level", "==", "severe"]).is_err());
        assert!(make(&["source.hostname", "<", "node1"]).is_err());
        assert!(make(&["data.score", "between", "1"]).is_err());
        assert!(make(&["data.", "==", "x"]).is_err());
        assert!(make(&["data.a.b", "==", "x"]).is_err());
        assert!(make(&["uptime", "==", "x"]).is_err());
    }
}
