//! Action trait and parameter schemas.
//!
//! Every discrete browser operation is exposed as a named action with an
//! explicit, hand-written parameter schema. Nothing is derived from function
//! signatures; the schema is the contract, and it must describe every field
//! the implementation reads apart from the page handle itself.

mod registry;

pub use registry::ActionRegistry;

use async_trait::async_trait;
use serde_json::{Map, Value};

use artflow_browser::Page;

use crate::error::{AutomationError, Result};

/// Declared type of one action parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
}

impl ParamKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Boolean => value.is_boolean(),
        }
    }

    fn label(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
        }
    }
}

/// One named parameter of an action schema.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<Value>,
    pub description: &'static str,
}

impl ParamSpec {
    pub fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            default: None,
            description,
        }
    }

    pub fn optional(
        name: &'static str,
        kind: ParamKind,
        default: Option<Value>,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            kind,
            required: false,
            default,
            description,
        }
    }
}

/// Ordered parameter schema for one action.
#[derive(Debug, Clone, Default)]
pub struct ActionSchema {
    pub params: Vec<ParamSpec>,
    /// When set, fields not named in `params` are passed through instead of
    /// rejected.
    pub permissive: bool,
}

impl ActionSchema {
    pub fn new(params: Vec<ParamSpec>) -> Self {
        Self {
            params,
            permissive: false,
        }
    }

    pub fn permissive(mut self) -> Self {
        self.permissive = true;
        self
    }

    /// Validate `raw` against this schema and return the merged parameter
    /// object with declared defaults applied.
    pub fn validate(&self, raw: &Value) -> Result<Value> {
        let empty = Map::new();
        let raw = match raw {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(AutomationError::Validation(format!(
                    "parameters must be an object, got {other}"
                )));
            }
        };

        if !self.permissive {
            for key in raw.keys() {
                if !self.params.iter().any(|p| p.name == key) {
                    return Err(AutomationError::Validation(format!(
                        "unknown parameter '{key}'"
                    )));
                }
            }
        }

        let mut merged = if self.permissive {
            raw.clone()
        } else {
            Map::new()
        };

        for spec in &self.params {
            match raw.get(spec.name) {
                Some(value) if !value.is_null() => {
                    if !spec.kind.matches(value) {
                        return Err(AutomationError::Validation(format!(
                            "parameter '{}' must be a {}",
                            spec.name,
                            spec.kind.label()
                        )));
                    }
                    merged.insert(spec.name.to_string(), value.clone());
                }
                _ if spec.required => {
                    return Err(AutomationError::Validation(format!(
                        "missing required parameter '{}'",
                        spec.name
                    )));
                }
                _ => {
                    if let Some(default) = &spec.default {
                        merged.insert(spec.name.to_string(), default.clone());
                    }
                }
            }
        }

        Ok(Value::Object(merged))
    }

    /// One line per field for the action catalog.
    fn describe(&self) -> String {
        self.params
            .iter()
            .map(|p| {
                let mut line = format!("    {} ({}", p.name, p.kind.label());
                if p.required {
                    line.push_str(", required");
                } else if let Some(default) = &p.default {
                    line.push_str(&format!(", default {default}"));
                } else {
                    line.push_str(", optional");
                }
                line.push(')');
                if !p.description.is_empty() {
                    line.push_str(" - ");
                    line.push_str(p.description);
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One registered browser operation.
#[async_trait]
pub trait Action: Send + Sync {
    /// Unique action name.
    fn name(&self) -> &str;

    /// Human-readable description for the catalog.
    fn description(&self) -> &str;

    fn schema(&self) -> ActionSchema;

    /// Run the action with validated parameters against the session page.
    async fn execute(&self, params: Value, page: &dyn Page) -> Result<Value>;
}

pub(crate) fn describe_action(action: &dyn Action) -> String {
    let schema = action.schema();
    let mut out = format!("{}: {}", action.name(), action.description());
    let fields = schema.describe();
    if !fields.is_empty() {
        out.push('\n');
        out.push_str(&fields);
    }
    out
}
