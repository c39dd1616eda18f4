//! Tool definitions and argument validation.
//!
//! A [`ToolDefinition`] is the single description of a tool: its fields
//! drive both the JSON Schema advertised by `tools/list` and the validation
//! applied on `tools/call`, so the two can never disagree.

use kvbridge_core::{Error, Result};
use kvbridge_store::{Command, Reply};
use rmcp::model::Tool;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::args::{ArgValue, Items, OneOrMany, ValidatedArguments};

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Accepted JSON type of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    /// JSON string
    String,
    /// JSON number (integer or float)
    Number,
    /// JSON boolean
    Boolean,
    /// A string or an array of strings
    StringOrArray,
}

impl FieldType {
    fn expectation(self) -> &'static str {
        match self {
            FieldType::String => "expected a string",
            FieldType::Number => "expected a number",
            FieldType::Boolean => "expected a boolean",
            FieldType::StringOrArray => "expected a string or an array of strings",
        }
    }

    fn schema(self) -> Value {
        match self {
            FieldType::String => json!({ "type": "string" }),
            FieldType::Number => json!({ "type": "number" }),
            FieldType::Boolean => json!({ "type": "boolean" }),
            FieldType::StringOrArray => json!({
                "anyOf": [
                    { "type": "string" },
                    { "type": "array", "items": { "type": "string" } }
                ]
            }),
        }
    }
}

/// Value used when an optional field is omitted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DefaultValue {
    /// String default
    Str(&'static str),
    /// Boolean default
    Bool(bool),
}

impl DefaultValue {
    fn to_arg(self) -> ArgValue {
        match self {
            DefaultValue::Str(s) => ArgValue::Str(s.to_string()),
            DefaultValue::Bool(b) => ArgValue::Bool(b),
        }
    }

    fn to_json(self) -> Value {
        match self {
            DefaultValue::Str(s) => json!(s),
            DefaultValue::Bool(b) => json!(b),
        }
    }
}

/// One named argument of a tool.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldSpec {
    /// Field name as sent by the caller
    pub name: &'static str,
    /// Accepted type
    pub ty: FieldType,
    /// Whether the field must be present
    pub required: bool,
    /// Value bound when an optional field is omitted
    pub default: Option<DefaultValue>,
    /// Human-readable description for the schema
    pub description: &'static str,
}

impl FieldSpec {
    /// A required field.
    pub const fn required(name: &'static str, ty: FieldType, description: &'static str) -> Self {
        Self {
            name,
            ty,
            required: true,
            default: None,
            description,
        }
    }

    /// An optional field with no default.
    pub const fn optional(name: &'static str, ty: FieldType, description: &'static str) -> Self {
        Self {
            name,
            ty,
            required: false,
            default: None,
            description,
        }
    }

    /// Attach a default to an optional field.
    pub const fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    fn parse(&self, value: &Value) -> Result<ArgValue> {
        let parsed = match self.ty {
            FieldType::String => value.as_str().map(|s| ArgValue::Str(s.to_string())),
            FieldType::Number => value.as_f64().map(ArgValue::Number),
            FieldType::Boolean => value.as_bool().map(ArgValue::Bool),
            FieldType::StringOrArray => {
                serde_json::from_value::<OneOrMany<String>>(value.clone())
                    .ok()
                    .map(|input| ArgValue::Items(Items::from_input(input)))
            }
        };
        parsed.ok_or_else(|| Error::invalid_argument(self.name, self.ty.expectation()))
    }

    fn schema(&self) -> Value {
        let mut schema = self.ty.schema();
        if let Value::Object(map) = &mut schema {
            map.insert("description".into(), json!(self.description));
            if let Some(default) = self.default {
                map.insert("default".into(), default.to_json());
            }
        }
        schema
    }
}

// ---------------------------------------------------------------------------
// ToolDefinition
// ---------------------------------------------------------------------------

/// Builds the store command for validated arguments.
pub type CommandBuilder = fn(&ValidatedArguments) -> Result<Command>;

/// Turns the store's reply into the tool's response text.
pub type Renderer = fn(&ValidatedArguments, Reply) -> Result<String>;

/// Everything the dispatcher needs to know about one tool.
#[derive(Clone, Copy)]
pub struct ToolDefinition {
    /// Tool name, unique across the table
    pub name: &'static str,
    /// Description shown to clients
    pub description: &'static str,
    /// Argument fields, in schema order
    pub fields: &'static [FieldSpec],
    /// Command construction
    pub command: CommandBuilder,
    /// Reply rendering
    pub render: Renderer,
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl ToolDefinition {
    /// Validate raw arguments against this tool's fields.
    ///
    /// Fields are checked in schema order and the first offending field is
    /// reported. `null` counts as absent, unknown fields are ignored, and
    /// defaults are bound for omitted optional fields.
    pub fn validate(&self, args: Option<&Map<String, Value>>) -> Result<ValidatedArguments> {
        let mut validated = ValidatedArguments::default();
        for field in self.fields {
            let value = args
                .and_then(|map| map.get(field.name))
                .filter(|v| !v.is_null());
            match (value, field.default) {
                (Some(value), _) => validated.insert(field.name, field.parse(value)?),
                (None, Some(default)) => validated.insert(field.name, default.to_arg()),
                (None, None) if field.required => {
                    return Err(Error::invalid_argument(field.name, "missing required field"));
                }
                (None, None) => {}
            }
        }
        Ok(validated)
    }

    /// Names of the required fields, in schema order.
    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.required).map(|f| f.name)
    }

    /// JSON Schema for the tool's arguments.
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.to_string(), f.schema()))
            .collect();
        let required: Vec<&str> = self.required_fields().collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// The MCP tool description advertised by `tools/list`.
    pub fn to_tool(&self) -> Tool {
        make_tool(self.name, self.description, self.input_schema())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn json_schema(value: Value) -> Arc<Map<String, Value>> {
    match value {
        Value::Object(map) => Arc::new(map),
        _ => Arc::new(Map::new()),
    }
}

fn make_tool(name: &str, description: &str, schema: Value) -> Tool {
    Tool::new(name.to_string(), description.to_string(), json_schema(schema))
}

// ============================================================================
// Tests
// ============================================================================
