//! Tool catalog: the schemas advertised to the model.

use protocol::Template;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors building a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("duplicate tool: {0}")]
    DuplicateTool(String),

    #[error("tool {tool} declares parameter {param} twice")]
    DuplicateParameter { tool: String, param: String },

    #[error("invalid tool schema: {0}")]
    InvalidSchema(String),
}

/// Declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParamType {
    fn from_schema(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" | "float" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    /// Whether `value` already has this type.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
        })
    }
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
    #[serde(default)]
    pub description: String,
}

impl Parameter {
    /// An optional parameter.
    pub fn optional(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            allowed_values: None,
            description: String::new(),
        }
    }

    /// A required parameter.
    pub fn required(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            required: true,
            ..Self::optional(name, kind)
        }
    }

    /// Restrict the parameter to a fixed set of values.
    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A tool definition exposed to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Vec<Parameter>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
        }
    }

    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Look up a declared parameter.
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Render in the tool-list JSON format the chat template expects.
    pub fn to_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            let mut property = Map::new();
            property.insert("type".into(), Value::String(param.kind.to_string()));
            if let Some(allowed) = &param.allowed_values {
                property.insert("enum".into(), json!(allowed));
            }
            if !param.description.is_empty() {
                property.insert("description".into(), Value::String(param.description.clone()));
            }
            properties.insert(param.name.clone(), Value::Object(property));
        }
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "name": self.name,
            "description": self.description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required,
            },
        })
    }

    /// Read a tool from the tool-list JSON format.
    pub fn from_schema(schema: &Value) -> Result<Self, CatalogError> {
        let invalid = |msg: &str| CatalogError::InvalidSchema(msg.to_string());

        let name = schema
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("tool without a name"))?;
        let description = schema
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let mut spec = ToolSpec::new(name, description);

        let Some(parameters) = schema.get("parameters") else {
            return Ok(spec);
        };
        let required: Vec<&str> = parameters
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let empty = Map::new();
        let properties = match parameters.get("properties") {
            Some(Value::Object(properties)) => properties,
            None => &empty,
            Some(_) => return Err(CatalogError::InvalidSchema(format!("{name}: properties must be an object"))),
        };

        for (param_name, property) in properties {
            let kind = match property.get("type").and_then(Value::as_str) {
                None => ParamType::String,
                Some(ty) => ParamType::from_schema(ty).ok_or_else(|| {
                    CatalogError::InvalidSchema(format!("{name}.{param_name}: unsupported type {ty}"))
                })?,
            };
            let mut param = Parameter::optional(param_name.clone(), kind);
            param.required = required.contains(&param_name.as_str());
            param.allowed_values = property.get("enum").and_then(Value::as_array).map(|values| {
                values
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            });
            if let Some(text) = property.get("description").and_then(Value::as_str) {
                param.description = text.to_string();
            }
            spec.parameters.push(param);
        }
        Ok(spec)
    }
}

/// The fixed set of tools advertised to the model.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolSpec>,
    index: HashMap<String, usize>,
}

impl ToolCatalog {
    /// Build a catalog, rejecting duplicate tool or parameter names.
    pub fn new(specs: impl IntoIterator<Item = ToolSpec>) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();
        for spec in specs {
            let mut seen = Vec::with_capacity(spec.parameters.len());
            for param in &spec.parameters {
                if seen.contains(&param.name.as_str()) {
                    return Err(CatalogError::DuplicateParameter {
                        tool: spec.name.clone(),
                        param: param.name.clone(),
                    });
                }
                seen.push(param.name.as_str());
            }
            if catalog.index.contains_key(&spec.name) {
                return Err(CatalogError::DuplicateTool(spec.name));
            }
            catalog.index.insert(spec.name.clone(), catalog.tools.len());
            catalog.tools.push(spec);
        }
        Ok(catalog)
    }

    /// Parse a JSON tool list (`[{"name": ..., "parameters": {...}}, ...]`).
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| CatalogError::InvalidSchema(e.to_string()))?;
        let Value::Array(items) = value else {
            return Err(CatalogError::InvalidSchema("expected a list of tools".to_string()));
        };
        let specs = items
            .iter()
            .map(ToolSpec::from_schema)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(specs)
    }

    /// Load a JSON tool list from a file.
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Tools in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// The tool list as JSON.
    pub fn to_json(&self) -> Value {
        Value::Array(self.tools.iter().map(ToolSpec::to_schema).collect())
    }

    /// System prompt advertising this catalog, followed by `persona`.
    pub fn system_prompt(&self, template: &Template, persona: &str) -> String {
        if self.is_empty() {
            return persona.to_string();
        }
        let tools = template.tool_list(&self.to_json().to_string());
        format!("List of tools: {tools}\n{persona}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fan() -> ToolSpec {
        ToolSpec::new("control_fan", "Controls the state of the fan.").param(
            Parameter::required("state", ParamType::String)
                .one_of(["on", "off"])
                .describe("The desired state of the fan."),
        )
    }

    #[test]
    fn lookup_by_name() {
        let catalog = ToolCatalog::new([fan(), ToolSpec::new("get_sensor_data", "")]).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("get_sensor_data"));
        assert_eq!(catalog.get("control_fan").unwrap().parameters.len(), 1);
        assert!(catalog.get("control_drain").is_none());
    }

    #[test]
    fn rejects_duplicates() {
        assert_eq!(
            ToolCatalog::new([fan(), fan()]).unwrap_err(),
            CatalogError::DuplicateTool("control_fan".into())
        );
        let twice = ToolSpec::new("f", "")
            .param(Parameter::optional("a", ParamType::String))
            .param(Parameter::optional("a", ParamType::Integer));
        assert!(matches!(
            ToolCatalog::new([twice]),
            Err(CatalogError::DuplicateParameter { .. })
        ));
    }

    #[test]
    fn schema_round_trip() {
        let spec = ToolSpec::new("set_irrigation_schedule", "Schedule irrigation.")
            .param(Parameter::required("location", ParamType::String))
            .param(Parameter::required("start_time", ParamType::String))
            .param(Parameter::optional("duration_minutes", ParamType::Integer));
        let parsed = ToolSpec::from_schema(&spec.to_schema()).unwrap();
        assert_eq!(parsed, spec);
    }

    #[test]
    fn schema_shape() {
        let schema = fan().to_schema();
        assert_eq!(schema["parameters"]["type"], "object");
        assert_eq!(schema["parameters"]["properties"]["state"]["enum"], json!(["on", "off"]));
        assert_eq!(schema["parameters"]["required"], json!(["state"]));
    }

    #[test]
    fn from_json_tool_list() {
        let json = r#"[
            {"name": "control_drain", "description": "Open or close the drain.",
             "parameters": {"type": "object",
                            "properties": {"state": {"type": "string", "enum": ["open", "closed"]}},
                            "required": ["state"]}},
            {"name": "get_sensor_data", "description": "Latest readings.",
             "parameters": {"type": "object", "properties": {}}}
        ]"#;
        let catalog = ToolCatalog::from_json(json).unwrap();
        let drain = catalog.get("control_drain").unwrap();
        assert!(drain.parameters[0].required);
        assert_eq!(
            drain.parameters[0].allowed_values.as_deref(),
            Some(&["open".to_string(), "closed".to_string()][..])
        );
        assert!(catalog.get("get_sensor_data").unwrap().parameters.is_empty());
    }

    #[test]
    fn from_json_rejects_unknown_type() {
        let json = r#"[{"name": "f", "parameters": {"properties": {"x": {"type": "tensor"}}}}]"#;
        assert!(matches!(
            ToolCatalog::from_json(json),
            Err(CatalogError::InvalidSchema(_))
        ));
    }

    #[test]
    fn system_prompt_wraps_tool_list() {
        let catalog = ToolCatalog::new([fan()]).unwrap();
        let prompt = catalog.system_prompt(&Template::default(), "You are a helpful assistant.");
        assert!(prompt.starts_with("List of tools: <|tool_list_start|>[{\"name\":\"control_fan\""));
        assert!(prompt.contains("<|tool_list_end|>\nYou are a helpful assistant."));

        let empty = ToolCatalog::default();
        assert_eq!(empty.system_prompt(&Template::default(), "Hi."), "Hi.");
    }
}
