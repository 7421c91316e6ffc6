//! Parsed call types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Call arguments, in the order the model wrote them.
pub type Arguments = serde_json::Map<String, Value>;

/// A non-fatal irregularity noticed while reading or checking a call.
///
/// Warnings never stop a call; they travel with it so the caller can
/// surface or log them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum Warning {
    /// An argument without `=` was skipped.
    MalformedPair { pair: String },
    /// An argument whose key is not an identifier was skipped.
    InvalidKey { key: String },
    /// A key appeared more than once; the last value was kept.
    DuplicateArgument { key: String },
    /// Further calls after the first were ignored.
    IgnoredCalls { count: usize },
    /// A value could not be coerced to its declared type and was kept as-is.
    TypeMismatch { param: String, expected: String },
    /// An argument not declared by the tool was passed through.
    ExtraArgument { key: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedPair { pair } => write!(f, "skipped malformed argument pair: {pair}"),
            Self::InvalidKey { key } => write!(f, "skipped argument with invalid key: {key}"),
            Self::DuplicateArgument { key } => write!(f, "argument {key} given twice, kept last"),
            Self::IgnoredCalls { count } => write!(f, "ignored {count} additional call(s)"),
            Self::TypeMismatch { param, expected } => {
                write!(f, "argument {param} is not a valid {expected}, passed as-is")
            }
            Self::ExtraArgument { key } => write!(f, "undeclared argument {key} passed through"),
        }
    }
}

/// A call read from model output, before any schema check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedCall {
    pub name: String,
    pub arguments: Arguments,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

impl ParsedCall {
    /// Create a call with no arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Arguments::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an argument.
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Render as `name(k=v, ...)` for logs.
    pub fn signature(&self) -> String {
        let args = self
            .arguments
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({args})", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_lists_arguments_in_order() {
        let call = ParsedCall::new("set_irrigation_schedule")
            .with_arg("location", "field_a")
            .with_arg("duration_minutes", 30);
        assert_eq!(
            call.signature(),
            r#"set_irrigation_schedule(location="field_a", duration_minutes=30)"#
        );
    }

    #[test]
    fn warning_serializes_tagged() {
        let json = serde_json::to_value(Warning::IgnoredCalls { count: 2 }).unwrap();
        assert_eq!(json["warning"], "ignored_calls");
        assert_eq!(json["count"], 2);
    }
}
