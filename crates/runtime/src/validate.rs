//! Schema checks and argument coercion.

use crate::catalog::{ParamType, Parameter, ToolCatalog};
use policy::Policy;
use protocol::{Arguments, ParsedCall, Warning};
use serde::Serialize;
use serde_json::{Number, Value};
use thiserror::Error;
use tracing::warn;

/// A call that names a catalog tool and carries coerced arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedCall {
    pub name: String,
    pub arguments: Arguments,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

/// A call the catalog cannot accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("{tool} is missing required argument(s): {}", names.join(", "))]
    MissingRequired { tool: String, names: Vec<String> },

    #[error("{param}={value} is not one of: {}", allowed.join(", "))]
    InvalidValue {
        param: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("{tool} does not take argument(s): {}", names.join(", "))]
    UnexpectedArguments { tool: String, names: Vec<String> },
}

/// Check a parsed call against the catalog and coerce its arguments.
///
/// A null argument counts as absent. Declared types are advisory: a value
/// that cannot be coerced is kept and a [`Warning::TypeMismatch`] recorded.
pub fn validate(
    call: ParsedCall,
    catalog: &ToolCatalog,
    policy: &Policy,
) -> Result<ValidatedCall, CallError> {
    let Some(spec) = catalog.get(&call.name) else {
        return Err(CallError::UnknownTool(call.name));
    };

    let missing: Vec<String> = spec
        .parameters
        .iter()
        .filter(|p| p.required)
        .filter(|p| call.arguments.get(&p.name).is_none_or(Value::is_null))
        .map(|p| p.name.clone())
        .collect();
    if !missing.is_empty() {
        return Err(CallError::MissingRequired {
            tool: call.name,
            names: missing,
        });
    }

    let extra: Vec<String> = call
        .arguments
        .keys()
        .filter(|key| spec.parameter(key).is_none())
        .cloned()
        .collect();
    if !policy.check_extra_arguments(&extra).is_allowed() {
        return Err(CallError::UnexpectedArguments {
            tool: call.name,
            names: extra,
        });
    }

    let mut warnings = call.warnings;
    let mut arguments = Arguments::new();
    for (key, value) in call.arguments {
        let Some(param) = spec.parameter(&key) else {
            warn!(tool = %spec.name, %key, "passing undeclared argument through");
            warnings.push(Warning::ExtraArgument { key: key.clone() });
            arguments.insert(key, value);
            continue;
        };
        if value.is_null() {
            continue;
        }

        let value = match coerce(&value, param.kind) {
            Some(coerced) => coerced,
            None => {
                warn!(tool = %spec.name, %key, expected = %param.kind, "argument type mismatch");
                warnings.push(Warning::TypeMismatch {
                    param: key.clone(),
                    expected: param.kind.to_string(),
                });
                value
            }
        };
        let value = check_allowed(param, value)?;
        arguments.insert(key, value);
    }

    Ok(ValidatedCall {
        name: call.name,
        arguments,
        warnings,
    })
}

/// Move `value` toward `kind`. `None` when the type is out of reach.
fn coerce(value: &Value, kind: ParamType) -> Option<Value> {
    if kind.accepts(value) {
        return Some(value.clone());
    }
    match (kind, value) {
        (ParamType::String, other) => Some(Value::String(render(other))),
        (ParamType::Integer, Value::Number(n)) => whole(n.as_f64()?),
        (ParamType::Integer, Value::String(s)) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => Some(Value::from(i)),
                Err(_) => whole(s.parse::<f64>().ok()?),
            }
        }
        (ParamType::Number, Value::String(s)) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => Some(Value::from(i)),
                Err(_) => s
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number),
            }
        }
        (ParamType::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn whole(f: f64) -> Option<Value> {
    (f.fract() == 0.0 && f.abs() < i64::MAX as f64).then(|| Value::from(f as i64))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn check_allowed(param: &Parameter, value: Value) -> Result<Value, CallError> {
    let Some(allowed) = &param.allowed_values else {
        return Ok(value);
    };
    let given = render(&value);
    match allowed.iter().find(|a| a.eq_ignore_ascii_case(given.trim())) {
        Some(canonical) if param.kind == ParamType::String => Ok(Value::String(canonical.clone())),
        Some(_) => Ok(value),
        None => Err(CallError::InvalidValue {
            param: param.name.clone(),
            value: given,
            allowed: allowed.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ToolSpec;
    use serde_json::json;

    fn catalog() -> ToolCatalog {
        ToolCatalog::new([
            ToolSpec::new("control_fan", "Controls the fan.").param(
                Parameter::required("state", ParamType::String).one_of(["on", "off"]),
            ),
            ToolSpec::new("set_irrigation_schedule", "Schedules irrigation.")
                .param(Parameter::required("location", ParamType::String))
                .param(Parameter::required("start_time", ParamType::String))
                .param(Parameter::required("duration_minutes", ParamType::Integer)),
            ToolSpec::new("turn_on_water_pump", "Starts the pump.")
                .param(Parameter::optional("duration_minutes", ParamType::Integer)),
            ToolSpec::new("configure", "")
                .param(Parameter::optional("ratio", ParamType::Number))
                .param(Parameter::optional("enabled", ParamType::Boolean))
                .param(Parameter::optional("label", ParamType::String)),
        ])
        .unwrap()
    }

    fn check(call: ParsedCall) -> Result<ValidatedCall, CallError> {
        validate(call, &catalog(), &Policy::lenient())
    }

    #[test]
    fn unknown_tool() {
        assert_eq!(
            check(ParsedCall::new("launch_rocket")),
            Err(CallError::UnknownTool("launch_rocket".into()))
        );
    }

    #[test]
    fn missing_required() {
        let call = ParsedCall::new("set_irrigation_schedule").with_arg("location", "field_a");
        assert_eq!(
            check(call),
            Err(CallError::MissingRequired {
                tool: "set_irrigation_schedule".into(),
                names: vec!["start_time".into(), "duration_minutes".into()],
            })
        );
    }

    #[test]
    fn null_counts_as_missing() {
        let call = ParsedCall::new("control_fan").with_arg("state", Value::Null);
        assert!(matches!(check(call), Err(CallError::MissingRequired { .. })));

        let call = ParsedCall::new("turn_on_water_pump").with_arg("duration_minutes", Value::Null);
        assert!(check(call).unwrap().arguments.is_empty());
    }

    #[test]
    fn allowed_values_are_case_insensitive() {
        let call = ParsedCall::new("control_fan").with_arg("state", "ON");
        assert_eq!(check(call).unwrap().arguments["state"], "on");

        let call = ParsedCall::new("control_fan").with_arg("state", "sideways");
        assert_eq!(
            check(call),
            Err(CallError::InvalidValue {
                param: "state".into(),
                value: "sideways".into(),
                allowed: vec!["on".into(), "off".into()],
            })
        );
    }

    #[test]
    fn coerces_to_declared_types() {
        let call = ParsedCall::new("set_irrigation_schedule")
            .with_arg("location", "field_a")
            .with_arg("start_time", 600)
            .with_arg("duration_minutes", "30");
        let valid = check(call).unwrap();
        assert_eq!(valid.arguments["start_time"], "600");
        assert_eq!(valid.arguments["duration_minutes"], 30);
        assert!(valid.warnings.is_empty());

        let call = ParsedCall::new("configure")
            .with_arg("ratio", "0.5")
            .with_arg("enabled", "TRUE")
            .with_arg("label", true);
        let valid = check(call).unwrap();
        assert_eq!(valid.arguments["ratio"], json!(0.5));
        assert_eq!(valid.arguments["enabled"], true);
        assert_eq!(valid.arguments["label"], "true");
    }

    #[test]
    fn leading_zeros_survive_to_string_params() {
        let call = protocol::parse(
            "set_irrigation_schedule(location=field_a, start_time=0600, duration_minutes=030)",
        )
        .unwrap();
        let valid = check(call).unwrap();
        assert_eq!(valid.arguments["start_time"], "0600");
        assert_eq!(valid.arguments["duration_minutes"], 30);
        assert!(valid.warnings.is_empty());
    }

    #[test]
    fn whole_float_becomes_integer() {
        let call = ParsedCall::new("turn_on_water_pump").with_arg("duration_minutes", 15.0);
        assert_eq!(check(call).unwrap().arguments["duration_minutes"], 15);
    }

    #[test]
    fn unreachable_type_is_advisory() {
        let call = ParsedCall::new("turn_on_water_pump").with_arg("duration_minutes", "soon");
        let valid = check(call).unwrap();
        assert_eq!(valid.arguments["duration_minutes"], "soon");
        assert_eq!(
            valid.warnings,
            vec![Warning::TypeMismatch {
                param: "duration_minutes".into(),
                expected: "integer".into(),
            }]
        );
    }

    #[test]
    fn extra_arguments_pass_through_when_lenient() {
        let call = ParsedCall::new("control_fan")
            .with_arg("state", "on")
            .with_arg("speed", 3);
        let valid = check(call).unwrap();
        assert_eq!(valid.arguments["speed"], 3);
        assert_eq!(valid.warnings, vec![Warning::ExtraArgument { key: "speed".into() }]);
    }

    #[test]
    fn extra_arguments_rejected_when_strict() {
        let call = ParsedCall::new("control_fan")
            .with_arg("state", "on")
            .with_arg("speed", 3);
        assert_eq!(
            validate(call, &catalog(), &Policy::strict()),
            Err(CallError::UnexpectedArguments {
                tool: "control_fan".into(),
                names: vec!["speed".into()],
            })
        );
    }

    #[test]
    fn parse_warnings_are_kept() {
        let mut call = ParsedCall::new("control_fan").with_arg("state", "off");
        call.warnings.push(Warning::IgnoredCalls { count: 1 });
        let valid = check(call).unwrap();
        assert_eq!(valid.warnings, vec![Warning::IgnoredCalls { count: 1 }]);
    }

    #[test]
    fn argument_order_is_kept() {
        let call = ParsedCall::new("set_irrigation_schedule")
            .with_arg("start_time", "06:00")
            .with_arg("location", "orchard")
            .with_arg("duration_minutes", 20);
        let keys: Vec<_> = check(call).unwrap().arguments.keys().cloned().collect();
        assert_eq!(keys, vec!["start_time", "location", "duration_minutes"]);
    }
}
