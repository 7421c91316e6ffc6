//! Reading typed values out of validated arguments.

use protocol::Arguments;
use runtime::ToolError;
use serde_json::Value;
use storage::Sensor;

pub(crate) fn required_str<'a>(args: &'a Arguments, name: &str) -> Result<&'a str, ToolError> {
    match args.get(name) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ToolError::InvalidInput(format!("{name} must be a string, got {other}"))),
        None => Err(ToolError::InvalidInput(format!("{name} is required"))),
    }
}

pub(crate) fn optional_int(args: &Arguments, name: &str) -> Result<Option<i64>, ToolError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| ToolError::InvalidInput(format!("{name} must be an integer, got {value}"))),
    }
}

pub(crate) fn required_int(args: &Arguments, name: &str) -> Result<i64, ToolError> {
    optional_int(args, name)?.ok_or_else(|| ToolError::InvalidInput(format!("{name} is required")))
}

/// A positive count, defaulting when absent.
pub(crate) fn count(args: &Arguments, name: &str, default: usize) -> Result<usize, ToolError> {
    match optional_int(args, name)? {
        None => Ok(default),
        Some(n) if n > 0 => Ok(n as usize),
        Some(n) => Err(ToolError::InvalidInput(format!("{name} must be positive, got {n}"))),
    }
}

pub(crate) fn sensor(args: &Arguments) -> Result<Sensor, ToolError> {
    required_str(args, "sensor")?
        .parse()
        .map_err(|e: storage::Error| ToolError::InvalidInput(e.to_string()))
}
