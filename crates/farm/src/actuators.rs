//! Fan, drain, pump and irrigation controls.
//!
//! These drive no hardware; each returns the confirmation a real controller
//! would report.

use crate::args::{optional_int, required_int, required_str};
use protocol::Arguments;
use runtime::{ToolError, ToolRegistry};
use serde_json::{Value, json};
use tracing::info;

fn control_fan(args: &Arguments) -> Result<Value, ToolError> {
    match required_str(args, "state")?.to_ascii_lowercase().as_str() {
        "on" => {
            info!("turning fan on");
            Ok(json!("The fan has been turned on."))
        }
        "off" => {
            info!("turning fan off");
            Ok(json!("The fan has been turned off."))
        }
        _ => Err(ToolError::InvalidInput(
            "Invalid state. Please specify 'on' or 'off'.".into(),
        )),
    }
}

fn control_drain(args: &Arguments) -> Result<Value, ToolError> {
    match required_str(args, "state")?.to_ascii_lowercase().as_str() {
        "open" => {
            info!("opening drain");
            Ok(json!("The drain has been opened."))
        }
        "closed" => {
            info!("closing drain");
            Ok(json!("The drain has been closed."))
        }
        _ => Err(ToolError::InvalidInput(
            "Invalid state. Please specify 'open' or 'closed'.".into(),
        )),
    }
}

fn turn_on_water_pump(args: &Arguments) -> Result<Value, ToolError> {
    let status = match optional_int(args, "duration_minutes")? {
        Some(minutes) if minutes > 0 => format!("Water pump turned ON for {minutes} minutes."),
        _ => "Water pump turned ON. It will run until manually stopped.".to_string(),
    };
    info!(%status, "water pump");
    Ok(json!({ "status": status }))
}

fn turn_off_water_pump(_: &Arguments) -> Result<Value, ToolError> {
    info!("water pump off");
    Ok(json!({ "status": "Water pump turned OFF." }))
}

/// Canned moisture levels until field probes are wired in.
fn soil_moisture(location: &str) -> u8 {
    match location {
        "field_a" => 45,
        "greenhouse_1" => 60,
        "orchard" => 30,
        _ => 50,
    }
}

fn check_soil_moisture(args: &Arguments) -> Result<Value, ToolError> {
    let location = required_str(args, "location")?;
    let level = soil_moisture(location);
    Ok(json!({ "status": format!("Soil moisture at {location} is {level}%.") }))
}

fn set_irrigation_schedule(args: &Arguments) -> Result<Value, ToolError> {
    let location = required_str(args, "location")?;
    let start_time = required_str(args, "start_time")?;
    let minutes = required_int(args, "duration_minutes")?;
    if minutes <= 0 {
        return Err(ToolError::InvalidInput(format!(
            "duration_minutes must be positive, got {minutes}"
        )));
    }
    info!(location, start_time, minutes, "irrigation scheduled");
    Ok(json!({
        "status": format!("Irrigation scheduled for {location} at {start_time} for {minutes} minutes.")
    }))
}

fn turn_on_drain(_: &Arguments) -> Result<Value, ToolError> {
    info!("drain on");
    Ok(json!("Drain turned ON (rainfall too high)."))
}

fn open_pressure_valve(_: &Arguments) -> Result<Value, ToolError> {
    info!("pressure valve open");
    Ok(json!("Pressure valve opened (pressure too high)."))
}

fn start_cooling_system(_: &Arguments) -> Result<Value, ToolError> {
    info!("cooling system on");
    Ok(json!("Cooling system activated (temperature too high)."))
}

pub(crate) fn register(registry: &mut ToolRegistry) {
    registry
        .register_fn("control_fan", control_fan)
        .register_fn("control_drain", control_drain)
        .register_fn("turn_on_water_pump", turn_on_water_pump)
        .register_fn("turn_off_water_pump", turn_off_water_pump)
        .register_fn("check_soil_moisture", check_soil_moisture)
        .register_fn("set_irrigation_schedule", set_irrigation_schedule)
        .register_fn("turn_on_drain", turn_on_drain)
        .register_fn("open_pressure_valve", open_pressure_valve)
        .register_fn("start_cooling_system", start_cooling_system);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, Value)]) -> Arguments {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn fan_states() {
        assert_eq!(
            control_fan(&args(&[("state", json!("On"))])).unwrap(),
            json!("The fan has been turned on.")
        );
        assert!(matches!(
            control_fan(&args(&[("state", json!("spin"))])),
            Err(ToolError::InvalidInput(_))
        ));
        assert!(control_fan(&Arguments::new()).is_err());
    }

    #[test]
    fn drain_states() {
        assert_eq!(
            control_drain(&args(&[("state", json!("closed"))])).unwrap(),
            json!("The drain has been closed.")
        );
    }

    #[test]
    fn pump_duration_is_optional() {
        assert_eq!(
            turn_on_water_pump(&args(&[("duration_minutes", json!(15))])).unwrap()["status"],
            "Water pump turned ON for 15 minutes."
        );
        assert_eq!(
            turn_on_water_pump(&Arguments::new()).unwrap()["status"],
            "Water pump turned ON. It will run until manually stopped."
        );
    }

    #[test]
    fn soil_moisture_defaults() {
        let reply = check_soil_moisture(&args(&[("location", json!("orchard"))])).unwrap();
        assert_eq!(reply["status"], "Soil moisture at orchard is 30%.");
        let reply = check_soil_moisture(&args(&[("location", json!("north_field"))])).unwrap();
        assert_eq!(reply["status"], "Soil moisture at north_field is 50%.");
    }

    #[test]
    fn irrigation_requires_positive_duration() {
        let ok = set_irrigation_schedule(&args(&[
            ("location", json!("field_a")),
            ("start_time", json!("06:00")),
            ("duration_minutes", json!(30)),
        ]))
        .unwrap();
        assert_eq!(
            ok["status"],
            "Irrigation scheduled for field_a at 06:00 for 30 minutes."
        );

        let bad = set_irrigation_schedule(&args(&[
            ("location", json!("field_a")),
            ("start_time", json!("06:00")),
            ("duration_minutes", json!(0)),
        ]));
        assert!(matches!(bad, Err(ToolError::InvalidInput(_))));
    }
}
