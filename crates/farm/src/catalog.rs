//! Tool definitions advertised to the model.

use runtime::{ParamType, Parameter, ToolSpec};
use storage::Sensor;

fn sensor_param() -> Parameter {
    Parameter::required("sensor", ParamType::String)
        .one_of(Sensor::ALL.map(Sensor::column))
        .describe("Which sensor to read: 'temperature', 'pressure' or 'rain'.")
}

/// Tools for conversational use.
pub fn assistant_tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            "control_fan",
            "Controls the state of the fan. Use this to turn the fan on or off.",
        )
        .param(
            Parameter::required("state", ParamType::String)
                .one_of(["on", "off"])
                .describe("The desired state of the fan ('on' or 'off')."),
        ),
        ToolSpec::new(
            "control_drain",
            "Controls the state of the drain. Use this to open or close the drain.",
        )
        .param(
            Parameter::required("state", ParamType::String)
                .one_of(["open", "closed"])
                .describe("The desired state of the drain ('open' or 'closed')."),
        ),
        ToolSpec::new(
            "get_sensor_data",
            "Retrieves the most recent temperature, pressure, and rain data from the sensors \
             database. Use this tool when asked about current sensor readings or environmental \
             conditions.",
        ),
        ToolSpec::new(
            "get_last_readings",
            "Returns the most recent values reported by one sensor, newest first.",
        )
        .param(sensor_param())
        .param(
            Parameter::optional("n", ParamType::Integer)
                .describe("How many readings to return. Defaults to 3."),
        ),
        ToolSpec::new(
            "compute_average",
            "Computes the average of the most recent values reported by one sensor.",
        )
        .param(sensor_param())
        .param(
            Parameter::optional("n", ParamType::Integer)
                .describe("How many readings to average. Defaults to 10."),
        ),
        ToolSpec::new(
            "schedule_maintenance",
            "Schedules maintenance for a piece of equipment a number of days from now.",
        )
        .param(
            Parameter::required("equipment", ParamType::String)
                .describe("The equipment to service (e.g., 'pump', 'fan')."),
        )
        .param(
            Parameter::required("days_from_now", ParamType::Integer)
                .describe("Days from today until the maintenance."),
        ),
        ToolSpec::new("list_maintenance", "Lists scheduled maintenance."),
        ToolSpec::new(
            "turn_on_water_pump",
            "Turn on the farm's water pump. Can be for a specific duration or until manually \
             stopped.",
        )
        .param(
            Parameter::optional("duration_minutes", ParamType::Integer).describe(
                "Optional: Duration in minutes for which the pump should run. If not specified, \
                 it runs until manually stopped.",
            ),
        ),
        ToolSpec::new("turn_off_water_pump", "Turn off the farm's water pump."),
        ToolSpec::new(
            "check_soil_moisture",
            "Check the current soil moisture level at a specific farm location.",
        )
        .param(
            Parameter::required("location", ParamType::String).describe(
                "The specific location in the farm (e.g., 'field_a', 'greenhouse_1', 'orchard')",
            ),
        ),
        ToolSpec::new(
            "set_irrigation_schedule",
            "Set up an automated irrigation schedule for a specific farm location.",
        )
        .param(
            Parameter::required("location", ParamType::String).describe(
                "The location to schedule irrigation for (e.g., 'field_a', 'greenhouse_1')",
            ),
        )
        .param(
            Parameter::required("start_time", ParamType::String).describe(
                "The desired start time for the irrigation (e.g., '06:00', '18:30')",
            ),
        )
        .param(
            Parameter::required("duration_minutes", ParamType::Integer)
                .describe("The duration of the irrigation in minutes."),
        ),
    ]
}

/// Actions the threshold monitor may trigger.
pub fn threshold_tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new("turn_on_drain", "Turns on the drain when rainfall is too high."),
        ToolSpec::new(
            "open_pressure_valve",
            "Opens the pressure valve when pressure is too high.",
        ),
        ToolSpec::new(
            "start_cooling_system",
            "Starts the cooling system to lower the temperature.",
        ),
    ]
}
