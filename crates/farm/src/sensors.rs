//! Tools that read the sensor log.

use crate::args::{count, sensor};
use protocol::Arguments;
use runtime::{Tool, ToolError, ToolRegistry};
use serde_json::{Value, json};
use std::sync::Arc;
use storage::SensorStore;
use tracing::warn;

fn store_error(err: storage::Error) -> ToolError {
    warn!(error = %err, "sensor store");
    ToolError::Unavailable(format!("sensor store: {err}"))
}

/// Latest temperature, pressure and rain.
///
/// Store failures are reported in the payload rather than as a tool error,
/// so the model can tell the user what went wrong.
struct GetSensorData {
    store: Arc<SensorStore>,
}

impl Tool for GetSensorData {
    fn name(&self) -> &str {
        "get_sensor_data"
    }

    fn call(&self, _args: &Arguments) -> Result<Value, ToolError> {
        match self.store.latest() {
            Ok(Some(reading)) => Ok(json!({
                "status": "success",
                "data": {
                    "temperature": reading.temperature,
                    "pressure": reading.pressure,
                    "rain": reading.rain,
                },
            })),
            Ok(None) => Ok(json!({
                "status": "error",
                "message": "No data found in the database.",
            })),
            Err(err) => {
                warn!(error = %err, "sensor store");
                Ok(json!({
                    "status": "error",
                    "message": format!("Database error: {err}"),
                }))
            }
        }
    }
}

/// The last `n` values of one sensor, newest first.
struct GetLastReadings {
    store: Arc<SensorStore>,
}

impl Tool for GetLastReadings {
    fn name(&self) -> &str {
        "get_last_readings"
    }

    fn call(&self, args: &Arguments) -> Result<Value, ToolError> {
        let sensor = sensor(args)?;
        let n = count(args, "n", 3)?;
        let readings = self.store.last_n(sensor, n).map_err(store_error)?;
        Ok(json!({
            "sensor": sensor.column(),
            "unit": sensor.unit(),
            "readings": readings,
        }))
    }
}

/// Mean of the last `n` values of one sensor.
struct ComputeAverage {
    store: Arc<SensorStore>,
}

impl Tool for ComputeAverage {
    fn name(&self) -> &str {
        "compute_average"
    }

    fn call(&self, args: &Arguments) -> Result<Value, ToolError> {
        let sensor = sensor(args)?;
        let n = count(args, "n", 10)?;
        let average = self.store.average(sensor, n).map_err(store_error)?;
        Ok(json!({
            "sensor": sensor.column(),
            "unit": sensor.unit(),
            "n": n,
            "average": average,
        }))
    }
}

pub(crate) fn register(registry: &mut ToolRegistry, store: &Arc<SensorStore>) {
    registry
        .register(GetSensorData {
            store: Arc::clone(store),
        })
        .register(GetLastReadings {
            store: Arc::clone(store),
        })
        .register(ComputeAverage {
            store: Arc::clone(store),
        });
}
