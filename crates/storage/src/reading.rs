//! Sensor reading types.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Timestamp layout used by the `sensor_data` table.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A gauge recorded in the sensor log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensor {
    Temperature,
    Pressure,
    Rain,
}

impl Sensor {
    pub const ALL: [Sensor; 3] = [Sensor::Temperature, Sensor::Pressure, Sensor::Rain];

    /// Column holding this sensor's values.
    pub fn column(self) -> &'static str {
        match self {
            Sensor::Temperature => "temperature",
            Sensor::Pressure => "pressure",
            Sensor::Rain => "rain",
        }
    }

    /// Display unit.
    pub fn unit(self) -> &'static str {
        match self {
            Sensor::Temperature => "C",
            Sensor::Pressure => "bar",
            Sensor::Rain => "mm",
        }
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Sensor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "temperature" | "temp" => Ok(Sensor::Temperature),
            "pressure" => Ok(Sensor::Pressure),
            "rain" | "rainfall" | "rainfall_height" => Ok(Sensor::Rain),
            _ => Err(Error::UnknownSensor(s.to_string())),
        }
    }
}

/// One row of the sensor log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Row id, assigned by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// `None` when the row has no timestamp or one in an unknown layout.
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
    pub temperature: Option<f64>,
    pub pressure: Option<f64>,
    pub rain: Option<f64>,
}

impl Reading {
    /// A reading taken now, in local time.
    pub fn now(temperature: f64, pressure: f64, rain: f64) -> Self {
        Self {
            id: None,
            timestamp: Some(Local::now().naive_local()),
            temperature: Some(temperature),
            pressure: Some(pressure),
            rain: Some(rain),
        }
    }

    /// Value of one sensor, if it reported.
    pub fn value(&self, sensor: Sensor) -> Option<f64> {
        match sensor {
            Sensor::Temperature => self.temperature,
            Sensor::Pressure => self.pressure,
            Sensor::Rain => self.rain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_names() {
        assert_eq!("Temp".parse::<Sensor>().unwrap(), Sensor::Temperature);
        assert_eq!("rainfall".parse::<Sensor>().unwrap(), Sensor::Rain);
        assert!(matches!(
            "humidity".parse::<Sensor>(),
            Err(Error::UnknownSensor(name)) if name == "humidity"
        ));
        assert_eq!(Sensor::Pressure.to_string(), "pressure");
    }

    #[test]
    fn reading_values() {
        let reading = Reading::now(21.5, 1.2, 0.0);
        assert_eq!(reading.value(Sensor::Pressure), Some(1.2));
        assert_eq!(reading.id, None);
    }
}
