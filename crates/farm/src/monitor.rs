//! Threshold monitor: asks the model to react to each new reading.

use crate::catalog::threshold_tools;
use runtime::llm::Backend;
use runtime::{CatalogError, Policy, Session, Template, ToolCatalog, ToolRegistry, Turn};
use std::sync::Arc;
use storage::{Reading, Sensor, SensorStore};
use tracing::{debug, info};

/// Limits above which the monitor should act.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub rain_mm: f64,
    pub pressure_bar: f64,
    pub temperature_c: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            rain_mm: 20.0,
            pressure_bar: 1.0,
            temperature_c: 50.0,
        }
    }
}

impl Thresholds {
    /// Actions the rules call for on `reading`.
    pub fn crossed(&self, reading: &Reading) -> Vec<&'static str> {
        Sensor::ALL
            .into_iter()
            .filter(|&sensor| reading.value(sensor).is_some_and(|v| v > self.limit(sensor)))
            .map(action)
            .collect()
    }

    fn limit(&self, sensor: Sensor) -> f64 {
        match sensor {
            Sensor::Temperature => self.temperature_c,
            Sensor::Pressure => self.pressure_bar,
            Sensor::Rain => self.rain_mm,
        }
    }

    /// The rules as written into the system prompt.
    pub fn persona(&self) -> String {
        format!(
            "You are a smart IoT assistant. Based on rules, trigger actions when thresholds are crossed.\n\
             \n\
             Threshold rules:\n\
             - If rainfall > {} mm, call turn_on_drain\n\
             - If pressure > {} bar, call open_pressure_valve\n\
             - If temperature > {} C, call start_cooling_system\n\
             \n\
             Do not take any action if no threshold is crossed.",
            self.rain_mm, self.pressure_bar, self.temperature_c
        )
    }
}

fn action(sensor: Sensor) -> &'static str {
    match sensor {
        Sensor::Temperature => "start_cooling_system",
        Sensor::Pressure => "open_pressure_valve",
        Sensor::Rain => "turn_on_drain",
    }
}

fn describe(reading: &Reading) -> String {
    let show = |v: Option<f64>| v.map_or_else(|| "unknown".to_string(), |v| v.to_string());
    format!(
        "Current reading:\nTemperature={}, Pressure={}, Rainfall={}",
        show(reading.temperature),
        show(reading.pressure),
        show(reading.rain)
    )
}

/// Runs one model turn per new row in the sensor log.
pub struct Monitor<B> {
    session: Session<B>,
    store: Arc<SensorStore>,
    thresholds: Thresholds,
    last_id: Option<i64>,
}

impl<B: Backend> Monitor<B> {
    pub fn new(
        backend: B,
        store: Arc<SensorStore>,
        registry: Arc<ToolRegistry>,
        thresholds: Thresholds,
    ) -> Result<Self, CatalogError> {
        let catalog = Arc::new(ToolCatalog::new(threshold_tools())?);
        let session = Session::new(backend, catalog, registry).with_system(thresholds.persona());
        Ok(Self {
            session,
            store,
            thresholds,
            last_id: None,
        })
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.session = self.session.with_policy(policy);
        self
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.session = self.session.with_template(template);
        self
    }

    pub fn session(&self) -> &Session<B> {
        &self.session
    }

    /// Check the log once; run a turn if a new reading arrived.
    pub async fn poll(&mut self) -> storage::Result<Option<Turn>> {
        let Some(reading) = self.store.latest()? else {
            debug!("sensor log is empty");
            return Ok(None);
        };
        if reading.id <= self.last_id {
            return Ok(None);
        }
        self.last_id = reading.id;
        info!(
            id = ?reading.id,
            expected = ?self.thresholds.crossed(&reading),
            "new reading"
        );

        let mut history = Vec::new();
        let turn = self.session.handle_turn(&describe(&reading), &mut history).await;
        info!(reply = %turn.message, "monitor turn");
        Ok(Some(turn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossed_thresholds() {
        let t = Thresholds::default();
        assert!(t.crossed(&Reading::now(25.0, 0.9, 5.0)).is_empty());
        assert_eq!(
            t.crossed(&Reading::now(55.0, 1.2, 21.0)),
            vec!["start_cooling_system", "open_pressure_valve", "turn_on_drain"]
        );
        let partial = Reading {
            temperature: None,
            ..Reading::now(0.0, 1.5, 0.0)
        };
        assert_eq!(t.crossed(&partial), vec!["open_pressure_valve"]);
    }

    #[test]
    fn persona_lists_rules() {
        let persona = Thresholds::default().persona();
        assert!(persona.contains("rainfall > 20 mm, call turn_on_drain"));
        assert!(persona.contains("temperature > 50 C, call start_cooling_system"));
    }

    #[test]
    fn describes_missing_values() {
        let reading = Reading {
            rain: None,
            ..Reading::now(21.5, 1.0, 0.0)
        };
        assert_eq!(
            describe(&reading),
            "Current reading:\nTemperature=21.5, Pressure=1, Rainfall=unknown"
        );
    }
}
