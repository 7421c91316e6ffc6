//! Equipment maintenance schedule.

use crate::args::{required_int, required_str};
use chrono::{Duration, Local, NaiveDateTime};
use protocol::Arguments;
use runtime::{Tool, ToolError, ToolRegistry};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use storage::TIMESTAMP_FORMAT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Appointment {
    pub equipment: String,
    #[serde(serialize_with = "serialize_date")]
    pub date: NaiveDateTime,
}

fn serialize_date<S: serde::Serializer>(date: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&date.format(TIMESTAMP_FORMAT))
}

/// In-memory schedule shared by the two maintenance tools.
#[derive(Debug, Default)]
pub struct MaintenanceLog {
    entries: Mutex<Vec<Appointment>>,
}

impl MaintenanceLog {
    fn entries(&self) -> MutexGuard<'_, Vec<Appointment>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Book `equipment` for `days` from `now`.
    pub fn schedule(&self, equipment: &str, now: NaiveDateTime, days: i64) -> Appointment {
        let appointment = Appointment {
            equipment: equipment.to_string(),
            date: now + Duration::days(days),
        };
        self.entries().push(appointment.clone());
        appointment
    }

    pub fn list(&self) -> Vec<Appointment> {
        self.entries().clone()
    }
}

struct ScheduleMaintenance {
    log: Arc<MaintenanceLog>,
}

impl Tool for ScheduleMaintenance {
    fn name(&self) -> &str {
        "schedule_maintenance"
    }

    fn call(&self, args: &Arguments) -> Result<Value, ToolError> {
        let equipment = required_str(args, "equipment")?;
        let days = required_int(args, "days_from_now")?;
        if !(0..=3650).contains(&days) {
            return Err(ToolError::InvalidInput(format!(
                "days_from_now must be between 0 and 3650, got {days}"
            )));
        }
        let booked = self.log.schedule(equipment, Local::now().naive_local(), days);
        Ok(json!(format!(
            "Scheduled maintenance for {} on {}",
            booked.equipment,
            booked.date.format(TIMESTAMP_FORMAT)
        )))
    }
}

struct ListMaintenance {
    log: Arc<MaintenanceLog>,
}

impl Tool for ListMaintenance {
    fn name(&self) -> &str {
        "list_maintenance"
    }

    fn call(&self, _args: &Arguments) -> Result<Value, ToolError> {
        serde_json::to_value(self.log.list()).map_err(|e| ToolError::Execution(e.to_string()))
    }
}

pub(crate) fn register(registry: &mut ToolRegistry, log: &Arc<MaintenanceLog>) {
    registry
        .register(ScheduleMaintenance {
            log: Arc::clone(log),
        })
        .register(ListMaintenance {
            log: Arc::clone(log),
        });
}
