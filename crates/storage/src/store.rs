//! SQLite sensor store implementation.

use crate::reading::TIMESTAMP_FORMAT;
use crate::{Reading, Result, Sensor};
use chrono::{DateTime, NaiveDateTime};
use rusqlite::{Connection, params};
use serde::Deserialize;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::warn;

/// Layouts accepted when reading rows, tried after [`TIMESTAMP_FORMAT`].
const TIMESTAMP_FALLBACKS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// SQLite-backed sensor log.
///
/// The connection sits behind a mutex so one store can be shared by tools
/// running on different threads.
pub struct SensorStore {
    conn: Mutex<Connection>,
}

#[derive(Debug, Deserialize)]
struct ReadingRow {
    id: i64,
    timestamp: Option<String>,
    temperature: Option<f64>,
    pressure: Option<f64>,
    rain: Option<f64>,
}

impl From<ReadingRow> for Reading {
    fn from(row: ReadingRow) -> Self {
        let timestamp = row.timestamp.as_deref().and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                warn!(id = row.id, timestamp = raw, "unreadable timestamp");
            }
            parsed
        });
        Reading {
            id: Some(row.id),
            timestamp,
            temperature: row.temperature,
            pressure: row.pressure,
            rain: row.rain,
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    std::iter::once(TIMESTAMP_FORMAT)
        .chain(TIMESTAMP_FALLBACKS)
        .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|ts| ts.naive_local()))
}

impl SensorStore {
    /// Open or create a sensor store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory sensor store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sensor_data (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT,
                temperature REAL,
                pressure REAL,
                rain REAL
            );
            "#,
        )?;
        Ok(())
    }

    /// Append a reading, returning its row id.
    pub fn record(&self, reading: &Reading) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO sensor_data (timestamp, temperature, pressure, rain) VALUES (?1, ?2, ?3, ?4)",
            params![
                reading
                    .timestamp
                    .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string()),
                reading.temperature,
                reading.pressure,
                reading.rain,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// The most recent reading, if any.
    pub fn latest(&self) -> Result<Option<Reading>> {
        Ok(self.recent(1)?.into_iter().next())
    }

    /// Up to `limit` readings, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<Reading>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, temperature, pressure, rain FROM sensor_data
             ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = serde_rusqlite::from_rows::<ReadingRow>(stmt.query([limit as i64])?);

        let mut readings = Vec::new();
        for row in rows {
            readings.push(Reading::from(row?));
        }
        Ok(readings)
    }

    /// The last `n` reported values of one sensor, newest first.
    pub fn last_n(&self, sensor: Sensor, n: usize) -> Result<Vec<f64>> {
        let column = sensor.column();
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {column} FROM sensor_data WHERE {column} IS NOT NULL
             ORDER BY id DESC LIMIT ?1"
        ))?;
        let values = stmt
            .query_map([n as i64], |row| row.get::<_, f64>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(values)
    }

    /// Mean of the last `n` reported values of one sensor.
    pub fn average(&self, sensor: Sensor, n: usize) -> Result<Option<f64>> {
        let values = self.last_n(sensor, n)?;
        if values.is_empty() {
            return Ok(None);
        }
        Ok(Some(values.iter().sum::<f64>() / values.len() as f64))
    }
}
