//! SQLite-backed sensor log.
//!
//! This crate stores the readings that gauge tools query: temperature,
//! pressure and rainfall, one row per sample. The runtime never touches it
//! directly; only tool implementations do.
//!
//! # Overview
//!
//! - [`SensorStore`] wraps a SQLite database holding the `sensor_data`
//!   table. The schema matches the log written by the gauge reader, so an
//!   existing `sensors-json.db` can be opened as-is.
//! - [`Reading`] is one row. Any sensor may be missing from a row, and so
//!   may the timestamp: rows written by other tools are read as they are.
//! - [`Sensor`] names a column. It is a closed enum, so a sensor name taken
//!   from model output is validated before it reaches SQL.
//!
//! # Example
//!
//! ```no_run
//! use storage::{Reading, Sensor, SensorStore};
//!
//! let store = SensorStore::open("sensors-json.db")?;
//! store.record(&Reading::now(23.5, 1.01, 4.0))?;
//!
//! if let Some(latest) = store.latest()? {
//!     println!("{:?}: {:?} C", latest.timestamp, latest.temperature);
//! }
//! let avg = store.average(Sensor::Temperature, 10)?;
//! println!("10-sample average: {avg:?}");
//! # Ok::<(), storage::Error>(())
//! ```

mod error;
mod reading;
mod store;

pub use error::{Error, Result};
pub use reading::{Reading, Sensor, TIMESTAMP_FORMAT};
pub use store::SensorStore;
