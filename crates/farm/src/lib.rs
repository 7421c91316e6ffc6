//! Smart-farm tools.
//!
//! Implementations and catalog entries for the tools a farm assistant
//! exposes: actuator controls, sensor-log queries, a maintenance schedule,
//! and the actions a [`Monitor`] may trigger when a reading crosses a
//! threshold.
//!
//! ```
//! use std::sync::Arc;
//! use storage::SensorStore;
//!
//! let store = Arc::new(SensorStore::in_memory()?);
//! let catalog = farm::default_catalog().expect("catalog");
//! let registry = farm::registry(store);
//!
//! for spec in catalog.iter() {
//!     assert!(registry.get(&spec.name).is_some());
//! }
//! # Ok::<(), storage::Error>(())
//! ```

mod actuators;
mod args;
mod catalog;
mod maintenance;
mod monitor;
mod sensors;

pub use catalog::{assistant_tools, threshold_tools};
pub use maintenance::{Appointment, MaintenanceLog};
pub use monitor::{Monitor, Thresholds};

use runtime::{CatalogError, ToolCatalog, ToolRegistry};
use std::sync::Arc;
use storage::SensorStore;

/// Every farm tool, threshold actions included.
pub fn default_catalog() -> Result<ToolCatalog, CatalogError> {
    ToolCatalog::new(assistant_tools().into_iter().chain(threshold_tools()))
}

/// Implementations for every tool in [`default_catalog`].
pub fn registry(store: Arc<SensorStore>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    actuators::register(&mut registry);
    sensors::register(&mut registry, &store);
    maintenance::register(&mut registry, &Arc::new(MaintenanceLog::default()));
    registry
}
