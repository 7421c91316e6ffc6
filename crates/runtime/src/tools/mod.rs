//! Tool implementations, lookup and dispatch.

mod dispatch;
pub mod errors;
mod registry;
mod r#trait;

pub use dispatch::{DispatchResult, Dispatcher};
pub use errors::ToolError;
pub use registry::ToolRegistry;
pub use r#trait::{FnTool, Tool};
