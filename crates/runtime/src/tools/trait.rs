//! Tool trait.

use crate::tools::ToolError;
use protocol::Arguments;
use serde_json::Value;

/// A callable tool.
///
/// This is the boundary between the session loop and side effects.
/// Implementations are synchronous; the dispatcher moves them onto the
/// blocking pool.
pub trait Tool: Send + Sync {
    /// Name the tool is registered under.
    fn name(&self) -> &str;

    /// Run the tool with validated arguments.
    fn call(&self, args: &Arguments) -> Result<Value, ToolError>;
}

/// A tool backed by a closure.
pub struct FnTool<F> {
    name: String,
    f: F,
}

impl<F> FnTool<F>
where
    F: Fn(&Arguments) -> Result<Value, ToolError> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Tool for FnTool<F>
where
    F: Fn(&Arguments) -> Result<Value, ToolError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, args: &Arguments) -> Result<Value, ToolError> {
        (self.f)(args)
    }
}
