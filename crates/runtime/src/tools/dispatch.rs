//! Routing validated calls to tool implementations.

use crate::tools::{ToolError, ToolRegistry};
use crate::validate::ValidatedCall;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// What happened when a call was dispatched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum DispatchResult {
    /// The tool returned a value.
    Ok(Value),
    /// The tool failed, timed out or panicked.
    ToolError(ToolError),
    /// The catalog advertised a tool the registry does not hold.
    ToolNotFound(String),
    /// The tool rejected its arguments.
    InvalidArguments(String),
}

impl DispatchResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

/// Runs tools from a registry, one call at a time.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    deadline: Option<Duration>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            deadline: None,
        }
    }

    /// Bound every tool invocation by `deadline`.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Invoke the tool named by `call`.
    ///
    /// Never fails: tool errors, panics and timeouts all come back as a
    /// [`DispatchResult`].
    pub async fn dispatch(&self, call: &ValidatedCall) -> DispatchResult {
        let Some(tool) = self.registry.get(&call.name) else {
            warn!(tool = %call.name, "tool is in the catalog but not registered");
            return DispatchResult::ToolNotFound(call.name.clone());
        };

        let args = call.arguments.clone();
        let task = tokio::task::spawn_blocking(move || tool.call(&args));

        let joined = match self.deadline {
            None => task.await,
            Some(deadline) => match tokio::time::timeout(deadline, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    let ms = deadline.as_millis() as u64;
                    warn!(tool = %call.name, ms, "tool timed out");
                    return DispatchResult::ToolError(ToolError::Timeout(ms));
                }
            },
        };

        match joined {
            Ok(Ok(value)) => {
                debug!(tool = %call.name, "tool returned");
                DispatchResult::Ok(value)
            }
            Ok(Err(ToolError::InvalidInput(details))) => {
                warn!(tool = %call.name, %details, "tool rejected its arguments");
                DispatchResult::InvalidArguments(details)
            }
            Ok(Err(err)) => {
                warn!(tool = %call.name, error = %err, "tool failed");
                DispatchResult::ToolError(err)
            }
            Err(join) => {
                warn!(tool = %call.name, error = %join, "tool panicked");
                DispatchResult::ToolError(ToolError::Execution("tool panicked".to_string()))
            }
        }
    }
}
