//! Tool-calling runtime for small chat models.
//!
//! This crate takes raw model output and turns it into a message for the
//! user: it checks a parsed call against the tool catalog, runs the tool,
//! and wraps the result for the next model turn.
//!
//! # Overview
//!
//! - **ToolCatalog**: the tools advertised to the model, rendered into the
//!   system prompt.
//! - **ToolRegistry**: the implementations behind those names.
//! - **Pipeline**: extract, parse, validate, dispatch and format one reply.
//!   Every failure becomes an [`OutgoingMessage`].
//! - **Session**: a [`Pipeline`] bound to a [`Backend`](llm::Backend).
//!
//! # Example
//!
//! ```
//! use runtime::{Parameter, ParamType, ScriptedBackend, Session, ToolCatalog, ToolRegistry, ToolSpec};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let catalog = ToolCatalog::new([ToolSpec::new("control_fan", "Controls the fan.")
//!     .param(Parameter::required("state", ParamType::String).one_of(["on", "off"]))])
//! .unwrap();
//! let mut registry = ToolRegistry::new();
//! registry.register_fn("control_fan", |args| {
//!     Ok(json!(format!("The fan has been turned {}.", args["state"].as_str().unwrap_or("?"))))
//! });
//!
//! let backend = ScriptedBackend::new([
//!     "<|tool_call_start|>[control_fan(state=\"on\")]<|tool_call_end|>",
//! ]);
//! let session = Session::new(backend, Arc::new(catalog), Arc::new(registry));
//!
//! let mut history = Vec::new();
//! let turn = session.handle_turn("Turn on the fan", &mut history).await;
//! assert_eq!(
//!     turn.message.text(),
//!     "<|tool_response_start|>The fan has been turned on.<|tool_response_end|>"
//! );
//! # }
//! ```

mod backend;
mod catalog;
mod error;
mod format;
pub mod llm;
mod session;
pub mod tools;
mod validate;

pub use backend::{LlamaCppBackend, LlamaCppBackendBuilder, ScriptedBackend};
pub use catalog::{CatalogError, ParamType, Parameter, ToolCatalog, ToolSpec};
pub use error::{Error, Result};
pub use format::{FALLBACK_TEXT, Formatter, Outcome, OutgoingMessage};
pub use session::{Pipeline, Session, Turn, TurnId, TurnState, respond};
pub use tools::{DispatchResult, Dispatcher, Tool, ToolError, ToolRegistry};
pub use validate::{CallError, ValidatedCall, validate};

pub use policy::Policy;
pub use protocol::{Arguments, Template};
