//! Model backends.
//!
//! [`LlamaCppBackend`] talks to a local llama.cpp server; [`ScriptedBackend`]
//! replays canned output. Both implement [`Backend`](crate::llm::Backend).

mod llamacpp;
mod scripted;

pub use llamacpp::{LlamaCppBackend, LlamaCppBackendBuilder};
pub use scripted::ScriptedBackend;
