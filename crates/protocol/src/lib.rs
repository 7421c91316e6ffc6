//! Tool-call wire protocol for small chat models.
//!
//! This crate turns raw model text into a [`ParsedCall`]. It knows nothing
//! about which tools exist; schema checks and dispatch live in `runtime`.
//!
//! # Example
//!
//! ```
//! use protocol::{Template, extract, parse};
//!
//! let template = Template::default();
//! let output = "<|tool_call_start|>[control_fan(state=\"on\")]<|tool_call_end|>";
//!
//! let candidate = extract(output, &template).unwrap().expect("call block");
//! let call = parse(candidate.text).unwrap();
//! assert_eq!(call.name, "control_fan");
//! assert_eq!(call.arguments["state"], "on");
//! ```

mod call;
mod error;
mod extract;
mod parse;
mod template;

pub use call::{Arguments, ParsedCall, Warning};
pub use error::{ExtractionError, ParseError, Result};
pub use extract::{CandidateCall, extract};
pub use parse::parse;
pub use template::Template;
