//! Call-handling policy.
//!
//! Decides how forgiving the runtime is with model output: whether
//! undeclared arguments and extra call blocks are tolerated, and how long a
//! tool may run.

mod error;
mod policy;
mod rules;

pub use error::{Error, Result};
pub use policy::{Decision, Policy};
pub use rules::{ExtraArguments, MultipleCalls};
