use serde::{Deserialize, Serialize};

/// What to do with arguments a tool does not declare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraArguments {
    /// Pass them to the tool unchanged.
    #[default]
    Pass,
    /// Reject the call.
    Reject,
}

/// What to do when one reply holds more than one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultipleCalls {
    /// Run the first call, ignore the rest.
    #[default]
    FirstWins,
    /// Treat the reply as unusable.
    Reject,
}
