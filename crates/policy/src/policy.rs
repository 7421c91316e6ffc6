//! Policy configuration and enforcement.

use crate::{Error, ExtraArguments, MultipleCalls, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Policy configuration loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Handling of arguments the tool does not declare.
    pub extra_arguments: ExtraArguments,

    /// Handling of replies with more than one call block.
    pub multiple_calls: MultipleCalls,

    /// Deadline for a single tool invocation, in milliseconds.
    pub tool_timeout_ms: Option<u64>,
}

/// Result of a policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { reason: String },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl Policy {
    /// Load policy from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse policy from TOML string.
    pub fn parse(toml: &str) -> Result<Self> {
        let policy: Self = toml::from_str(toml).map_err(|e| Error::Parse(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Accept what the model most likely meant: first call wins, undeclared
    /// arguments pass through, no deadline.
    pub fn lenient() -> Self {
        Self::default()
    }

    /// Reject anything ambiguous and bound every tool call.
    pub fn strict() -> Self {
        Self {
            extra_arguments: ExtraArguments::Reject,
            multiple_calls: MultipleCalls::Reject,
            tool_timeout_ms: Some(5_000),
        }
    }

    /// Tool deadline, if one is configured.
    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_ms.map(Duration::from_millis)
    }

    /// Check whether a reply holding `calls` calls, across all blocks, may proceed.
    pub fn check_call_count(&self, calls: usize) -> Decision {
        match self.multiple_calls {
            MultipleCalls::Reject if calls > 1 => Decision::Deny {
                reason: format!("{calls} calls in one reply"),
            },
            _ => Decision::Allow,
        }
    }

    /// Check whether undeclared arguments may be passed to a tool.
    pub fn check_extra_arguments(&self, names: &[String]) -> Decision {
        match self.extra_arguments {
            ExtraArguments::Reject if !names.is_empty() => Decision::Deny {
                reason: format!("undeclared arguments: {}", names.join(", ")),
            },
            _ => Decision::Allow,
        }
    }

    /// Check values serde cannot rule out on its own.
    pub fn validate(&self) -> Result<()> {
        if self.tool_timeout_ms == Some(0) {
            return Err(Error::Invalid(
                "tool_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_allows_everything() {
        let policy = Policy::lenient();
        assert!(policy.check_call_count(3).is_allowed());
        assert!(policy.check_extra_arguments(&["speed".into()]).is_allowed());
        assert_eq!(policy.tool_timeout(), None);
    }

    #[test]
    fn test_strict_denies_ambiguity() {
        let policy = Policy::strict();
        assert!(policy.check_call_count(1).is_allowed());
        assert!(!policy.check_call_count(2).is_allowed());
        assert!(policy.check_extra_arguments(&[]).is_allowed());
        assert_eq!(
            policy.check_extra_arguments(&["speed".into(), "mode".into()]),
            Decision::Deny {
                reason: "undeclared arguments: speed, mode".into()
            }
        );
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
extra_arguments = "reject"
tool_timeout_ms = 250
"#;
        let policy = Policy::parse(toml).unwrap();
        assert_eq!(policy.extra_arguments, ExtraArguments::Reject);
        assert_eq!(policy.multiple_calls, MultipleCalls::FirstWins);
        assert_eq!(policy.tool_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_parse_rejects_zero_timeout() {
        assert!(matches!(
            Policy::parse("tool_timeout_ms = 0"),
            Err(Error::Invalid(_))
        ));
        assert!(matches!(
            Policy::parse("multiple_calls = \"sometimes\""),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_round_trips_through_json() {
        let json = serde_json::to_string(&Policy::strict()).unwrap();
        assert!(json.contains("\"multiple_calls\":\"reject\""));
    }
}
