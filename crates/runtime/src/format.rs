//! Turning a turn's outcome into the message the caller sees.

use crate::tools::{DispatchResult, ToolError};
use crate::validate::CallError;
use protocol::{ExtractionError, ParseError, Template, Warning};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Shown when the model produced no usable text.
pub const FALLBACK_TEXT: &str = "Could not understand the request or generate a response.";

const PARSE_FAILED: &str = "Error: Could not parse tool call arguments.";
const TOOL_FAILED: &str = "Error executing tool call.";
const TOOL_TIMED_OUT: &str = "Error: The tool took too long to respond.";
const MODEL_FAILED: &str = "Error: The model did not respond.";

/// How a turn ended, before formatting.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The model answered without a call block.
    PlainText(String),
    /// A call was dispatched.
    Dispatched {
        tool: String,
        result: DispatchResult,
        warnings: Vec<Warning>,
    },
    /// A call block was found but could not be read.
    ParseFailed(ParseError),
    /// The call was read but the catalog rejected it.
    Invalid(CallError),
    /// The call blocks themselves were rejected.
    Rejected(ExtractionError),
    /// The backend failed before producing output.
    ModelFailed(String),
}

/// The user-facing result of one turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutgoingMessage {
    /// A tool ran; `envelope` is what goes back to the model.
    ToolResponse {
        tool: String,
        payload: Value,
        envelope: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<Warning>,
    },
    Error {
        message: String,
    },
    Text {
        text: String,
    },
}

impl OutgoingMessage {
    /// The text shown to the user.
    pub fn text(&self) -> &str {
        match self {
            Self::ToolResponse { envelope, .. } => envelope,
            Self::Error { message } => message,
            Self::Text { text } => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

impl fmt::Display for OutgoingMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Renders outcomes using one chat template's sentinels.
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    template: Template,
}

impl Formatter {
    pub fn new(template: Template) -> Self {
        Self { template }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Wrap a tool result in the response envelope.
    ///
    /// Strings are written verbatim, anything else as compact JSON.
    pub fn envelope(&self, payload: &Value) -> String {
        let body = match payload {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        self.template.tool_response(&body)
    }

    pub fn format(&self, outcome: Outcome) -> OutgoingMessage {
        match outcome {
            Outcome::PlainText(raw) => {
                let text = self.template.strip_turn_markup(&raw);
                OutgoingMessage::Text {
                    text: if text.is_empty() {
                        FALLBACK_TEXT.to_string()
                    } else {
                        text.to_string()
                    },
                }
            }
            Outcome::Dispatched {
                tool,
                result,
                warnings,
            } => match result {
                DispatchResult::Ok(payload) => OutgoingMessage::ToolResponse {
                    envelope: self.envelope(&payload),
                    tool,
                    payload,
                    warnings,
                },
                DispatchResult::ToolNotFound(name) => {
                    OutgoingMessage::error(format!("Error: Unsupported tool call '{name}'."))
                }
                DispatchResult::InvalidArguments(details) => OutgoingMessage::error(format!(
                    "Error: Invalid arguments for '{tool}': {details}"
                )),
                DispatchResult::ToolError(ToolError::Timeout(_)) => {
                    OutgoingMessage::error(TOOL_TIMED_OUT)
                }
                DispatchResult::ToolError(_) => OutgoingMessage::error(TOOL_FAILED),
            },
            Outcome::ParseFailed(_) | Outcome::Rejected(_) => OutgoingMessage::error(PARSE_FAILED),
            Outcome::Invalid(CallError::UnknownTool(name)) => {
                OutgoingMessage::error(format!("Error: Unsupported tool call '{name}'."))
            }
            Outcome::Invalid(err) => OutgoingMessage::error(format!("Error: {err}.")),
            Outcome::ModelFailed(_) => OutgoingMessage::error(MODEL_FAILED),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dispatched(result: DispatchResult) -> Outcome {
        Outcome::Dispatched {
            tool: "control_fan".into(),
            result,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn string_payload_is_verbatim() {
        let msg = Formatter::default()
            .format(dispatched(DispatchResult::Ok(json!("The fan has been turned on."))));
        assert_eq!(
            msg.text(),
            "<|tool_response_start|>The fan has been turned on.<|tool_response_end|>"
        );
    }

    #[test]
    fn structured_payload_is_compact_json() {
        let payload = json!({"status": "success", "data": {"temperature": 22.5}});
        let msg = Formatter::default().format(dispatched(DispatchResult::Ok(payload.clone())));
        assert_eq!(
            msg.text(),
            r#"<|tool_response_start|>{"status":"success","data":{"temperature":22.5}}<|tool_response_end|>"#
        );
        let OutgoingMessage::ToolResponse { payload: kept, .. } = msg else {
            panic!("expected a tool response");
        };
        assert_eq!(kept, payload);
    }

    #[test]
    fn envelope_follows_template() {
        let formatter = Formatter::new(Template {
            tool_response_start: "[[".into(),
            tool_response_end: "]]".into(),
            ..Template::default()
        });
        assert_eq!(formatter.envelope(&json!(42)), "[[42]]");
    }

    #[test]
    fn error_strings_hide_details() {
        let f = Formatter::default();
        let failed = f.format(dispatched(DispatchResult::ToolError(ToolError::Execution(
            "disk I/O error at /var/lib/sensors".into(),
        ))));
        assert_eq!(failed.text(), "Error executing tool call.");
        assert!(failed.is_error());

        let timed_out = f.format(dispatched(DispatchResult::ToolError(ToolError::Timeout(5000))));
        assert_eq!(timed_out.text(), "Error: The tool took too long to respond.");

        let parse = f.format(Outcome::ParseFailed(ParseError::MalformedPositional("x".into())));
        assert_eq!(parse.text(), "Error: Could not parse tool call arguments.");

        let unknown = f.format(Outcome::Invalid(CallError::UnknownTool("launch_rocket".into())));
        assert_eq!(unknown.text(), "Error: Unsupported tool call 'launch_rocket'.");

        let not_found = f.format(dispatched(DispatchResult::ToolNotFound("control_fan".into())));
        assert_eq!(not_found.text(), "Error: Unsupported tool call 'control_fan'.");
    }

    #[test]
    fn validation_errors_name_the_problem() {
        let msg = Formatter::default().format(Outcome::Invalid(CallError::MissingRequired {
            tool: "control_fan".into(),
            names: vec!["state".into()],
        }));
        assert_eq!(
            msg.text(),
            "Error: control_fan is missing required argument(s): state."
        );
    }

    #[test]
    fn plain_text_is_trimmed() {
        let f = Formatter::default();
        let msg = f.format(Outcome::PlainText(
            "<|im_start|>assistant\nThe fan is off.<|im_end|>".into(),
        ));
        assert_eq!(msg, OutgoingMessage::Text { text: "The fan is off.".into() });

        let empty = f.format(Outcome::PlainText("<|im_end|>".into()));
        assert_eq!(empty.text(), FALLBACK_TEXT);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(OutgoingMessage::Text { text: "hi".into() }).unwrap();
        assert_eq!(json, json!({"kind": "text", "text": "hi"}));
    }
}
