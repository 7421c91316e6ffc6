//! Sentinel tokens shared by the prompt, the extractor and the formatter.

use serde::{Deserialize, Serialize};

/// The chat template's special tokens.
///
/// Defaults match the LFM2 chat template. The catalog serializer, the call
/// extractor and the response envelope must all read from the same value,
/// so a deployment that overrides one marker overrides it everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Template {
    pub begin_of_text: String,
    pub end_of_text: String,
    pub turn_start: String,
    pub turn_end: String,
    pub tool_list_start: String,
    pub tool_list_end: String,
    pub tool_call_start: String,
    pub tool_call_end: String,
    pub tool_response_start: String,
    pub tool_response_end: String,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            begin_of_text: "<|startoftext|>".to_string(),
            end_of_text: "<|endoftext|>".to_string(),
            turn_start: "<|im_start|>".to_string(),
            turn_end: "<|im_end|>".to_string(),
            tool_list_start: "<|tool_list_start|>".to_string(),
            tool_list_end: "<|tool_list_end|>".to_string(),
            tool_call_start: "<|tool_call_start|>".to_string(),
            tool_call_end: "<|tool_call_end|>".to_string(),
            tool_response_start: "<|tool_response_start|>".to_string(),
            tool_response_end: "<|tool_response_end|>".to_string(),
        }
    }
}

impl Template {
    /// Name of the first marker that is blank, if any.
    ///
    /// A blank marker matches everywhere, so a template holding one is
    /// unusable.
    pub fn blank_marker(&self) -> Option<&'static str> {
        [
            ("begin_of_text", &self.begin_of_text),
            ("end_of_text", &self.end_of_text),
            ("turn_start", &self.turn_start),
            ("turn_end", &self.turn_end),
            ("tool_list_start", &self.tool_list_start),
            ("tool_list_end", &self.tool_list_end),
            ("tool_call_start", &self.tool_call_start),
            ("tool_call_end", &self.tool_call_end),
            ("tool_response_start", &self.tool_response_start),
            ("tool_response_end", &self.tool_response_end),
        ]
        .into_iter()
        .find(|(_, marker)| marker.trim().is_empty())
        .map(|(name, _)| name)
    }

    /// Wrap a serialized tool list in the tool-list sentinels.
    pub fn tool_list(&self, tools_json: &str) -> String {
        format!("{}{tools_json}{}", self.tool_list_start, self.tool_list_end)
    }

    /// Wrap a tool result in the tool-response sentinels.
    pub fn tool_response(&self, body: &str) -> String {
        format!("{}{body}{}", self.tool_response_start, self.tool_response_end)
    }

    /// Wrap a call expression in the tool-call sentinels.
    pub fn tool_call(&self, call: &str) -> String {
        format!("{}{call}{}", self.tool_call_start, self.tool_call_end)
    }

    /// Render one chat turn: `<|im_start|>{role}\n{content}<|im_end|>\n`.
    pub fn turn(&self, role: &str, content: &str) -> String {
        format!("{}{role}\n{content}{}\n", self.turn_start, self.turn_end)
    }

    /// The header that opens the assistant's reply.
    pub fn assistant_header(&self) -> String {
        format!("{}assistant\n", self.turn_start)
    }

    /// Remove chat-turn markup around an assistant reply.
    ///
    /// Accepts either the full decoded sequence (prompt included) or only the
    /// generated continuation. Anything from a dangling call-start marker
    /// onward is dropped, since a half-written call is not user-facing text.
    pub fn strip_turn_markup<'a>(&self, text: &'a str) -> &'a str {
        let assistant = format!("{}assistant", self.turn_start);
        let mut reply = match text.rfind(&assistant) {
            Some(at) => &text[at + assistant.len()..],
            None => text,
        };
        if let Some(end) = reply.find(&self.turn_end) {
            reply = &reply[..end];
        }
        if let Some(call) = reply.find(&self.tool_call_start) {
            reply = &reply[..call];
        }
        for marker in [&self.begin_of_text, &self.end_of_text] {
            reply = reply.trim().trim_start_matches(marker.as_str());
            reply = reply.trim().trim_end_matches(marker.as_str());
        }
        reply.trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_uses_configured_markers() {
        let template = Template {
            tool_response_start: "<resp>".into(),
            tool_response_end: "</resp>".into(),
            ..Template::default()
        };
        assert_eq!(template.tool_response("ok"), "<resp>ok</resp>");
    }

    #[test]
    fn blank_marker_is_named() {
        assert_eq!(Template::default().blank_marker(), None);
        let template = Template {
            tool_call_end: " ".into(),
            ..Template::default()
        };
        assert_eq!(template.blank_marker(), Some("tool_call_end"));
    }

    #[test]
    fn strips_full_decoded_sequence() {
        let template = Template::default();
        let decoded = "<|startoftext|><|im_start|>system\nList of tools: []<|im_end|>\n\
                       <|im_start|>user\nhi<|im_end|>\n<|im_start|>assistant\nHello there!<|im_end|>";
        assert_eq!(template.strip_turn_markup(decoded), "Hello there!");
    }

    #[test]
    fn strips_continuation_only() {
        let template = Template::default();
        assert_eq!(template.strip_turn_markup("  Sure.<|im_end|>"), "Sure.");
        assert_eq!(template.strip_turn_markup("Plain."), "Plain.");
    }

    #[test]
    fn drops_dangling_call() {
        let template = Template::default();
        let text = "Turning it on. <|tool_call_start|>[control_fan(state=";
        assert_eq!(template.strip_turn_markup(text), "Turning it on.");
    }

    #[test]
    fn parses_partial_overrides() {
        let template: Template = serde_json::from_str(r#"{"tool_call_start": "<call>"}"#).unwrap();
        assert_eq!(template.tool_call_start, "<call>");
        assert_eq!(template.tool_call_end, "<|tool_call_end|>");
    }
}
