//! Call grammar.
//!
//! Two surface forms are accepted, tried in this order:
//!
//! 1. Structured: a JSON object `{"name": ..., "arguments": {...}}`, or a
//!    JSON array whose first element is one. `arguments` may itself be a
//!    JSON string holding an object (double-encoded), which is decoded once.
//! 2. Positional: `name(key=value, ...)`, optionally wrapped in `[...]`.
//!
//! The positional scanner tracks string literals and bracket nesting, so
//! commas and parentheses inside quotes or nested lists never split an
//! argument.

use crate::call::{Arguments, ParsedCall, Warning};
use crate::error::{ParseError, Result};
use serde_json::{Number, Value};

const NAME_KEYS: [&str; 3] = ["name", "tool", "action"];
const ARGUMENT_KEYS: [&str; 2] = ["arguments", "args"];

/// Parse candidate call text into a [`ParsedCall`].
pub fn parse(candidate: &str) -> Result<ParsedCall> {
    let text = candidate.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    if text.starts_with('{') {
        let value = serde_json::from_str(text)
            .map_err(|e| ParseError::MalformedStructured(e.to_string()))?;
        return structured(value);
    }

    if let Some(inner) = text.strip_prefix('[') {
        if let Ok(value) = serde_json::from_str::<Value>(text) {
            return structured(value);
        }
        let inner = inner
            .strip_suffix(']')
            .ok_or_else(|| malformed("unclosed '['"))?;
        if inner.trim().is_empty() {
            return Err(ParseError::Empty);
        }
        return positional(inner);
    }

    positional(text)
}

fn structured(value: Value) -> Result<ParsedCall> {
    let (object, ignored) = match value {
        Value::Object(object) => (object, 0),
        Value::Array(items) => {
            let ignored = items.len().saturating_sub(1);
            match items.into_iter().next() {
                Some(Value::Object(object)) => (object, ignored),
                Some(_) => {
                    return Err(ParseError::MalformedStructured(
                        "call list must contain objects".to_string(),
                    ));
                }
                None => return Err(ParseError::Empty),
            }
        }
        _ => {
            return Err(ParseError::MalformedStructured(
                "expected an object".to_string(),
            ));
        }
    };

    let name = NAME_KEYS
        .iter()
        .find_map(|key| object.get(*key))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ParseError::MalformedStructured("missing \"name\"".to_string()))?;

    let arguments = match ARGUMENT_KEYS.iter().find_map(|key| object.get(*key)) {
        None | Some(Value::Null) => Arguments::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(encoded)) => decode_arguments(encoded)?,
        Some(_) => {
            return Err(ParseError::MalformedStructured(
                "\"arguments\" must be a mapping".to_string(),
            ));
        }
    };

    let mut call = ParsedCall {
        name: name.to_string(),
        arguments,
        warnings: Vec::new(),
    };
    if ignored > 0 {
        call.warnings.push(Warning::IgnoredCalls { count: ignored });
    }
    Ok(call)
}

/// Decode arguments that were serialized to a string inside the call object.
fn decode_arguments(encoded: &str) -> Result<Arguments> {
    if encoded.trim().is_empty() {
        return Ok(Arguments::new());
    }
    match serde_json::from_str(encoded) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ParseError::MalformedStructured(
            "encoded \"arguments\" is not an object".to_string(),
        )),
        Err(e) => Err(ParseError::MalformedStructured(format!(
            "encoded \"arguments\": {e}"
        ))),
    }
}

fn positional(text: &str) -> Result<ParsedCall> {
    let text = text.trim_start();
    let name_len = identifier_len(text);
    if name_len == 0 {
        return Err(malformed("expected a tool name"));
    }
    let (name, rest) = text.split_at(name_len);

    let Some(body) = rest.trim_start().strip_prefix('(') else {
        return Err(malformed(format!("expected '(' after {name}")));
    };
    let close = find_call_close(body)?;
    let (args, trailer) = (&body[..close], body[close + 1..].trim());

    let mut call = ParsedCall::new(name);
    if !args.trim().is_empty() {
        for pair in split_top_level(args) {
            read_pair(pair.trim(), &mut call);
        }
    }

    if !trailer.is_empty() {
        let Some(more) = trailer.strip_prefix(',') else {
            return Err(malformed(format!("unexpected text after call: {trailer}")));
        };
        let count = split_top_level(more)
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .count();
        if count > 0 {
            call.warnings.push(Warning::IgnoredCalls { count });
        }
    }

    Ok(call)
}

fn read_pair(pair: &str, call: &mut ParsedCall) {
    let Some((key, value)) = pair.split_once('=') else {
        call.warnings.push(Warning::MalformedPair {
            pair: pair.to_string(),
        });
        return;
    };
    let key = key.trim();
    if key.is_empty() || identifier_len(key) != key.len() {
        call.warnings.push(Warning::InvalidKey {
            key: key.to_string(),
        });
        return;
    }
    if call
        .arguments
        .insert(key.to_string(), literal(value.trim()))
        .is_some()
    {
        call.warnings.push(Warning::DuplicateArgument {
            key: key.to_string(),
        });
    }
}

/// Lex one positional value.
fn literal(raw: &str) -> Value {
    if let Some(text) = quoted(raw) {
        return Value::String(unescape(text));
    }
    if raw.starts_with(['"', '\'']) {
        return Value::String(raw.trim_matches(['"', '\'']).to_string());
    }
    if raw.starts_with(['[', '{']) {
        if let Ok(value) = serde_json::from_str(raw) {
            return value;
        }
    }
    match raw.to_ascii_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" | "none" => return Value::Null,
        _ => {}
    }
    // Numbers must print back as written; `0600` or `1.50` stay text.
    let number = match raw.parse::<i64>() {
        Ok(int) => Some(Number::from(int)),
        Err(_) if looks_numeric(raw) => raw.parse::<f64>().ok().and_then(Number::from_f64),
        Err(_) => None,
    };
    match number {
        Some(number) if number.to_string() == raw => Value::Number(number),
        _ => Value::String(raw.to_string()),
    }
}

fn quoted(raw: &str) -> Option<&str> {
    let quote = raw.chars().next().filter(|c| matches!(c, '"' | '\''))?;
    raw[1..].strip_suffix(quote)
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(c @ ('\\' | '"' | '\'')) => out.push(c),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn looks_numeric(raw: &str) -> bool {
    raw.chars().any(|c| c.is_ascii_digit())
        && raw
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
}

/// Length in bytes of the `[A-Za-z_][A-Za-z0-9_]*` prefix of `text`.
fn identifier_len(text: &str) -> usize {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return 0,
    }
    chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map_or(text.len(), |(at, _)| at)
}

/// Tracks whether the scanner is inside a string literal.
///
/// A quote only opens a string where a value can begin, so apostrophes
/// inside bare words (`note=don't`) stay ordinary characters.
#[derive(Debug, Default)]
struct Quotes {
    open: Option<char>,
    escaped: bool,
    prev: Option<char>,
}

impl Quotes {
    /// Feed one character. Returns `true` if it lies outside any literal.
    fn feed(&mut self, c: char) -> bool {
        if let Some(quote) = self.open {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == quote {
                self.open = None;
                self.prev = Some(c);
            }
            return false;
        }
        if c.is_whitespace() {
            return true;
        }
        if matches!(c, '"' | '\'') && matches!(self.prev, None | Some('=' | '(' | ',' | '[' | '{' | ':')) {
            self.open = Some(c);
            self.prev = Some(c);
            return false;
        }
        self.prev = Some(c);
        true
    }

    fn in_literal(&self) -> bool {
        self.open.is_some()
    }
}

/// Byte index of the `)` closing a call whose `(` precedes `body`.
fn find_call_close(body: &str) -> Result<usize> {
    let mut quotes = Quotes::default();
    let mut nesting = Vec::new();
    for (at, c) in body.char_indices() {
        if !quotes.feed(c) {
            continue;
        }
        match c {
            '(' => nesting.push(')'),
            '[' => nesting.push(']'),
            '{' => nesting.push('}'),
            ')' | ']' | '}' => match nesting.pop() {
                Some(expected) if expected == c => {}
                None if c == ')' => return Ok(at),
                _ => return Err(malformed(format!("unbalanced '{c}'"))),
            },
            _ => {}
        }
    }
    if quotes.in_literal() {
        Err(malformed("unterminated string literal"))
    } else {
        Err(malformed("missing ')'"))
    }
}

/// Split on commas that are outside literals and brackets.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut quotes = Quotes::default();
    let mut depth = 0usize;
    let mut parts = Vec::new();
    let mut start = 0;
    for (at, c) in text.char_indices() {
        if !quotes.feed(c) {
            continue;
        }
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..at]);
                start = at + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn malformed(detail: impl Into<String>) -> ParseError {
    ParseError::MalformedPositional(detail.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn zero_argument_call() {
        let call = parse("start_cooling_system()").unwrap();
        assert_eq!(call.name, "start_cooling_system");
        assert!(call.arguments.is_empty());
        assert!(call.warnings.is_empty());
    }

    #[test]
    fn bare_word_value() {
        let call = parse("control_fan(state=on)").unwrap();
        assert_eq!(call.name, "control_fan");
        assert_eq!(call.arguments, args(json!({"state": "on"})));
    }

    #[test]
    fn call_list_wrapper() {
        let call = parse(r#"[control_fan(state="on")]"#).unwrap();
        assert_eq!(call.arguments, args(json!({"state": "on"})));
    }

    #[test]
    fn literal_kinds() {
        let call = parse(r#"f(n=3, x=2.5, flag=True, s='single', d="say \"hi\"", z=None)"#).unwrap();
        assert_eq!(
            call.arguments,
            args(json!({"n": 3, "x": 2.5, "flag": true, "s": "single", "d": "say \"hi\"", "z": null}))
        );
    }

    #[test]
    fn numbers_keep_their_spelling() {
        let call = parse("f(t=0600, p=+1, x=1.50, e=1e3, n=-4, y=0.5)").unwrap();
        assert_eq!(
            call.arguments,
            args(json!({"t": "0600", "p": "+1", "x": "1.50", "e": "1e3", "n": -4, "y": 0.5}))
        );
    }

    #[test]
    fn malformed_pair_is_skipped_with_warning() {
        let call = parse("set_sched(field_a, start_time=06:00)").unwrap();
        assert_eq!(call.name, "set_sched");
        assert_eq!(call.arguments, args(json!({"start_time": "06:00"})));
        assert_eq!(
            call.warnings,
            vec![Warning::MalformedPair {
                pair: "field_a".into()
            }]
        );
    }

    #[test]
    fn quoted_commas_and_parens_do_not_split() {
        let call = parse(r#"note(text="a, b (c)", tag='x)y')"#).unwrap();
        assert_eq!(call.arguments, args(json!({"text": "a, b (c)", "tag": "x)y"})));
    }

    #[test]
    fn nested_list_value() {
        let call = parse("water(zones=[1, 2, 3], mode=auto)").unwrap();
        assert_eq!(call.arguments, args(json!({"zones": [1, 2, 3], "mode": "auto"})));
    }

    #[test]
    fn apostrophe_in_bare_word() {
        let call = parse("note(text=don't)").unwrap();
        assert_eq!(call.arguments, args(json!({"text": "don't"})));
    }

    #[test]
    fn invalid_key_and_duplicate() {
        let call = parse("f(1x=2, a=1, a=2)").unwrap();
        assert_eq!(call.arguments, args(json!({"a": 2})));
        assert_eq!(
            call.warnings,
            vec![
                Warning::InvalidKey { key: "1x".into() },
                Warning::DuplicateArgument { key: "a".into() },
            ]
        );
    }

    #[test]
    fn additional_calls_are_ignored() {
        let call = parse(r#"[control_fan(state="on"), control_drain(state="open")]"#).unwrap();
        assert_eq!(call.name, "control_fan");
        assert_eq!(call.warnings, vec![Warning::IgnoredCalls { count: 1 }]);
    }

    #[test]
    fn positional_failures() {
        for text in ["f(a=1", "f(a=(1)", "f(a=\"x)", "f(a=1))", "f a=1", "(a=1)", "[f()"] {
            assert!(
                matches!(parse(text), Err(ParseError::MalformedPositional(_))),
                "{text} should be malformed"
            );
        }
    }

    #[test]
    fn blank_is_empty() {
        assert_eq!(parse("  \n"), Err(ParseError::Empty));
        assert_eq!(parse("[]"), Err(ParseError::Empty));
        assert_eq!(parse("[ ]"), Err(ParseError::Empty));
    }

    #[test]
    fn structured_object() {
        let call = parse(r#"{"name": "check_soil_moisture", "arguments": {"location": "orchard"}}"#)
            .unwrap();
        assert_eq!(call.name, "check_soil_moisture");
        assert_eq!(call.arguments, args(json!({"location": "orchard"})));
    }

    #[test]
    fn double_encoded_arguments() {
        let text = r#"{"name": "turn_on_water_pump", "arguments": "{\"duration_minutes\": 30}"}"#;
        let call = parse(text).unwrap();
        assert_eq!(call.arguments, args(json!({"duration_minutes": 30})));
    }

    #[test]
    fn structured_aliases_and_lists() {
        let call = parse(r#"{"tool": "turn_on_drain"}"#).unwrap();
        assert_eq!(call.name, "turn_on_drain");
        assert!(call.arguments.is_empty());

        let call = parse(r#"[{"action": "open_pressure_valve", "args": {}}, {"tool": "x"}]"#).unwrap();
        assert_eq!(call.name, "open_pressure_valve");
        assert_eq!(call.warnings, vec![Warning::IgnoredCalls { count: 1 }]);
    }

    #[test]
    fn structured_failures() {
        for text in [
            r#"{"arguments": {}}"#,
            r#"{"name": 5}"#,
            r#"{"name": "f", "arguments": [1]}"#,
            r#"{"name": "f", "arguments": "[1]"}"#,
            r#"{"name": "f", "arguments": "{oops"}"#,
            r#"{"name": "f""#,
            "[1, 2]",
        ] {
            assert!(
                matches!(parse(text), Err(ParseError::MalformedStructured(_))),
                "{text} should be malformed"
            );
        }
    }

    #[test]
    fn structured_round_trip() {
        let text = r#"{"name": "set_irrigation_schedule",
                       "arguments": {"location": "field_a", "start_time": "06:00", "duration_minutes": 45}}"#;
        let first = parse(text).unwrap();
        let again = serde_json::to_string(&json!({
            "name": first.name,
            "arguments": first.arguments,
        }))
        .unwrap();
        let second = parse(&again).unwrap();
        assert_eq!(first.arguments, second.arguments);
        assert_eq!(first.name, second.name);
    }
}
