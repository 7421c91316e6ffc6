//! Isolate the call block from raw model output.

use crate::{ExtractionError, Template};

/// Text found between the first pair of call markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateCall<'a> {
    /// The text strictly between the markers, untrimmed.
    pub text: &'a str,
    /// Byte offset of the start marker in the model output.
    pub offset: usize,
    /// Complete call blocks after the first one. They are not parsed.
    pub ignored_blocks: usize,
}

/// Find the first delimited call block in `output`.
///
/// Returns `Ok(None)` when the output holds no start marker at all, and
/// [`ExtractionError::Unterminated`] when the first start marker has no end
/// marker after it.
pub fn extract<'a>(
    output: &'a str,
    template: &Template,
) -> Result<Option<CandidateCall<'a>>, ExtractionError> {
    let open = template.tool_call_start.as_str();
    let close = template.tool_call_end.as_str();

    let Some(offset) = output.find(open) else {
        return Ok(None);
    };
    let body_start = offset + open.len();
    let Some(len) = output[body_start..].find(close) else {
        return Err(ExtractionError::Unterminated { offset });
    };
    let body_end = body_start + len;

    Ok(Some(CandidateCall {
        text: &output[body_start..body_end],
        offset,
        ignored_blocks: count_blocks(&output[body_end + close.len()..], open, close),
    }))
}

fn count_blocks(mut rest: &str, open: &str, close: &str) -> usize {
    let mut count = 0;
    while let Some(start) = rest.find(open) {
        rest = &rest[start + open.len()..];
        match rest.find(close) {
            Some(end) => {
                count += 1;
                rest = &rest[end + close.len()..];
            }
            None => break,
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Template {
        Template::default()
    }

    #[test]
    fn no_marker_is_no_call() {
        assert_eq!(extract("The fan is already off.", &template()), Ok(None));
    }

    #[test]
    fn isolates_text_between_markers() {
        let output = "<|tool_call_start|>[control_fan(state=\"on\")]<|tool_call_end|>Turning on.";
        let call = extract(output, &template()).unwrap().unwrap();
        assert_eq!(call.text, "[control_fan(state=\"on\")]");
        assert_eq!(call.offset, 0);
        assert_eq!(call.ignored_blocks, 0);
    }

    #[test]
    fn unterminated_block() {
        let output = "ok <|tool_call_start|>[control_fan(state=";
        assert_eq!(
            extract(output, &template()),
            Err(ExtractionError::Unterminated { offset: 3 })
        );
    }

    #[test]
    fn first_block_wins() {
        let output = "<|tool_call_start|>a()<|tool_call_end|> then \
                      <|tool_call_start|>b()<|tool_call_end|>\
                      <|tool_call_start|>c()<|tool_call_end|>";
        let call = extract(output, &template()).unwrap().unwrap();
        assert_eq!(call.text, "a()");
        assert_eq!(call.ignored_blocks, 2);
    }

    #[test]
    fn end_marker_before_start_is_ignored() {
        let output = "<|tool_call_end|> noise <|tool_call_start|>x()<|tool_call_end|>";
        let call = extract(output, &template()).unwrap().unwrap();
        assert_eq!(call.text, "x()");
    }

    #[test]
    fn custom_markers() {
        let template = Template {
            tool_call_start: "<call>".into(),
            tool_call_end: "</call>".into(),
            ..Template::default()
        };
        let call = extract("<call>{}</call>", &template).unwrap().unwrap();
        assert_eq!(call.text, "{}");
    }
}
