//! Text helpers for picking structured payloads out of free-form model output.

/// Extract the first balanced JSON object from text that may contain other
/// content such as prose or markdown fences.
///
/// Braces inside string literals are ignored, so code snippets quoted in a
/// JSON value do not throw off the depth count.
pub fn extract_json_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + i + 1;
                    return Some(text[start..end].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

/// Return the body of the first fenced code block tagged with `lang`
/// (for example ```` ```json ````), if any.
pub fn fenced_block<'a>(text: &'a str, lang: &str) -> Option<&'a str> {
    let opener = format!("```{}", lang);
    let start = text.find(&opener)? + opener.len();
    let rest = &text[start..];
    let body_start = rest.find('\n')? + 1;
    let body = &rest[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim_end())
}

/// Truncate `text` to at most `max` characters, appending an ellipsis when cut.
pub fn truncate_for_log(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_object_simple() {
        let text = r#"{"key": "value"}"#;
        assert_eq!(extract_json_object(text), Some(text.to_string()));
    }

    #[test]
    fn test_extract_json_object_with_surrounding_prose() {
        let text = r#"Here is the plan: {"key": "value"} hope it helps"#;
        assert_eq!(
            extract_json_object(text),
            Some(r#"{"key": "value"}"#.to_string())
        );
    }

    #[test]
    fn test_extract_json_object_nested() {
        let text = r#"{"outer": {"inner": "value"}}"#;
        assert_eq!(extract_json_object(text), Some(text.to_string()));
    }

    #[test]
    fn test_extract_json_object_ignores_braces_in_strings() {
        let text = r#"{"code": "function f() { return '}'; }", "n": 1} trailing"#;
        assert_eq!(
            extract_json_object(text),
            Some(r#"{"code": "function f() { return '}'; }", "n": 1}"#.to_string())
        );
    }

    #[test]
    fn test_extract_json_object_handles_escaped_quotes() {
        let text = r#"{"q": "say \"{hi}\""}"#;
        assert_eq!(extract_json_object(text), Some(text.to_string()));
    }

    #[test]
    fn test_extract_json_object_no_json() {
        assert_eq!(extract_json_object("No JSON here"), None);
    }

    #[test]
    fn test_extract_json_object_unclosed() {
        assert_eq!(extract_json_object(r#"{"key": "value""#), None);
    }

    #[test]
    fn test_fenced_block() {
        let text = "Sure!\n```json\n{\"a\": 1}\n```\nDone";
        assert_eq!(fenced_block(text, "json"), Some("{\"a\": 1}"));
        assert_eq!(fenced_block(text, "css"), None);
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short", 10), "short");
        assert_eq!(truncate_for_log("abcdefghij", 4), "abcd...");
    }
}
