//! Low-level text passes shared by the normalizers

/// Body of the first fenced code block whose content satisfies `accept`
///
/// The language tag after the opening fence (`json`, `JSON`, `json5`, ...)
/// is skipped. A fence that is never closed runs to the end of the text,
/// which is what a truncated reply looks like.
pub(crate) fn fenced_body(text: &str, accept: impl Fn(&str) -> bool) -> Option<&str> {
    let mut search = 0;

    while let Some(rel) = text[search..].find("```") {
        let after_fence = search + rel + 3;
        let tag_len = text[after_fence..]
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric())
            .count();
        let body_start = after_fence + tag_len;

        let (body, next) = match text[body_start..].find("```") {
            Some(close) => (
                &text[body_start..body_start + close],
                body_start + close + 3,
            ),
            None => (&text[body_start..], text.len()),
        };

        if accept(body) {
            return Some(body.trim());
        }
        search = next;
    }

    None
}

/// Slice from the first `open` to the last `close`, inclusive
pub(crate) fn bracketed_section(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    Str(char),
    LineComment,
    BlockComment,
}

/// Repair string literals in place
///
/// Walks the text tracking strings and comments. Inside string literals:
///
/// - a backslash that does not start an escape known to the decoder
///   (JSON escapes, `\v`, `\0`, `\xHH`, line continuations) is doubled, so that
///   Windows paths and regexes keep their backslashes (`C:\data` stays
///   `C:\data` after decoding)
/// - when `escape_controls` is set, raw control characters (a model's
///   multi-line strings) are rewritten as escapes
///
/// Everything outside string literals is copied unchanged. Running the pass
/// on its own output changes nothing.
pub(crate) fn repair_strings(text: &str, escape_controls: bool) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut state = State::Code;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => {
                match c {
                    '"' | '\'' => state = State::Str(c),
                    '/' => match chars.peek() {
                        Some('/') => state = State::LineComment,
                        Some('*') => {
                            out.push(c);
                            out.push('*');
                            chars.next();
                            state = State::BlockComment;
                            continue;
                        }
                        _ => {}
                    },
                    _ => {}
                }
                out.push(c);
            }
            State::LineComment => {
                if c == '\n' {
                    state = State::Code;
                }
                out.push(c);
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    out.push('*');
                    out.push('/');
                    chars.next();
                    state = State::Code;
                    continue;
                }
                out.push(c);
            }
            State::Str(quote) => {
                if c == quote {
                    state = State::Code;
                    out.push(c);
                } else if c == '\\' {
                    let rest = chars.clone();
                    if starts_valid_escape(rest) {
                        out.push('\\');
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                            // `\<CR><LF>` is one line continuation
                            if escaped == '\r' && chars.peek() == Some(&'\n') {
                                out.push('\n');
                                chars.next();
                            }
                        }
                    } else {
                        out.push_str("\\\\");
                    }
                } else if escape_controls && c.is_control() && (c as u32) < 0x20 {
                    push_control_escape(&mut out, c);
                } else {
                    out.push(c);
                }
            }
        }
    }

    out
}

/// Escapes the decoder gives a meaning other than "drop the backslash"
fn starts_valid_escape(mut rest: impl Iterator<Item = char>) -> bool {
    match rest.next() {
        Some('"' | '\'' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' | '0') => true,
        Some('\n' | '\r' | '\u{2028}' | '\u{2029}') => true,
        Some('u') => (0..4).all(|_| rest.next().is_some_and(|c| c.is_ascii_hexdigit())),
        Some('x') => (0..2).all(|_| rest.next().is_some_and(|c| c.is_ascii_hexdigit())),
        _ => false,
    }
}

fn push_control_escape(out: &mut String, c: char) {
    match c {
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        other => out.push_str(&format!("\\u{:04x}", other as u32)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_body_with_tag() {
        let text = "Sure!\n```json\n{\"a\": 1}\n```\nDone.";
        assert_eq!(fenced_body(text, |b| b.contains('{')), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_fenced_body_skips_unrelated_blocks() {
        let text = "```bash\nls -la\n```\nthen\n```\n{\"a\": 1}\n```";
        assert_eq!(fenced_body(text, |b| b.contains('{')), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_fenced_body_unclosed() {
        let text = "```json\n{\"a\": 1}";
        assert_eq!(fenced_body(text, |b| b.contains('{')), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_fenced_body_none() {
        assert_eq!(fenced_body("plain {\"a\": 1}", |b| b.contains('{')), None);
    }

    #[test]
    fn test_bracketed_section() {
        assert_eq!(bracketed_section("x {a} y {b} z", '{', '}'), Some("{a} y {b}"));
        assert_eq!(bracketed_section("} {", '{', '}'), None);
        assert_eq!(bracketed_section("none", '{', '}'), None);
    }

    #[test]
    fn test_repair_invalid_backslashes() {
        let text = r#"{"path": "C:\data\new", "ok": "a\"b\\c\u00e9"}"#;
        let repaired = repair_strings(text, false);
        assert_eq!(
            repaired,
            r#"{"path": "C:\\data\new", "ok": "a\"b\\c\u00e9"}"#
        );
    }

    #[test]
    fn test_repair_short_unicode_escape() {
        assert_eq!(repair_strings(r#"'\u12'"#, false), r#"'\\u12'"#);
    }

    #[test]
    fn test_repair_escapes_controls_only_inside_strings() {
        let text = "{\n\"text\": \"one\ntwo\tthree\"\n}";
        assert_eq!(
            repair_strings(text, true),
            "{\n\"text\": \"one\\ntwo\\tthree\"\n}"
        );
        assert_eq!(repair_strings(text, false), text);
    }

    #[test]
    fn test_repair_ignores_comments() {
        let text = "{\n// don't touch C:\\x\na: 'b',\n/* it's \\q */ c: 1}";
        assert_eq!(repair_strings(text, true), text);
    }

    #[test]
    fn test_repair_keeps_decoder_escapes() {
        let text = r#"{"s": "\x41\v\0\x4", 'p': 'C:\xyz'}"#;
        assert_eq!(
            repair_strings(text, true),
            r#"{"s": "\x41\v\0\\x4", 'p': 'C:\\xyz'}"#
        );
    }

    #[test]
    fn test_repair_keeps_line_continuations() {
        let text = "{\"s\": \"one \\\ntwo \\\r\nthree\"}";
        assert_eq!(repair_strings(text, true), text);
        assert_eq!(repair_strings(text, false), text);
    }

    #[test]
    fn test_repair_is_idempotent() {
        let samples = [
            "{\"a\": \"x\\\ny\"}",
            "{\"a\": \"\\x4\\\r\n\\\r\\0\"}",
            "{'a': 'tail\\",
            "{\"a\": \"\\u12\\q\n\r\t\u{1}\"}",
            "/* open",
        ];
        for sample in samples {
            for escape in [true, false] {
                let once = repair_strings(sample, escape);
                assert_eq!(repair_strings(&once, escape), once, "sample {:?}", sample);
            }
        }
    }
}
