//! Text normalization ahead of decoding
//!
//! Model replies wrap their JSON in prose and markdown fences, and write
//! string literals the way a person would (raw newlines, unescaped
//! backslashes). Normalizers cut the structured section out of the reply
//! and repair its string literals.
//!
//! Normalizers are fail-open: when they cannot locate a structured section
//! they hand the input back unchanged, so that syntax problems are reported
//! by the decoder instead of being hidden. They never repair unbalanced
//! brackets; a truncated reply stays truncated.
//!
//! All normalizers are idempotent: normalizing normalized text returns it
//! unchanged.

mod scan;

/// Pure text-to-text cleanup applied before decoding
pub trait TextNormalizer: Send + Sync {
    /// Normalize a raw reply; returns `raw` unchanged when unsure
    fn normalize(&self, raw: &str) -> String;
}

/// Normalizer for replies carrying `thoughts` and a `tool` selection
///
/// 1. Takes the body of the first fenced code block containing `{`
/// 2. Slices from the first `{` to the last `}`
/// 3. Doubles backslashes that do not start a valid escape
/// 4. Escapes raw newlines, tabs and other control characters inside strings
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionNormalizer;

impl ActionNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl TextNormalizer for ActionNormalizer {
    fn normalize(&self, raw: &str) -> String {
        let candidate = if raw.trim_start().starts_with('{') {
            raw
        } else {
            scan::fenced_body(raw, |body| body.contains('{')).unwrap_or(raw)
        };

        match scan::bracketed_section(candidate, '{', '}') {
            Some(section) => scan::repair_strings(section, true),
            None => raw.to_string(),
        }
    }
}

/// Normalizer for replies carrying a `tasks` list
///
/// Task replies tend to be surrounded by commentary ("Here is the plan:").
/// The object holding the list is preferred; a reply with no object at all
/// is cut down to its outermost array. Backslashes are repaired as for
/// actions, but raw control characters are left for the decoder, which
/// reads task replies in non-strict mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskNormalizer;

impl TaskNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl TextNormalizer for TaskNormalizer {
    fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim_start();
        let candidate = if trimmed.starts_with('{') || trimmed.starts_with('[') {
            raw
        } else {
            scan::fenced_body(raw, |body| body.contains('{') || body.contains('['))
                .unwrap_or(raw)
        };

        let section = scan::bracketed_section(candidate, '{', '}').or_else(|| {
            if candidate.contains('{') {
                None
            } else {
                scan::bracketed_section(candidate, '[', ']')
            }
        });

        match section {
            Some(section) => scan::repair_strings(section, false),
            None => raw.to_string(),
        }
    }
}

/// Normalizer that returns its input unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughNormalizer;

impl TextNormalizer for PassthroughNormalizer {
    fn normalize(&self, raw: &str) -> String {
        raw.to_string()
    }
}

impl<F> TextNormalizer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn normalize(&self, raw: &str) -> String {
        self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_strips_fence_and_prose() {
        let raw = "I will search now.\n```json\n{\"tool\": {\"name\": \"search\"}}\n```\nHope that helps!";
        assert_eq!(
            ActionNormalizer.normalize(raw),
            "{\"tool\": {\"name\": \"search\"}}"
        );
    }

    #[test]
    fn test_action_strips_surrounding_prose_without_fence() {
        let raw = "Answer: {\"tool\": null} -- end";
        assert_eq!(ActionNormalizer.normalize(raw), "{\"tool\": null}");
    }

    #[test]
    fn test_action_escapes_multiline_strings() {
        let raw = "{\"thoughts\": {\"plan\": \"- step one\n- step two\"}}";
        assert_eq!(
            ActionNormalizer.normalize(raw),
            "{\"thoughts\": {\"plan\": \"- step one\\n- step two\"}}"
        );
    }

    #[test]
    fn test_action_keeps_truncated_reply_truncated() {
        let raw = "{\"tool\": {";
        assert_eq!(ActionNormalizer.normalize(raw), raw);
    }

    #[test]
    fn test_action_fail_open_without_object() {
        let raw = "I don't know which tool to use.";
        assert_eq!(ActionNormalizer.normalize(raw), raw);
    }

    #[test]
    fn test_action_ignores_fences_inside_normalized_text() {
        let normalized = "{\"text\": \"use ```{x}``` here\"}";
        assert_eq!(ActionNormalizer.normalize(normalized), normalized);
    }

    #[test]
    fn test_task_prefers_object() {
        let raw = "Here is the plan:\n{\"tasks\": [\"a\", \"b\"]}\nLet me know.";
        assert_eq!(TaskNormalizer.normalize(raw), "{\"tasks\": [\"a\", \"b\"]}");
    }

    #[test]
    fn test_task_falls_back_to_array() {
        let raw = "Tasks follow: [\"a\", \"b\"] (two in total)";
        assert_eq!(TaskNormalizer.normalize(raw), "[\"a\", \"b\"]");
    }

    #[test]
    fn test_task_leaves_control_characters() {
        let raw = "{\"tasks\": [\"line one\nline two\"]}";
        assert_eq!(TaskNormalizer.normalize(raw), raw);
    }

    #[test]
    fn test_task_fenced() {
        let raw = "```\n{\"tasks\": []}\n```";
        assert_eq!(TaskNormalizer.normalize(raw), "{\"tasks\": []}");
    }

    #[test]
    fn test_normalizers_idempotent() {
        let samples = [
            "prefix ```json\n{'a': 'C:\\dir'}\n``` suffix",
            "{\"a\": \"x\ny\"}",
            "no json here",
            "[1, 2] and {\"tasks\": [3]}",
            "```\n[\"a\"]\n```",
            "}{",
        ];
        for sample in samples {
            let once = ActionNormalizer.normalize(sample);
            assert_eq!(ActionNormalizer.normalize(&once), once, "action {:?}", sample);

            let once = TaskNormalizer.normalize(sample);
            assert_eq!(TaskNormalizer.normalize(&once), once, "tasks {:?}", sample);
        }
    }

    #[test]
    fn test_closure_normalizer() {
        let upper = |raw: &str| raw.to_uppercase();
        assert_eq!(upper.normalize("abc"), "ABC");
        assert_eq!(PassthroughNormalizer.normalize(" x "), " x ");
    }
}
