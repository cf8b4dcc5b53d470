//! Snippet extraction: line-based fence stripping, no syntax validation.

/// Pull a runnable snippet out of raw model output.
///
/// When the text carries fenced blocks (with or without a language tag) the
/// fenced content is taken, joined in order; otherwise the whole text is
/// used. Internal code is never altered. Returns `None` when nothing
/// remains after stripping.
pub fn extract_snippet(raw: &str) -> Option<String> {
    let mut fenced_lines: Vec<&str> = Vec::new();
    let mut in_fence = false;
    let mut saw_fence = false;

    for line in raw.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            saw_fence = true;
            continue;
        }
        if in_fence {
            fenced_lines.push(line);
        }
    }

    let snippet = if saw_fence {
        fenced_lines.join("\n")
    } else {
        raw.to_string()
    };

    let snippet = snippet.trim();
    if snippet.is_empty() {
        None
    } else {
        Some(snippet.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_with_language_tag() {
        let raw = "```python\nprint(df[\"a\"].mean())\n```";
        assert_eq!(
            extract_snippet(raw).unwrap(),
            "print(df[\"a\"].mean())"
        );
    }

    #[test]
    fn fenced_without_language_tag() {
        let raw = "```\nx = 1\nprint(x)\n```";
        assert_eq!(extract_snippet(raw).unwrap(), "x = 1\nprint(x)");
    }

    #[test]
    fn prose_around_fence_is_dropped() {
        let raw = "Here is the code:\n```python\ndf.describe()\n```\nHope that helps!";
        assert_eq!(extract_snippet(raw).unwrap(), "df.describe()");
    }

    #[test]
    fn bare_code_passes_through_trimmed() {
        let raw = "  print(1)  \n";
        assert_eq!(extract_snippet(raw).unwrap(), "print(1)");
    }

    #[test]
    fn internal_lines_are_untouched() {
        let raw = "```\na = 1\n\n  b = 2\n```";
        assert_eq!(extract_snippet(raw).unwrap(), "a = 1\n\n  b = 2");
    }

    #[test]
    fn empty_input_yields_none() {
        assert!(extract_snippet("").is_none());
        assert!(extract_snippet("   \n  ").is_none());
        assert!(extract_snippet("```python\n```").is_none());
    }
}
