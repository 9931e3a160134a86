//! Logging helpers for announcement text, which is multi-line by nature.
//! Keeps every log record on a single line by escaping control characters.

/// Escape a string for single-line logging:
/// - `\n` => `\\n`
/// - `\r` => `\\r`
/// - `\t` => `\\t`
/// - backslash => `\\\\`
///   Long strings are truncated with an ellipsis; announcements are short,
///   anything past the cap is noise.
pub fn escape_log(s: &str) -> String {
    const MAX_PREVIEW: usize = 200;
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::escape_log;

    #[test]
    fn escapes_newlines_and_tabs() {
        let s = "Sale ends\nsoon\t!";
        assert_eq!(escape_log(s), "Sale ends\\nsoon\\t!");
    }

    #[test]
    fn truncates_oversized_input() {
        let s = "x".repeat(500);
        let esc = escape_log(&s);
        assert!(esc.ends_with('…'));
        assert!(esc.chars().count() <= 201);
    }
}
