//! Subfolder name sanitization, strict enough for Windows paths.

/// Subfolder used when the user's name sanitizes to nothing.
pub const DEFAULT_SUBFOLDER: &str = "yt-dlp_downloads";

/// Characters no supported platform accepts in a path component.
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Sanitizes a subfolder name.
///
/// - Removes `< > : " / \ | ? *` and control characters
/// - Trims surrounding whitespace and trailing dots
/// - Falls back to [`DEFAULT_SUBFOLDER`] when nothing is left
///
/// Idempotent: the output is already free of everything the function removes.
pub fn sanitize_subfolder(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| !FORBIDDEN.contains(c) && !c.is_control())
        .collect();

    let trimmed = kept
        .trim()
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace());

    if trimmed.is_empty() {
        DEFAULT_SUBFOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_forbidden_characters() {
        assert_eq!(sanitize_subfolder(r#"a<b>c:d"e/f\g|h?i*j"#), "abcdefghij");
    }

    #[test]
    fn empty_and_blank_fall_back_to_default() {
        assert_eq!(sanitize_subfolder(""), DEFAULT_SUBFOLDER);
        assert_eq!(sanitize_subfolder("   "), DEFAULT_SUBFOLDER);
        assert_eq!(sanitize_subfolder("<>:?*"), DEFAULT_SUBFOLDER);
        assert_eq!(sanitize_subfolder(".."), DEFAULT_SUBFOLDER);
    }

    #[test]
    fn trims_after_removal() {
        // Removal first, so a forbidden char cannot shield trailing whitespace.
        assert_eq!(sanitize_subfolder("music <"), "music");
        assert_eq!(sanitize_subfolder("  talks. . "), "talks");
    }

    #[test]
    fn keeps_unicode_and_inner_spaces() {
        assert_eq!(sanitize_subfolder("Мои видео 2024"), "Мои видео 2024");
    }

    #[test]
    fn control_chars_removed() {
        assert_eq!(sanitize_subfolder("a\tb\x00c\n"), "abc");
    }

    #[test]
    fn idempotent_on_awkward_inputs() {
        let inputs = [
            "",
            " ",
            "plain",
            "a/b",
            " x . ",
            "..",
            ".hidden",
            "trailing?.",
            "<>",
            "\u{7f}del",
            "a . :",
            DEFAULT_SUBFOLDER,
        ];
        for input in inputs {
            let once = sanitize_subfolder(input);
            assert_eq!(sanitize_subfolder(&once), once, "input {input:?}");
            assert!(!once.contains(FORBIDDEN), "input {input:?} -> {once:?}");
        }
    }
}
