//! Display-width helpers. ANSI SGR sequences take no columns; wide glyphs
//! take two.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: char = '\u{2026}';
const RESET: &str = "\x1b[0m";

/// Remove `ESC ... m` sequences.
pub fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_escape = false;
    for c in s.chars() {
        if in_escape {
            if c == 'm' {
                in_escape = false;
            }
        } else if c == '\x1b' {
            in_escape = true;
        } else {
            out.push(c);
        }
    }
    out
}

/// Terminal columns occupied by `s`. Measured over the whole stripped string
/// so emoji presentation sequences count as two columns.
pub fn display_width(s: &str) -> usize {
    strip_ansi(s).as_str().width()
}

/// Cut `s` to at most `max` columns, ending in an ellipsis when shortened.
/// Escape sequences are kept, and a reset is appended if any were seen.
pub fn truncate_to_width(s: &str, max: usize) -> String {
    if display_width(s) <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }

    let budget = max - 1;
    let mut out = String::with_capacity(s.len());
    let mut width = 0;
    let mut in_escape = false;
    let mut styled = false;
    for c in s.chars() {
        if in_escape {
            out.push(c);
            if c == 'm' {
                in_escape = false;
            }
        } else if c == '\x1b' {
            in_escape = true;
            styled = true;
            out.push(c);
        } else {
            let w = c.width().unwrap_or(0);
            if width + w > budget {
                break;
            }
            out.push(c);
            width += w;
        }
    }
    out.push(ELLIPSIS);
    if styled {
        out.push_str(RESET);
    }
    out
}

/// Right-pad `s` with spaces to `width` columns.
pub fn pad_right(s: &str, width: usize) -> String {
    let current = display_width(s);
    if current >= width {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + width - current);
    out.push_str(s);
    out.extend(std::iter::repeat(' ').take(width - current));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_width_ignores_ansi() {
        assert_eq!(display_width("\x1b[32mmain\x1b[0m"), 4);
        assert_eq!(strip_ansi("\x1b[1;34mapp\x1b[0m"), "app");
    }

    #[test]
    fn test_display_width_counts_wide_glyphs() {
        assert_eq!(display_width("日本"), 4);
        assert_eq!(display_width("a\u{2588}b"), 3);
    }

    #[test]
    fn test_display_width_emoji_presentation() {
        assert_eq!(display_width("\u{26a0}\u{fe0f}"), 2);
        assert_eq!(display_width("\x1b[33m\u{26a0}\u{fe0f} x\x1b[0m"), 4);
        assert_eq!(pad_right("\u{26a0}\u{fe0f} x", 5), "\u{26a0}\u{fe0f} x ");
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefgh", 5), "abcd\u{2026}");
        assert_eq!(truncate_to_width("日本語テキスト", 5), "日本\u{2026}");
        assert_eq!(
            truncate_to_width("\x1b[32mabcdefgh\x1b[0m", 4),
            "\x1b[32mabc\u{2026}\x1b[0m"
        );
    }

    #[test]
    fn test_pad_right() {
        assert_eq!(pad_right("ab", 4), "ab  ");
        assert_eq!(pad_right("日本", 5), "日本 ");
        assert_eq!(pad_right("abcdef", 3), "abcdef");
    }
}
