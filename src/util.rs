//! Shared utility functions

use unicode_width::UnicodeWidthChar;

/// Cut `s` so it occupies at most `max_cols` terminal columns
///
/// Wide characters (CJK, emoji) count as two columns and are never split.
/// A cut string ends in `…`, which takes one of the columns.
pub fn truncate_to_width(s: &str, max_cols: usize) -> String {
    let total: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max_cols {
        return s.to_string();
    }
    if max_cols == 0 {
        return String::new();
    }

    let budget = max_cols - 1;
    let mut used = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use unicode_width::UnicodeWidthStr;

    #[test]
    fn test_short_text_unchanged() {
        assert_eq!(truncate_to_width("connected", 20), "connected");
        assert_eq!(truncate_to_width("", 0), "");
    }

    #[test]
    fn test_cut_text_ends_with_ellipsis() {
        let cut = truncate_to_width("Live channel lost: reset by peer", 12);
        assert_eq!(cut, "Live channe…");
        assert_eq!(cut.width(), 12);
    }

    #[test]
    fn test_wide_characters_counted_as_two_columns() {
        // Each of these is two columns wide; only two fit before the ellipsis
        let cut = truncate_to_width("日本語のログ", 6);
        assert_eq!(cut, "日本…");
        assert!(cut.width() <= 6);
    }

    #[test]
    fn test_zero_width_budget() {
        assert_eq!(truncate_to_width("boom", 0), "");
    }
}
