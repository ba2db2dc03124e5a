//! Search highlighting
//!
//! Splits a line's content into matched / unmatched segments for a search
//! term. Always run against the stored entry text, never against already
//! highlighted output, so emphasis can't compound across renders.

use regex::RegexBuilder;

/// A run of text that either matched the search term or didn't
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub matched: bool,
}

impl Segment {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            matched: false,
        }
    }

    fn hit(text: &str) -> Self {
        Self {
            text: text.to_string(),
            matched: true,
        }
    }
}

/// Mark every non-overlapping, case-insensitive occurrence of `term`
///
/// The term is matched literally. An empty term returns the text untouched
/// as a single unmatched segment.
pub fn highlight(text: &str, term: &str) -> Vec<Segment> {
    if term.is_empty() {
        return vec![Segment::plain(text)];
    }

    let Ok(re) = RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
    else {
        // An escaped literal always compiles; fall back to plain text regardless
        return vec![Segment::plain(text)];
    };

    let mut segments = Vec::new();
    let mut cursor = 0;
    for m in re.find_iter(text) {
        if m.start() > cursor {
            segments.push(Segment::plain(&text[cursor..m.start()]));
        }
        segments.push(Segment::hit(m.as_str()));
        cursor = m.end();
    }
    if cursor < text.len() || segments.is_empty() {
        segments.push(Segment::plain(&text[cursor..]));
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejoin(segments: &[Segment]) -> String {
        segments.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_empty_term_returns_text_unchanged() {
        let segments = highlight("GET /health 200", "");
        assert_eq!(segments, vec![Segment::plain("GET /health 200")]);
    }

    #[test]
    fn test_case_variants_both_marked() {
        let segments = highlight("abcABC", "abc");
        assert_eq!(segments, vec![Segment::hit("abc"), Segment::hit("ABC")]);
    }

    #[test]
    fn test_matches_do_not_overlap() {
        let segments = highlight("aaaa", "aa");
        let hits: Vec<_> = segments.iter().filter(|s| s.matched).collect();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_surrounding_text_preserved() {
        let text = "error: connection refused (ERROR code 7)";
        let segments = highlight(text, "error");
        assert_eq!(rejoin(&segments), text);
        assert_eq!(segments.iter().filter(|s| s.matched).count(), 2);
        assert!(!segments[1].matched);
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let segments = highlight("value (a+b) and ab", "(a+b)");
        assert_eq!(segments.iter().filter(|s| s.matched).count(), 1);
        assert!(highlight("aab", "a+b").iter().all(|s| !s.matched));
    }

    #[test]
    fn test_no_match_yields_single_plain_segment() {
        assert_eq!(highlight("warming up", "panic"), vec![Segment::plain("warming up")]);
    }

    #[test]
    fn test_highlight_is_deterministic() {
        let first = highlight("Ready in 120ms, ready", "ready");
        let second = highlight("Ready in 120ms, ready", "ready");
        assert_eq!(first, second);
    }
}
