//! Mention trigger detection and text splicing.
//!
//! Analyzes the host text and caret position to find an in-progress
//! `@mention`, and rewrites the text when a candidate is committed.
//! All offsets are byte offsets into UTF-8 text.

use std::ops::Range;

/// An in-progress mention found before the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionQuery {
    /// Offset of the `@` that opened the mention.
    pub start: usize,
    /// Text between the `@` and the caret.
    pub query: String,
}

/// Host text after a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub text: String,
    pub caret: usize,
}

/// A completed `@username` token inside a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionSpan {
    /// Byte range covering the `@` and the username.
    pub range: Range<usize>,
    pub username: String,
}

/// Clamp `pos` into `text` and move it back to the nearest char boundary.
pub fn clamp_to_char_boundary(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while pos > 0 && !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

/// Detect a mention being typed at `caret`.
///
/// The last `@` before the caret opens a mention only when it starts the
/// text or follows whitespace. Any whitespace between it and the caret
/// abandons the mention.
pub fn detect_mention(text: &str, caret: usize) -> Option<MentionQuery> {
    let pos = clamp_to_char_boundary(text, caret);
    let before_caret = &text[..pos];

    let at = before_caret.rfind('@')?;
    let opens_token = before_caret[..at]
        .chars()
        .next_back()
        .is_none_or(char::is_whitespace);
    if !opens_token {
        return None;
    }

    let query = &before_caret[at + 1..];
    if query.contains(char::is_whitespace) {
        return None;
    }

    Some(MentionQuery {
        start: at,
        query: query.to_string(),
    })
}

/// Replace `[start, caret)` with `@username ` and put the caret after the space.
pub fn splice_mention(text: &str, start: usize, caret: usize, username: &str) -> Splice {
    let caret = clamp_to_char_boundary(text, caret);
    let start = clamp_to_char_boundary(text, start.min(caret));

    let replacement = format!("@{username} ");
    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..start]);
    out.push_str(&replacement);
    out.push_str(&text[caret..]);

    Splice {
        text: out,
        caret: start + replacement.len(),
    }
}

/// Characters allowed in a username (the web app's username rules, minus `@`).
fn is_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '_' | '+' | '-')
}

/// Find every completed `@username` token in `text`.
///
/// Tokens follow the same opening rule as [`detect_mention`]; a trailing
/// `.` is treated as sentence punctuation, not part of the name.
pub fn extract_mentions(text: &str) -> Vec<MentionSpan> {
    let mut spans = Vec::new();
    let mut prev: Option<char> = None;

    for (i, c) in text.char_indices() {
        if c == '@' && prev.is_none_or(char::is_whitespace) {
            let rest = &text[i + 1..];
            let len = rest
                .char_indices()
                .find(|&(_, ch)| !is_username_char(ch))
                .map_or(rest.len(), |(j, _)| j);
            let name = rest[..len].trim_end_matches('.');
            if !name.is_empty() {
                spans.push(MentionSpan {
                    range: i..i + 1 + name.len(),
                    username: name.to_string(),
                });
            }
        }
        prev = Some(c);
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mention(start: usize, query: &str) -> Option<MentionQuery> {
        Some(MentionQuery {
            start,
            query: query.to_string(),
        })
    }

    #[test]
    fn detects_mention_after_space() {
        assert_eq!(detect_mention("Hello @ali", 10), mention(6, "ali"));
    }

    #[test]
    fn detects_mention_at_text_start() {
        assert_eq!(detect_mention("@res", 4), mention(0, "res"));
    }

    #[test]
    fn detects_mention_after_newline() {
        assert_eq!(detect_mention("line one\n@bo", 12), mention(9, "bo"));
    }

    #[test]
    fn bare_at_sign_opens_empty_query() {
        assert_eq!(detect_mention("cc @", 4), mention(3, ""));
    }

    #[test]
    fn at_glued_to_word_is_not_a_mention() {
        assert_eq!(detect_mention("text@nospacebefore", 18), None);
        assert_eq!(detect_mention("mail bob@example", 16), None);
    }

    #[test]
    fn space_after_query_abandons_mention() {
        assert_eq!(detect_mention("Hello @ali ", 11), None);
        assert_eq!(detect_mention("@alice and bob", 14), None);
    }

    #[test]
    fn no_at_sign_is_none() {
        assert_eq!(detect_mention("hello world", 11), None);
        assert_eq!(detect_mention("", 0), None);
    }

    #[test]
    fn caret_mid_text_only_looks_backward() {
        // Caret right after "@al" in "@al ice"
        assert_eq!(detect_mention("@al ice", 3), mention(0, "al"));
    }

    #[test]
    fn last_at_decides() {
        // The nearest @ is glued to "a", so nothing qualifies even though
        // an earlier one would.
        assert_eq!(detect_mention("@a@b", 4), None);
        assert_eq!(detect_mention("@alice @b", 9), mention(7, "b"));
    }

    #[test]
    fn caret_inside_multibyte_char_is_clamped() {
        let text = "réu @é";
        // Offset 7 is inside the two-byte "é"; clamps back to 6.
        assert_eq!(detect_mention(text, 7), mention(5, ""));
        assert_eq!(detect_mention(text, text.len()), mention(5, "é"));
    }

    #[test]
    fn splice_replaces_token_and_moves_caret() {
        let s = splice_mention("Hello @ali", 6, 10, "alice");
        assert_eq!(s.text, "Hello @alice ");
        assert_eq!(s.caret, 13);
    }

    #[test]
    fn splice_keeps_text_after_caret() {
        let s = splice_mention("@al, see notes", 0, 3, "alain");
        assert_eq!(s.text, "@alain , see notes");
        assert_eq!(s.caret, 7);
    }

    #[test]
    fn extract_finds_completed_mentions() {
        let found = extract_mentions("Réunion avec @alice et @bob.martin. Email x@y.fr");
        let names: Vec<&str> = found.iter().map(|m| m.username.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob.martin"]);
        assert_eq!(&"Réunion avec @alice"[found[0].range.clone()], "@alice");
    }

    #[test]
    fn extract_skips_lone_at() {
        assert!(extract_mentions("@ and @").is_empty());
    }
}
