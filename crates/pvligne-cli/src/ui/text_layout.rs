//! Character-wrapped layout of field text.
//!
//! Fields are drawn from these lines rather than with `Paragraph::wrap`, so
//! that the caret, the click-to-caret mapping and the panel placement agree
//! with what is on screen.

use std::ops::Range;

use unicode_width::UnicodeWidthChar;

fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(0)
}

/// Split `text` into visual rows of at most `width` cells.
///
/// Each range excludes the `\n` that ends a hard line. Empty text yields one
/// empty row.
pub fn wrap_lines(text: &str, width: usize) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut used = 0;

    for (i, c) in text.char_indices() {
        if c == '\n' {
            lines.push(start..i);
            start = i + 1;
            used = 0;
            continue;
        }
        let w = char_width(c);
        if width > 0 && used + w > width && i > start {
            lines.push(start..i);
            start = i;
            used = 0;
        }
        used += w;
    }
    lines.push(start..text.len());
    lines
}

/// Row and column of the caret within the wrapped text.
pub fn caret_cell(text: &str, caret: usize, width: usize) -> (usize, usize) {
    let caret = pvligne_core::mention::clamp_to_char_boundary(text, caret);
    let lines = wrap_lines(text, width);
    let row = lines
        .iter()
        .rposition(|line| line.start <= caret)
        .unwrap_or(0);
    let start = lines[row].start;
    let col = text[start..caret].chars().map(char_width).sum();
    (row, col)
}

/// Byte offset for a click at `row`/`col` within the wrapped text.
pub fn offset_at(text: &str, width: usize, row: usize, col: usize) -> usize {
    let lines = wrap_lines(text, width);
    let line = &lines[row.min(lines.len() - 1)];
    let mut used = 0;
    for (i, c) in text[line.clone()].char_indices() {
        let w = char_width(c);
        if used + w > col {
            return line.start + i;
        }
        used += w;
    }
    line.end
}
