//! Editor position tracking for format requests
//!
//! Prettier exchanges cursor locations as flat character offsets while the
//! editor speaks in zero-based `(row, column)` pairs. Offsets and columns count
//! characters, not bytes, and a newline counts as one character.

use serde::{Deserialize, Serialize};

/// A zero-based `(row, column)` location in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl Position {
    /// Create a new position
    #[must_use]
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

/// A raw editor selection, possibly partial-line and possibly reversed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
}

impl Selection {
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A collapsed selection at the given position
    #[must_use]
    pub const fn caret(at: Position) -> Self {
        Self { start: at, end: at }
    }

    /// Returns true if the selection covers no characters
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The selection with `start <= end`
    #[must_use]
    pub fn ordered(self) -> Self {
        if self.end < self.start {
            Self {
                start: self.end,
                end: self.start,
            }
        } else {
            self
        }
    }
}

/// A line-aligned range: start column is always 0 and the end column is
/// the length of the end line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSpan {
    pub start: Position,
    pub end: Position,
}

impl SelectionSpan {
    /// Number of lines covered by the span
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.end.row.saturating_sub(self.start.row) + 1
    }
}

fn char_len(line: &str) -> usize {
    line.chars().count()
}

/// Convert a position to a character offset
///
/// Sums `line length + 1` for every line before `position.row`, then adds
/// the column. A row past the last line saturates at the end of the text.
#[must_use]
pub fn position_to_offset(text: &str, position: Position) -> usize {
    let mut offset = 0;
    for (row, line) in text.split('\n').enumerate() {
        if row == position.row {
            return offset + position.column;
        }
        offset += char_len(line) + 1;
    }
    // Row beyond the document: the loop counted a newline after the last line
    offset.saturating_sub(1)
}

/// Convert a character offset to a position
///
/// The row is the first line whose cumulative length (its own newline
/// included, except for the last line) exceeds `offset`. Offsets at or past
/// the end of the text saturate to the end of the last line.
#[must_use]
pub fn offset_to_position(text: &str, offset: usize) -> Position {
    let lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len() - 1;
    let mut consumed = 0;

    for (row, line) in lines.iter().enumerate() {
        let len = char_len(line);
        let newline = usize::from(row != last);
        if consumed + len + newline > offset {
            return Position::new(row, offset - consumed);
        }
        consumed += len + 1;
    }

    Position::new(last, char_len(lines[last]))
}

/// Convert a character offset to a UTF-16 code unit offset, the index
/// JavaScript uses; offsets past the end saturate
#[must_use]
pub fn char_to_utf16_offset(text: &str, offset: usize) -> usize {
    text.chars().take(offset).map(char::len_utf16).sum()
}

/// Convert a UTF-16 code unit offset back to a character offset
///
/// An offset inside a surrogate pair rounds down to the start of that
/// character.
#[must_use]
pub fn utf16_to_char_offset(text: &str, offset: usize) -> usize {
    let mut units = 0;
    for (index, c) in text.chars().enumerate() {
        units += c.len_utf16();
        if units > offset {
            return index;
        }
    }
    text.chars().count()
}

/// The span covering the entire document
#[must_use]
pub fn document_span(text: &str) -> SelectionSpan {
    let lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len() - 1;
    SelectionSpan {
        start: Position::new(0, 0),
        end: Position::new(last, char_len(lines[last])),
    }
}

/// Expand a selection to whole lines
///
/// Returns `None` for an empty selection. A selection ending at column 0 of a
/// later row does not include that row. Returns the span together with the
/// selected lines joined by `\n`.
#[must_use]
pub fn expand_selection(text: &str, selection: Selection) -> Option<(SelectionSpan, String)> {
    if selection.is_empty() {
        return None;
    }
    let Selection { start, end } = selection.ordered();
    let lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len() - 1;

    let start_row = start.row.min(last);
    let mut end_row = end.row;
    if end.column == 0 && end_row > start_row {
        end_row -= 1;
    }
    let end_row = end_row.min(last).max(start_row);

    let span = SelectionSpan {
        start: Position::new(start_row, 0),
        end: Position::new(end_row, char_len(lines[end_row])),
    };
    Some((span, lines[start_row..=end_row].join("\n")))
}

fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map_or(text.len(), |(index, _)| index)
}

/// Replace the text covered by `span` with `replacement`
#[must_use]
pub fn replace_span(text: &str, span: SelectionSpan, replacement: &str) -> String {
    let start = byte_index(text, position_to_offset(text, span.start));
    let end = byte_index(text, position_to_offset(text, span.end)).max(start);

    let mut result = String::with_capacity(text.len() - (end - start) + replacement.len());
    result.push_str(&text[..start]);
    result.push_str(replacement);
    result.push_str(&text[end..]);
    result
}
