//! Line tables for mapping line indices to byte offsets.
//!
//! A text is split on `\n` into pieces. Every piece gets a [`LineInfo`] whose
//! `end` includes the terminator, except for the final piece which has none.
//! A text ending in `\n` therefore has a trailing empty line entry, and the
//! table is never empty (the empty text has one empty line).

/// Start and end byte offset of one line, `end` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInfo {
    pub start: usize,
    pub end: usize,
}

/// Build the line table for `text`
pub fn line_infos(text: &str) -> Vec<LineInfo> {
    let mut infos = Vec::new();
    let mut start = 0;

    for line in text.split('\n') {
        infos.push(LineInfo {
            start,
            end: start + line.len() + 1,
        });
        start += line.len() + 1;
    }

    // The final piece has no terminator
    if let Some(last) = infos.last_mut() {
        last.end -= 1;
    }

    infos
}

/// Start offset of line `index`, tolerating an index past the table.
///
/// Past the end this yields the virtual position one character after the
/// last line (the place a line would start if the last line was terminated).
pub fn start_index_safely(infos: &[LineInfo], index: usize) -> usize {
    match infos.get(index) {
        Some(info) => info.start,
        None => infos.last().map_or(0, |last| last.end + 1),
    }
}

/// End offset of a line range `begin..end`, clamped to the last line.
///
/// The range is treated as covering at least the line at `begin`.
pub fn end_index(infos: &[LineInfo], begin: usize, end: usize) -> usize {
    let last = infos.len().saturating_sub(1);
    let index = begin.max(end.saturating_sub(1)).min(last);
    infos.get(index).map_or(0, |info| info.end)
}

/// Number of `\n` characters in `text`
pub fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}
