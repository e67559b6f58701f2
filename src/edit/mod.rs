pub mod unified;

use similar::{DiffOp, DiffTag, TextDiff};
use std::ops::Range;

/// Kind of a line-level edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Insert,
    Delete,
    Replace,
    Empty,
}

/// One line-range edit between an old and a new text.
///
/// Line indices are 0-based, `end` exclusive. An insertion has an empty old
/// range, a deletion an empty new range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEdit {
    pub kind: EditKind,
    pub begin_old: usize,
    pub end_old: usize,
    pub begin_new: usize,
    pub end_new: usize,
}

impl LineEdit {
    /// Create an edit, deriving its kind from the two ranges
    pub fn new(begin_old: usize, end_old: usize, begin_new: usize, end_new: usize) -> Self {
        let kind = match (begin_old == end_old, begin_new == end_new) {
            (true, true) => EditKind::Empty,
            (true, false) => EditKind::Insert,
            (false, true) => EditKind::Delete,
            (false, false) => EditKind::Replace,
        };

        Self {
            kind,
            begin_old,
            end_old,
            begin_new,
            end_new,
        }
    }
}

/// The changed ranges of a diff, walked with running cursors over both
/// sides.
///
/// Only the op lengths are trusted: the reported start of an op is not
/// always in line with the ops before it.
pub fn changed_ranges(ops: &[DiffOp]) -> Vec<(DiffTag, Range<usize>, Range<usize>)> {
    let (mut old, mut new) = (0, 0);
    let mut ranges = Vec::new();
    for op in ops {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        let (old_end, new_end) = (old + old_range.len(), new + new_range.len());
        if tag != DiffTag::Equal {
            ranges.push((tag, old..old_end, new..new_end));
        }
        old = old_end;
        new = new_end;
    }
    ranges
}

/// Compute the line edits between two texts.
///
/// Results are ordered and non-overlapping on both sides; unchanged runs are
/// not reported.
pub fn line_edits(old: &str, new: &str) -> Vec<LineEdit> {
    let diff = TextDiff::from_lines(old, new);
    changed_ranges(diff.ops())
        .into_iter()
        .map(|(_, old, new)| LineEdit::new(old.start, old.end, new.start, new.end))
        .collect()
}
