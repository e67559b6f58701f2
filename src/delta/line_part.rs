use super::{ChangeSide, ChangeType, TextChange, point_after_delete, ranges_conflict};
use crate::edit::changed_ranges;
use similar::{DiffTag, TextDiff};
use std::ops::Range;

/// Deltas touching this many lines or more are split by lines instead of words
pub const WORD_DIFF_LINE_LIMIT: usize = 20;

/// A sub-change inside one delta, in absolute byte offsets of both texts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinePart {
    change_type: ChangeType,
    old: Range<usize>,
    new: Range<usize>,
}

impl LinePart {
    pub fn new(change_type: ChangeType, old: Range<usize>, new: Range<usize>) -> Self {
        Self {
            change_type,
            old,
            new,
        }
    }

    /// Split the change `old_text` → `new_text` into parts.
    ///
    /// `old_base`/`new_base` are the offsets of the two slices in their full
    /// texts. With `by_words` the texts are compared word by word, otherwise
    /// line by line.
    pub fn compute(
        old_text: &str,
        new_text: &str,
        old_base: usize,
        new_base: usize,
        by_words: bool,
    ) -> Vec<LinePart> {
        let diff = if by_words {
            TextDiff::from_words(old_text, new_text)
        } else {
            TextDiff::from_lines(old_text, new_text)
        };

        let old_offsets = token_offsets(diff.old_slices(), old_base);
        let new_offsets = token_offsets(diff.new_slices(), new_base);

        changed_ranges(diff.ops())
            .into_iter()
            .map(|(tag, old_range, new_range)| LinePart {
                change_type: match tag {
                    DiffTag::Insert => ChangeType::Add,
                    DiffTag::Delete => ChangeType::Delete,
                    _ => ChangeType::Modify,
                },
                old: old_offsets[old_range.start]..old_offsets[old_range.end],
                new: new_offsets[new_range.start]..new_offsets[new_range.end],
            })
            .collect()
    }

    pub fn change_type(&self) -> ChangeType {
        self.change_type
    }

    pub fn range(&self, side: ChangeSide) -> Range<usize> {
        match side {
            ChangeSide::Old => self.old.clone(),
            ChangeSide::New => self.new.clone(),
        }
    }

    /// Whether the OLD ranges of both parts conflict
    pub fn is_conflicting_with(&self, other: &LinePart) -> bool {
        ranges_conflict(&self.old, &other.old)
    }

    pub(crate) fn with_range(&self, side: ChangeSide, range: Range<usize>) -> Self {
        let mut part = self.clone();
        match side {
            ChangeSide::Old => part.old = range,
            ChangeSide::New => part.new = range,
        }
        part
    }

    pub(crate) fn shifted(&self, side: ChangeSide, text: isize) -> Self {
        let range = self.range(side);
        self.with_range(
            side,
            range.start.saturating_add_signed(text)..range.end.saturating_add_signed(text),
        )
    }

    /// Range after `change`; an insertion at an edge lands outside the part
    pub(crate) fn with_change(&self, side: ChangeSide, change: &TextChange) -> Self {
        let range = self.range(side);
        let updated = match *change {
            TextChange::Insert { offset, length, .. } => {
                let start = if range.start >= offset {
                    range.start + length
                } else {
                    range.start
                };
                let end = if range.end > offset || range.start >= offset {
                    range.end + length
                } else {
                    range.end
                };
                start..end
            }
            TextChange::Delete { offset, length, .. } => {
                point_after_delete(range.start, offset, length)
                    ..point_after_delete(range.end, offset, length)
            }
        };
        self.with_range(side, updated)
    }
}

/// Byte offset of every token boundary, one more entry than tokens
fn token_offsets(tokens: &[&str], base: usize) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(tokens.len() + 1);
    let mut offset = base;
    offsets.push(offset);
    for token in tokens {
        offset += token.len();
        offsets.push(offset);
    }
    offsets
}
