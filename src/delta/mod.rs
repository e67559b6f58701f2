pub mod builder;
pub mod event;
pub mod line_part;

pub use builder::DeltaBuilder;
pub use event::DeltaTextChangeEvent;
pub use line_part::LinePart;

use crate::edit::EditKind;
use std::fmt;
use std::ops::Range;

/// One of the two texts a delta spans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeSide {
    Old,
    New,
}

impl ChangeSide {
    pub fn opposite(self) -> Self {
        match self {
            ChangeSide::Old => ChangeSide::New,
            ChangeSide::New => ChangeSide::Old,
        }
    }
}

impl fmt::Display for ChangeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeSide::Old => write!(f, "old"),
            ChangeSide::New => write!(f, "new"),
        }
    }
}

/// Lifecycle state of a delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeStatus {
    Pending,
    Accepted,
    Discarded,
    Undefined,
}

/// What a delta (or a whole file) does to the text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Same,
    Add,
    Delete,
    Modify,
    Rename,
    Copy,
}

impl ChangeType {
    pub fn from_edit_kind(kind: EditKind) -> Self {
        match kind {
            EditKind::Insert => ChangeType::Add,
            EditKind::Delete => ChangeType::Delete,
            EditKind::Replace => ChangeType::Modify,
            EditKind::Empty => ChangeType::Same,
        }
    }

    /// Map a git status letter (`git diff --name-status`, `git status --porcelain`)
    pub fn from_status_letter(letter: char) -> Option<Self> {
        match letter {
            'A' => Some(ChangeType::Add),
            'M' | 'T' => Some(ChangeType::Modify),
            'D' => Some(ChangeType::Delete),
            'R' => Some(ChangeType::Rename),
            'C' => Some(ChangeType::Copy),
            _ => None,
        }
    }
}

/// How a delta relates to the overlapping delta of the sibling diff in a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictType {
    None,
    Conflicting,
    EnclosedByYours,
    EnclosedByTheirs,
    Resolvable,
}

/// Line and byte bounds of a delta on one side, ends exclusive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds {
    pub start_line: usize,
    pub end_line: usize,
    pub start: usize,
    pub end: usize,
}

impl Bounds {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Zero-width range (a point between two characters)
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    fn shifted(self, lines: isize, text: isize) -> Self {
        Self {
            start_line: self.start_line.saturating_add_signed(lines),
            end_line: self.end_line.saturating_add_signed(lines),
            start: self.start.saturating_add_signed(text),
            end: self.end.saturating_add_signed(text),
        }
    }

    /// Bounds after `change`, treating an insertion at or inside the range as
    /// growing it
    fn with_change(self, change: &TextChange) -> Self {
        match *change {
            TextChange::Insert {
                offset,
                length,
                lines,
            } => {
                let mut bounds = self;
                if self.start > offset {
                    bounds.start += length;
                    bounds.start_line += lines;
                }
                if self.end >= offset {
                    bounds.end += length;
                    bounds.end_line += lines;
                }
                bounds
            }
            TextChange::Delete {
                offset,
                length,
                lines_before,
                lines_inside,
            } => {
                let (start_line, end_line) = if offset < self.start {
                    (
                        self.start_line.saturating_sub(lines_before),
                        self.end_line.saturating_sub(lines_before + lines_inside),
                    )
                } else {
                    (self.start_line, self.end_line.saturating_sub(lines_inside))
                };
                Self {
                    start_line,
                    end_line: end_line.max(start_line),
                    start: point_after_delete(self.start, offset, length),
                    end: point_after_delete(self.end, offset, length),
                }
            }
        }
    }
}

/// Position of `point` once `offset..offset + length` is removed
pub(crate) fn point_after_delete(point: usize, offset: usize, length: usize) -> usize {
    if point <= offset {
        point
    } else if point >= offset + length {
        point - length
    } else {
        offset
    }
}

/// Whether two ranges overlap, or are both empty at the same point
pub fn ranges_conflict(a: &Range<usize>, b: &Range<usize>) -> bool {
    (a.start < b.end && a.end > b.start) || (a.is_empty() && b.is_empty() && a.start == b.start)
}

/// A text edit that touches a delta.
///
/// Line counts are the number of newlines involved: for an insertion the
/// newlines inserted, for a deletion the newlines removed in front of the
/// delta (`lines_before`) and inside it (`lines_inside`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextChange {
    Insert {
        offset: usize,
        length: usize,
        lines: usize,
    },
    Delete {
        offset: usize,
        length: usize,
        lines_before: usize,
        lines_inside: usize,
    },
}

/// One contiguous changed region between an OLD and a NEW text.
///
/// Immutable: every transformation returns a new delta that the owning
/// [`FileDiff`](crate::file_diff::FileDiff) writes back into its list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeDelta {
    status: ChangeStatus,
    change_type: ChangeType,
    conflict_type: ConflictType,
    old: Bounds,
    new: Bounds,
    line_parts: Vec<LinePart>,
}

impl ChangeDelta {
    /// Create a pending delta, computing its line parts from both texts
    pub fn new(change_type: ChangeType, old: Bounds, new: Bounds, old_text: &str, new_text: &str) -> Self {
        debug_assert!(old.start <= old.end && new.start <= new.end);

        let changed_lines = old.line_count() + new.line_count();
        let line_parts = LinePart::compute(
            old_text.get(old.range()).unwrap_or_default(),
            new_text.get(new.range()).unwrap_or_default(),
            old.start,
            new.start,
            changed_lines < line_part::WORD_DIFF_LINE_LIMIT,
        );

        Self {
            status: ChangeStatus::Pending,
            change_type,
            conflict_type: ConflictType::None,
            old,
            new,
            line_parts,
        }
    }

    pub fn status(&self) -> ChangeStatus {
        self.status
    }

    pub fn change_type(&self) -> ChangeType {
        self.change_type
    }

    pub fn conflict_type(&self) -> ConflictType {
        self.conflict_type
    }

    pub fn bounds(&self, side: ChangeSide) -> &Bounds {
        match side {
            ChangeSide::Old => &self.old,
            ChangeSide::New => &self.new,
        }
    }

    pub fn start(&self, side: ChangeSide) -> usize {
        self.bounds(side).start
    }

    pub fn end(&self, side: ChangeSide) -> usize {
        self.bounds(side).end
    }

    pub fn start_line(&self, side: ChangeSide) -> usize {
        self.bounds(side).start_line
    }

    pub fn end_line(&self, side: ChangeSide) -> usize {
        self.bounds(side).end_line
    }

    pub fn range(&self, side: ChangeSide) -> Range<usize> {
        self.bounds(side).range()
    }

    /// Word-level (or, for big deltas, line-level) sub-changes
    pub fn line_parts(&self) -> &[LinePart] {
        &self.line_parts
    }

    pub fn with_status(&self, status: ChangeStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    pub fn with_conflict_type(&self, conflict_type: ConflictType) -> Self {
        Self {
            conflict_type,
            ..self.clone()
        }
    }

    /// Shift the NEW side; OLD is the fixed reference text
    pub fn apply_offset(&self, lines: isize, text: isize) -> Self {
        self.apply_offset_on(ChangeSide::New, lines, text)
    }

    /// Shift the bounds of one side
    pub fn apply_offset_on(&self, side: ChangeSide, lines: isize, text: isize) -> Self {
        let mut delta = self.clone();
        let bounds = delta.bounds_mut(side);
        *bounds = bounds.shifted(lines, text);
        for part in &mut delta.line_parts {
            *part = part.shifted(side, text);
        }
        delta
    }

    /// Mark accepted, collapsing the NEW range onto the length of the OLD range
    pub fn accept_change(&self) -> Self {
        self.accept_change_on(ChangeSide::New)
    }

    /// Mark accepted after `side` received the opposite side's text
    pub fn accept_change_on(&self, side: ChangeSide) -> Self {
        let source = *self.bounds(side.opposite());
        let mut delta = self.clone();
        delta.status = ChangeStatus::Accepted;

        let bounds = delta.bounds_mut(side);
        bounds.end = bounds.start + source.len();
        bounds.end_line = bounds.start_line + source.line_count();

        let target_start = bounds.start;
        for part in &mut delta.line_parts {
            let from = part.range(side.opposite());
            *part = part.with_range(
                side,
                target_start + from.start.saturating_sub(source.start)
                    ..target_start + from.end.saturating_sub(source.start),
            );
        }
        delta
    }

    /// Mark accepted after each line part was applied separately to `side`
    pub fn accept_parts_on(&self, side: ChangeSide, lines: isize, text: isize) -> Self {
        let mut delta = self.clone();
        delta.status = ChangeStatus::Accepted;

        let bounds = delta.bounds_mut(side);
        bounds.end = bounds.end.saturating_add_signed(text);
        bounds.end_line = bounds.end_line.saturating_add_signed(lines);

        let mut shift: isize = 0;
        for part in &mut delta.line_parts {
            let target = part.range(side);
            let source = part.range(side.opposite());
            let start = target.start.saturating_add_signed(shift);
            shift += source.len() as isize - target.len() as isize;
            *part = part.with_range(side, start..start + source.len());
        }
        delta
    }

    /// Mark accepted after the NEW text was appended behind the OLD range
    pub fn append_change(&self) -> Self {
        let mut delta = self.clone();
        delta.status = ChangeStatus::Accepted;
        delta.old.end += self.new.len();
        delta.old.end_line += self.new.line_count();
        delta
    }

    /// Mark discarded, bounds unchanged
    pub fn discard_change(&self) -> Self {
        self.with_status(ChangeStatus::Discarded)
    }

    /// Recompute the NEW bounds for an edit that touches this delta
    pub fn process_text_event(&self, change: &TextChange) -> Self {
        self.process_text_event_on(ChangeSide::New, change)
    }

    /// Recompute the bounds of `side` for an edit that touches this delta.
    ///
    /// An insertion at or inside the range grows the delta. Line parts never
    /// grow from an insertion at their edges.
    pub fn process_text_event_on(&self, side: ChangeSide, change: &TextChange) -> Self {
        let mut delta = self.clone();
        let bounds = delta.bounds_mut(side);
        *bounds = bounds.with_change(change);
        for part in &mut delta.line_parts {
            *part = part.with_change(side, change);
        }
        delta
    }

    /// Whether the OLD ranges of both deltas conflict
    pub fn is_conflicting_with(&self, other: &ChangeDelta) -> bool {
        ranges_conflict(&self.old.range(), &other.old.range())
    }

    fn bounds_mut(&mut self, side: ChangeSide) -> &mut Bounds {
        match side {
            ChangeSide::Old => &mut self.old,
            ChangeSide::New => &mut self.new,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn bounds(start_line: usize, end_line: usize, start: usize, end: usize) -> Bounds {
        Bounds {
            start_line,
            end_line,
            start,
            end,
        }
    }

    /// OLD "a\nb\nc\n", NEW "a\nX\nY\nc\n", line 1 replaced by two lines
    fn modify_delta() -> ChangeDelta {
        ChangeDelta::new(
            ChangeType::Modify,
            bounds(1, 2, 2, 4),
            bounds(1, 3, 2, 6),
            "a\nb\nc\n",
            "a\nX\nY\nc\n",
        )
    }

    #[test]
    fn new_delta_is_pending_without_conflict() {
        let delta = modify_delta();
        assert_eq!(delta.status(), ChangeStatus::Pending);
        assert_eq!(delta.conflict_type(), ConflictType::None);
        assert_eq!(delta.range(ChangeSide::Old), 2..4);
        assert_eq!(delta.range(ChangeSide::New), 2..6);
    }

    #[test]
    fn apply_offset_shifts_only_new_side() {
        let delta = modify_delta().apply_offset(2, 5);
        assert_eq!(*delta.bounds(ChangeSide::Old), bounds(1, 2, 2, 4));
        assert_eq!(*delta.bounds(ChangeSide::New), bounds(3, 5, 7, 11));
    }

    #[test]
    fn apply_offset_shifts_line_parts() {
        let delta = modify_delta();
        let shifted = delta.apply_offset(0, 3);
        for (before, after) in delta.line_parts().iter().zip(shifted.line_parts()) {
            assert_eq!(after.range(ChangeSide::New).start, before.range(ChangeSide::New).start + 3);
            assert_eq!(after.range(ChangeSide::Old), before.range(ChangeSide::Old));
        }
    }

    #[test]
    fn accept_collapses_new_onto_old_length() {
        let delta = modify_delta().accept_change();
        assert_eq!(delta.status(), ChangeStatus::Accepted);
        assert_eq!(*delta.bounds(ChangeSide::New), bounds(1, 2, 2, 4));
        assert_eq!(*delta.bounds(ChangeSide::Old), bounds(1, 2, 2, 4));
    }

    #[test]
    fn accept_on_old_takes_new_length() {
        let delta = modify_delta().accept_change_on(ChangeSide::Old);
        assert_eq!(*delta.bounds(ChangeSide::Old), bounds(1, 3, 2, 6));
    }

    #[test]
    fn discard_keeps_bounds() {
        let delta = modify_delta();
        let discarded = delta.discard_change();
        assert_eq!(discarded.status(), ChangeStatus::Discarded);
        assert_eq!(discarded.bounds(ChangeSide::New), delta.bounds(ChangeSide::New));
        assert_eq!(discarded.bounds(ChangeSide::Old), delta.bounds(ChangeSide::Old));
    }

    #[test]
    fn append_grows_old_by_new_text() {
        let delta = modify_delta().append_change();
        assert_eq!(delta.status(), ChangeStatus::Accepted);
        assert_eq!(*delta.bounds(ChangeSide::Old), bounds(1, 4, 2, 8));
    }

    #[test]
    fn insert_inside_grows_end() {
        let delta = modify_delta().process_text_event(&TextChange::Insert {
            offset: 3,
            length: 4,
            lines: 1,
        });
        assert_eq!(*delta.bounds(ChangeSide::New), bounds(1, 4, 2, 10));
    }

    #[test]
    fn delete_overlapping_start_moves_start() {
        // delete 1..4 on NEW where the delta spans 2..6
        let delta = modify_delta().process_text_event(&TextChange::Delete {
            offset: 1,
            length: 3,
            lines_before: 1,
            lines_inside: 1,
        });
        assert_eq!(*delta.bounds(ChangeSide::New), bounds(0, 1, 1, 3));
    }

    #[test]
    fn delete_covering_delta_collapses_it() {
        let delta = modify_delta().process_text_event(&TextChange::Delete {
            offset: 1,
            length: 7,
            lines_before: 1,
            lines_inside: 2,
        });
        assert_eq!(*delta.bounds(ChangeSide::New), bounds(0, 0, 1, 1));
    }

    #[test]
    fn delete_inside_shrinks_end() {
        let delta = modify_delta().process_text_event(&TextChange::Delete {
            offset: 3,
            length: 2,
            lines_before: 0,
            lines_inside: 1,
        });
        assert_eq!(*delta.bounds(ChangeSide::New), bounds(1, 2, 2, 4));
    }

    #[test]
    fn delete_past_end_cuts_at_offset() {
        let delta = modify_delta().process_text_event(&TextChange::Delete {
            offset: 4,
            length: 4,
            lines_before: 0,
            lines_inside: 1,
        });
        assert_eq!(*delta.bounds(ChangeSide::New), bounds(1, 2, 2, 4));
    }

    #[test]
    fn conflicting_ranges() {
        assert!(ranges_conflict(&(2..4), &(3..6)));
        assert!(!ranges_conflict(&(2..4), &(4..6)));
        assert!(ranges_conflict(&(3..3), &(3..3)));
        assert!(ranges_conflict(&(3..3), &(2..4)));
        assert!(!ranges_conflict(&(2..2), &(2..4)));
    }

    #[test]
    fn status_letters_map_to_change_types() {
        assert_eq!(ChangeType::from_status_letter('A'), Some(ChangeType::Add));
        assert_eq!(ChangeType::from_status_letter('R'), Some(ChangeType::Rename));
        assert_eq!(ChangeType::from_status_letter('T'), Some(ChangeType::Modify));
        assert_eq!(ChangeType::from_status_letter('?'), None);
    }
}
