//! The delta list of one (OLD, NEW) text pair.
//!
//! [`FileDiff`] is the only owner of its deltas. Every mutation writes new
//! delta values back by index and re-indexes the deltas behind the mutated
//! one, so offsets always point into the current text buffers.

pub mod header;

use crate::delta::{
    ChangeDelta, ChangeSide, ChangeStatus, ChangeType, ConflictType, DeltaBuilder,
    DeltaTextChangeEvent, TextChange, ranges_conflict,
};
use crate::edit::{LineEdit, line_edits};
use crate::line_index::count_newlines;
use crate::merge::ConflictSide;
use crate::merge::conflict::ConflictPair;
use crate::resolve::{DeltaRef, Resolve, ResolveOptions};
use error_set::error_set;
use header::FileDiffHeader;
use tracing::{debug, trace};

error_set! {
    /// Errors from editing the texts of a [`FileDiff`]
    FileDiffError := {
        /// The edited range does not lie inside the text
        #[display("Text event {offset}..{end} is outside of the {side} text ({len} bytes)")]
        OutOfBounds { side: ChangeSide, offset: usize, end: usize, len: usize },
        /// The edited range splits a UTF-8 character
        #[display("Offset {offset} is not on a char boundary of the {side} text")]
        NotCharBoundary { side: ChangeSide, offset: usize },
    }
}

/// Deltas between an OLD and a NEW text, plus both live text buffers
#[derive(Debug, Clone)]
pub struct FileDiff {
    header: FileDiffHeader,
    edits: Vec<LineEdit>,
    original_old: String,
    original_new: String,
    old_text: String,
    new_text: String,
    deltas: Vec<ChangeDelta>,
}

impl FileDiff {
    /// Create a diff from externally computed line edits
    pub fn new(
        header: FileDiffHeader,
        old_text: impl Into<String>,
        new_text: impl Into<String>,
        edits: Vec<LineEdit>,
    ) -> Self {
        let old_text = old_text.into();
        let new_text = new_text.into();
        let deltas = DeltaBuilder::new(&old_text, &new_text).build(&edits);

        Self {
            header,
            edits,
            original_old: old_text.clone(),
            original_new: new_text.clone(),
            old_text,
            new_text,
            deltas,
        }
    }

    /// Create a diff, computing the line edits of both texts
    pub fn from_texts(header: FileDiffHeader, old_text: impl Into<String>, new_text: impl Into<String>) -> Self {
        let old_text = old_text.into();
        let new_text = new_text.into();
        let edits = line_edits(&old_text, &new_text);
        Self::new(header, old_text, new_text, edits)
    }

    pub fn header(&self) -> &FileDiffHeader {
        &self.header
    }

    /// Top-level change type of the file
    pub fn change_type(&self) -> ChangeType {
        self.header.change_type()
    }

    /// The line edits the deltas were built from
    pub fn edits(&self) -> &[LineEdit] {
        &self.edits
    }

    pub fn deltas(&self) -> &[ChangeDelta] {
        &self.deltas
    }

    /// Current content of one side
    pub fn text(&self, side: ChangeSide) -> &str {
        match side {
            ChangeSide::Old => &self.old_text,
            ChangeSide::New => &self.new_text,
        }
    }

    /// Text covered by `delta` on one side of the current buffers
    pub fn delta_text(&self, delta: &ChangeDelta, side: ChangeSide) -> &str {
        self.text(side).get(delta.range(side)).unwrap_or_default()
    }

    /// Position of `delta` in the list, compared by value
    pub fn index_of(&self, delta: &ChangeDelta) -> Option<usize> {
        self.deltas.iter().position(|d| d == delta)
    }

    /// Restore the original texts and rebuild the deltas
    pub fn reset(&mut self) {
        self.old_text = self.original_old.clone();
        self.new_text = self.original_new.clone();
        self.deltas = DeltaBuilder::new(&self.old_text, &self.new_text).build(&self.edits);
        debug!(path = ?self.header.file_path(), "reset file diff");
    }

    /// Accept `delta`: its NEW text becomes its OLD text.
    ///
    /// Returns the edit applied to the NEW buffer without the leading and
    /// trailing text the two versions share. An unknown or no longer pending
    /// delta yields an empty event and changes nothing.
    pub fn accept_delta(&mut self, delta: &ChangeDelta) -> DeltaTextChangeEvent {
        if self.pending_index(delta).is_none() {
            return DeltaTextChangeEvent::empty(ChangeSide::New);
        }
        let replaced = self.delta_text(delta, ChangeSide::New).to_string();
        self.accept_delta_into(delta, ChangeSide::New).trimmed(&replaced)
    }

    /// Replace the `target` range of `delta` with the text of the other side.
    ///
    /// Returns the full replaced span. Deltas behind `delta` are shifted on
    /// `target` by the resulting length change.
    pub fn accept_delta_into(&mut self, delta: &ChangeDelta, target: ChangeSide) -> DeltaTextChangeEvent {
        let Some(index) = self.pending_index(delta) else {
            return DeltaTextChangeEvent::empty(target);
        };
        let source = target.opposite();
        let range = delta.range(target);
        let replacement = self.delta_text(delta, source).to_string();

        let event = DeltaTextChangeEvent::new(range.start, range.len(), replacement, target);
        let text_diff = event.text.len() as isize - range.len() as isize;
        let line_diff =
            delta.bounds(source).line_count() as isize - delta.bounds(target).line_count() as isize;

        self.replace_text(&event);
        self.deltas[index] = delta.accept_change_on(target);
        self.shift_following(index, target, line_diff, text_diff);

        debug!(index, side = %target, offset = event.offset, length = event.length, "accepted delta");
        event
    }

    /// Accept `delta` one line part at a time, leaving the text between the
    /// parts as it is on `target`.
    ///
    /// Returns one event per part, each in the coordinates left by the
    /// previous one.
    pub fn accept_line_parts_into(
        &mut self,
        delta: &ChangeDelta,
        target: ChangeSide,
    ) -> Vec<DeltaTextChangeEvent> {
        let Some(index) = self.pending_index(delta) else {
            return vec![DeltaTextChangeEvent::empty(target)];
        };
        let source = target.opposite();

        let mut events = Vec::with_capacity(delta.line_parts().len());
        let mut text_diff: isize = 0;
        let mut line_diff: isize = 0;
        for part in delta.line_parts() {
            let target_range = part.range(target);
            let start = target_range.start.saturating_add_signed(text_diff);
            let replacement = self
                .text(source)
                .get(part.range(source))
                .unwrap_or_default()
                .to_string();
            let removed = self
                .text(target)
                .get(start..start + target_range.len())
                .unwrap_or_default();

            line_diff += count_newlines(&replacement) as isize - count_newlines(removed) as isize;
            text_diff += replacement.len() as isize - target_range.len() as isize;

            let event = DeltaTextChangeEvent::new(start, target_range.len(), replacement, target);
            self.replace_text(&event);
            events.push(event);
        }

        self.deltas[index] = delta.accept_parts_on(target, line_diff, text_diff);
        self.shift_following(index, target, line_diff, text_diff);

        debug!(index, side = %target, parts = events.len(), "accepted line parts");
        events
    }

    /// Insert the NEW text of `delta` behind its OLD range, keeping the OLD
    /// text in front of it
    pub fn append_delta_text(&mut self, delta: &ChangeDelta) -> DeltaTextChangeEvent {
        let Some(index) = self.pending_index(delta) else {
            return DeltaTextChangeEvent::empty(ChangeSide::Old);
        };
        let text = self.delta_text(delta, ChangeSide::New).to_string();
        let event = DeltaTextChangeEvent::new(delta.end(ChangeSide::Old), 0, text, ChangeSide::Old);
        let lines = delta.bounds(ChangeSide::New).line_count() as isize;
        let length = event.text.len() as isize;

        self.replace_text(&event);
        self.deltas[index] = delta.append_change();
        self.shift_following(index, ChangeSide::Old, lines, length);

        debug!(index, offset = event.offset, "appended delta text");
        event
    }

    /// Mark `delta` discarded; texts and offsets stay as they are
    pub fn discard_delta(&mut self, delta: &ChangeDelta) {
        if let Some(index) = self.pending_index(delta) {
            self.deltas[index] = delta.discard_change();
            debug!(index, "discarded delta");
        }
    }

    /// Live edit of the NEW text: remove `length` bytes at `offset`, then insert `text`
    pub fn process_text_event(&mut self, offset: usize, length: usize, text: &str) -> Result<(), FileDiffError> {
        self.process_text_event_on(ChangeSide::New, offset, length, text)
    }

    /// Live edit of one side's text.
    ///
    /// On NEW a deletion is absorbed by every delta it reaches and an
    /// insertion by the delta it lands in. On OLD (the fork point of a merge)
    /// the first delta whose range conflicts with the edited range absorbs
    /// the whole edit, other conflicting deltas are trimmed and moved behind
    /// the inserted text.
    pub fn process_text_event_on(
        &mut self,
        side: ChangeSide,
        offset: usize,
        length: usize,
        text: &str,
    ) -> Result<(), FileDiffError> {
        self.check_range(side, offset, length)?;
        if length == 0 && text.is_empty() {
            return Ok(());
        }
        trace!(%side, offset, length, inserted = text.len(), "text event");

        match side {
            ChangeSide::New => {
                let mut affected = None;
                if length > 0 {
                    affected = self.process_delete(side, offset, length);
                    self.replace_text(&DeltaTextChangeEvent::new(offset, length, "", side));
                }
                if !text.is_empty() {
                    self.process_insert(side, offset, text, affected);
                    self.replace_text(&DeltaTextChangeEvent::new(offset, 0, text, side));
                }
            }
            ChangeSide::Old => {
                self.process_spanning_event(side, offset, length, text);
                self.replace_text(&DeltaTextChangeEvent::new(offset, length, text, side));
            }
        }
        Ok(())
    }

    /// Tag each delta with how it relates to the first conflicting delta of
    /// `other`, which must share this diff's OLD text.
    ///
    /// Returns one pair per conflicting delta, indices ordered as
    /// (yours, theirs).
    pub fn mark_conflicting(
        &mut self,
        other: &FileDiff,
        own_side: ConflictSide,
        options: &ResolveOptions,
    ) -> Vec<ConflictPair> {
        let mut pairs = Vec::new();

        for index in 0..self.deltas.len() {
            let own = &self.deltas[index];
            let conflict = other.deltas().iter().enumerate().find(|(_, candidate)| {
                own.is_conflicting_with(candidate)
                    && own.change_type() != ChangeType::Same
                    && candidate.change_type() != ChangeType::Same
            });

            let conflict_type = match conflict {
                None => ConflictType::None,
                Some((other_index, other_delta)) => {
                    let own_ref = DeltaRef::new(own, self);
                    let other_ref = DeltaRef::new(other_delta, other);
                    let resolution = options.find(&own_ref, &other_ref, own_side);
                    let conflict_type = resolution.map_or(ConflictType::Conflicting, |option| {
                        option.conflict_type(&own_ref, &other_ref, own_side)
                    });

                    let (yours_index, theirs_index) = match own_side {
                        ConflictSide::Yours => (index, other_index),
                        ConflictSide::Theirs => (other_index, index),
                    };
                    pairs.push(ConflictPair::new(yours_index, theirs_index, conflict_type, resolution));
                    conflict_type
                }
            };

            self.deltas[index] = self.deltas[index].with_conflict_type(conflict_type);
        }

        debug!(side = %own_side, pairs = pairs.len(), "marked conflicting deltas");
        pairs
    }

    /// Overwrite the status of the delta at `index` without touching any text
    pub(crate) fn set_status(&mut self, index: usize, status: ChangeStatus) {
        if let Some(delta) = self.deltas.get(index) {
            self.deltas[index] = delta.with_status(status);
        }
    }

    fn pending_index(&self, delta: &ChangeDelta) -> Option<usize> {
        self.index_of(delta)
            .filter(|&index| self.deltas[index].status() == ChangeStatus::Pending)
    }

    fn check_range(&self, side: ChangeSide, offset: usize, length: usize) -> Result<(), FileDiffError> {
        let text = self.text(side);
        let end = offset + length;
        if end > text.len() {
            return Err(FileDiffError::OutOfBounds {
                side,
                offset,
                end,
                len: text.len(),
            });
        }
        for point in [offset, end] {
            if !text.is_char_boundary(point) {
                return Err(FileDiffError::NotCharBoundary { side, offset: point });
            }
        }
        Ok(())
    }

    fn text_mut(&mut self, side: ChangeSide) -> &mut String {
        match side {
            ChangeSide::Old => &mut self.old_text,
            ChangeSide::New => &mut self.new_text,
        }
    }

    fn replace_text(&mut self, event: &DeltaTextChangeEvent) {
        let start = event.offset;
        let end = event.offset + event.length;
        self.text_mut(event.side).replace_range(start..end, &event.text);
    }

    /// Shift every delta after `index` on one side
    fn shift_following(&mut self, index: usize, side: ChangeSide, lines: isize, text: isize) {
        for delta in self.deltas.iter_mut().skip(index + 1) {
            *delta = delta.apply_offset_on(side, lines, text);
        }
    }

    /// Update the deltas for removing `offset..offset + length`; returns the
    /// last delta the deletion reached
    fn process_delete(&mut self, side: ChangeSide, offset: usize, length: usize) -> Option<usize> {
        let end = offset + length;
        let buffer = match side {
            ChangeSide::Old => &self.old_text,
            ChangeSide::New => &self.new_text,
        };
        let lines = count_newlines(&buffer[offset..end]) as isize;
        let mut affected = None;

        for index in 0..self.deltas.len() {
            let delta = &self.deltas[index];
            let (start, delta_end) = (delta.start(side), delta.end(side));
            if offset >= delta_end {
                continue;
            }

            let reaches_next = end > delta_end;
            self.deltas[index] = if end < start {
                delta.apply_offset_on(side, -lines, -(length as isize))
            } else {
                let before = buffer.get(offset.min(start)..start).unwrap_or_default();
                let inside = buffer
                    .get(offset.max(start)..end.min(delta_end))
                    .unwrap_or_default();
                delta.process_text_event_on(
                    side,
                    &TextChange::Delete {
                        offset,
                        length,
                        lines_before: count_newlines(before),
                        lines_inside: count_newlines(inside),
                    },
                )
            };
            affected = Some(index);

            if !reaches_next {
                for delta in self.deltas.iter_mut().skip(index + 1) {
                    *delta = delta.apply_offset_on(side, -lines, -(length as isize));
                }
                break;
            }
        }
        affected
    }

    /// Update the deltas for inserting `text` at `offset`. After a deletion
    /// that reached delta `affected`, an insertion at its end still belongs to it.
    fn process_insert(&mut self, side: ChangeSide, offset: usize, text: &str, affected: Option<usize>) {
        let lines = count_newlines(text);
        let length = text.len();

        let hit = self.deltas.iter().enumerate().find(|(index, delta)| {
            offset < delta.end(side) || (affected == Some(*index) && offset == delta.end(side))
        });
        let Some((index, delta)) = hit else {
            return;
        };

        if offset >= delta.start(side) {
            self.deltas[index] =
                delta.process_text_event_on(side, &TextChange::Insert { offset, length, lines });
            self.shift_following(index, side, lines as isize, length as isize);
        } else {
            for delta in self.deltas.iter_mut().skip(index) {
                *delta = delta.apply_offset_on(side, lines as isize, length as isize);
            }
        }
    }

    /// Update the deltas for replacing `offset..offset + length` by `text`,
    /// classifying every delta against the range before the edit
    fn process_spanning_event(&mut self, side: ChangeSide, offset: usize, length: usize, text: &str) {
        let end = offset + length;
        let buffer = match side {
            ChangeSide::Old => &self.old_text,
            ChangeSide::New => &self.new_text,
        };
        let removed_lines = count_newlines(&buffer[offset..end]);
        let inserted_lines = count_newlines(text);
        let insert = TextChange::Insert {
            offset,
            length: text.len(),
            lines: inserted_lines,
        };
        let mut absorbed = false;

        for index in 0..self.deltas.len() {
            let delta = &self.deltas[index];
            let range = delta.range(side);

            if ranges_conflict(&(offset..end), &range) {
                let mut updated = if length > 0 {
                    let before = buffer.get(offset.min(range.start)..range.start.min(end)).unwrap_or_default();
                    let inside = buffer
                        .get(offset.max(range.start)..end.min(range.end))
                        .unwrap_or_default();
                    delta.process_text_event_on(
                        side,
                        &TextChange::Delete {
                            offset,
                            length,
                            lines_before: count_newlines(before),
                            lines_inside: count_newlines(inside),
                        },
                    )
                } else {
                    delta.clone()
                };
                if !text.is_empty() {
                    updated = if absorbed {
                        updated.apply_offset_on(side, inserted_lines as isize, text.len() as isize)
                    } else {
                        updated.process_text_event_on(side, &insert)
                    };
                }
                absorbed = true;
                self.deltas[index] = updated;
            } else if end <= range.start {
                self.deltas[index] = delta.apply_offset_on(
                    side,
                    inserted_lines as isize - removed_lines as isize,
                    text.len() as isize - length as isize,
                );
            }
        }
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Lines from a small pool, sometimes with an unterminated last line
    fn arb_text() -> impl Strategy<Value = String> {
        (
            prop::collection::vec(
                prop::sample::select(vec!["a\n", "b\n", "c c\n", "dd\n", "\n", "e f g\n", "é\n"]),
                0..10,
            ),
            prop::sample::select(vec!["", "", "a", "é ü", "c c"]),
        )
            .prop_map(|(lines, tail)| lines.concat() + tail)
    }

    fn diff(old: &str, new: &str) -> FileDiff {
        FileDiff::from_texts(FileDiffHeader::for_path(ChangeType::Modify, "prop.txt"), old, new)
    }

    proptest! {
        #![proptest_config(ProptestConfig { max_global_rejects: 16384, ..ProptestConfig::default() })]

        #[test]
        fn accepts_keep_other_deltas_in_place(
            old in arb_text(),
            new in arb_text(),
            picks in prop::collection::vec(any::<bool>(), 10),
        ) {
            let mut diff = diff(&old, &new);
            let originals: Vec<(String, String)> = diff
                .deltas()
                .iter()
                .map(|d| {
                    (
                        diff.delta_text(d, ChangeSide::Old).to_string(),
                        diff.delta_text(d, ChangeSide::New).to_string(),
                    )
                })
                .collect();

            for (index, pick) in picks.iter().enumerate().take(originals.len()) {
                if *pick {
                    let delta = diff.deltas()[index].clone();
                    diff.accept_delta(&delta);
                }
            }

            for (delta, (old_part, new_part)) in diff.deltas().iter().zip(&originals) {
                let expected = if delta.status() == ChangeStatus::Accepted { old_part } else { new_part };
                prop_assert_eq!(diff.delta_text(delta, ChangeSide::New), expected.as_str());
            }
        }

        #[test]
        fn accepting_every_delta_restores_old(old in arb_text(), new in arb_text()) {
            let mut diff = diff(&old, &new);
            for index in 0..diff.deltas().len() {
                let delta = diff.deltas()[index].clone();
                diff.accept_delta(&delta);
            }
            prop_assert_eq!(diff.text(ChangeSide::New), old.as_str());
        }

        #[test]
        fn minimal_events_replay_onto_new(old in arb_text(), new in arb_text()) {
            let mut diff = diff(&old, &new);
            let mut replayed = new.clone();
            for index in 0..diff.deltas().len() {
                let delta = diff.deltas()[index].clone();
                replayed = diff.accept_delta(&delta).apply(&replayed);
            }
            prop_assert_eq!(replayed, old);
        }

        #[test]
        fn old_side_edits_before_deltas_only_shift(
            old in arb_text(),
            new in arb_text(),
            prefix in "[xyz\n]{1,5}",
        ) {
            let mut diff = diff(&old, &new);
            let before: Vec<String> = diff
                .deltas()
                .iter()
                .map(|d| diff.delta_text(d, ChangeSide::Old).to_string())
                .collect();
            prop_assume!(diff.deltas().iter().all(|d| d.start(ChangeSide::Old) > 0));

            diff.process_text_event_on(ChangeSide::Old, 0, 0, &prefix).unwrap();
            for (delta, text) in diff.deltas().iter().zip(&before) {
                prop_assert_eq!(diff.delta_text(delta, ChangeSide::Old), text.as_str());
            }
        }
    }
}
