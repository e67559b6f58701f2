//! Three-way merge of one file.
//!
//! Both sides of a merge are diffed against the same fork point. The OLD
//! text of each [`FileDiff`] is that side's view of the merge result: every
//! change accepted on one side is mirrored as a text event onto the OLD text
//! of the other, so both views always hold the same text.

pub mod adjust;
pub mod conflict;

pub use adjust::adjust_edits_for_merge;
pub use conflict::ConflictPair;

use crate::MergeConfig;
use crate::delta::{ChangeDelta, ChangeSide, ChangeStatus, ChangeType, ConflictType};
use crate::edit::line_edits;
use crate::file_diff::header::FileDiffHeader;
use crate::file_diff::{FileDiff, FileDiffError};
use crate::resolve::{Resolve, ResolveContext, ResolveOptions};
use error_set::error_set;
use std::fmt;
use tracing::{debug, info};

error_set! {
    /// Errors from driving a merge
    MergeError := {
        /// Accepting a delta of status UNDEFINED is a caller bug
        #[display("Cannot accept a delta of state UNDEFINED")]
        UndefinedDelta,
        FileDiffError(FileDiffError),
    }
}

/// One of the two diverging versions of a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictSide {
    Yours,
    Theirs,
}

impl ConflictSide {
    pub fn opposite(self) -> Self {
        match self {
            ConflictSide::Yours => ConflictSide::Theirs,
            ConflictSide::Theirs => ConflictSide::Yours,
        }
    }
}

impl fmt::Display for ConflictSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictSide::Yours => write!(f, "yours"),
            ConflictSide::Theirs => write!(f, "theirs"),
        }
    }
}

/// The two diffs of one conflicting file, diffed against a shared fork point
#[derive(Debug, Clone)]
pub struct MergeData {
    yours: FileDiff,
    theirs: FileDiff,
    conflict_pairs: Vec<ConflictPair>,
}

impl MergeData {
    pub fn new(yours: FileDiff, theirs: FileDiff) -> Self {
        Self {
            yours,
            theirs,
            conflict_pairs: Vec::new(),
        }
    }

    /// Diff both versions against `fork`, with the line edits of both sides
    /// widened to common OLD ranges
    pub fn from_texts(
        yours_header: FileDiffHeader,
        theirs_header: FileDiffHeader,
        fork: &str,
        yours: &str,
        theirs: &str,
    ) -> Self {
        let mut yours_edits = line_edits(fork, yours);
        let mut theirs_edits = line_edits(fork, theirs);
        adjust_edits_for_merge(&mut yours_edits, &mut theirs_edits);

        Self::new(
            FileDiff::new(yours_header, fork, yours, yours_edits),
            FileDiff::new(theirs_header, fork, theirs, theirs_edits),
        )
    }

    pub fn diff(&self, side: ConflictSide) -> &FileDiff {
        match side {
            ConflictSide::Yours => &self.yours,
            ConflictSide::Theirs => &self.theirs,
        }
    }

    /// Path of the merged file, following a rename on either side
    pub fn file_path(&self) -> Option<&str> {
        let yours = self.yours.header();
        let theirs = self.theirs.header();
        let renamed = |header: &FileDiffHeader| header.change_type() == ChangeType::Rename;

        match (renamed(yours), renamed(theirs)) {
            (false, _) => yours.file_path(),
            (true, false) => theirs.file_path(),
            (true, true) if theirs.old_path() == yours.old_path() => theirs.old_path(),
            (true, true) => theirs.new_path(),
        }
    }

    /// The merge result (the OLD text both sides share)
    pub fn merged_text(&self) -> &str {
        self.yours.text(ChangeSide::Old)
    }

    pub fn conflict_pairs(&self) -> &[ConflictPair] {
        &self.conflict_pairs
    }

    /// The pair `delta` of `side` belongs to, if it is in conflict
    pub fn conflict_pair(&self, delta: &ChangeDelta, side: ConflictSide) -> Option<&ConflictPair> {
        let index = self.diff(side).index_of(delta)?;
        self.conflict_pair_at(index, side)
    }

    /// Classify the conflicts between both sides
    pub fn mark_conflicting(&mut self, options: &ResolveOptions) {
        self.theirs.mark_conflicting(&self.yours, ConflictSide::Theirs, options);
        self.conflict_pairs = self.yours.mark_conflicting(&self.theirs, ConflictSide::Yours, options);
        debug!(
            path = ?self.file_path(),
            pairs = self.conflict_pairs.len(),
            conflicting = self.conflicting_count(),
            "marked conflicts"
        );
    }

    /// Accept `delta` of `side` into the merge result.
    ///
    /// A delta with a resolvable conflict is accepted by its strategy. A
    /// really conflicting delta whose counterpart was already accepted adds
    /// its text behind the counterpart's. The resulting text events are
    /// mirrored onto the other side.
    pub fn accept_delta(&mut self, delta: &ChangeDelta, side: ConflictSide) -> Result<(), MergeError> {
        if delta.status() == ChangeStatus::Undefined {
            return Err(MergeError::UndefinedDelta);
        }
        let Some(index) = self.diff(side).index_of(delta) else {
            return Ok(());
        };
        if self.diff(side).deltas()[index].status() != ChangeStatus::Pending {
            return Ok(());
        }
        let pair = self.conflict_pair_at(index, side).copied();

        let (accepted, other) = self.diffs_mut(side);
        let Some(pair) = pair else {
            let event = accepted.accept_delta_into(delta, ChangeSide::Old);
            other.process_text_event_on(ChangeSide::Old, event.offset, event.length, &event.text)?;
            return Ok(());
        };

        let mut context = ResolveContext {
            accepted,
            other,
            side,
            pair,
        };
        let events = if let Some(option) = pair.resolution() {
            debug!(%side, index, ?option, "resolving conflict");
            option.resolve_conflict(delta, &mut context)?
        } else if pair.conflict_type() == ConflictType::Conflicting
            && context.counterpart_status() == Some(ChangeStatus::Accepted)
        {
            vec![context.accepted.append_delta_text(delta)]
        } else {
            vec![context.accepted.accept_delta_into(delta, ChangeSide::Old)]
        };
        context.mirror(&events)?;
        Ok(())
    }

    /// Discard `delta` of `side`; the merge result stays as it is and the
    /// other side only sees an empty text event
    pub fn discard_change(&mut self, delta: &ChangeDelta, side: ConflictSide) -> Result<(), MergeError> {
        let (discarded, other) = self.diffs_mut(side);
        discarded.discard_delta(delta);
        other.process_text_event_on(ChangeSide::Old, 0, 0, "")?;
        debug!(%side, "discarded change");
        Ok(())
    }

    /// Edit the merge result directly, on both sides
    pub fn modify_text(&mut self, offset: usize, length: usize, text: &str) -> Result<(), MergeError> {
        self.yours.process_text_event_on(ChangeSide::Old, offset, length, text)?;
        self.theirs.process_text_event_on(ChangeSide::Old, offset, length, text)?;
        Ok(())
    }

    /// Rebuild both diffs from their original texts. Conflicts have to be
    /// marked again afterwards.
    pub fn reset(&mut self) {
        self.yours.reset();
        self.theirs.reset();
        self.conflict_pairs.clear();
    }

    /// Accept every pending delta of `side` that is not in a real conflict.
    ///
    /// Returns the number of deltas accepted.
    pub fn accept_side(&mut self, side: ConflictSide) -> Result<usize, MergeError> {
        let mut accepted = 0;
        for index in 0..self.diff(side).deltas().len() {
            let delta = self.diff(side).deltas()[index].clone();
            if delta.status() == ChangeStatus::Pending && delta.conflict_type() != ConflictType::Conflicting {
                self.accept_delta(&delta, side)?;
                accepted += 1;
            }
        }
        Ok(accepted)
    }

    /// Number of pending deltas on both sides that are in a real conflict
    pub fn conflicting_count(&self) -> usize {
        [&self.yours, &self.theirs]
            .iter()
            .flat_map(|diff| diff.deltas())
            .filter(|delta| {
                delta.status() == ChangeStatus::Pending && delta.conflict_type() == ConflictType::Conflicting
            })
            .count()
    }

    /// Accept both sides when no delta is in a real conflict.
    ///
    /// Expects [`mark_conflicting`](Self::mark_conflicting) to have run.
    /// Returns whether the file was resolved.
    pub fn auto_resolve(&mut self) -> Result<bool, MergeError> {
        if self.conflicting_count() > 0 {
            debug!(path = ?self.file_path(), "conflicts left, skipping auto-resolve");
            return Ok(false);
        }
        let yours = self.accept_side(ConflictSide::Yours)?;
        let theirs = self.accept_side(ConflictSide::Theirs)?;
        info!(path = ?self.file_path(), yours, theirs, "auto-resolved");
        Ok(true)
    }

    /// Whether any of the four texts is longer than `max_chars` characters
    pub fn is_huge_file(&self, max_chars: usize) -> bool {
        [&self.yours, &self.theirs].iter().any(|diff| {
            [ChangeSide::Old, ChangeSide::New]
                .iter()
                .any(|&side| diff.text(side).chars().count() > max_chars)
        })
    }

    /// Sum of the lines touched by all deltas of both sides, on both sides
    pub fn changed_lines(&self) -> usize {
        [&self.yours, &self.theirs]
            .iter()
            .flat_map(|diff| diff.deltas())
            .map(|delta| delta.bounds(ChangeSide::Old).line_count() + delta.bounds(ChangeSide::New).line_count())
            .sum()
    }

    /// Huge files are only auto-resolved when they have few changed lines;
    /// a limit of zero skips every huge file
    pub fn should_skip_auto_resolve(&self, config: &MergeConfig) -> bool {
        if !self.is_huge_file(config.huge_file_chars) {
            return false;
        }
        config.max_changed_lines == 0 || self.changed_lines() > config.max_changed_lines
    }

    fn conflict_pair_at(&self, index: usize, side: ConflictSide) -> Option<&ConflictPair> {
        self.conflict_pairs
            .iter()
            .find(|pair| pair.index_of_side(side) == index)
    }

    /// The diff of `side` and the other one
    fn diffs_mut(&mut self, side: ConflictSide) -> (&mut FileDiff, &mut FileDiff) {
        match side {
            ConflictSide::Yours => (&mut self.yours, &mut self.theirs),
            ConflictSide::Theirs => (&mut self.theirs, &mut self.yours),
        }
    }
}
