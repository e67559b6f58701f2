//! Strategies that settle a conflict between two deltas without asking.
//!
//! Strategies are tried in ascending [`Resolve::position`]; the first one
//! that can resolve a pair owns it for the rest of the merge.

pub mod enclosed;
pub mod language_file;
pub mod liquibase;
pub mod same;
pub mod word_based;
pub mod xml;

use crate::delta::{ChangeDelta, ChangeSide, ChangeStatus, ChangeType, ConflictType, DeltaTextChangeEvent, LinePart};
use crate::file_diff::{FileDiff, FileDiffError};
use crate::merge::{ConflictPair, ConflictSide};
use enclosed::EnclosedResolve;
use language_file::LanguageFileResolve;
use liquibase::LiquibaseResolve;
use same::SameResolve;
use std::fmt;
use tracing::debug;
use word_based::WordBasedResolve;

/// A delta together with the diff that owns it
#[derive(Debug, Clone, Copy)]
pub struct DeltaRef<'a> {
    delta: &'a ChangeDelta,
    diff: &'a FileDiff,
}

impl<'a> DeltaRef<'a> {
    pub fn new(delta: &'a ChangeDelta, diff: &'a FileDiff) -> Self {
        Self { delta, diff }
    }

    pub fn delta(&self) -> &'a ChangeDelta {
        self.delta
    }

    /// Text the delta covers on one side
    pub fn text(&self, side: ChangeSide) -> &'a str {
        self.diff.delta_text(self.delta, side)
    }

    pub fn line_parts(&self) -> &'a [LinePart] {
        self.delta.line_parts()
    }

    pub fn change_type(&self) -> ChangeType {
        self.delta.change_type()
    }

    /// Same OLD range and same NEW text
    pub fn is_same_change(&self, other: &DeltaRef<'_>) -> bool {
        self.delta.range(ChangeSide::Old) == other.delta.range(ChangeSide::Old)
            && self.text(ChangeSide::New) == other.text(ChangeSide::New)
    }
}

/// Both diffs of a merge while one delta of a conflict pair is accepted
pub struct ResolveContext<'a> {
    /// Diff of the accepted delta
    pub(crate) accepted: &'a mut FileDiff,
    pub(crate) other: &'a mut FileDiff,
    /// Side of the accepted delta
    pub(crate) side: ConflictSide,
    pub(crate) pair: ConflictPair,
}

impl ResolveContext<'_> {
    pub fn side(&self) -> ConflictSide {
        self.side
    }

    /// Index of the other delta of the pair in the other diff
    pub fn counterpart_index(&self) -> usize {
        self.pair.index_of_side(self.side.opposite())
    }

    pub fn counterpart(&self) -> Option<&ChangeDelta> {
        self.other.deltas().get(self.counterpart_index())
    }

    pub fn counterpart_status(&self) -> Option<ChangeStatus> {
        self.counterpart().map(ChangeDelta::status)
    }

    /// Apply OLD-side events of the accepted diff to the OLD text of the other
    pub fn mirror(&mut self, events: &[DeltaTextChangeEvent]) -> Result<(), FileDiffError> {
        for event in events {
            self.other
                .process_text_event_on(ChangeSide::Old, event.offset, event.length, &event.text)?;
        }
        Ok(())
    }
}

/// A conflict resolution strategy
pub trait Resolve {
    /// Order among the strategies, lower is tried first
    fn position(&self) -> u32;

    /// Whether this strategy can settle the conflict between `own`, a delta
    /// of `side`, and `other`
    fn can_resolve_conflict(&self, own: &DeltaRef<'_>, other: &DeltaRef<'_>, side: ConflictSide) -> bool;

    /// Accept `delta` of `context.side`.
    ///
    /// Returns the OLD-side events still to be mirrored onto the other diff;
    /// strategies that update the other diff themselves return none.
    fn resolve_conflict(
        &self,
        delta: &ChangeDelta,
        context: &mut ResolveContext<'_>,
    ) -> Result<Vec<DeltaTextChangeEvent>, FileDiffError>;

    /// Conflict type of a pair this strategy resolves
    fn conflict_type(&self, _own: &DeltaRef<'_>, _other: &DeltaRef<'_>, _side: ConflictSide) -> ConflictType {
        ConflictType::Resolvable
    }
}

/// The known strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveOption {
    Same,
    Enclosed,
    WordBased,
    Liquibase,
    LanguageFile,
}

impl ResolveOption {
    pub const ALL: [ResolveOption; 5] = [
        ResolveOption::Same,
        ResolveOption::Enclosed,
        ResolveOption::WordBased,
        ResolveOption::Liquibase,
        ResolveOption::LanguageFile,
    ];

    fn strategy(self) -> &'static dyn Resolve {
        match self {
            ResolveOption::Same => &SameResolve,
            ResolveOption::Enclosed => &EnclosedResolve,
            ResolveOption::WordBased => &WordBasedResolve,
            ResolveOption::Liquibase => &LiquibaseResolve,
            ResolveOption::LanguageFile => &LanguageFileResolve,
        }
    }
}

impl Resolve for ResolveOption {
    fn position(&self) -> u32 {
        self.strategy().position()
    }

    fn can_resolve_conflict(&self, own: &DeltaRef<'_>, other: &DeltaRef<'_>, side: ConflictSide) -> bool {
        self.strategy().can_resolve_conflict(own, other, side)
    }

    fn resolve_conflict(
        &self,
        delta: &ChangeDelta,
        context: &mut ResolveContext<'_>,
    ) -> Result<Vec<DeltaTextChangeEvent>, FileDiffError> {
        self.strategy().resolve_conflict(delta, context)
    }

    fn conflict_type(&self, own: &DeltaRef<'_>, other: &DeltaRef<'_>, side: ConflictSide) -> ConflictType {
        self.strategy().conflict_type(own, other, side)
    }
}

impl fmt::Display for ResolveOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolveOption::Same => "same",
            ResolveOption::Enclosed => "enclosed",
            ResolveOption::WordBased => "word-based",
            ResolveOption::Liquibase => "liquibase",
            ResolveOption::LanguageFile => "language-file",
        };
        write!(f, "{name}")
    }
}

/// The strategies consulted by a merge, in the order they are tried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    options: Vec<ResolveOption>,
}

impl ResolveOptions {
    /// Strategies sorted by position; equal positions keep the given order
    pub fn new(options: impl IntoIterator<Item = ResolveOption>) -> Self {
        let mut options: Vec<_> = options.into_iter().collect();
        options.sort_by_key(|option| option.position());
        Self { options }
    }

    /// No strategy: every overlap is a real conflict
    pub fn none() -> Self {
        Self { options: Vec::new() }
    }

    pub fn options(&self) -> &[ResolveOption] {
        &self.options
    }

    /// First strategy able to resolve the conflict
    pub fn find(&self, own: &DeltaRef<'_>, other: &DeltaRef<'_>, side: ConflictSide) -> Option<ResolveOption> {
        let found = self
            .options
            .iter()
            .copied()
            .find(|option| option.can_resolve_conflict(own, other, side));
        debug!(%side, ?found, "looked up resolve option");
        found
    }
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self::new(ResolveOption::ALL)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn options_are_sorted_by_position() {
        let options = ResolveOptions::new([
            ResolveOption::LanguageFile,
            ResolveOption::Liquibase,
            ResolveOption::Same,
            ResolveOption::WordBased,
            ResolveOption::Enclosed,
        ]);
        assert_eq!(
            options.options(),
            &[
                ResolveOption::Same,
                ResolveOption::Enclosed,
                ResolveOption::Liquibase,
                ResolveOption::WordBased,
                ResolveOption::LanguageFile,
            ]
        );
    }

    #[test]
    fn positions() {
        let positions: Vec<u32> = ResolveOption::ALL.iter().map(Resolve::position).collect();
        assert_eq!(positions, vec![0, 100, 300, 300, 400]);
    }

    #[test]
    fn default_holds_every_option() {
        assert_eq!(ResolveOptions::default().options(), &ResolveOption::ALL);
        assert!(ResolveOptions::none().options().is_empty());
    }
}
