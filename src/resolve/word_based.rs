use super::{DeltaRef, Resolve, ResolveContext};
use crate::delta::{ChangeDelta, ChangeSide, DeltaTextChangeEvent};
use crate::file_diff::FileDiffError;
use crate::merge::ConflictSide;

/// Both sides changed the same lines, but never the same words
#[derive(Debug, Clone, Copy, Default)]
pub struct WordBasedResolve;

impl Resolve for WordBasedResolve {
    fn position(&self) -> u32 {
        300
    }

    fn can_resolve_conflict(&self, own: &DeltaRef<'_>, other: &DeltaRef<'_>, _side: ConflictSide) -> bool {
        other.line_parts().iter().all(|theirs| {
            own.line_parts()
                .iter()
                .all(|ours| !ours.is_conflicting_with(theirs))
        })
    }

    /// Applies the word changes one by one, so the words the other side
    /// changed stay in place
    fn resolve_conflict(
        &self,
        delta: &ChangeDelta,
        context: &mut ResolveContext<'_>,
    ) -> Result<Vec<DeltaTextChangeEvent>, FileDiffError> {
        Ok(context.accepted.accept_line_parts_into(delta, ChangeSide::Old))
    }
}
