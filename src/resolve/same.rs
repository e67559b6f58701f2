use super::{DeltaRef, Resolve, ResolveContext};
use crate::delta::{ChangeDelta, ChangeSide, ChangeStatus, DeltaTextChangeEvent};
use crate::file_diff::FileDiffError;
use crate::merge::ConflictSide;

/// Both sides made the very same change
#[derive(Debug, Clone, Copy, Default)]
pub struct SameResolve;

impl Resolve for SameResolve {
    fn position(&self) -> u32 {
        0
    }

    fn can_resolve_conflict(&self, own: &DeltaRef<'_>, other: &DeltaRef<'_>, _side: ConflictSide) -> bool {
        own.is_same_change(other)
    }

    /// Accepts both deltas at once. Both diffs apply the same replacement,
    /// so there is nothing left to mirror.
    fn resolve_conflict(
        &self,
        delta: &ChangeDelta,
        context: &mut ResolveContext<'_>,
    ) -> Result<Vec<DeltaTextChangeEvent>, FileDiffError> {
        let counterpart = context.counterpart().cloned();
        match counterpart {
            Some(counterpart) if counterpart.status() == ChangeStatus::Pending => {
                context.accepted.accept_delta_into(delta, ChangeSide::Old);
                context.other.accept_delta_into(&counterpart, ChangeSide::Old);
                Ok(Vec::new())
            }
            Some(counterpart) if counterpart.status() == ChangeStatus::Accepted => {
                if let Some(index) = context.accepted.index_of(delta) {
                    context.accepted.set_status(index, ChangeStatus::Accepted);
                }
                Ok(Vec::new())
            }
            _ => Ok(vec![context.accepted.accept_delta_into(delta, ChangeSide::Old)]),
        }
    }
}
