use super::{DeltaRef, Resolve, ResolveContext};
use crate::delta::{ChangeDelta, ChangeSide, ChangeStatus, ChangeType, ConflictType, DeltaTextChangeEvent};
use crate::file_diff::FileDiffError;
use crate::merge::ConflictSide;
use tracing::debug;

/// The NEW text of one side contains the NEW text of the other
#[derive(Debug, Clone, Copy, Default)]
pub struct EnclosedResolve;

/// Which side encloses the other, seen from `own` of `side`
pub fn enclosure(own: &DeltaRef<'_>, other: &DeltaRef<'_>, side: ConflictSide) -> Option<ConflictType> {
    if own.change_type() == ChangeType::Delete || other.change_type() == ChangeType::Delete {
        return None;
    }
    let own_text = own.text(ChangeSide::New);
    let other_text = other.text(ChangeSide::New);

    if own_text.contains(other_text) {
        Some(enclosed_by(side))
    } else if other_text.contains(own_text) {
        Some(enclosed_by(side.opposite()))
    } else {
        None
    }
}

fn enclosed_by(side: ConflictSide) -> ConflictType {
    match side {
        ConflictSide::Yours => ConflictType::EnclosedByYours,
        ConflictSide::Theirs => ConflictType::EnclosedByTheirs,
    }
}

impl Resolve for EnclosedResolve {
    fn position(&self) -> u32 {
        100
    }

    fn can_resolve_conflict(&self, own: &DeltaRef<'_>, other: &DeltaRef<'_>, side: ConflictSide) -> bool {
        enclosure(own, other, side).is_some()
    }

    /// Accepting the enclosing delta also accepts the enclosed one. An
    /// enclosed delta whose encloser is already in is accepted without
    /// touching the text.
    fn resolve_conflict(
        &self,
        delta: &ChangeDelta,
        context: &mut ResolveContext<'_>,
    ) -> Result<Vec<DeltaTextChangeEvent>, FileDiffError> {
        let enclosing = delta.conflict_type() == enclosed_by(context.side);
        let counterpart = context.counterpart_index();

        match (enclosing, context.counterpart_status()) {
            (false, Some(ChangeStatus::Accepted)) => {
                if let Some(index) = context.accepted.index_of(delta) {
                    context.accepted.set_status(index, ChangeStatus::Accepted);
                }
                debug!(side = %context.side, "enclosed delta already accepted by its counterpart");
                Ok(Vec::new())
            }
            (true, Some(ChangeStatus::Pending)) => {
                let event = context.accepted.accept_delta_into(delta, ChangeSide::Old);
                context.mirror(std::slice::from_ref(&event))?;
                context.other.set_status(counterpart, ChangeStatus::Accepted);
                Ok(Vec::new())
            }
            _ => Ok(vec![context.accepted.accept_delta_into(delta, ChangeSide::Old)]),
        }
    }

    fn conflict_type(&self, own: &DeltaRef<'_>, other: &DeltaRef<'_>, side: ConflictSide) -> ConflictType {
        enclosure(own, other, side).unwrap_or(ConflictType::Conflicting)
    }
}
