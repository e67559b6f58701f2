use super::xml::{XmlElement, parse_elements};
use super::{DeltaRef, Resolve, ResolveContext};
use crate::delta::{ChangeDelta, ChangeSide, ChangeStatus, DeltaTextChangeEvent};
use crate::file_diff::FileDiffError;
use crate::merge::ConflictSide;
use std::collections::HashSet;

/// Both sides added changelog includes (`<include file="..."/>` and the
/// like) for different files
#[derive(Debug, Clone, Copy, Default)]
pub struct LiquibaseResolve;

/// The `file` attribute of every element, `None` if one lacks it
fn referenced_files(elements: &[XmlElement]) -> Option<Vec<&str>> {
    elements.iter().map(|element| element.attribute("file")).collect()
}

impl Resolve for LiquibaseResolve {
    fn position(&self) -> u32 {
        300
    }

    fn can_resolve_conflict(&self, own: &DeltaRef<'_>, other: &DeltaRef<'_>, _side: ConflictSide) -> bool {
        let (Some(own_elements), Some(other_elements)) = (
            parse_elements(own.text(ChangeSide::New)),
            parse_elements(other.text(ChangeSide::New)),
        ) else {
            return false;
        };
        let (Some(own_files), Some(other_files)) =
            (referenced_files(&own_elements), referenced_files(&other_elements))
        else {
            return false;
        };
        if own_files.is_empty() || other_files.is_empty() {
            return false;
        }

        let own_files: HashSet<&str> = own_files.into_iter().collect();
        other_files.iter().all(|file| !own_files.contains(file))
    }

    /// The first side replaces the conflicting range, the second one is
    /// added behind it
    fn resolve_conflict(
        &self,
        delta: &ChangeDelta,
        context: &mut ResolveContext<'_>,
    ) -> Result<Vec<DeltaTextChangeEvent>, FileDiffError> {
        Ok(vec![unite(delta, context)])
    }
}

/// Accept `delta` so that the text of an already accepted counterpart stays
pub(super) fn unite(delta: &ChangeDelta, context: &mut ResolveContext<'_>) -> DeltaTextChangeEvent {
    if context.counterpart_status() == Some(ChangeStatus::Accepted) {
        context.accepted.append_delta_text(delta)
    } else {
        context.accepted.accept_delta_into(delta, ChangeSide::Old)
    }
}
