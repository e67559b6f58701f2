use super::ConflictSide;
use crate::delta::ConflictType;
use crate::resolve::ResolveOption;

/// Two deltas, one per side of a merge, whose OLD ranges conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictPair {
    yours_index: usize,
    theirs_index: usize,
    conflict_type: ConflictType,
    resolution: Option<ResolveOption>,
}

impl ConflictPair {
    pub fn new(
        yours_index: usize,
        theirs_index: usize,
        conflict_type: ConflictType,
        resolution: Option<ResolveOption>,
    ) -> Self {
        Self {
            yours_index,
            theirs_index,
            conflict_type,
            resolution,
        }
    }

    /// Delta index belonging to `side`
    pub fn index_of_side(&self, side: ConflictSide) -> usize {
        match side {
            ConflictSide::Yours => self.yours_index,
            ConflictSide::Theirs => self.theirs_index,
        }
    }

    pub fn conflict_type(&self) -> ConflictType {
        self.conflict_type
    }

    /// Strategy that settles this pair, `None` for a real conflict
    pub fn resolution(&self) -> Option<ResolveOption> {
        self.resolution
    }
}
