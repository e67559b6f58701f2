use super::{Bounds, ChangeDelta, ChangeType};
use crate::edit::{EditKind, LineEdit};
use crate::line_index::{LineInfo, end_index, line_infos, start_index_safely};
use tracing::debug;

/// Maps line edits between two texts onto byte offsets, producing deltas
pub struct DeltaBuilder<'a> {
    old_text: &'a str,
    new_text: &'a str,
    old_lines: Vec<LineInfo>,
    new_lines: Vec<LineInfo>,
}

impl<'a> DeltaBuilder<'a> {
    pub fn new(old_text: &'a str, new_text: &'a str) -> Self {
        Self {
            old_text,
            new_text,
            old_lines: line_infos(old_text),
            new_lines: line_infos(new_text),
        }
    }

    /// Build one pending delta per edit, in edit order.
    ///
    /// An insertion covers no OLD text and a deletion no NEW text, so their
    /// ranges on that side are a point at the edit position.
    pub fn build(&self, edits: &[LineEdit]) -> Vec<ChangeDelta> {
        let deltas: Vec<ChangeDelta> = edits
            .iter()
            .map(|edit| {
                let old = side_bounds(
                    &self.old_lines,
                    self.old_text.len(),
                    edit.begin_old,
                    edit.end_old,
                    edit.kind == EditKind::Insert,
                );
                let new = side_bounds(
                    &self.new_lines,
                    self.new_text.len(),
                    edit.begin_new,
                    edit.end_new,
                    edit.kind == EditKind::Delete,
                );
                ChangeDelta::new(
                    ChangeType::from_edit_kind(edit.kind),
                    old,
                    new,
                    self.old_text,
                    self.new_text,
                )
            })
            .collect();

        debug!(edits = edits.len(), deltas = deltas.len(), "built change deltas");
        deltas
    }
}

/// Byte bounds of the lines `begin..end` of one text
fn side_bounds(infos: &[LineInfo], text_len: usize, begin: usize, end: usize, point: bool) -> Bounds {
    // an edit behind an unterminated last line starts one past the text
    let start = start_index_safely(infos, begin).min(text_len);
    let end_offset = if point {
        start
    } else {
        end_index(infos, begin, end).clamp(start, text_len)
    };

    Bounds {
        start_line: begin,
        end_line: end.max(begin),
        start,
        end: end_offset,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::delta::{ChangeSide, ChangeStatus};
    use crate::edit::line_edits;
    use similar_asserts::assert_eq;

    const ORIGINAL: &str = "first line.\nsecne.\nfifth line.";

    fn ranges(old: &str, new: &str, edits: &[LineEdit]) -> Vec<(usize, usize, usize, usize)> {
        DeltaBuilder::new(old, new)
            .build(edits)
            .iter()
            .map(|d| {
                (
                    d.start(ChangeSide::Old),
                    d.end(ChangeSide::Old),
                    d.start(ChangeSide::New),
                    d.end(ChangeSide::New),
                )
            })
            .collect()
    }

    #[test]
    fn deleted_line_is_point_on_new() {
        assert_eq!(
            ranges(ORIGINAL, "first line.\nfifth line.\n", &[LineEdit::new(1, 2, 1, 1)]),
            vec![(12, 19, 12, 12)]
        );
    }

    #[test]
    fn modified_line() {
        assert_eq!(
            ranges(
                ORIGINAL,
                "first line.\nsecond line.\nfifth line.\n",
                &[LineEdit::new(1, 2, 1, 2)]
            ),
            vec![(12, 19, 12, 25)]
        );
    }

    #[test]
    fn one_line_replaced_by_three() {
        assert_eq!(
            ranges(
                ORIGINAL,
                "first line.\nsecond line.\nthird line.\nforth line.\nfifth line.\n",
                &[LineEdit::new(1, 2, 1, 4)]
            ),
            vec![(12, 19, 12, 49)]
        );
    }

    #[test]
    fn added_line_is_point_on_old() {
        assert_eq!(
            ranges(ORIGINAL, "first line.\nsecne.\n\nfifth line.\n", &[LineEdit::new(2, 2, 2, 3)]),
            vec![(19, 19, 19, 20)]
        );
    }

    #[test]
    fn several_edits_keep_order() {
        assert_eq!(
            ranges(
                ORIGINAL,
                "first line!\nsecne.\nfifth line!",
                &[LineEdit::new(0, 1, 0, 1), LineEdit::new(2, 3, 2, 3)]
            ),
            vec![(0, 12, 0, 12), (19, 30, 19, 30)]
        );
    }

    #[test]
    fn append_behind_unterminated_last_line() {
        // both texts lack a final newline, the added line starts past OLD
        let edits = [LineEdit::new(2, 2, 2, 3)];
        assert_eq!(ranges("a\nb", "a\nb\nc", &edits), vec![(3, 3, 4, 5)]);
    }

    #[test]
    fn empty_texts_do_not_panic() {
        let deltas = DeltaBuilder::new("", "x\n").build(&line_edits("", "x\n"));
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].change_type(), ChangeType::Add);
        assert_eq!(deltas[0].range(ChangeSide::Old), 0..0);
        assert_eq!(deltas[0].range(ChangeSide::New), 0..2);
    }

    #[test]
    fn deltas_start_pending_with_mapped_types() {
        let old = "a\nb\nc\n";
        let new = "a\nX\nc\nd\n";
        let deltas = DeltaBuilder::new(old, new).build(&line_edits(old, new));
        let types: Vec<_> = deltas.iter().map(ChangeDelta::change_type).collect();
        assert_eq!(types, vec![ChangeType::Modify, ChangeType::Add]);
        assert!(deltas.iter().all(|d| d.status() == ChangeStatus::Pending));
        assert_eq!(&new[deltas[0].range(ChangeSide::New)], "X\n");
        assert_eq!(&old[deltas[0].range(ChangeSide::Old)], "b\n");
    }
}
