use crate::edit::LineEdit;

/// Widen the edits of two sides of a merge so that overlapping edits cover
/// the same OLD lines, then fold edits of each list that now touch.
///
/// The NEW ranges grow by the lines taken in on the OLD side.
pub fn adjust_edits_for_merge(edits: &mut Vec<LineEdit>, other: &mut Vec<LineEdit>) {
    for main in 0..edits.len() {
        for index in 0..other.len() {
            if overlaps(&edits[main], &other[index]) {
                edits[main] = merge_edit(&edits[main], &other[index]);
                other[index] = merge_edit(&other[index], &edits[main]);
            }
        }
    }
    compress(edits);
    compress(other);
}

/// Whether `other` overlaps `edit` on the OLD side; identical ranges do not count
fn overlaps(edit: &LineEdit, other: &LineEdit) -> bool {
    if other.begin_old == edit.begin_old && other.end_old == edit.end_old {
        return false;
    }
    if other.end_old < edit.begin_old {
        return false;
    }
    if other.end_old <= edit.end_old {
        return true;
    }
    other.begin_old <= edit.end_old
}

/// `edit` stretched over the OLD range of both edits
fn merge_edit(edit: &LineEdit, other: &LineEdit) -> LineEdit {
    let begin_old = edit.begin_old.min(other.begin_old);
    let end_old = edit.end_old.max(other.end_old);
    LineEdit::new(
        begin_old,
        end_old,
        edit.begin_new.saturating_sub(edit.begin_old - begin_old),
        edit.end_new + (end_old - edit.end_old),
    )
}

/// Fold adjacent or overlapping edits into one
fn compress(edits: &mut Vec<LineEdit>) {
    let mut index = 0;
    while index + 1 < edits.len() {
        let (current, next) = (edits[index], edits[index + 1]);
        if current.end_old >= next.begin_old || current.end_new >= next.begin_new {
            edits[index] = LineEdit::new(current.begin_old, next.end_old, current.begin_new, next.end_new);
            edits.remove(index + 1);
        } else {
            index += 1;
        }
    }
}
