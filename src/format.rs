use crate::delta::{ChangeDelta, ChangeSide, ChangeStatus, ConflictType};
use crate::file_diff::FileDiff;
use crate::merge::{ConflictSide, MergeData};
use std::fmt::Write;

const UNNAMED: &str = "<unnamed>";

/// Append one `  {sign}{line}:\t{content}` row per line of `text`, numbered
/// from the 0-based `start_line`
fn push_lines(out: &mut String, indent: &str, sign: char, start_line: usize, text: &str) {
    for (offset, line) in text.lines().enumerate() {
        let _ = writeln!(out, "{indent}{sign}{}:\t{line}", start_line + offset + 1);
    }
}

fn push_delta(out: &mut String, indent: &str, diff: &FileDiff, delta: &ChangeDelta) {
    push_lines(
        out,
        indent,
        '-',
        delta.start_line(ChangeSide::Old),
        diff.delta_text(delta, ChangeSide::Old),
    );
    push_lines(
        out,
        indent,
        '+',
        delta.start_line(ChangeSide::New),
        diff.delta_text(delta, ChangeSide::New),
    );
}

/// Render the deltas of `diff` line by line, a blank line between deltas
pub fn format_deltas(diff: &FileDiff) -> String {
    if diff.deltas().is_empty() {
        return String::new();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{}:", diff.header().file_path().unwrap_or(UNNAMED));
    for (index, delta) in diff.deltas().iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        push_delta(&mut out, "  ", diff, delta);
    }
    out
}

/// Render every conflict of `data` that still needs a decision
pub fn format_conflicts(data: &MergeData) -> String {
    let mut out = String::new();

    for pair in data.conflict_pairs() {
        if pair.conflict_type() != ConflictType::Conflicting {
            continue;
        }
        let deltas = [ConflictSide::Yours, ConflictSide::Theirs].map(|side| {
            let diff = data.diff(side);
            (side, diff, diff.deltas().get(pair.index_of_side(side)))
        });
        let pending = deltas
            .iter()
            .all(|(_, _, delta)| delta.is_some_and(|delta| delta.status() == ChangeStatus::Pending));
        if !pending {
            continue;
        }

        if out.is_empty() {
            let _ = writeln!(out, "{}:", data.file_path().unwrap_or(UNNAMED));
        } else {
            out.push('\n');
        }
        for (side, diff, delta) in deltas {
            let Some(delta) = delta else {
                continue;
            };
            let _ = writeln!(out, "  {side}:");
            push_delta(&mut out, "    ", diff, delta);
        }
    }
    out
}
