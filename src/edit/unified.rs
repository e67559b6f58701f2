//! Reading line edits from `git diff -U0` output.
//!
//! A patch of a single file is turned into its [`FileDiffHeader`] and the
//! list of [`LineEdit`]s described by its hunk headers. Hunk bodies are not
//! needed: with zero context lines the header ranges alone define each edit.

use super::LineEdit;
use crate::delta::ChangeType;
use crate::file_diff::header::{FileDiffHeader, FileMode};
use error_set::error_set;
use nom::{
    IResult, Parser,
    bytes::complete::tag,
    character::complete::{char, hex_digit1, u32 as parse_u32},
    combinator::opt,
    sequence::{preceded, separated_pair},
};

error_set! {
    /// Errors from reading a unified diff
    ParseError := {
        /// The patch has no `diff --git` line
        #[display("Missing 'diff --git' header")]
        MissingHeader,
        /// A line starting with `@@` is not a valid hunk header
        #[display("Invalid hunk header '{line}'")]
        InvalidHunkHeader { line: String },
    }
}

/// Line range of one side of a hunk header (1-based start, line count)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HunkRange {
    start: u32,
    count: u32,
}

impl HunkRange {
    /// 0-based line range covered by this side.
    ///
    /// An empty range (`count == 0`) refers to the position after line
    /// `start`, so its 0-based index is `start` itself.
    fn to_lines(self) -> (usize, usize) {
        let start = self.start as usize;
        if self.count == 0 {
            (start, start)
        } else {
            let begin = start.saturating_sub(1);
            (begin, begin + self.count as usize)
        }
    }
}

/// Parse "N" or "N,M"
fn hunk_range(input: &str) -> IResult<&str, HunkRange> {
    let (rest, (start, count)) = (parse_u32, opt(preceded(char(','), parse_u32))).parse(input)?;
    Ok((
        rest,
        HunkRange {
            start,
            count: count.unwrap_or(1),
        },
    ))
}

/// Parse "@@ -a,b +c,d @@" (trailing section heading ignored)
fn hunk_header(input: &str) -> IResult<&str, (HunkRange, HunkRange)> {
    let (rest, ranges) = separated_pair(
        preceded(tag("@@ -"), hunk_range),
        char(' '),
        preceded(char('+'), hunk_range),
    )
    .parse(input)?;
    let (rest, _) = tag(" @@").parse(rest)?;
    Ok((rest, ranges))
}

/// Parse "index abc123..def456[ 100644]"
fn index_line(input: &str) -> IResult<&str, (&str, &str, Option<&str>)> {
    let (rest, (old_id, new_id)) = preceded(
        tag("index "),
        separated_pair(hex_digit1, tag(".."), hex_digit1),
    )
    .parse(input)?;
    let (rest, mode) = opt(preceded(char(' '), nom::character::complete::digit1)).parse(rest)?;
    Ok((rest, (old_id, new_id, mode)))
}

/// Convert one hunk header line into a [`LineEdit`]
pub fn parse_hunk_header(line: &str) -> Result<LineEdit, ParseError> {
    let (_, (old, new)) = hunk_header(line).map_err(|_| ParseError::InvalidHunkHeader {
        line: line.to_string(),
    })?;
    let (begin_old, end_old) = old.to_lines();
    let (begin_new, end_new) = new.to_lines();
    Ok(LineEdit::new(begin_old, end_old, begin_new, end_new))
}

/// Strip the `a/` or `b/` prefix git puts in front of paths
fn strip_side_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if path == "/dev/null" {
        return None;
    }
    Some(path.strip_prefix(prefix).unwrap_or(path))
}

/// Parse the patch of one file into its header and edits
pub fn parse_file_patch(text: &str) -> Result<(FileDiffHeader, Vec<LineEdit>), ParseError> {
    let mut lines = text.lines().skip_while(|line| !line.starts_with("diff --git "));

    let first = lines.next().ok_or(ParseError::MissingHeader)?;
    let mut old_path = None;
    let mut new_path = None;
    if let Some(paths) = first.strip_prefix("diff --git ")
        && let Some((a, b)) = paths.split_once(" b/")
    {
        old_path = strip_side_prefix(a, "a/").map(str::to_string);
        new_path = Some(b.to_string());
    }

    let mut change_type = ChangeType::Modify;
    let mut old_id = None;
    let mut new_id = None;
    let mut old_mode = FileMode::Missing;
    let mut new_mode = FileMode::Missing;
    let mut edits = Vec::new();

    for line in lines {
        if line.starts_with("@@") {
            edits.push(parse_hunk_header(line)?);
        } else if !edits.is_empty() {
            // hunk body
            continue;
        } else if let Some(mode) = line.strip_prefix("new file mode ") {
            change_type = ChangeType::Add;
            new_mode = FileMode::from_octal(mode).unwrap_or(FileMode::Regular);
        } else if let Some(mode) = line.strip_prefix("deleted file mode ") {
            change_type = ChangeType::Delete;
            old_mode = FileMode::from_octal(mode).unwrap_or(FileMode::Regular);
        } else if let Some(mode) = line.strip_prefix("old mode ") {
            old_mode = FileMode::from_octal(mode).unwrap_or(FileMode::Regular);
        } else if let Some(mode) = line.strip_prefix("new mode ") {
            new_mode = FileMode::from_octal(mode).unwrap_or(FileMode::Regular);
        } else if let Some(path) = line.strip_prefix("rename from ") {
            change_type = ChangeType::Rename;
            old_path = Some(path.to_string());
        } else if let Some(path) = line.strip_prefix("rename to ") {
            new_path = Some(path.to_string());
        } else if let Some(path) = line.strip_prefix("copy from ") {
            change_type = ChangeType::Copy;
            old_path = Some(path.to_string());
        } else if let Some(path) = line.strip_prefix("copy to ") {
            new_path = Some(path.to_string());
        } else if let Some(path) = line.strip_prefix("--- ") {
            if change_type != ChangeType::Rename && change_type != ChangeType::Copy {
                old_path = strip_side_prefix(path, "a/").map(str::to_string);
            }
        } else if let Some(path) = line.strip_prefix("+++ ") {
            if change_type != ChangeType::Rename && change_type != ChangeType::Copy {
                new_path = strip_side_prefix(path, "b/").map(str::to_string);
            }
        } else if let Ok((_, (old, new, mode))) = index_line(line) {
            old_id = Some(old.to_string());
            new_id = Some(new.to_string());
            if let Some(mode) = mode.and_then(FileMode::from_octal) {
                old_mode = mode;
                new_mode = mode;
            }
        }
    }

    match change_type {
        ChangeType::Add => old_path = None,
        ChangeType::Delete => new_path = None,
        _ => {}
    }

    let header = FileDiffHeader::new(change_type, old_path, new_path)
        .with_ids(old_id, new_id)
        .with_modes(old_mode, new_mode);

    Ok((header, edits))
}
