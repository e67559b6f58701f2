use error_set::error_set;
use std::str::FromStr;
use tracing::{info, warn};

pub mod delta;
pub mod edit;
pub mod file_diff;
pub mod format;
pub mod line_index;
pub mod merge;
pub mod resolve;

pub use delta::{ChangeDelta, ChangeSide, ChangeStatus, ChangeType, ConflictType, DeltaTextChangeEvent};
pub use edit::unified::ParseError;
pub use file_diff::header::FileDiffHeader;
pub use file_diff::{FileDiff, FileDiffError};
pub use merge::{ConflictSide, MergeData, MergeError};
pub use resolve::{ResolveOption, ResolveOptions};

error_set! {
    /// Top-level error for delta-merge operations
    DeltaMergeError := {
        #[display("Failed to read or write {path}: {message}")]
        Io { path: String, message: String },
        #[display("{count} unresolved conflicts in {path}")]
        UnresolvedConflicts { path: String, count: usize },
        ParseError(ParseError),
        FileDiffError(FileDiffError),
        MergeError(MergeError),
    }
}

/// Whether conflicts that a strategy can settle are resolved without asking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AutoResolveMode {
    #[default]
    Always,
    Never,
    Ask,
}

impl FromStr for AutoResolveMode {
    type Err = std::convert::Infallible;

    /// Case-insensitive; anything unknown turns auto-resolving off
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value.trim().to_ascii_lowercase().as_str() {
            "always" => AutoResolveMode::Always,
            "ask" => AutoResolveMode::Ask,
            _ => AutoResolveMode::Never,
        })
    }
}

/// Settings of a merge run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConfig {
    pub auto_resolve: AutoResolveMode,
    /// A huge file is only auto-resolved with at most this many changed lines
    pub max_changed_lines: usize,
    /// Character count above which a text counts as huge
    pub huge_file_chars: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            auto_resolve: AutoResolveMode::Always,
            max_changed_lines: 50,
            huge_file_chars: 80_000,
        }
    }
}

/// Result of merging one file
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The merged text; unresolved conflicts keep the fork point's lines
    pub text: String,
    /// Whether every delta of both sides made it in
    pub resolved: bool,
    /// Rendering of the conflicts left, empty when resolved
    pub conflicts: String,
    pub data: MergeData,
}

/// Main interface for diffing and merging texts
#[derive(Debug, Clone, Default)]
pub struct Merger {
    config: MergeConfig,
    options: ResolveOptions,
}

impl Merger {
    pub fn new(config: MergeConfig) -> Self {
        Self {
            config,
            options: ResolveOptions::default(),
        }
    }

    /// Use a custom set of resolve strategies
    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Deltas between two versions of `path`
    ///
    /// # Examples
    /// ```
    /// # use delta_merge::Merger;
    /// let diff = Merger::default().diff("notes.txt", "a\nb\n", "a\nB\n");
    /// assert_eq!(diff.deltas().len(), 1);
    /// ```
    pub fn diff(&self, path: &str, old: &str, new: &str) -> FileDiff {
        FileDiff::from_texts(FileDiffHeader::for_path(ChangeType::Modify, path), old, new)
    }

    /// Deltas between two versions, with the line edits taken from a
    /// `git diff -U0` patch of one file
    pub fn diff_with_patch(&self, old: &str, new: &str, patch: &str) -> Result<FileDiff, DeltaMergeError> {
        let (header, edits) = edit::unified::parse_file_patch(patch)?;
        Ok(FileDiff::new(header, old, new, edits))
    }

    /// Diff both versions against `base` and classify their conflicts
    pub fn prepare(&self, path: &str, base: &str, yours: &str, theirs: &str) -> MergeData {
        let header = FileDiffHeader::for_path(ChangeType::Modify, path);
        let mut data = MergeData::from_texts(header.clone(), header, base, yours, theirs);
        data.mark_conflicting(&self.options);
        data
    }

    /// Merge `yours` and `theirs`, both derived from `base`.
    ///
    /// With [`AutoResolveMode::Ask`], `confirm` decides whether to go ahead.
    /// When conflicts remain, every delta outside of them is still taken.
    ///
    /// # Examples
    /// ```
    /// # use delta_merge::Merger;
    /// let outcome = Merger::default()
    ///     .merge("notes.txt", "a\nb\nc\n", "A\nb\nc\n", "a\nb\nC\n", |_| true)
    ///     .unwrap();
    /// assert!(outcome.resolved);
    /// assert_eq!(outcome.text, "A\nb\nC\n");
    /// ```
    pub fn merge(
        &self,
        path: &str,
        base: &str,
        yours: &str,
        theirs: &str,
        confirm: impl FnOnce(&MergeData) -> bool,
    ) -> Result<MergeOutcome, DeltaMergeError> {
        let mut data = self.prepare(path, base, yours, theirs);

        let wanted = match self.config.auto_resolve {
            AutoResolveMode::Always => true,
            AutoResolveMode::Never => false,
            AutoResolveMode::Ask => confirm(&data),
        };
        let skipped = wanted && data.should_skip_auto_resolve(&self.config);
        if skipped {
            warn!(path, changed = data.changed_lines(), "huge file, not auto-resolving");
        }

        let resolved = if wanted && !skipped {
            let resolved = data.auto_resolve()?;
            if !resolved {
                data.accept_side(ConflictSide::Yours)?;
                data.accept_side(ConflictSide::Theirs)?;
            }
            resolved
        } else {
            [ConflictSide::Yours, ConflictSide::Theirs]
                .iter()
                .all(|&side| data.diff(side).deltas().is_empty())
        };

        let conflicts = if resolved {
            String::new()
        } else {
            format::format_conflicts(&data)
        };
        info!(path, resolved, "merged");
        Ok(MergeOutcome {
            text: data.merged_text().to_string(),
            resolved,
            conflicts,
            data,
        })
    }
}
