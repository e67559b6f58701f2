use crate::delta::ChangeType;

/// Git file mode of one side of a diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileMode {
    Regular,
    Executable,
    Symlink,
    Gitlink,
    Tree,
    #[default]
    Missing,
}

impl FileMode {
    /// Parse the octal mode git prints in diff headers (e.g. "100644")
    pub fn from_octal(mode: &str) -> Option<Self> {
        match mode {
            "100644" | "100664" => Some(FileMode::Regular),
            "100755" => Some(FileMode::Executable),
            "120000" => Some(FileMode::Symlink),
            "160000" => Some(FileMode::Gitlink),
            "040000" | "40000" => Some(FileMode::Tree),
            "000000" | "0" => Some(FileMode::Missing),
            _ => None,
        }
    }
}

/// Immutable description of the file a [`FileDiff`](super::FileDiff) belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiffHeader {
    change_type: ChangeType,
    old_path: Option<String>,
    new_path: Option<String>,
    old_id: Option<String>,
    new_id: Option<String>,
    old_mode: FileMode,
    new_mode: FileMode,
}

impl FileDiffHeader {
    pub fn new(change_type: ChangeType, old_path: Option<String>, new_path: Option<String>) -> Self {
        Self {
            change_type,
            old_path,
            new_path,
            old_id: None,
            new_id: None,
            old_mode: FileMode::Missing,
            new_mode: FileMode::Missing,
        }
    }

    /// Header for a file with the same path on both sides
    pub fn for_path(change_type: ChangeType, path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(change_type, Some(path.clone()), Some(path))
    }

    pub fn with_ids(mut self, old_id: Option<String>, new_id: Option<String>) -> Self {
        self.old_id = old_id;
        self.new_id = new_id;
        self
    }

    pub fn with_modes(mut self, old_mode: FileMode, new_mode: FileMode) -> Self {
        self.old_mode = old_mode;
        self.new_mode = new_mode;
        self
    }

    pub fn change_type(&self) -> ChangeType {
        self.change_type
    }

    /// Path of the file: the OLD path for a deletion, the NEW path otherwise
    pub fn file_path(&self) -> Option<&str> {
        match self.change_type {
            ChangeType::Delete => self.old_path(),
            _ => self.new_path(),
        }
    }

    pub fn old_path(&self) -> Option<&str> {
        self.old_path.as_deref()
    }

    pub fn new_path(&self) -> Option<&str> {
        self.new_path.as_deref()
    }

    pub fn old_id(&self) -> Option<&str> {
        self.old_id.as_deref()
    }

    pub fn new_id(&self) -> Option<&str> {
        self.new_id.as_deref()
    }

    pub fn old_mode(&self) -> FileMode {
        self.old_mode
    }

    pub fn new_mode(&self) -> FileMode {
        self.new_mode
    }
}
