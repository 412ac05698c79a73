use std::path::{Path, PathBuf};

/// Maps content paths reported by the torrent client onto the local filesystem.
///
/// The client may run in a container that sees its downloads under a different
/// root than this process does.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathMapper {
    root_dir: String,
    remote_dir: String,
}

impl PathMapper {
    pub fn new(root_dir: impl Into<String>, remote_dir: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            remote_dir: remote_dir.into(),
        }
    }

    /// Swap a leading `root_dir` for `remote_dir`; other paths pass through unchanged
    pub fn remap(&self, content_path: &str) -> PathBuf {
        if self.root_dir.is_empty() {
            return PathBuf::from(content_path);
        }
        match content_path.strip_prefix(self.root_dir.as_str()) {
            Some(rest) => PathBuf::from(format!("{}{}", self.remote_dir, rest)),
            None => PathBuf::from(content_path),
        }
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }
}
