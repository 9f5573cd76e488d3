//! Where split lists come from.
//!
//! The auto-splitter reloads its list on every reset, so the host hands it a
//! source rather than a list.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::split::SplitList;

pub trait SplitSource {
    fn load(&self) -> Result<SplitList>;

    /// Human-readable origin for log messages.
    fn describe(&self) -> String;
}

/// A JSON split file read from disk on every load.
#[derive(Debug, Clone)]
pub struct FileSplitSource {
    path: PathBuf,
}

impl FileSplitSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SplitSource for FileSplitSource {
    fn load(&self) -> Result<SplitList> {
        debug!("Loading splits from {}", self.path.display());
        SplitList::load(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// A fixed in-memory list.
#[derive(Debug, Clone, Default)]
pub struct StaticSplitSource {
    list: SplitList,
}

impl StaticSplitSource {
    pub fn new(list: SplitList) -> Self {
        Self { list }
    }
}

impl SplitSource for StaticSplitSource {
    fn load(&self) -> Result<SplitList> {
        Ok(self.list.clone())
    }

    fn describe(&self) -> String {
        format!("built-in list ({} splits)", self.list.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::{Split, SplitMode};
    use std::fs;

    #[test]
    fn test_file_source_rereads_on_each_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("splits.json");
        fs::write(&path, r#"{ "splits": [ { "name": "A" } ] }"#).unwrap();
        let source = FileSplitSource::new(&path);

        assert_eq!(source.load().unwrap().len(), 1);

        fs::write(&path, r#"{ "splits": [ { "name": "A" }, { "name": "B" } ] }"#).unwrap();
        assert_eq!(source.load().unwrap().len(), 2);
        assert_eq!(source.describe(), path.display().to_string());
    }

    #[test]
    fn test_file_source_reports_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("splits.json");
        fs::write(&path, "not json").unwrap();

        assert!(FileSplitSource::new(&path).load().is_err());
    }

    #[test]
    fn test_static_source() {
        let list = SplitList::new(SplitMode::All, vec![Split::new("A").room(3)]);
        let source = StaticSplitSource::new(list.clone());
        assert_eq!(source.load().unwrap(), list);
        assert_eq!(source.describe(), "built-in list (1 splits)");
    }
}
