//! Subcommand implementations.

use std::path::Path;

use fables_core::{FileSplitSource, SplitList, SplitMode, SplitSource, StaticSplitSource};

pub mod run;
pub mod splits;
pub mod status;

/// Split source for `path`, or a start/end-only list when none is given.
pub fn split_source(path: Option<&Path>) -> Box<dyn SplitSource> {
    match path {
        Some(path) => Box::new(FileSplitSource::new(path)),
        None => Box::new(StaticSplitSource::new(SplitList::new(
            SplitMode::StartEndOnly,
            Vec::new(),
        ))),
    }
}
