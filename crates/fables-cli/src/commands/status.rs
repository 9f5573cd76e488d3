//! Status command implementation.

use std::path::Path;

use anyhow::{Result, bail};
use fables_core::{AutoSplitter, NullSink, SystemProcessProvider};

use super::split_source;

/// Hook the game once and print the auto-splitter status as JSON.
pub fn run(splits: Option<&Path>) -> Result<()> {
    let mut splitter = AutoSplitter::new(
        SystemProcessProvider,
        split_source(splits),
        Box::new(NullSink),
    );

    if !splitter.hook() {
        bail!("Bug Fables is not running");
    }

    let status = splitter.status();
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
