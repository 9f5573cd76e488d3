//! Split configuration

mod model;
mod source;

pub use model::{Split, SplitList, SplitMode};
pub use source::{FileSplitSource, SplitSource, StaticSplitSource};
