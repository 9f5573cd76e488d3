pub mod autosplitter;
pub mod binding;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod game;
pub mod offset;
pub mod process;
pub mod split;

pub use autosplitter::{AutoSplitter, Status};
pub use binding::{BindState, Binder, Binding, HookEvent};
pub use diagnostics::{DiagnosticSink, FileLogSink, MemorySink, NullSink, Query, ReadHealth};
pub use engine::{EndSequenceState, EngineState};
pub use error::{Error, Result};
pub use game::{EncounterTable, FlagSet, GameIds, GameMemory, Snapshot};
pub use offset::{Field, GameVersion, OffsetTable, VersionDetection, detect_version};
pub use process::{ProcessHandle, ProcessProvider, ReadMemory, SystemProcessProvider};
pub use split::{FileSplitSource, Split, SplitList, SplitMode, SplitSource, StaticSplitSource};
