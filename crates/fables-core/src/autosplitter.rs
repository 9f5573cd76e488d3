//! Host-facing auto-splitter.
//!
//! Owns the process binding, the remembered engine state, the active split
//! list and the diagnostic sink. Every query takes `&mut self` and returns a
//! plain `bool`; memory failures are logged and read as "no".

use serde::Serialize;
use tracing::{debug, warn};

use crate::binding::{BindState, Binder, Binding, HookEvent};
use crate::config;
use crate::diagnostics::{DiagnosticSink, Query, ReadHealth};
use crate::engine::{self, EndSequenceState, EngineState};
use crate::error::Result;
use crate::game::{GameMemory, Snapshot};
use crate::offset::GameVersion;
use crate::process::{ProcessInfo, ProcessProvider};
use crate::split::{SplitList, SplitMode, SplitSource};

/// Point-in-time view for status output.
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub bind_state: BindState,
    pub process_id: Option<u32>,
    pub version: Option<GameVersion>,
    /// True when the version was assumed rather than detected
    pub fallback_layout: bool,
    pub module_base: Option<u64>,
    pub new_game_started: bool,
    pub end_sequence: EndSequenceState,
    pub snapshot: Option<Snapshot>,
}

pub struct AutoSplitter<P: ProcessProvider> {
    binder: Binder<P>,
    state: EngineState,
    splits: SplitList,
    source: Box<dyn SplitSource>,
    sink: Box<dyn DiagnosticSink>,
    health: ReadHealth,
}

impl<P: ProcessProvider> AutoSplitter<P> {
    /// Create an auto-splitter looking for the game under its default name.
    pub fn new(provider: P, source: Box<dyn SplitSource>, sink: Box<dyn DiagnosticSink>) -> Self {
        Self::with_process_name(provider, config::process::PROCESS_NAME, source, sink)
    }

    pub fn with_process_name(
        provider: P,
        process_name: &str,
        source: Box<dyn SplitSource>,
        mut sink: Box<dyn DiagnosticSink>,
    ) -> Self {
        let splits = match load_splits(source.as_ref()) {
            Ok(list) => list,
            Err(e) => {
                sink.record(&format!(
                    "Couldn't load splits from {}: {}",
                    source.describe(),
                    e
                ));
                SplitList::default()
            }
        };
        sink.record("STARTED");

        Self {
            binder: Binder::new(provider, process_name),
            state: EngineState::new(),
            splits,
            source,
            sink,
            health: ReadHealth::new(),
        }
    }

    /// Establish or drop the process binding. Returns whether a process is bound.
    pub fn hook(&mut self) -> bool {
        match self.binder.hook() {
            HookEvent::Bound(detection) => {
                let pid = self.binder.binding().map(|b| b.process().pid());
                self.sink.record(&format!(
                    "Bound to {} (PID {}), game version {}",
                    self.binder.process_name(),
                    pid.unwrap_or_default(),
                    detection.version
                ));
                if detection.fallback {
                    self.sink.record(&format!(
                        "Unrecognized game layout, assuming {}; reads may fail",
                        detection.version
                    ));
                }
                true
            }
            HookEvent::Redetected(detection) => {
                self.sink.record(&format!(
                    "Game runtime loaded, switched to game version {}",
                    detection.version
                ));
                true
            }
            HookEvent::StillBound => true,
            HookEvent::Lost => {
                self.sink.record("Game process exited, unbound");
                self.health.clear();
                false
            }
            HookEvent::StillUnbound => false,
        }
    }

    /// Whether a new run just started.
    pub fn should_start(&mut self) -> bool {
        let Some(reading) = self.read(Query::ShouldStart, |m| m.read_start()) else {
            return false;
        };

        let (next, fire) = engine::should_start(&self.state, &reading, &self.splits.ids);
        self.state = next;
        if fire {
            self.sink.record("ShouldStart: new game started");
        }
        fire
    }

    /// Whether the timer should advance past split `current_index`.
    ///
    /// The final split (or every split in start/end-only mode) is decided by
    /// the end sequence; the others by their own conditions.
    pub fn should_split(&mut self, current_index: usize, total_splits: usize) -> bool {
        let is_last = current_index.checked_add(1) == Some(total_splits);
        if self.splits.mode == SplitMode::StartEndOnly || is_last {
            self.should_end()
        } else {
            self.should_mid_split(current_index)
        }
    }

    fn should_mid_split(&mut self, index: usize) -> bool {
        if index >= self.splits.len() {
            debug!("No split configured at index {}", index);
            return false;
        }
        let Some(reading) = self.read(Query::ShouldSplit, |m| m.read_mid_split()) else {
            return false;
        };
        let Some(split) = self.splits.get(index) else {
            return false;
        };

        let (next, fire) = engine::mid_split(&self.state, split, &reading);
        self.state = next;
        if fire {
            self.sink.record(&format!(
                "ShouldSplit: reached '{}' (split {})",
                split.name, index
            ));
        }
        fire
    }

    fn should_end(&mut self) -> bool {
        let Some(reading) = self.read(Query::ShouldEnd, |m| m.read_end()) else {
            return false;
        };

        let before = self.state.end_sequence;
        let (next, fire) = engine::should_end(&self.state, &reading, &self.splits.ids);
        self.state = next;
        if self.state.end_sequence != before {
            self.sink.record(&format!(
                "ShouldEnd: {} -> {}",
                before, self.state.end_sequence
            ));
        }
        if fire {
            self.sink.record("ShouldEnd: run finished");
        }
        fire
    }

    /// Forget all run progress and reload the split list.
    pub fn reset(&mut self) {
        self.state = engine::reset();
        match load_splits(self.source.as_ref()) {
            Ok(list) => self.splits = list,
            Err(e) => {
                warn!("Keeping previous split list: {}", e);
                self.sink.record(&format!(
                    "Couldn't reload splits from {}: {}",
                    self.source.describe(),
                    e
                ));
            }
        }
        self.sink.record("LOGIC RESET");
    }

    /// Run one read against the bound process, logging failure edges.
    fn read<T>(
        &mut self,
        query: Query,
        read: impl FnOnce(&GameMemory<'_, P::Process>) -> Result<T>,
    ) -> Option<T> {
        let binding = self.binder.binding()?;
        match read(&binding.memory()) {
            Ok(value) => {
                if let Some(message) = self.health.succeeded(query) {
                    self.sink.record(&message);
                }
                Some(value)
            }
            Err(e) => {
                if let Some(message) = self.health.failed(query, &e) {
                    self.sink.record(&message);
                }
                None
            }
        }
    }

    /// Every accessor's current value; fails when nothing is bound.
    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(self.binder.require()?.memory().snapshot())
    }

    pub fn status(&self) -> Status {
        let binding = self.binder.binding();
        Status {
            bind_state: self.binder.state(),
            process_id: binding.map(|b| b.process().pid()),
            version: binding.map(Binding::version),
            fallback_layout: binding.is_some_and(|b| b.detection().fallback),
            module_base: binding.and_then(Binding::module_base),
            new_game_started: self.state.new_game_started,
            end_sequence: self.state.end_sequence,
            snapshot: binding.map(|b| b.memory().snapshot()),
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn splits(&self) -> &SplitList {
        &self.splits
    }

    pub fn bind_state(&self) -> BindState {
        self.binder.state()
    }

    pub fn binding(&self) -> Option<&Binding<P::Process>> {
        self.binder.binding()
    }

    /// Whether the last read for `query` failed.
    pub fn is_failing(&self, query: Query) -> bool {
        self.health.is_failing(query)
    }
}

/// Load a list and reject ids the game tables cannot hold.
fn load_splits(source: &dyn SplitSource) -> Result<SplitList> {
    let list = source.load()?;
    list.validate()?;
    Ok(list)
}
