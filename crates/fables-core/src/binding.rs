//! Process binding lifecycle.
//!
//! ## State Transition Rules
//!
//! - Unbound -> Binding -> Bound: the target process appears; its runtime is
//!   detected, the offset table chosen and every field path built. Binding
//!   lasts only for one [`Binder::hook`] call, so [`BindState`] never reports it.
//! - Bound (assumed layout) -> Bound (detected layout): the runtime module
//!   shows up after the process was found; table and paths are rebuilt.
//! - Bound -> Unbound: the process exits; paths and table are dropped with the
//!   binding, so nothing carries over to the next process.
//! - Bound + alive, Unbound + absent: no-op.

use std::collections::HashMap;

use serde::Serialize;
use strum::Display;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::game::GameMemory;
use crate::offset::{
    Field, GameVersion, OffsetTable, VersionDetection, detect_version, match_version,
};
use crate::process::{OffsetPath, ProcessInfo, ProcessProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum BindState {
    Unbound,
    Bound,
}

/// What a single [`Binder::hook`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    /// A new process was found and bound
    Bound(VersionDetection),
    /// Bound on an assumed layout and the real runtime has now been detected
    Redetected(VersionDetection),
    /// Already bound and the process is still alive
    StillBound,
    /// The bound process went away and the binding was discarded
    Lost,
    /// Not bound and no process found
    StillUnbound,
}

impl HookEvent {
    pub fn is_bound(self) -> bool {
        matches!(
            self,
            HookEvent::Bound(_) | HookEvent::Redetected(_) | HookEvent::StillBound
        )
    }
}

/// A live process paired with the offset table chosen for it.
pub struct Binding<Proc> {
    process: Proc,
    detection: VersionDetection,
    table: &'static OffsetTable,
    paths: HashMap<Field, OffsetPath>,
    module_base: Option<u64>,
}

impl<Proc: ProcessInfo> Binding<Proc> {
    fn new(process: Proc, detection: VersionDetection) -> Self {
        let table = detection.version.table();
        let mut binding = Self {
            process,
            detection,
            table,
            paths: HashMap::new(),
            module_base: None,
        };
        binding.apply(detection);
        binding
    }

    /// Switch to the table for `detection`, rebuilding paths and module base.
    fn apply(&mut self, detection: VersionDetection) {
        self.detection = detection;
        self.table = detection.version.table();
        self.paths = self.table.all_paths().into_iter().collect();
        self.module_base = None;
        self.refresh_module_base();
    }

    /// Retry detection while running on an assumed layout.
    fn redetect(&mut self) -> Option<VersionDetection> {
        if !self.detection.fallback {
            return None;
        }
        let modules = self.process.modules().ok()?;
        let version = match_version(&modules)?;
        let detection = VersionDetection {
            version,
            fallback: false,
        };
        info!("Runtime loaded, switching to game version {}", version);
        self.apply(detection);
        Some(detection)
    }

    /// Look up the runtime module again if it was not loaded at bind time.
    fn refresh_module_base(&mut self) {
        if self.module_base.is_some() {
            return;
        }
        match self.process.find_module(self.table.module_name) {
            Ok(Some(module)) => {
                debug!(
                    "{} loaded at {:#x}",
                    self.table.module_name, module.base_address
                );
                self.module_base = Some(module.base_address);
            }
            Ok(None) => debug!("{} not loaded yet", self.table.module_name),
            Err(e) => debug!("Module enumeration failed: {}", e),
        }
    }

    pub fn process(&self) -> &Proc {
        &self.process
    }

    pub fn version(&self) -> GameVersion {
        self.detection.version
    }

    pub fn detection(&self) -> VersionDetection {
        self.detection
    }

    pub fn table(&self) -> &'static OffsetTable {
        self.table
    }

    pub fn module_base(&self) -> Option<u64> {
        self.module_base
    }

    pub fn path(&self, field: Field) -> Option<&OffsetPath> {
        self.paths.get(&field)
    }

    /// Typed accessors over this binding.
    pub fn memory(&self) -> GameMemory<'_, Proc>
    where
        Proc: crate::process::ReadMemory,
    {
        GameMemory::new(&self.process, self.table, &self.paths, self.module_base)
    }
}

/// Owns the (at most one) binding to the target process.
pub struct Binder<P: ProcessProvider> {
    provider: P,
    process_name: String,
    binding: Option<Binding<P::Process>>,
}

impl<P: ProcessProvider> Binder<P> {
    pub fn new(provider: P, process_name: impl Into<String>) -> Self {
        Self {
            provider,
            process_name: process_name.into(),
            binding: None,
        }
    }

    /// Establish, keep or drop the binding. Safe to call on every poll.
    pub fn hook(&mut self) -> HookEvent {
        if let Some(binding) = self.binding.as_mut() {
            if binding.process.is_alive() {
                if let Some(detection) = binding.redetect() {
                    return HookEvent::Redetected(detection);
                }
                binding.refresh_module_base();
                return HookEvent::StillBound;
            }
            info!(
                "Process {} exited, unbinding",
                binding.process.pid()
            );
            self.binding = None;
            return HookEvent::Lost;
        }

        let process = match self.provider.find_process(&self.process_name) {
            Ok(process) => process,
            Err(_) => return HookEvent::StillUnbound,
        };

        debug!("Binding to {} (PID {})", self.process_name, process.pid());
        let modules = match process.modules() {
            Ok(modules) => modules,
            Err(e) => {
                warn!("Failed to enumerate modules: {}", e);
                Vec::new()
            }
        };
        let detection = detect_version(&modules);
        let binding = Binding::new(process, detection);
        info!(
            "Bound to {} (PID {}), game version {}",
            self.process_name,
            binding.process.pid(),
            detection.version
        );
        self.binding = Some(binding);
        HookEvent::Bound(detection)
    }

    pub fn state(&self) -> BindState {
        if self.binding.is_some() {
            BindState::Bound
        } else {
            BindState::Unbound
        }
    }

    pub fn binding(&self) -> Option<&Binding<P::Process>> {
        self.binding.as_ref()
    }

    /// The current binding, or [`Error::NotBound`].
    pub fn require(&self) -> Result<&Binding<P::Process>> {
        self.binding.as_ref().ok_or(Error::NotBound)
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }
}
