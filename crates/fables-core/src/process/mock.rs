//! Mock address space and process for testing
//!
//! Provides a sparse, page-like memory map implementing `ReadMemory`, plus a
//! mock process and provider that tests can launch, mutate and kill while an
//! auto-splitter holds a binding to them.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::process::handle::process_name_matches;
use crate::process::provider::{ModuleInfo, ProcessInfo, ProcessProvider};
use crate::process::reader::ReadMemory;

/// Sparse byte-addressable memory made of disjoint mapped regions
///
/// A read succeeds only when it falls entirely inside one region, so an
/// unmapped gap behaves like a missing page in a real process.
#[derive(Debug, Clone, Default)]
pub struct MockMemory {
    regions: BTreeMap<u64, Vec<u8>>,
}

impl MockMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a zero-filled region of `size` bytes at `base`
    pub fn with_region(mut self, base: u64, size: usize) -> Self {
        self.map(base, size);
        self
    }

    /// Write raw bytes at an absolute address, mapping memory as needed
    pub fn with_bytes(mut self, address: u64, bytes: &[u8]) -> Self {
        self.write_bytes(address, bytes);
        self
    }

    pub fn with_bool(mut self, address: u64, value: bool) -> Self {
        self.write_bool(address, value);
        self
    }

    pub fn with_i32(mut self, address: u64, value: i32) -> Self {
        self.write_i32(address, value);
        self
    }

    pub fn with_u64(mut self, address: u64, value: u64) -> Self {
        self.write_u64(address, value);
        self
    }

    pub fn map(&mut self, base: u64, size: usize) {
        self.regions.insert(base, vec![0u8; size]);
    }

    /// Remove the region containing `address`, simulating a page going away
    pub fn unmap(&mut self, address: u64) -> bool {
        match self.region_base(address, 0) {
            Some(base) => self.regions.remove(&base).is_some(),
            None => false,
        }
    }

    /// Write raw bytes at an absolute address
    ///
    /// Extends the region the address falls into (or directly follows);
    /// otherwise maps a new region.
    pub fn write_bytes(&mut self, address: u64, bytes: &[u8]) {
        let containing = self
            .regions
            .range(..=address)
            .next_back()
            .filter(|(base, data)| address <= **base + data.len() as u64)
            .map(|(base, _)| *base);

        match containing {
            Some(base) => {
                let data = self.regions.entry(base).or_default();
                let start = (address - base) as usize;
                let end = start + bytes.len();
                if data.len() < end {
                    data.resize(end, 0);
                }
                data[start..end].copy_from_slice(bytes);
            }
            None => {
                self.regions.insert(address, bytes.to_vec());
            }
        }
    }

    pub fn write_bool(&mut self, address: u64, value: bool) {
        self.write_bytes(address, &[value as u8]);
    }

    pub fn write_i32(&mut self, address: u64, value: i32) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    pub fn write_u64(&mut self, address: u64, value: u64) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    fn region_base(&self, address: u64, size: usize) -> Option<u64> {
        self.regions
            .range(..=address)
            .next_back()
            .filter(|(base, data)| address + size as u64 <= **base + data.len() as u64)
            .filter(|(base, data)| size > 0 || address < **base + data.len() as u64)
            .map(|(base, _)| *base)
    }
}

impl ReadMemory for MockMemory {
    fn read_into(&self, address: u64, buffer: &mut [u8]) -> Result<()> {
        let base = self
            .region_base(address, buffer.len())
            .ok_or_else(|| Error::MemoryReadFailed {
                address,
                message: format!("Unmapped range of {} bytes", buffer.len()),
            })?;
        let data = &self.regions[&base];
        let start = (address - base) as usize;
        buffer.copy_from_slice(&data[start..start + buffer.len()]);
        Ok(())
    }
}

/// A fake game process sharing its memory with the test that created it
///
/// Clones share memory and liveness, so a test can keep one clone and mutate
/// or kill the process while another clone is bound elsewhere.
#[derive(Debug, Clone)]
pub struct MockProcess {
    pid: u32,
    modules: Arc<Mutex<Vec<ModuleInfo>>>,
    memory: Arc<Mutex<MockMemory>>,
    alive: Arc<AtomicBool>,
}

impl MockProcess {
    pub fn new(pid: u32, modules: Vec<ModuleInfo>, memory: MockMemory) -> Self {
        Self {
            pid,
            modules: Arc::new(Mutex::new(modules)),
            memory: Arc::new(Mutex::new(memory)),
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Mutate the process memory in place
    pub fn update<F: FnOnce(&mut MockMemory)>(&self, f: F) {
        let mut memory = self
            .memory
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut memory);
    }

    /// Load another module, as the runtime DLL does shortly after launch
    pub fn load_module(&self, module: ModuleInfo) {
        self.modules
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(module);
    }

    /// Mark the process as exited; every later read fails
    pub fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}

impl ProcessInfo for MockProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn modules(&self) -> Result<Vec<ModuleInfo>> {
        let modules = self
            .modules
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(modules.clone())
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }
}

impl ReadMemory for MockProcess {
    fn read_into(&self, address: u64, buffer: &mut [u8]) -> Result<()> {
        if !self.is_alive() {
            return Err(Error::MemoryReadFailed {
                address,
                message: format!("Process {} has exited", self.pid),
            });
        }
        let memory = self
            .memory
            .lock()
            .map_err(|_| Error::MemoryReadFailed {
                address,
                message: "Mock memory lock poisoned".to_string(),
            })?;
        memory.read_into(address, buffer)
    }
}

/// Provider whose process list is controlled by the test
#[derive(Debug, Clone)]
pub struct MockProcessProvider {
    exe_name: String,
    running: Arc<Mutex<Option<MockProcess>>>,
}

impl MockProcessProvider {
    pub fn new(exe_name: impl Into<String>) -> Self {
        Self {
            exe_name: exe_name.into(),
            running: Arc::new(Mutex::new(None)),
        }
    }

    /// Start `process`, replacing any currently running one
    pub fn launch(&self, process: MockProcess) {
        *self.slot() = Some(process);
    }

    /// Kill and remove the running process, if any
    pub fn exit(&self) {
        if let Some(process) = self.slot().take() {
            process.kill();
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<MockProcess>> {
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ProcessProvider for MockProcessProvider {
    type Process = MockProcess;

    fn find_process(&self, name: &str) -> Result<Self::Process> {
        if !process_name_matches(&self.exe_name, name) {
            return Err(Error::ProcessNotFound(format!("Process '{}' not found", name)));
        }
        self.slot()
            .as_ref()
            .filter(|p| p.is_alive())
            .cloned()
            .ok_or_else(|| Error::ProcessNotFound(format!("Process '{}' not found", name)))
    }
}
