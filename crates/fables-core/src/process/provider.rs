//! Process provider abstraction for testability.
//!
//! This module provides traits that abstract process discovery and access,
//! enabling mock implementations for testing without a running game process.

use crate::error::Result;
use crate::process::ReadMemory;

/// One loaded binary image inside the target process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// File name of the module, e.g. `mono-2.0-bdwgc.dll`
    pub name: String,
    /// Runtime base address of the module
    pub base_address: u64,
    /// Size of the module image in bytes
    pub size: u32,
}

impl ModuleInfo {
    pub fn new(name: impl Into<String>, base_address: u64, size: u32) -> Self {
        Self {
            name: name.into(),
            base_address,
            size,
        }
    }
}

/// Trait for accessing process information.
///
/// This trait abstracts the properties of a process handle, allowing
/// mock implementations for testing.
pub trait ProcessInfo {
    /// Get the process ID.
    fn pid(&self) -> u32;

    /// Enumerate the modules currently loaded in the process.
    fn modules(&self) -> Result<Vec<ModuleInfo>>;

    /// Check if the process is still running.
    fn is_alive(&self) -> bool;

    /// Find a loaded module by file name (case-insensitive).
    fn find_module(&self, name: &str) -> Result<Option<ModuleInfo>> {
        Ok(self
            .modules()?
            .into_iter()
            .find(|m| m.name.eq_ignore_ascii_case(name)))
    }
}

/// Trait for finding and opening processes.
///
/// This trait abstracts process discovery, allowing mock implementations
/// that don't require actual system processes.
pub trait ProcessProvider {
    /// The type of process returned by this provider.
    type Process: ProcessInfo + ReadMemory;

    /// Find and open a running process by executable name.
    fn find_process(&self, name: &str) -> Result<Self::Process>;
}
