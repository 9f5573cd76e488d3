#![cfg_attr(not(target_os = "windows"), allow(dead_code))]

use crate::error::{Error, Result};
use crate::process::provider::{ModuleInfo, ProcessInfo, ProcessProvider};
use crate::process::reader::{MemoryReader, ReadMemory};

#[cfg(target_os = "windows")]
use tracing::warn;

#[cfg(target_os = "windows")]
use std::ffi::OsString;
#[cfg(target_os = "windows")]
use std::os::windows::ffi::OsStringExt;
#[cfg(target_os = "windows")]
use windows::Win32::Foundation::{CloseHandle, HANDLE, HMODULE};
#[cfg(target_os = "windows")]
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW, TH32CS_SNAPPROCESS,
};
#[cfg(target_os = "windows")]
use windows::Win32::System::ProcessStatus::{
    EnumProcessModulesEx, GetModuleBaseNameW, GetModuleInformation, LIST_MODULES_ALL, MODULEINFO,
};
#[cfg(target_os = "windows")]
use windows::Win32::System::Threading::{
    GetExitCodeProcess, OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
};

/// Compare an executable file name against a process name, ignoring case and
/// an optional `.exe` suffix on either side.
pub fn process_name_matches(exe_name: &str, wanted: &str) -> bool {
    fn stem(name: &str) -> &str {
        let split = name.len().saturating_sub(4);
        match (name.get(..split), name.get(split..)) {
            (Some(stem), Some(ext)) if ext.eq_ignore_ascii_case(".exe") => stem,
            _ => name,
        }
    }
    stem(exe_name).eq_ignore_ascii_case(stem(wanted))
}

#[cfg(target_os = "windows")]
pub struct ProcessHandle {
    handle: HANDLE,
    pub pid: u32,
}

#[cfg(not(target_os = "windows"))]
pub struct ProcessHandle {
    pub pid: u32,
}

#[cfg(target_os = "windows")]
impl ProcessHandle {
    pub fn find_and_open(name: &str) -> Result<Self> {
        let pid = find_process_id(name).map_err(|e| {
            tracing::debug!("Process detection failed: {}", e);
            e
        })?;
        tracing::debug!("Found {} with PID {}", name, pid);
        Self::open(pid)
    }

    pub fn open(pid: u32) -> Result<Self> {
        // SAFETY: OpenProcess is called with valid flags (PROCESS_QUERY_INFORMATION | PROCESS_VM_READ)
        // and a process ID obtained from CreateToolhelp32Snapshot. The returned handle is managed
        // by this struct and closed in Drop.
        let handle = unsafe {
            OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, false, pid).map_err(|e| {
                tracing::debug!("OpenProcess failed for PID {}: {}", pid, e);
                Error::ProcessOpenFailed(e.to_string())
            })?
        };

        Ok(Self { handle, pid })
    }

    pub fn handle(&self) -> HANDLE {
        self.handle
    }

    /// Check if the process is still running
    pub fn is_alive(&self) -> bool {
        const STILL_ACTIVE: u32 = 259;

        let mut exit_code: u32 = 0;
        // SAFETY: GetExitCodeProcess is called with a valid process handle obtained from OpenProcess.
        // The exit_code variable is properly initialized and passed by mutable reference.
        unsafe {
            if GetExitCodeProcess(self.handle, &mut exit_code).is_ok() {
                exit_code == STILL_ACTIVE
            } else {
                false
            }
        }
    }

    /// Enumerate every module loaded in the process
    pub fn modules(&self) -> Result<Vec<ModuleInfo>> {
        enumerate_modules(self.handle)
    }
}

#[cfg(not(target_os = "windows"))]
impl ProcessHandle {
    pub fn find_and_open(_name: &str) -> Result<Self> {
        Err(Error::ProcessNotFound(
            "Windows only: process access not supported on this platform".to_string(),
        ))
    }

    pub fn open(_pid: u32) -> Result<Self> {
        Err(Error::ProcessNotFound(
            "Windows only: process access not supported on this platform".to_string(),
        ))
    }

    /// Check if the process is still running (stub for non-Windows)
    pub fn is_alive(&self) -> bool {
        false
    }

    /// Enumerate modules (stub for non-Windows)
    pub fn modules(&self) -> Result<Vec<ModuleInfo>> {
        Ok(Vec::new())
    }
}

impl ProcessInfo for ProcessHandle {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn modules(&self) -> Result<Vec<ModuleInfo>> {
        ProcessHandle::modules(self)
    }

    fn is_alive(&self) -> bool {
        ProcessHandle::is_alive(self)
    }
}

impl ReadMemory for ProcessHandle {
    fn read_into(&self, address: u64, buffer: &mut [u8]) -> Result<()> {
        MemoryReader::new(self).read_into(address, buffer)
    }
}

#[cfg(target_os = "windows")]
impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if !self.handle.is_invalid() {
            // SAFETY: self.handle is a valid handle obtained from OpenProcess and has not been
            // closed yet. CloseHandle is safe to call on a valid handle.
            if let Err(e) = unsafe { CloseHandle(self.handle) } {
                warn!("Failed to close process handle: {}", e);
            }
        }
    }
}

/// Finds processes on the local machine through the OS process list.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessProvider;

impl ProcessProvider for SystemProcessProvider {
    type Process = ProcessHandle;

    fn find_process(&self, name: &str) -> Result<Self::Process> {
        ProcessHandle::find_and_open(name)
    }
}

#[cfg(target_os = "windows")]
fn find_process_id(name: &str) -> Result<u32> {
    // SAFETY: CreateToolhelp32Snapshot with TH32CS_SNAPPROCESS is safe to call.
    // The returned handle is closed at the end of this function.
    let snapshot = unsafe {
        CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0)
            .map_err(|e| Error::ProcessNotFound(e.to_string()))?
    };

    let mut entry = PROCESSENTRY32W {
        dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
        ..Default::default()
    };

    // SAFETY: Process32FirstW and Process32NextW are safe to call with a valid snapshot handle
    // and properly initialized PROCESSENTRY32W structure. szExeFile is null-terminated.
    let mut found = None;
    unsafe {
        if Process32FirstW(snapshot, &mut entry).is_ok() {
            loop {
                let exe_name = wide_to_string(&entry.szExeFile);
                if process_name_matches(&exe_name, name) {
                    found = Some(entry.th32ProcessID);
                    break;
                }

                if Process32NextW(snapshot, &mut entry).is_err() {
                    break;
                }
            }
        }
    }

    // SAFETY: snapshot is a valid handle from CreateToolhelp32Snapshot
    let _ = unsafe { CloseHandle(snapshot) };

    found.ok_or_else(|| Error::ProcessNotFound(format!("Process '{}' not found", name)))
}

#[cfg(target_os = "windows")]
fn enumerate_modules(handle: HANDLE) -> Result<Vec<ModuleInfo>> {
    let mut modules = [HMODULE::default(); 1024];
    let mut needed: u32 = 0;

    // SAFETY: EnumProcessModulesEx is called with a valid process handle from OpenProcess,
    // and the modules array is large enough to hold typical module counts. The needed
    // parameter receives the actual bytes required.
    unsafe {
        EnumProcessModulesEx(
            handle,
            modules.as_mut_ptr(),
            (modules.len() * std::mem::size_of::<HMODULE>()) as u32,
            &mut needed,
            LIST_MODULES_ALL,
        )
        .map_err(|e| Error::ProcessOpenFailed(format!("Failed to enumerate modules: {}", e)))?;
    }

    let count = (needed as usize / std::mem::size_of::<HMODULE>()).min(modules.len());
    let mut result = Vec::with_capacity(count);

    for &module in &modules[..count] {
        let mut name = [0u16; 260];
        // SAFETY: GetModuleBaseNameW writes at most name.len() UTF-16 units into the buffer
        // and returns the number written (0 on failure).
        let len = unsafe { GetModuleBaseNameW(handle, module, &mut name) } as usize;
        if len == 0 {
            continue;
        }

        let mut info = MODULEINFO::default();
        // SAFETY: GetModuleInformation is called with a valid process handle and a module
        // handle from the enumeration above. The info struct is properly sized.
        let info_ok = unsafe {
            GetModuleInformation(
                handle,
                module,
                &mut info,
                std::mem::size_of::<MODULEINFO>() as u32,
            )
            .is_ok()
        };
        if !info_ok {
            continue;
        }

        result.push(ModuleInfo::new(
            wide_to_string(&name[..len]),
            info.lpBaseOfDll as u64,
            info.SizeOfImage,
        ));
    }

    Ok(result)
}

#[cfg(target_os = "windows")]
fn wide_to_string(wide: &[u16]) -> String {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    OsString::from_wide(&wide[..len])
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_name_matches() {
        assert!(process_name_matches("Bug Fables.exe", "Bug Fables"));
        assert!(process_name_matches("bug fables.EXE", "Bug Fables"));
        assert!(process_name_matches("Bug Fables", "Bug Fables.exe"));
        assert!(!process_name_matches("Bug Fables Demo.exe", "Bug Fables"));
        assert!(!process_name_matches("exe", "Bug Fables"));
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn test_system_provider_unsupported_platform() {
        let provider = SystemProcessProvider;
        assert!(provider.find_process("Bug Fables").is_err());
    }
}
