#![cfg_attr(not(target_os = "windows"), allow(dead_code, unused_variables))]

use crate::error::{Error, Result};
use crate::process::ProcessHandle;

#[cfg(target_os = "windows")]
use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;

/// Trait for reading memory from a process or buffer
///
/// This trait enables mocking for tests and abstracts over different memory sources.
/// `read_into` is the only primitive; every other read reduces to it.
pub trait ReadMemory {
    /// Fill `buffer` with the bytes at `address`, failing unless every byte was read
    fn read_into(&self, address: u64, buffer: &mut [u8]) -> Result<()>;

    /// Read raw bytes from memory at the given address
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        self.read_into(address, &mut buffer)?;
        Ok(buffer)
    }

    /// Read a single byte interpreted as a boolean (non-zero = true)
    fn read_bool(&self, address: u64) -> Result<bool> {
        let mut byte = [0u8; 1];
        self.read_into(address, &mut byte)?;
        Ok(byte[0] != 0)
    }

    /// Read a signed 32-bit integer from memory
    fn read_i32(&self, address: u64) -> Result<i32> {
        let mut bytes = [0u8; 4];
        self.read_into(address, &mut bytes)?;
        Ok(i32::from_le_bytes(bytes))
    }

    /// Read an unsigned 64-bit integer from memory
    fn read_u64(&self, address: u64) -> Result<u64> {
        let mut bytes = [0u8; 8];
        self.read_into(address, &mut bytes)?;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Read a pointer-sized value from memory
    fn read_pointer(&self, address: u64) -> Result<u64> {
        self.read_u64(address)
    }

    /// Read a null-terminated ASCII/UTF-8 string of at most `max_len` bytes
    ///
    /// Bytes are read one at a time so that a string ending just before an
    /// unmapped page still resolves.
    fn read_c_string(&self, address: u64, max_len: usize) -> Result<String> {
        let mut bytes = Vec::new();
        let mut byte = [0u8; 1];
        for i in 0..max_len {
            self.read_into(address + i as u64, &mut byte)?;
            if byte[0] == 0 {
                break;
            }
            bytes.push(byte[0]);
        }

        String::from_utf8(bytes)
            .map_err(|e| Error::EncodingError(format!("Failed to decode UTF-8 string: {}", e)))
    }
}

impl<T: ReadMemory + ?Sized> ReadMemory for &T {
    fn read_into(&self, address: u64, buffer: &mut [u8]) -> Result<()> {
        (**self).read_into(address, buffer)
    }
}

pub struct MemoryReader<'a> {
    process: &'a ProcessHandle,
}

impl<'a> MemoryReader<'a> {
    pub fn new(process: &'a ProcessHandle) -> Self {
        Self { process }
    }

    #[cfg(target_os = "windows")]
    fn read_into_impl(&self, address: u64, buffer: &mut [u8]) -> Result<()> {
        let size = buffer.len();
        let mut scratch = vec![0u8; size];
        let mut bytes_read = 0;

        // SAFETY: ReadProcessMemory is called with:
        // - A valid process handle from ProcessHandle (obtained via OpenProcess with PROCESS_VM_READ)
        // - An address within the target process's address space
        // - A scratch buffer of exactly `size` bytes owned by this frame
        // - A pointer to receive the actual bytes read
        // Unmapped or protected addresses make the call fail, which is surfaced as an error.
        unsafe {
            ReadProcessMemory(
                self.process.handle(),
                address as *const _,
                scratch.as_mut_ptr() as *mut _,
                size,
                Some(&mut bytes_read),
            )
            .map_err(|e| Error::MemoryReadFailed {
                address,
                message: e.to_string(),
            })?;
        }

        // All-or-nothing: a short read is as bad as no read, and the caller's
        // buffer is only touched once every byte arrived
        if bytes_read != size {
            return Err(Error::MemoryReadFailed {
                address,
                message: format!("Expected {} bytes, read {}", size, bytes_read),
            });
        }

        buffer.copy_from_slice(&scratch);
        Ok(())
    }

    #[cfg(not(target_os = "windows"))]
    fn read_into_impl(&self, address: u64, _buffer: &mut [u8]) -> Result<()> {
        Err(Error::MemoryReadFailed {
            address,
            message: "Windows only: memory reading not supported on this platform".to_string(),
        })
    }
}

impl ReadMemory for MemoryReader<'_> {
    fn read_into(&self, address: u64, buffer: &mut [u8]) -> Result<()> {
        self.read_into_impl(address, buffer)
    }
}
