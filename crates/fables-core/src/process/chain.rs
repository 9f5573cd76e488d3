//! Pointer-chain resolution over a foreign address space.
//!
//! An [`OffsetPath`] names one logical field as `(module, base, offsets)`.
//! Resolution starts at `module_base + base`, dereferences one pointer per
//! offset except the last, and adds the last offset to reach the field's
//! address. Any unreadable step or null intermediate pointer fails the whole
//! read; nothing is returned from a partially resolved chain.

use std::fmt;

use crate::error::{Error, Result};
use crate::process::reader::ReadMemory;

/// Ordered byte offsets locating one field relative to a module's base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetPath {
    module: &'static str,
    base: u64,
    offsets: Vec<u64>,
}

impl OffsetPath {
    pub fn new(module: &'static str, base: u64, offsets: Vec<u64>) -> Self {
        Self {
            module,
            base,
            offsets,
        }
    }

    pub fn module(&self) -> &'static str {
        self.module
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Bind the path to a module's runtime base address.
    pub fn at(&self, module_base: u64) -> PointerChain<'_> {
        PointerChain {
            path: self,
            module_base,
        }
    }
}

impl fmt::Display for OffsetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"+{:#X}", self.module, self.base)?;
        for offset in &self.offsets {
            write!(f, " -> {:#X}", offset)?;
        }
        Ok(())
    }
}

/// An [`OffsetPath`] whose module base has been resolved in a live process.
#[derive(Debug, Clone, Copy)]
pub struct PointerChain<'p> {
    path: &'p OffsetPath,
    module_base: u64,
}

impl PointerChain<'_> {
    /// Walk the chain and return the final field address.
    pub fn resolve<R: ReadMemory + ?Sized>(&self, reader: &R) -> Result<u64> {
        let root = self.module_base.wrapping_add(self.path.base);
        let Some((last, intermediate)) = self.path.offsets.split_last() else {
            return Ok(root);
        };

        let mut address = reader.read_pointer(root)?;
        if address == 0 {
            return Err(Error::NullPointer { step: 0 });
        }

        for (step, offset) in intermediate.iter().enumerate() {
            address = reader.read_pointer(address.wrapping_add(*offset))?;
            if address == 0 {
                return Err(Error::NullPointer { step: step + 1 });
            }
        }

        Ok(address.wrapping_add(*last))
    }

    /// Resolve the chain and fill `buffer` from the final address.
    pub fn read_into<R: ReadMemory + ?Sized>(&self, reader: &R, buffer: &mut [u8]) -> Result<()> {
        let address = self.resolve(reader)?;
        reader.read_into(address, buffer)
    }

    pub fn read_bytes<R: ReadMemory + ?Sized>(&self, reader: &R, size: usize) -> Result<Vec<u8>> {
        let address = self.resolve(reader)?;
        reader.read_bytes(address, size)
    }

    pub fn read_bool<R: ReadMemory + ?Sized>(&self, reader: &R) -> Result<bool> {
        let address = self.resolve(reader)?;
        reader.read_bool(address)
    }

    pub fn read_i32<R: ReadMemory + ?Sized>(&self, reader: &R) -> Result<i32> {
        let address = self.resolve(reader)?;
        reader.read_i32(address)
    }

    pub fn read_u64<R: ReadMemory + ?Sized>(&self, reader: &R) -> Result<u64> {
        let address = self.resolve(reader)?;
        reader.read_u64(address)
    }

    pub fn read_c_string<R: ReadMemory + ?Sized>(&self, reader: &R, max_len: usize) -> Result<String> {
        let address = self.resolve(reader)?;
        reader.read_c_string(address, max_len)
    }
}
