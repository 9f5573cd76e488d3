use crate::error::{Error, Result};

/// The game's boolean flag array, one byte per flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSet {
    bytes: Vec<u8>,
}

impl FlagSet {
    /// Wrap a raw flag buffer, requiring exactly `expected_len` bytes.
    pub fn from_bytes(bytes: Vec<u8>, expected_len: usize) -> Result<Self> {
        if bytes.len() != expected_len {
            return Err(Error::SizeMismatch {
                expected: expected_len,
                actual: bytes.len(),
            });
        }
        Ok(Self { bytes })
    }

    /// Flag value, or `None` for an index past the end of the array.
    pub fn get(&self, index: usize) -> Option<bool> {
        self.bytes.get(index).map(|&b| b != 0)
    }

    /// True only for an in-range flag that is set.
    pub fn is_set(&self, index: usize) -> bool {
        self.get(index).unwrap_or(false)
    }

    /// True when every listed flag is set; vacuously true for an empty list.
    pub fn all_set(&self, indices: &[usize]) -> bool {
        indices.iter().all(|&i| self.is_set(i))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Indices of every set flag.
    pub fn set_indices(&self) -> Vec<usize> {
        self.bytes
            .iter()
            .enumerate()
            .filter(|(_, b)| **b != 0)
            .map(|(i, _)| i)
            .collect()
    }
}
