pub mod chain;
mod handle;
pub mod provider;
mod reader;

// Mock address space and process for testing (always available for unit and integration tests)
#[doc(hidden)]
pub mod mock;

pub use chain::{OffsetPath, PointerChain};
pub use handle::*;
pub use provider::{ModuleInfo, ProcessInfo, ProcessProvider};
pub use reader::{MemoryReader, ReadMemory};

// Re-export mock for convenient access in tests
#[doc(hidden)]
pub use mock::{MockMemory, MockProcess, MockProcessProvider};
