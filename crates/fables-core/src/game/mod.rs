//! Game state read from a bound process

mod encounter;
mod flags;
mod ids;
mod memory;

#[doc(hidden)]
pub mod fixture;

pub use encounter::EncounterTable;
pub use flags::FlagSet;
pub use ids::GameIds;
pub use memory::{EndReading, GameMemory, MidSplitReading, Snapshot, StartReading};
