//! Memory layout constants for Bug Fables data structures
//!
//! Every field the splitter reads hangs off the static `MainManager` class.
//! The path to the static field block differs per Mono runtime (see
//! [`crate::offset::OffsetTable`]); everything below is the part shared by
//! both known builds.
//!
//! # Structure Overview
//!
//! ```text
//! MainManager (static fields)
//! ├── 0x010  instance ──────────► MainManager (instance)
//! │                                ├── 0x160  flags[]  (bool array)
//! │                                ├── 0x190  enemyencounter[,] (int pairs)
//! │                                └── 0x25E  inevent (bool)
//! ├── 0x020  map ───────────────► MapControl
//! │                                ├── 0x010  m_CachedPtr → GameObject name
//! │                                └── 0x108  mapid (int)
//! ├── 0x040  battle ────────────► BattleControl
//! │                                └── 0x010  m_CachedPtr (0 when no battle)
//! ├── 0x058  music coroutine handle (0 when idle)
//! ├── 0x160  musicid[]  (int array)
//! └── 0x3B0  lastevent (int)
//! ```

/// Managed array layout shared by every Mono array object
pub mod array {
    /// Offset of the first element from the array object pointer
    pub const FIRST_ELEMENT: u64 = 0x20;
}

/// Offsets inside the `MainManager` static field block
pub mod main_manager_static {
    pub const INSTANCE: u64 = 0x10;
    pub const MAP: u64 = 0x20;
    pub const BATTLE: u64 = 0x40;
    pub const MUSIC_COROUTINE: u64 = 0x58;
    pub const MUSIC_ID_ARRAY: u64 = 0x160;
    pub const LAST_EVENT: u64 = 0x3B0;
}

/// Offsets inside the `MainManager` instance
pub mod main_manager {
    pub const FLAGS_ARRAY: u64 = 0x160;
    pub const ENEMY_ENCOUNTER: u64 = 0x190;
    pub const IN_EVENT: u64 = 0x25E;
}

/// Offsets inside the `MapControl` instance
pub mod map_control {
    pub const MAP_ID: u64 = 0x108;
}

/// Unity engine object layout
pub mod unity {
    /// Pointer from a managed object to its native counterpart
    pub const CACHED_PTR: u64 = 0x10;

    /// Path from a native component to its GameObject's name string
    pub const GAME_OBJECT_NAME: [u64; 4] = [CACHED_PTR, 0x30, 0x60, 0x0];

    /// Upper bound on a GameObject name read
    pub const MAX_NAME_LEN: usize = 64;
}

/// Enemy encounter table layout
///
/// ```text
/// Offset        Field            Size
/// ─────────────────────────────────────
/// id*8 + 0      times encountered   4
/// id*8 + 4      times defeated      4
/// ```
pub mod encounter {
    /// Number of enemy slots in the table
    pub const ENEMY_SLOTS: usize = 256;

    /// Bytes per enemy entry (two 32-bit integers)
    pub const ENTRY_SIZE: usize = 2 * 4;

    /// Offset of the defeated counter inside an entry
    pub const DEFEATED: usize = 4;

    /// Total byte length of the table
    pub const TABLE_SIZE: usize = ENEMY_SLOTS * ENTRY_SIZE;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encounter_table_size() {
        assert_eq!(encounter::TABLE_SIZE, 2048);
    }
}
