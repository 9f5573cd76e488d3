//! Typed snapshot accessors over a bound process.
//!
//! Each accessor resolves one fixed pointer chain from the active offset
//! table. Nothing is cached: every call reads the process again.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::game::{EncounterTable, FlagSet};
use crate::offset::layout::unity;
use crate::offset::{Field, OffsetTable};
use crate::process::{OffsetPath, PointerChain, ReadMemory};

/// Inputs for the start decision, read in one go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartReading {
    pub flags: FlagSet,
    pub in_event: bool,
    pub last_event: i32,
}

/// Inputs for an intermediate split decision, read in one go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidSplitReading {
    pub room_id: i32,
    pub flags: FlagSet,
    pub encounters: EncounterTable,
    pub battle_ptr: u64,
}

/// Inputs for the end-sequence decision, read in one go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndReading {
    pub room_id: i32,
    pub song_id: i32,
    pub music_coroutine: u64,
}

/// Best-effort dump of every accessor, for status output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub room_id: Option<i32>,
    pub room_name: Option<String>,
    pub song_id: Option<i32>,
    pub music_coroutine: Option<u64>,
    pub battle_ptr: Option<u64>,
    pub in_event: Option<bool>,
    pub last_event: Option<i32>,
    /// Indices of set flags
    pub flags_set: Option<Vec<usize>>,
    /// `(enemy id, times defeated)` for every defeated enemy
    pub enemies_defeated: Option<Vec<(usize, i32)>>,
}

pub struct GameMemory<'a, R: ?Sized> {
    reader: &'a R,
    table: &'static OffsetTable,
    paths: &'a HashMap<Field, OffsetPath>,
    module_base: Option<u64>,
}

fn unreadable(field: Field) -> impl FnOnce(Error) -> Error {
    move |source| Error::FieldUnreadable {
        field: field.to_string(),
        source: Box::new(source),
    }
}

impl<'a, R: ReadMemory + ?Sized> GameMemory<'a, R> {
    pub fn new(
        reader: &'a R,
        table: &'static OffsetTable,
        paths: &'a HashMap<Field, OffsetPath>,
        module_base: Option<u64>,
    ) -> Self {
        Self {
            reader,
            table,
            paths,
            module_base,
        }
    }

    fn chain(&self, field: Field) -> Result<PointerChain<'a>> {
        let base = self
            .module_base
            .ok_or_else(|| Error::ModuleNotLoaded(self.table.module_name.to_string()))?;
        let path = self.paths.get(&field).ok_or(Error::NotBound)?;
        Ok(path.at(base))
    }

    pub fn read_flags(&self) -> Result<FlagSet> {
        let len = self.table.num_flags;
        self.chain(Field::Flags)
            .and_then(|c| c.read_bytes(self.reader, len))
            .and_then(|bytes| FlagSet::from_bytes(bytes, len))
            .map_err(unreadable(Field::Flags))
    }

    pub fn read_enemy_encounter(&self) -> Result<EncounterTable> {
        let len = self.table.encounter_size;
        self.chain(Field::EnemyEncounter)
            .and_then(|c| c.read_bytes(self.reader, len))
            .and_then(|bytes| EncounterTable::from_bytes(bytes, len))
            .map_err(unreadable(Field::EnemyEncounter))
    }

    pub fn read_room_id(&self) -> Result<i32> {
        self.chain(Field::RoomId)
            .and_then(|c| c.read_i32(self.reader))
            .map_err(unreadable(Field::RoomId))
    }

    /// Name of the current map's GameObject; diagnostic only.
    pub fn read_room_name(&self) -> Result<String> {
        self.chain(Field::RoomName)
            .and_then(|c| c.read_c_string(self.reader, unity::MAX_NAME_LEN))
            .map_err(unreadable(Field::RoomName))
    }

    pub fn read_first_music_id(&self) -> Result<i32> {
        self.chain(Field::FirstMusicId)
            .and_then(|c| c.read_i32(self.reader))
            .map_err(unreadable(Field::FirstMusicId))
    }

    pub fn read_music_coroutine(&self) -> Result<u64> {
        self.chain(Field::MusicCoroutine)
            .and_then(|c| c.read_u64(self.reader))
            .map_err(unreadable(Field::MusicCoroutine))
    }

    /// Native pointer of the active battle, `0` when none.
    ///
    /// The direct chain fails while no battle exists (its controller field is
    /// null); in that case a readable controller field means "no battle".
    pub fn read_battle_ptr(&self) -> Result<u64> {
        if let Ok(ptr) = self
            .chain(Field::BattlePtr)
            .and_then(|c| c.read_u64(self.reader))
        {
            return Ok(ptr);
        }

        self.chain(Field::Battle)
            .and_then(|c| c.read_u64(self.reader))
            .map(|_| 0)
            .map_err(unreadable(Field::Battle))
    }

    pub fn read_in_event(&self) -> Result<bool> {
        self.chain(Field::InEvent)
            .and_then(|c| c.read_bool(self.reader))
            .map_err(unreadable(Field::InEvent))
    }

    pub fn read_last_event(&self) -> Result<i32> {
        self.chain(Field::LastEvent)
            .and_then(|c| c.read_i32(self.reader))
            .map_err(unreadable(Field::LastEvent))
    }

    pub fn read_start(&self) -> Result<StartReading> {
        Ok(StartReading {
            flags: self.read_flags()?,
            in_event: self.read_in_event()?,
            last_event: self.read_last_event()?,
        })
    }

    pub fn read_mid_split(&self) -> Result<MidSplitReading> {
        Ok(MidSplitReading {
            room_id: self.read_room_id()?,
            flags: self.read_flags()?,
            encounters: self.read_enemy_encounter()?,
            battle_ptr: self.read_battle_ptr()?,
        })
    }

    pub fn read_end(&self) -> Result<EndReading> {
        Ok(EndReading {
            song_id: self.read_first_music_id()?,
            music_coroutine: self.read_music_coroutine()?,
            room_id: self.read_room_id()?,
        })
    }

    /// Read every accessor, keeping whatever succeeds.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            room_id: self.read_room_id().ok(),
            room_name: self.read_room_name().ok(),
            song_id: self.read_first_music_id().ok(),
            music_coroutine: self.read_music_coroutine().ok(),
            battle_ptr: self.read_battle_ptr().ok(),
            in_event: self.read_in_event().ok(),
            last_event: self.read_last_event().ok(),
            flags_set: self.read_flags().ok().map(|f| f.set_indices()),
            enemies_defeated: self
                .read_enemy_encounter()
                .ok()
                .map(|t| t.defeated_enemies()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fixture::GameLayout;
    use crate::offset::{V110, V113_MONO_BLEEDING_EDGE};
    use crate::process::MockMemory;

    const BASE: u64 = 0x7FF0_0000_0000;

    fn paths(table: &'static OffsetTable) -> HashMap<Field, OffsetPath> {
        table.all_paths().into_iter().collect()
    }

    #[test]
    fn test_reads_every_field_v110() {
        let (layout, mut memory) = GameLayout::build(&V110, BASE);
        layout.set_flag(&mut memory, 12, true);
        layout.set_defeated(&mut memory, 3, 2);
        layout.set_room(&mut memory, 42);
        layout.set_song(&mut memory, 7);
        layout.set_music_coroutine(&mut memory, 0xDEAD);
        layout.set_in_event(&mut memory, true);
        layout.set_last_event(&mut memory, 15);

        let paths = paths(&V110);
        let game = GameMemory::new(&memory, &V110, &paths, Some(BASE));

        let flags = game.read_flags().unwrap();
        assert_eq!(flags.len(), 750);
        assert!(flags.is_set(12));
        assert_eq!(game.read_enemy_encounter().unwrap().defeated(3), Some(2));
        assert_eq!(game.read_room_id().unwrap(), 42);
        assert_eq!(game.read_first_music_id().unwrap(), 7);
        assert_eq!(game.read_music_coroutine().unwrap(), 0xDEAD);
        assert!(game.read_in_event().unwrap());
        assert_eq!(game.read_last_event().unwrap(), 15);
    }

    #[test]
    fn test_bleeding_edge_prefix() {
        let (layout, mut memory) = GameLayout::build(&V113_MONO_BLEEDING_EDGE, BASE);
        layout.set_room(&mut memory, 7);

        let paths = paths(&V113_MONO_BLEEDING_EDGE);
        let game = GameMemory::new(&memory, &V113_MONO_BLEEDING_EDGE, &paths, Some(BASE));
        assert_eq!(game.read_room_id().unwrap(), 7);

        // The legacy table over the same memory resolves nothing
        let legacy = self::paths(&V110);
        let wrong = GameMemory::new(&memory, &V110, &legacy, Some(BASE));
        assert!(wrong.read_room_id().is_err());
    }

    #[test]
    fn test_battle_pointer_fallback() {
        let (layout, mut memory) = GameLayout::build(&V110, BASE);
        let paths = paths(&V110);

        // No battle: the direct chain hits a null controller
        {
            let game = GameMemory::new(&memory, &V110, &paths, Some(BASE));
            assert_eq!(game.read_battle_ptr().unwrap(), 0);
        }

        layout.set_battle(&mut memory, Some(0x5555_0000));
        {
            let game = GameMemory::new(&memory, &V110, &paths, Some(BASE));
            assert_eq!(game.read_battle_ptr().unwrap(), 0x5555_0000);
        }

        layout.set_battle(&mut memory, None);
        let game = GameMemory::new(&memory, &V110, &paths, Some(BASE));
        assert_eq!(game.read_battle_ptr().unwrap(), 0);
    }

    #[test]
    fn test_battle_unreadable_when_static_block_missing() {
        let (layout, mut memory) = GameLayout::build(&V110, BASE);
        memory.unmap(layout.static_block);
        let paths = paths(&V110);
        let game = GameMemory::new(&memory, &V110, &paths, Some(BASE));

        match game.read_battle_ptr() {
            Err(Error::FieldUnreadable { field, .. }) => assert_eq!(field, "battle"),
            other => panic!("expected FieldUnreadable, got {:?}", other),
        }
    }

    #[test]
    fn test_room_name() {
        let (layout, mut memory) = GameLayout::build(&V110, BASE);
        layout.set_room_name(&mut memory, "BugariaMainPlaza");
        let paths = paths(&V110);
        let game = GameMemory::new(&memory, &V110, &paths, Some(BASE));

        assert_eq!(game.read_room_name().unwrap(), "BugariaMainPlaza");
    }

    #[test]
    fn test_missing_module_base() {
        let (_, memory) = GameLayout::build(&V110, BASE);
        let paths = paths(&V110);
        let game = GameMemory::new(&memory, &V110, &paths, None);

        match game.read_room_id() {
            Err(Error::FieldUnreadable { source, .. }) => {
                assert!(matches!(*source, Error::ModuleNotLoaded(_)));
            }
            other => panic!("expected FieldUnreadable, got {:?}", other),
        }
    }

    #[test]
    fn test_dropped_instance_fails_composite_reads() {
        let (layout, mut memory) = GameLayout::build(&V110, BASE);
        layout.set_room(&mut memory, 3);
        layout.drop_instance(&mut memory);
        let paths = paths(&V110);
        let game = GameMemory::new(&memory, &V110, &paths, Some(BASE));

        assert!(game.read_flags().is_err());
        assert!(game.read_start().is_err());
        assert!(game.read_mid_split().is_err());
        // End reads do not touch the instance
        let end = game.read_end().unwrap();
        assert_eq!(end.room_id, 3);
    }

    #[test]
    fn test_flag_length_must_match_table() {
        let memory = MockMemory::new().with_bytes(0x1000, &[1u8; 16]);
        let paths: HashMap<Field, OffsetPath> = [(
            Field::Flags,
            OffsetPath::new("mono.dll", 0x1000, Vec::new()),
        )]
        .into_iter()
        .collect();
        let game = GameMemory::new(&memory, &V110, &paths, Some(0));

        // 750 bytes requested but only 16 mapped
        assert!(game.read_flags().is_err());
    }

    #[test]
    fn test_snapshot_keeps_partial_results() {
        let (layout, mut memory) = GameLayout::build(&V110, BASE);
        layout.set_room(&mut memory, 9);
        layout.set_defeated(&mut memory, 1, 4);
        layout.set_flag(&mut memory, 5, true);

        let paths = paths(&V110);
        let full = GameMemory::new(&memory, &V110, &paths, Some(BASE)).snapshot();
        assert_eq!(full.room_id, Some(9));
        assert_eq!(full.flags_set, Some(vec![5]));
        assert_eq!(full.enemies_defeated, Some(vec![(1, 4)]));
        assert_eq!(full.battle_ptr, Some(0));

        layout.drop_instance(&mut memory);
        let partial = GameMemory::new(&memory, &V110, &paths, Some(BASE)).snapshot();
        assert_eq!(partial.room_id, Some(9));
        assert_eq!(partial.flags_set, None);
        assert_eq!(partial.in_event, None);
    }
}
