//! Synthetic game memory for tests
//!
//! Lays out the `MainManager` object graph for a given offset table inside a
//! [`MockMemory`], one page per object, so accessors can be exercised without
//! a running game.

use crate::offset::OffsetTable;
use crate::offset::layout::{
    array, main_manager, main_manager_static as statics, map_control, unity,
};
use crate::process::MockMemory;

const PAGE: u64 = 0x1000;
const FIRST_PAGE: u64 = 0x1000_0000;

/// Addresses of every object the fixture allocated.
#[derive(Debug, Clone)]
pub struct GameLayout {
    pub module_base: u64,
    pub static_block: u64,
    pub instance: u64,
    pub map: u64,
    pub battle: u64,
    pub flags_data: u64,
    pub encounter_data: u64,
    pub music_data: u64,
    pub room_name: u64,
}

impl GameLayout {
    /// Build the object graph for `table` with every value zeroed and no battle.
    pub fn build(table: &OffsetTable, module_base: u64) -> (GameLayout, MockMemory) {
        let mut memory = MockMemory::new();
        let mut next_page = FIRST_PAGE;
        let mut alloc = |memory: &mut MockMemory| {
            let page = next_page;
            next_page += PAGE;
            memory.map(page, PAGE as usize);
            page
        };

        // Prefix: root -> X0 -> ... -> static_block
        let root = module_base + table.base_address;
        let mut current = alloc(&mut memory);
        memory.write_u64(root, current);
        for offset in table.prefix {
            let next = alloc(&mut memory);
            memory.write_u64(current + offset, next);
            current = next;
        }
        let static_block = current;

        let instance = alloc(&mut memory);
        let map = alloc(&mut memory);
        let battle = alloc(&mut memory);
        let flags_array = alloc(&mut memory);
        let encounter_array = alloc(&mut memory);
        let music_array = alloc(&mut memory);
        let native_map = alloc(&mut memory);
        let game_object = alloc(&mut memory);
        let room_name = alloc(&mut memory);

        memory.write_u64(static_block + statics::INSTANCE, instance);
        memory.write_u64(static_block + statics::MAP, map);
        memory.write_u64(static_block + statics::BATTLE, 0);
        memory.write_u64(static_block + statics::MUSIC_ID_ARRAY, music_array);

        memory.write_u64(instance + main_manager::FLAGS_ARRAY, flags_array);
        memory.write_u64(instance + main_manager::ENEMY_ENCOUNTER, encounter_array);

        // Arrays big enough for their payload
        let flags_data = flags_array + array::FIRST_ELEMENT;
        memory.write_bytes(flags_data, &vec![0u8; table.num_flags]);
        let encounter_data = encounter_array + array::FIRST_ELEMENT;
        memory.write_bytes(encounter_data, &vec![0u8; table.encounter_size]);
        let music_data = music_array + array::FIRST_ELEMENT;

        memory.write_u64(map + unity::CACHED_PTR, native_map);
        memory.write_u64(native_map + unity::GAME_OBJECT_NAME[1], game_object);
        // The last step is an offset, not a dereference: the name bytes live here
        memory.write_u64(game_object + unity::GAME_OBJECT_NAME[2], room_name);

        let layout = GameLayout {
            module_base,
            static_block,
            instance,
            map,
            battle,
            flags_data,
            encounter_data,
            music_data,
            room_name,
        };
        (layout, memory)
    }

    pub fn set_flag(&self, memory: &mut MockMemory, index: usize, value: bool) {
        memory.write_bool(self.flags_data + index as u64, value);
    }

    pub fn set_defeated(&self, memory: &mut MockMemory, enemy: usize, defeated: i32) {
        memory.write_i32(self.encounter_data + enemy as u64 * 8 + 4, defeated);
    }

    pub fn set_room(&self, memory: &mut MockMemory, room_id: i32) {
        memory.write_i32(self.map + map_control::MAP_ID, room_id);
    }

    pub fn set_room_name(&self, memory: &mut MockMemory, name: &str) {
        let mut bytes = name.as_bytes().to_vec();
        bytes.push(0);
        memory.write_bytes(self.room_name, &bytes);
    }

    pub fn set_song(&self, memory: &mut MockMemory, song_id: i32) {
        memory.write_i32(self.music_data, song_id);
    }

    pub fn set_music_coroutine(&self, memory: &mut MockMemory, handle: u64) {
        memory.write_u64(self.static_block + statics::MUSIC_COROUTINE, handle);
    }

    pub fn set_in_event(&self, memory: &mut MockMemory, in_event: bool) {
        memory.write_bool(self.instance + main_manager::IN_EVENT, in_event);
    }

    pub fn set_last_event(&self, memory: &mut MockMemory, event: i32) {
        memory.write_i32(self.static_block + statics::LAST_EVENT, event);
    }

    /// Enter a battle whose native pointer is `native`, or leave it with `None`.
    pub fn set_battle(&self, memory: &mut MockMemory, native: Option<u64>) {
        match native {
            Some(ptr) => {
                memory.write_u64(self.static_block + statics::BATTLE, self.battle);
                memory.write_u64(self.battle + unity::CACHED_PTR, ptr);
            }
            None => memory.write_u64(self.static_block + statics::BATTLE, 0),
        }
    }

    /// Unmap the `MainManager` instance, as happens while the game reloads.
    pub fn drop_instance(&self, memory: &mut MockMemory) {
        memory.unmap(self.instance);
    }
}
