//! Version-keyed offset tables.
//!
//! Bug Fables shipped on two Mono runtimes whose static field blocks live at
//! different places. Each runtime gets one immutable [`OffsetTable`]; the
//! table is picked once per binding from the modules loaded in the process.

use serde::Serialize;
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::warn;

use crate::offset::layout::{
    array, encounter, main_manager, main_manager_static, map_control, unity,
};
use crate::process::{ModuleInfo, OffsetPath};

/// Known game builds, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
pub enum GameVersion {
    /// 1.1.0 and earlier, legacy Mono runtime
    #[strum(serialize = "1.1.0")]
    V110,
    /// 1.1.3+, MonoBleedingEdge runtime
    #[strum(serialize = "1.1.3 (MonoBleedingEdge)")]
    V113MonoBleedingEdge,
}

impl GameVersion {
    /// Version assumed when no known runtime module is loaded.
    pub const NEWEST: GameVersion = GameVersion::V113MonoBleedingEdge;

    /// Detection priority: the first variant whose module is loaded wins.
    const DETECTION_ORDER: [GameVersion; 2] =
        [GameVersion::V113MonoBleedingEdge, GameVersion::V110];

    pub fn table(self) -> &'static OffsetTable {
        match self {
            GameVersion::V110 => &V110,
            GameVersion::V113MonoBleedingEdge => &V113_MONO_BLEEDING_EDGE,
        }
    }
}

/// Outcome of matching loaded modules against the known runtimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionDetection {
    pub version: GameVersion,
    /// True when no known module matched and [`GameVersion::NEWEST`] was assumed
    pub fallback: bool,
}

/// The known runtime loaded in a process, if any, by detection priority.
pub fn match_version(modules: &[ModuleInfo]) -> Option<GameVersion> {
    GameVersion::DETECTION_ORDER.into_iter().find(|version| {
        let module_name = version.table().module_name;
        modules
            .iter()
            .any(|m| m.name.eq_ignore_ascii_case(module_name))
    })
}

/// Pick the offset table variant for a process from its loaded module names.
pub fn detect_version(modules: &[ModuleInfo]) -> VersionDetection {
    if let Some(version) = match_version(modules) {
        return VersionDetection {
            version,
            fallback: false,
        };
    }

    warn!(
        "No known Mono runtime among {} loaded modules, assuming {}",
        modules.len(),
        GameVersion::NEWEST
    );
    VersionDetection {
        version: GameVersion::NEWEST,
        fallback: true,
    }
}

/// Logical fields read from game memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    Flags,
    EnemyEncounter,
    RoomId,
    RoomName,
    FirstMusicId,
    MusicCoroutine,
    Battle,
    BattlePtr,
    InEvent,
    LastEvent,
}

impl Field {
    /// Offsets following the version prefix.
    pub fn suffix(self) -> Vec<u64> {
        use main_manager_static as statics;

        match self {
            Field::Flags => vec![
                statics::INSTANCE,
                main_manager::FLAGS_ARRAY,
                array::FIRST_ELEMENT,
            ],
            Field::EnemyEncounter => vec![
                statics::INSTANCE,
                main_manager::ENEMY_ENCOUNTER,
                array::FIRST_ELEMENT,
            ],
            Field::RoomId => vec![statics::MAP, map_control::MAP_ID],
            Field::RoomName => {
                let mut path = vec![statics::MAP];
                path.extend_from_slice(&unity::GAME_OBJECT_NAME);
                path
            }
            Field::FirstMusicId => vec![statics::MUSIC_ID_ARRAY, array::FIRST_ELEMENT],
            Field::MusicCoroutine => vec![statics::MUSIC_COROUTINE],
            Field::Battle => vec![statics::BATTLE],
            Field::BattlePtr => vec![statics::BATTLE, unity::CACHED_PTR],
            Field::InEvent => vec![statics::INSTANCE, main_manager::IN_EVENT],
            Field::LastEvent => vec![statics::LAST_EVENT],
        }
    }
}

/// Where the `MainManager` static field block lives for one game build.
#[derive(Debug, PartialEq, Eq)]
pub struct OffsetTable {
    pub version: GameVersion,
    /// Runtime module the base address is relative to
    pub module_name: &'static str,
    /// Address of the static-data root relative to the module base
    pub base_address: u64,
    /// Offsets from the root to the `MainManager` static field block
    pub prefix: &'static [u64],
    /// Length of the game flag array
    pub num_flags: usize,
    /// Byte length of the enemy encounter table
    pub encounter_size: usize,
}

pub static V110: OffsetTable = OffsetTable {
    version: GameVersion::V110,
    module_name: "mono.dll",
    base_address: 0x0050_1AC8,
    prefix: &[0x20, 0x150],
    num_flags: 750,
    encounter_size: encounter::TABLE_SIZE,
};

pub static V113_MONO_BLEEDING_EDGE: OffsetTable = OffsetTable {
    version: GameVersion::V113MonoBleedingEdge,
    module_name: "mono-2.0-bdwgc.dll",
    base_address: 0x0048_FA90,
    prefix: &[0xBD0, 0x0, 0x60],
    num_flags: 750,
    encounter_size: encounter::TABLE_SIZE,
};

impl OffsetTable {
    /// Full offset path for a field: version prefix followed by the field suffix.
    pub fn path(&self, field: Field) -> OffsetPath {
        let mut offsets = self.prefix.to_vec();
        offsets.extend(field.suffix());
        OffsetPath::new(self.module_name, self.base_address, offsets)
    }

    /// Paths for every field, in [`Field`] declaration order.
    pub fn all_paths(&self) -> Vec<(Field, OffsetPath)> {
        Field::iter().map(|f| (f, self.path(f))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modules(names: &[&str]) -> Vec<ModuleInfo> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| ModuleInfo::new(*n, 0x1000 * (i as u64 + 1), 0x1000))
            .collect()
    }

    #[test]
    fn test_detect_legacy_mono() {
        let detection = detect_version(&modules(&["Bug Fables.exe", "mono.dll"]));
        assert_eq!(detection.version, GameVersion::V110);
        assert!(!detection.fallback);
    }

    #[test]
    fn test_detect_bleeding_edge() {
        let detection = detect_version(&modules(&["Bug Fables.exe", "MONO-2.0-BDWGC.DLL"]));
        assert_eq!(detection.version, GameVersion::V113MonoBleedingEdge);
        assert!(!detection.fallback);
    }

    #[test]
    fn test_detect_prefers_bleeding_edge_when_both_loaded() {
        let forward = detect_version(&modules(&["mono.dll", "mono-2.0-bdwgc.dll"]));
        let backward = detect_version(&modules(&["mono-2.0-bdwgc.dll", "mono.dll"]));
        assert_eq!(forward, backward);
        assert_eq!(forward.version, GameVersion::V113MonoBleedingEdge);
    }

    #[test]
    fn test_unknown_modules_fall_back_to_newest() {
        for names in [&[][..], &["Bug Fables.exe", "UnityPlayer.dll"][..]] {
            let detection = detect_version(&modules(names));
            assert_eq!(detection.version, GameVersion::NEWEST);
            assert!(detection.fallback);
        }
    }

    #[test]
    fn test_match_version_without_runtime() {
        assert_eq!(match_version(&modules(&["Bug Fables.exe"])), None);
        assert_eq!(
            match_version(&modules(&["Bug Fables.exe", "mono.dll"])),
            Some(GameVersion::V110)
        );
    }

    #[test]
    fn test_table_lookup_matches_version() {
        for version in GameVersion::iter() {
            assert_eq!(version.table().version, version);
        }
    }

    #[test]
    fn test_flags_path_v110() {
        let path = V110.path(Field::Flags);
        assert_eq!(path.module(), "mono.dll");
        assert_eq!(path.base(), 0x501AC8);
        assert_eq!(path.offsets(), &[0x20, 0x150, 0x10, 0x160, 0x20]);
    }

    #[test]
    fn test_room_name_path_bleeding_edge() {
        let path = V113_MONO_BLEEDING_EDGE.path(Field::RoomName);
        assert_eq!(
            path.offsets(),
            &[0xBD0, 0x0, 0x60, 0x20, 0x10, 0x30, 0x60, 0x0]
        );
    }

    #[test]
    fn test_all_paths_cover_every_field() {
        let paths = V110.all_paths();
        assert_eq!(paths.len(), Field::iter().count());
        assert!(paths.iter().all(|(_, p)| p.offsets().starts_with(V110.prefix)));
    }
}
