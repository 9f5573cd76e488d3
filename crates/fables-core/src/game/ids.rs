use serde::{Deserialize, Serialize};

/// Fixed game identifiers the decision engine compares against.
///
/// Split files may override any of these in an `ids` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameIds {
    /// Flag set when a new save file is started
    pub new_game_started_flag: usize,
    /// Event id running while a new game is set up
    pub new_game_event: i32,
    /// Room where the final cutscene plays
    pub end_room: i32,
    /// Song played when the final boss is beaten
    pub level_up_song: i32,
}

impl GameIds {
    pub const NEW_GAME_STARTED_FLAG: usize = 0;
    pub const NEW_GAME_EVENT: i32 = 0;
    pub const END_ROOM: i32 = 42;
    pub const LEVEL_UP_SONG: i32 = 7;
}

impl Default for GameIds {
    fn default() -> Self {
        Self {
            new_game_started_flag: Self::NEW_GAME_STARTED_FLAG,
            new_game_event: Self::NEW_GAME_EVENT,
            end_room: Self::END_ROOM,
            level_up_song: Self::LEVEL_UP_SONG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override() {
        let ids: GameIds = serde_json::from_str(r#"{ "end_room": 90 }"#).unwrap();
        assert_eq!(ids.end_room, 90);
        assert_eq!(ids.level_up_song, GameIds::LEVEL_UP_SONG);
        assert_eq!(ids.new_game_event, GameIds::NEW_GAME_EVENT);
    }
}
