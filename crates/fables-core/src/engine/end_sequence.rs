use crate::engine::{EndSequenceState, EngineState};
use crate::game::{EndReading, GameIds};

/// Next end-sequence state for one reading, and whether the run just ended.
pub fn next_end_state(current: EndSequenceState, reading: &EndReading, ids: &GameIds) -> (EndSequenceState, bool) {
    use EndSequenceState::*;

    let transition = reading.music_coroutine != 0;
    match current {
        NotArrivedYet if reading.room_id == ids.end_room => (ArrivedInRoom, false),
        ArrivedInRoom if reading.song_id == ids.level_up_song => (SongLevelUpStarting, false),
        SongLevelUpStarting if !transition => (SongLevelIsPlaying, false),
        SongLevelIsPlaying if transition => (SongIsFading, false),
        SongIsFading if !transition => (NotArrivedYet, true),
        unchanged => (unchanged, false),
    }
}

/// Advance the end sequence by at most one step.
pub fn should_end(state: &EngineState, reading: &EndReading, ids: &GameIds) -> (EngineState, bool) {
    let (end_sequence, fire) = next_end_state(state.end_sequence, reading, ids);
    let next = EngineState {
        end_sequence,
        ..state.clone()
    };
    (next, fire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use EndSequenceState::*;

    fn reading(room_id: i32, song_id: i32, music_coroutine: u64) -> EndReading {
        EndReading {
            room_id,
            song_id,
            music_coroutine,
        }
    }

    fn run(readings: &[EndReading]) -> (EngineState, Vec<bool>) {
        let ids = GameIds::default();
        let mut state = EngineState::new();
        let mut fired = Vec::new();
        for r in readings {
            let (next, fire) = should_end(&state, r, &ids);
            state = next;
            fired.push(fire);
        }
        (state, fired)
    }

    #[test]
    fn test_full_sequence() {
        let (room, song) = (GameIds::END_ROOM, GameIds::LEVEL_UP_SONG);
        let (state, fired) = run(&[
            reading(room, 0, 5),
            reading(room, song, 5),
            reading(room, song, 0),
            reading(room, song, 5),
            reading(room, song, 5),
            reading(room, song, 0),
        ]);
        assert_eq!(fired, vec![false, false, false, false, false, true]);
        assert_eq!(state.end_sequence, NotArrivedYet);
    }

    #[test]
    fn test_one_step_per_poll() {
        // Every condition holds at once but only one step is taken
        let ids = GameIds::default();
        let all = reading(GameIds::END_ROOM, GameIds::LEVEL_UP_SONG, 0);
        assert_eq!(next_end_state(NotArrivedYet, &all, &ids), (ArrivedInRoom, false));
        assert_eq!(next_end_state(ArrivedInRoom, &all, &ids), (SongLevelUpStarting, false));
        assert_eq!(next_end_state(SongLevelUpStarting, &all, &ids), (SongLevelIsPlaying, false));
        assert_eq!(next_end_state(SongLevelIsPlaying, &all, &ids), (SongLevelIsPlaying, false));
    }

    #[test]
    fn test_wrong_room_or_song_holds() {
        let ids = GameIds::default();
        let elsewhere = reading(GameIds::END_ROOM + 1, GameIds::LEVEL_UP_SONG, 0);
        assert_eq!(next_end_state(NotArrivedYet, &elsewhere, &ids), (NotArrivedYet, false));

        let other_song = reading(GameIds::END_ROOM, GameIds::LEVEL_UP_SONG + 1, 0);
        assert_eq!(next_end_state(ArrivedInRoom, &other_song, &ids), (ArrivedInRoom, false));
    }

    #[test]
    fn test_never_fires_early() {
        let ids = GameIds::default();
        let mut state = NotArrivedYet;
        let mut fired_at = None;
        let script = [
            reading(GameIds::END_ROOM, GameIds::LEVEL_UP_SONG, 0),
            reading(GameIds::END_ROOM, GameIds::LEVEL_UP_SONG, 0),
            reading(GameIds::END_ROOM, GameIds::LEVEL_UP_SONG, 0),
            reading(GameIds::END_ROOM, GameIds::LEVEL_UP_SONG, 0),
            reading(GameIds::END_ROOM, GameIds::LEVEL_UP_SONG, 9),
            reading(GameIds::END_ROOM, GameIds::LEVEL_UP_SONG, 0),
        ];
        for (i, r) in script.iter().enumerate() {
            let (next, fire) = next_end_state(state, r, &ids);
            state = next;
            if fire {
                fired_at = Some(i);
            }
        }
        assert_eq!(fired_at, Some(5));
    }

    #[test]
    fn test_custom_end_ids() {
        let ids = GameIds {
            end_room: 90,
            level_up_song: 3,
            ..GameIds::default()
        };
        assert_eq!(next_end_state(NotArrivedYet, &reading(90, 0, 0), &ids).0, ArrivedInRoom);
        assert_eq!(next_end_state(ArrivedInRoom, &reading(90, 3, 0), &ids).0, SongLevelUpStarting);
    }
}
