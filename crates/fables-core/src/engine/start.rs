use crate::engine::EngineState;
use crate::game::{GameIds, StartReading};

/// Decide whether a new run just started.
///
/// Fires only on the false -> true edge of the new-game flag while the
/// new-game event is running. The remembered flag always follows the read.
pub fn should_start(state: &EngineState, reading: &StartReading, ids: &GameIds) -> (EngineState, bool) {
    let new_flag = reading.flags.is_set(ids.new_game_started_flag);
    let fire = new_flag
        && !state.new_game_started
        && reading.in_event
        && reading.last_event == ids.new_game_event;

    let next = EngineState {
        new_game_started: new_flag,
        ..state.clone()
    };
    (next, fire)
}
