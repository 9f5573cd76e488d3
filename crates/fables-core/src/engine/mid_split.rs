use crate::engine::EngineState;
use crate::game::MidSplitReading;
use crate::split::Split;

/// Decide whether an intermediate split's conditions are met.
///
/// A room or flag mismatch resyncs the enemy baseline to the fresh table, so
/// defeats that happen elsewhere never count toward this split. A failing
/// enemy check keeps the baseline, so a defeat in progress is not lost.
pub fn mid_split(state: &EngineState, split: &Split, reading: &MidSplitReading) -> (EngineState, bool) {
    let baseline = state
        .baseline
        .clone()
        .unwrap_or_else(|| reading.encounters.clone());

    let resynced = EngineState {
        baseline: Some(reading.encounters.clone()),
        ..state.clone()
    };

    let room_ok = split
        .required_room
        .is_none_or(|room| room == reading.room_id);
    let flags_ok = reading.flags.all_set(&split.required_flags);
    if !room_ok || !flags_ok {
        return (resynced, false);
    }

    let enemies_ok = split.required_enemies.is_empty()
        || (reading.battle_ptr == 0
            && reading
                .encounters
                .all_defeated_since(&baseline, &split.required_enemies));
    if !enemies_ok {
        let kept = EngineState {
            baseline: Some(baseline),
            ..state.clone()
        };
        return (kept, false);
    }

    (resynced, true)
}
