use serde::Serialize;
use strum::Display;

use crate::game::EncounterTable;

/// Progress through the final cutscene.
///
/// ## State Transition Rules
///
/// - NotArrivedYet -> ArrivedInRoom: player enters the end room
/// - ArrivedInRoom -> SongLevelUpStarting: the level-up song is selected
/// - SongLevelUpStarting -> SongLevelIsPlaying: the music transition settles
/// - SongLevelIsPlaying -> SongIsFading: a new music transition starts
/// - SongIsFading -> NotArrivedYet: the fade ends; the run is over
///
/// At most one step per poll. There are no backward transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, Serialize)]
pub enum EndSequenceState {
    #[default]
    NotArrivedYet,
    ArrivedInRoom,
    SongLevelUpStarting,
    SongLevelIsPlaying,
    SongIsFading,
}

/// Everything the decision functions remember between polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineState {
    /// New-game flag as of the last successful start read
    pub new_game_started: bool,
    /// Encounter table captured at the last resync; `None` until first read
    pub baseline: Option<EncounterTable>,
    pub end_sequence: EndSequenceState,
}

impl EngineState {
    pub fn new() -> Self {
        Self {
            new_game_started: true,
            baseline: None,
            end_sequence: EndSequenceState::NotArrivedYet,
        }
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}

/// Fresh state after a reset.
pub fn reset() -> EngineState {
    EngineState::new()
}
