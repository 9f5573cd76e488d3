//! Split decision engine
//!
//! Pure functions from the remembered [`EngineState`] and one fresh reading
//! to the next state and a decision. Nothing here touches process memory.

mod end_sequence;
mod mid_split;
mod start;
mod state;

pub use end_sequence::{next_end_state, should_end};
pub use mid_split::mid_split;
pub use start::should_start;
pub use state::{EndSequenceState, EngineState, reset};
