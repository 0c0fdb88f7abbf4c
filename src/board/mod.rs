//! The board and its move engine.
//!
//! - `board`: stacks, pieces, layout, and the movement primitives
//! - `engine`: `execute` / `un_execute` and the turn state machine
//! - `digest`: position hashing
//! - `state`: turn states

#[allow(clippy::module_inception)]
pub mod board;
pub mod digest;
pub mod engine;
pub mod state;

pub use board::Board;
pub use engine::{ReplayMode, Transition};
pub use state::{FlipMark, State};
