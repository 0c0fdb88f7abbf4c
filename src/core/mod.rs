//! Core engine types: players, board coordinates, RNG, configuration, errors.
//!
//! Nothing here knows about pieces moving; these are the building blocks the
//! piece model, board, and move engine are written against.

pub mod config;
pub mod error;
pub mod locus;
pub mod player;
pub mod rng;

pub use config::{EngineConfig, RobotConfig, Variation};
pub use error::{EngineError, ParseError, PlateauError, PlateauResult};
pub use locus::{Cell, Locus};
pub use player::{PlayerId, PlayerMap, PLAYER_COUNT};
pub use rng::GameRng;
