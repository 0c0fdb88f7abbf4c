//! # plateau
//!
//! Rule and state engine for Plateau, a two-player stacking game played with
//! two-faced pieces on a 4×4 or 5×5 board.
//!
//! ## Design Principles
//!
//! 1. **One entry point**: every change to a board goes through
//!    [`Board::execute`], and [`Board::un_execute`] is its exact inverse.
//!    Failed moves leave the board untouched.
//!
//! 2. **Oracle first**: [`Board::legal_move`] decides legality and the
//!    generator only ever emits what the oracle accepts.
//!
//! 3. **Hidden information is data**: each piece carries what the opponent
//!    has seen of it, and the position digest ignores that knowledge.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: pieces and stacks live in `im-rs`
//!   arenas, so board clones and undo snapshots are O(1).
//!
//! - **Micro-steps**: compound moves are scripted pick, drop, and flip steps
//!   driving one closed turn state machine.
//!
//! ## Modules
//!
//! - `core`: players, cells and loci, RNG, configuration, errors
//! - `pieces`: pieces, stacks, faces, and their arenas
//! - `board`: the board, turn states, move execution, and digests
//! - `rules`: the legality oracle and exchange arithmetic
//! - `movegen`: legal move generation
//! - `moves`: the move protocol, move log, and game records
//! - `game`: a board with its history
//! - `robot`: automated players and self-play

pub mod core;
pub mod pieces;
pub mod board;
pub mod rules;
pub mod movegen;
pub mod moves;
pub mod game;
pub mod robot;

// Re-export commonly used types
pub use crate::core::{
    Cell, Locus,
    EngineConfig, RobotConfig, Variation,
    EngineError, ParseError, PlateauError, PlateauResult,
    GameRng, PlayerId, PlayerMap, PLAYER_COUNT,
};

pub use crate::pieces::{Face, Knowledge, Origin, Piece, PieceId, PieceKind, Stack, StackId};

pub use crate::board::{Board, FlipMark, ReplayMode, State, Transition};

pub use crate::movegen::GenOptions;

pub use crate::moves::{Colors, GameRecord, Level, LogEntry, Move, MoveLog, MoveOp, RecordedMove};

pub use crate::game::Game;

pub use crate::robot::{self_play, self_play_many, GameOutcome, GreedyRobot, RandomRobot, Robot};
