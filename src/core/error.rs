//! Error types for the Plateau engine.
//!
//! Two failure classes reach callers:
//!
//! - [`ParseError`]: a move or setup token could not be decoded. Nothing has
//!   been applied to any board.
//! - [`EngineError`]: an invariant was violated while executing or verifying a
//!   move. The board is rolled back to its state before the failed call, but
//!   the condition usually means a desynchronized peer or an engine bug.
//!
//! Situations with no legal move (nothing to offer in an exchange, a flipped
//! stack that cannot continue) are not errors; the state machine handles them
//! with refusals and forced passes.

use thiserror::Error;

/// Errors raised while decoding move, locus, or setup tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The first token of a move is not a known operation.
    #[error("unrecognized move operation `{0}`")]
    UnknownOperation(String),

    /// A required operand is missing.
    #[error("move `{text}` is missing its {operand}")]
    MissingOperand { text: String, operand: &'static str },

    /// Tokens are left over after a complete move.
    #[error("move `{text}` has an unexpected trailing `{token}`")]
    TrailingToken { text: String, token: String },

    /// A numeric operand could not be parsed.
    #[error("bad number `{0}`")]
    BadNumber(String),

    /// A locus is neither a board cell nor a rack/bar/trade literal.
    #[error("malformed locus `{0}`")]
    BadLocus(String),

    /// A colour letter is not one of the known faces.
    #[error("malformed colour string `{0}`")]
    BadColor(String),

    /// A player token is not `P0` or `P1`.
    #[error("malformed player `{0}`")]
    BadPlayer(String),

    /// A setup token names no known variation.
    #[error("unknown variation `{0}`")]
    UnknownVariation(String),
}

impl From<std::num::ParseIntError> for ParseError {
    fn from(e: std::num::ParseIntError) -> Self {
        ParseError::BadNumber(e.to_string())
    }
}

/// Fatal invariant violations raised by the move engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No transition is defined for this operation in the current state.
    #[error("{op} is not defined for a {origin} stack in state {state}")]
    IllegalTransition {
        op: &'static str,
        origin: String,
        state: String,
    },

    /// The move was rejected by the legality checks.
    #[error("illegal move `{mv}` in state {state}")]
    IllegalMove { mv: String, state: String },

    /// A colour commitment does not match the authoritative piece faces.
    #[error("colour mismatch on piece {piece}: expected {expected}, found {found}")]
    ColorMismatch {
        piece: u16,
        expected: String,
        found: String,
    },

    /// A piece id outside the arena.
    #[error("no piece with id {0}")]
    UnknownPiece(u16),

    /// A stack id outside the arena.
    #[error("no stack with id {0}")]
    UnknownStack(u16),

    /// A drop arrived while nothing was being carried.
    #[error("nothing is in hand")]
    NothingInHand,

    /// A move chain grew past the configured bound.
    #[error("move chain exceeds {0} hops")]
    ChainOverflow(usize),

    /// Two boards that should be identical differ.
    #[error("boards differ: {0}")]
    BoardMismatch(String),

    /// Two boards compare equal but digest differently.
    #[error("digest mismatch: {left:#018x} != {right:#018x}")]
    DigestMismatch { left: u64, right: u64 },

    /// `un_execute` was called with no executed move to undo.
    #[error("nothing to undo")]
    UndoUnderflow,

    /// `un_execute` was called with a move other than the last one executed.
    #[error("cannot undo `{requested}`: last executed move was `{last}`")]
    UndoMismatch { requested: String, last: String },

    /// A serialized game record could not be decoded.
    #[error("corrupt game record: {0}")]
    CorruptRecord(String),
}

/// Any failure surfaced by the crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlateauError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl PlateauError {
    /// True for invariant violations, which must abort the current game.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, PlateauError::Engine(_))
    }
}

/// Result type alias for engine operations.
pub type PlateauResult<T> = Result<T, PlateauError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = ParseError::BadLocus("Z9".into());
        assert_eq!(e.to_string(), "malformed locus `Z9`");

        let e = EngineError::DigestMismatch { left: 1, right: 2 };
        assert!(e.to_string().contains("0x0000000000000001"));
    }

    #[test]
    fn test_fatal_classification() {
        let parse: PlateauError = ParseError::UnknownOperation("Jump".into()).into();
        let engine: PlateauError = EngineError::NothingInHand.into();
        assert!(!parse.is_fatal());
        assert!(engine.is_fatal());
    }
}
