//! Game records.
//!
//! A record is the configuration a game was played under plus the text of
//! every move, in order. It has two serialized forms:
//!
//! - text: the variation's setup token on the first line, then one
//!   `P<n> <move>` line per move;
//! - binary: the whole record through `bincode`, including every
//!   configuration switch.
//!
//! [`GameRecord::replay`] rebuilds the final board by executing the moves in
//! [`ReplayMode::Replay`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::protocol::Move;
use crate::board::{Board, ReplayMode};
use crate::core::{EngineConfig, EngineError, ParseError, PlateauResult, PlayerId, Variation};

/// One move as it was played.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedMove {
    pub player: PlayerId,
    pub text: String,
}

impl RecordedMove {
    /// Decode the move.
    pub fn to_move(&self) -> Result<Move, ParseError> {
        Move::parse(&self.text, self.player)
    }
}

impl From<&Move> for RecordedMove {
    fn from(mv: &Move) -> Self {
        Self {
            player: mv.player,
            text: mv.to_string(),
        }
    }
}

/// A complete, replayable game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub config: EngineConfig,
    pub moves: Vec<RecordedMove>,
}

impl GameRecord {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            moves: Vec::new(),
        }
    }

    /// The token that opens the text form.
    #[must_use]
    pub fn setup_token(&self) -> &'static str {
        self.config.variation.name()
    }

    pub fn push(&mut self, mv: &Move) {
        self.moves.push(RecordedMove::from(mv));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Decode every move.
    pub fn parse_moves(&self) -> Result<Vec<Move>, ParseError> {
        self.moves.iter().map(RecordedMove::to_move).collect()
    }

    /// Rebuild the board the record ends on.
    pub fn replay(&self) -> PlateauResult<Board> {
        let mut board = Board::new(self.config.clone());
        for (index, recorded) in self.moves.iter().enumerate() {
            let mv = recorded.to_move()?;
            board.execute(&mv, ReplayMode::Replay)?;
            debug!(index, mv = %recorded.text, "replayed");
        }
        Ok(board)
    }

    /// Text form. Only the variation survives from the configuration.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::from(self.setup_token());
        for m in &self.moves {
            out.push('\n');
            out.push_str(&format!("{} {}", m.player, m.text));
        }
        out
    }

    /// Parse the text form written by [`GameRecord::to_text`].
    pub fn from_text(text: &str) -> Result<Self, ParseError> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        let setup = lines.next().ok_or_else(|| ParseError::UnknownVariation(String::new()))?;
        let variation: Variation = setup.parse()?;
        let mut record = Self::new(EngineConfig::new(variation));
        for line in lines {
            let (player, rest) = line.split_once(char::is_whitespace).ok_or_else(|| {
                ParseError::MissingOperand {
                    text: line.to_string(),
                    operand: "move",
                }
            })?;
            let player: PlayerId = player.parse()?;
            let mv = Move::parse(rest.trim(), player)?;
            record.push(&mv);
        }
        Ok(record)
    }

    /// Binary form.
    pub fn to_bytes(&self) -> PlateauResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| EngineError::CorruptRecord(e.to_string()).into())
    }

    /// Decode the binary form.
    pub fn from_bytes(bytes: &[u8]) -> PlateauResult<Self> {
        bincode::deserialize(bytes).map_err(|e| EngineError::CorruptRecord(e.to_string()).into())
    }
}
