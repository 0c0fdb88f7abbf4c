//! Game configuration types.
//!
//! - `Variation`: board size and piece mix, named by the setup token that
//!   starts every game record.
//! - `EngineConfig`: rule switches for a game, built with `with_*` methods.
//! - `RobotConfig`: knobs for the automated players.
//!
//! All three serialize with serde so that a game record carries the exact
//! configuration it was played under.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::ParseError;
use crate::pieces::KIND_COUNT;

/// Board size and starting piece mix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variation {
    /// The standard 4×4 game, twelve pieces per player.
    #[default]
    Plateau,
    /// The 5×5 board with extra mutes and colours.
    Plateau5,
}

impl Variation {
    /// Every variation, for enumeration in tools and tests.
    pub const ALL: [Variation; 2] = [Variation::Plateau, Variation::Plateau5];

    /// Board edge length.
    #[must_use]
    pub const fn board_size(self) -> usize {
        match self {
            Variation::Plateau => 4,
            Variation::Plateau5 => 5,
        }
    }

    /// Pieces per player of each kind, in `PieceKind::ALL` order
    /// (Mute, Red, Blue, RedMask, BlueMask, Twister, Ace).
    #[must_use]
    pub const fn piece_counts(self) -> [u8; KIND_COUNT] {
        match self {
            Variation::Plateau => [4, 2, 2, 1, 1, 1, 1],
            Variation::Plateau5 => [6, 3, 3, 1, 1, 1, 1],
        }
    }

    /// Total pieces owned by each player.
    #[must_use]
    pub fn pieces_per_player(self) -> usize {
        self.piece_counts().iter().map(|&n| usize::from(n)).sum()
    }

    /// The setup token for this variation.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Variation::Plateau => "plateau",
            Variation::Plateau5 => "plateau-5",
        }
    }
}

impl std::fmt::Display for Variation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variation::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::UnknownVariation(s.to_string()))
    }
}

/// Rule configuration for one game.
///
/// ```
/// use plateau::core::{EngineConfig, Variation};
///
/// let config = EngineConfig::new(Variation::Plateau5)
///     .with_paired_opening(true);
/// assert_eq!(config.variation.board_size(), 5);
/// assert_eq!(config.win_captures, 6);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Board size and piece mix.
    pub variation: Variation,

    /// When set, the second player also opens with a two-piece stack.
    /// Otherwise only the first player does and the game proceeds to Play.
    pub paired_opening: bool,

    /// Contiguous same-owner pieces in one stack that win the game.
    pub win_stack_height: usize,

    /// Captured pieces on a player's bar that win the game.
    pub win_captures: usize,
}

impl EngineConfig {
    /// Standard rules for `variation`.
    #[must_use]
    pub fn new(variation: Variation) -> Self {
        Self {
            variation,
            paired_opening: false,
            win_stack_height: 6,
            win_captures: 6,
        }
    }

    /// Require both players to open with a two-piece stack.
    #[must_use]
    pub fn with_paired_opening(mut self, paired: bool) -> Self {
        self.paired_opening = paired;
        self
    }

    /// Override the stack height that wins.
    #[must_use]
    pub fn with_win_stack_height(mut self, height: usize) -> Self {
        self.win_stack_height = height;
        self
    }

    /// Override the capture count that wins.
    #[must_use]
    pub fn with_win_captures(mut self, captures: usize) -> Self {
        self.win_captures = captures;
        self
    }

    /// Longest multi-hop chain a move may build: one hop per board row.
    #[must_use]
    pub fn max_hops(&self) -> usize {
        self.variation.board_size()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(Variation::default())
    }
}

/// Settings for automated players.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Seed for the robot's random stream.
    pub seed: u64,

    /// Moves after which a self-play game is abandoned as a draw.
    pub max_moves: usize,

    /// Also propose flips that reveal nothing new.
    pub include_redundant_flips: bool,
}

impl RobotConfig {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            max_moves: 400,
            include_redundant_flips: false,
        }
    }

    #[must_use]
    pub fn with_max_moves(mut self, max_moves: usize) -> Self {
        self.max_moves = max_moves;
        self
    }

    #[must_use]
    pub fn with_redundant_flips(mut self, include: bool) -> Self {
        self.include_redundant_flips = include;
        self
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variation_tokens() {
        for v in Variation::ALL {
            assert_eq!(v.name().parse::<Variation>().unwrap(), v);
        }
        assert!("chess".parse::<Variation>().is_err());
    }

    #[test]
    fn test_piece_totals() {
        assert_eq!(Variation::Plateau.pieces_per_player(), 12);
        assert_eq!(Variation::Plateau5.pieces_per_player(), 16);
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::default()
            .with_paired_opening(true)
            .with_win_captures(4);
        assert!(config.paired_opening);
        assert_eq!(config.win_captures, 4);
        assert_eq!(config.max_hops(), 4);
    }

    #[test]
    fn test_config_serde_json() {
        let config = EngineConfig::new(Variation::Plateau5).with_win_stack_height(5);
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
