//! Player identification and per-player data storage.
//!
//! ## PlayerId
//!
//! Plateau is strictly two-player. `PlayerId` is a 0-based index with
//! `other()` for the opponent, and parses/prints as the `P<n>` token used by
//! the `Start` move.
//!
//! ## PlayerMap
//!
//! Per-player storage (rack, bar, trade handles, win flags) indexed by
//! `PlayerId`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use super::error::ParseError;

/// Number of players in every Plateau game.
pub const PLAYER_COUNT: usize = 2;

/// Player identifier, index 0 or 1.
///
/// Only the constants, [`FromStr`] and [`TryFrom<u8>`] build one, so every
/// `PlayerId` indexes a [`PlayerMap`]. Decoding goes through the same check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PlayerId(u8);

impl PlayerId {
    /// The player who moves first in a fresh game.
    pub const FIRST: PlayerId = PlayerId(0);
    /// The other player.
    pub const SECOND: PlayerId = PlayerId(1);

    /// Get the raw player index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The opponent of this player.
    #[must_use]
    pub const fn other(self) -> Self {
        Self(self.0 ^ 1)
    }

    /// Both players, first player first.
    pub fn all() -> impl Iterator<Item = PlayerId> {
        (0..PLAYER_COUNT as u8).map(PlayerId)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl TryFrom<u8> for PlayerId {
    type Error = ParseError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        if (n as usize) < PLAYER_COUNT {
            Ok(PlayerId(n))
        } else {
            Err(ParseError::BadPlayer(n.to_string()))
        }
    }
}

impl From<PlayerId> for u8 {
    fn from(player: PlayerId) -> u8 {
        player.0
    }
}

impl FromStr for PlayerId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('P').or_else(|| s.strip_prefix('p')).unwrap_or(s);
        digits
            .parse::<u8>()
            .ok()
            .and_then(|n| PlayerId::try_from(n).ok())
            .ok_or_else(|| ParseError::BadPlayer(s.to_string()))
    }
}

/// Per-player data storage with O(1) access.
///
/// ## Example
///
/// ```
/// use plateau::core::{PlayerId, PlayerMap};
///
/// let mut captures: PlayerMap<u32> = PlayerMap::new(|_| 0);
/// captures[PlayerId::SECOND] += 2;
/// assert_eq!(captures[PlayerId::FIRST], 0);
/// assert_eq!(captures[PlayerId::SECOND], 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    data: [T; PLAYER_COUNT],
}

impl<T> PlayerMap<T> {
    /// Create a new PlayerMap with values from a factory function.
    pub fn new(factory: impl Fn(PlayerId) -> T) -> Self {
        Self {
            data: [factory(PlayerId::FIRST), factory(PlayerId::SECOND)],
        }
    }

    /// Create a new PlayerMap with both entries set to the same value.
    pub fn with_value(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(|_| value.clone())
    }

    /// Get a reference to a player's data.
    #[must_use]
    pub fn get(&self, player: PlayerId) -> &T {
        &self.data[player.index()]
    }

    /// Get a mutable reference to a player's data.
    pub fn get_mut(&mut self, player: PlayerId) -> &mut T {
        &mut self.data[player.index()]
    }

    /// Iterate over (PlayerId, &T) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }
}

impl<T: Default> Default for PlayerMap<T> {
    fn default() -> Self {
        Self::new(|_| T::default())
    }
}

impl<T> Index<PlayerId> for PlayerMap<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &Self::Output {
        self.get(player)
    }
}

impl<T> IndexMut<PlayerId> for PlayerMap<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut Self::Output {
        self.get_mut(player)
    }
}
