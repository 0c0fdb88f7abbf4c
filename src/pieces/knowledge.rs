//! What an opponent observer can infer about a piece.
//!
//! A piece starts fully concealed: neither face has been seen and every kind
//! is still possible. Revealing a face records it as known and narrows the
//! candidate kinds to those carrying that colour. Once both faces are known
//! the identity is confirmed and the candidate set is cleared; a confirmed
//! piece has no "possible but unconfirmed" kinds left.

use serde::{Deserialize, Serialize};

use super::face::{Face, KindSet, Side};

const TOP: u8 = 1;
const BOTTOM: u8 = 2;
const BOTH: u8 = TOP | BOTTOM;

/// Knowledge set for one piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Knowledge {
    known: u8,
    possible: KindSet,
}

impl Default for Knowledge {
    fn default() -> Self {
        Self::concealed()
    }
}

impl Knowledge {
    /// Nothing seen yet.
    #[must_use]
    pub const fn concealed() -> Self {
        Self {
            known: 0,
            possible: KindSet::ALL,
        }
    }

    /// Both faces seen.
    #[must_use]
    pub const fn confirmed() -> Self {
        Self {
            known: BOTH,
            possible: KindSet::EMPTY,
        }
    }

    const fn bit(side: Side) -> u8 {
        match side {
            Side::Top => TOP,
            Side::Bottom => BOTTOM,
        }
    }

    /// Record that `side` has been seen showing `face`.
    ///
    /// Returns true if this is the first time that side was seen.
    pub fn reveal(&mut self, side: Side, face: Face) -> bool {
        let bit = Self::bit(side);
        let fresh = self.known & bit == 0;
        if self.is_confirmed() {
            return false;
        }
        self.known |= bit;
        if face != Face::Unknown {
            self.possible = self.possible.intersect(KindSet::with_face(face));
        }
        if self.known == BOTH {
            self.possible = KindSet::EMPTY;
        }
        fresh
    }

    /// Mark both faces as seen.
    pub fn confirm(&mut self) {
        *self = Self::confirmed();
    }

    /// True if `side` has been seen.
    #[must_use]
    pub const fn is_known(&self, side: Side) -> bool {
        self.known & Self::bit(side) != 0
    }

    /// True once both faces have been seen.
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        self.known == BOTH
    }

    /// Kinds still consistent with what has been seen, while unconfirmed.
    #[must_use]
    pub const fn possible(&self) -> KindSet {
        self.possible
    }

    /// Swap the known-sides record after the piece turns over.
    pub fn swap_sides(&mut self) {
        let top = self.known & TOP;
        let bottom = self.known & BOTTOM;
        self.known = (top << 1) | (bottom >> 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::PieceKind;

    #[test]
    fn test_reveal_narrows() {
        let mut k = Knowledge::concealed();
        assert!(k.reveal(Side::Top, Face::Blue));
        assert!(k.is_known(Side::Top));
        assert!(!k.is_known(Side::Bottom));
        assert!(k.possible().contains(PieceKind::BlueMask));
        assert!(!k.possible().contains(PieceKind::Red));
        assert!(!k.reveal(Side::Top, Face::Blue));
    }

    #[test]
    fn test_both_sides_confirm() {
        let mut k = Knowledge::concealed();
        k.reveal(Side::Top, Face::Red);
        k.reveal(Side::Bottom, Face::Blue);
        assert!(k.is_confirmed());
        assert!(k.possible().is_empty());
    }

    #[test]
    fn test_swap_sides() {
        let mut k = Knowledge::concealed();
        k.reveal(Side::Bottom, Face::Blank);
        k.swap_sides();
        assert!(k.is_known(Side::Top));
        assert!(!k.is_known(Side::Bottom));
    }
}
