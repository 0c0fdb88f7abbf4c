//! A single Plateau piece.
//!
//! ## Identity
//!
//! `id`, `owner`, `kind` and the hash `key` never change. Piece ids are
//! allocated at setup, player by player and kind by kind, and double as the
//! cross-network handle in move tokens.
//!
//! ## Faces
//!
//! The *real* faces are the authoritative colours. The *visible* faces are
//! what an opponent sees; they stay `Unknown` until revealed. `flip()` swaps
//! both pairs at once, so real and visible never disagree about which side is
//! up.

use serde::{Deserialize, Serialize};

use super::face::{Face, PieceKind, Side};
use super::knowledge::Knowledge;
use super::stack::StackId;
use crate::core::{GameRng, PlayerId};

/// Stable piece handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PieceId(pub u16);

impl PieceId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for PieceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Fixed per-face salts folded into piece digests.
const FACE_SALT: [u64; 5] = [
    0x243F_6A88_85A3_08D3,
    0x1319_8A2E_0370_7344,
    0xA409_3822_299F_31D0,
    0x082E_FA98_EC4E_6C89,
    0x4528_21E6_38D0_1377,
];
const OWNER_SALT: [u64; 2] = [0xBE54_66CF_34E9_0C6C, 0xC0AC_29B7_C97C_50DD];
const PLACED_SALT: u64 = 0x3F84_D5B5_B547_0917;

/// One piece.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    id: PieceId,
    owner: PlayerId,
    kind: PieceKind,
    key: u64,
    real_top: Face,
    real_bottom: Face,
    visible_top: Face,
    visible_bottom: Face,
    flipped: bool,
    knowledge: Knowledge,
    placed_position: u32,
    stack: Option<StackId>,
}

impl Piece {
    /// A fresh, concealed piece in its natural orientation.
    #[must_use]
    pub fn new(id: PieceId, owner: PlayerId, kind: PieceKind, key: u64) -> Self {
        let (top, bottom) = kind.faces();
        Self {
            id,
            owner,
            kind,
            key,
            real_top: top,
            real_bottom: bottom,
            visible_top: Face::Unknown,
            visible_bottom: Face::Unknown,
            flipped: false,
            knowledge: Knowledge::concealed(),
            placed_position: 0,
            stack: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> PieceId {
        self.id
    }

    #[must_use]
    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    #[must_use]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub fn real_top(&self) -> Face {
        self.real_top
    }

    #[must_use]
    pub fn real_bottom(&self) -> Face {
        self.real_bottom
    }

    #[must_use]
    pub fn visible_top(&self) -> Face {
        self.visible_top
    }

    #[must_use]
    pub fn visible_bottom(&self) -> Face {
        self.visible_bottom
    }

    #[must_use]
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    #[must_use]
    pub fn knowledge(&self) -> Knowledge {
        self.knowledge
    }

    /// Encoded `(stack << 8) + level` of the piece's last placement.
    #[must_use]
    pub fn placed_position(&self) -> u32 {
        self.placed_position
    }

    /// The stack currently holding this piece.
    #[must_use]
    pub fn stack(&self) -> Option<StackId> {
        self.stack
    }

    pub(crate) fn set_stack(&mut self, stack: Option<StackId>) {
        self.stack = stack;
    }

    pub(crate) fn set_placed_position(&mut self, position: u32) {
        self.placed_position = position;
    }

    /// Both faces the same colour.
    #[must_use]
    pub fn is_mono_color(&self) -> bool {
        self.kind.is_mono_color()
    }

    /// A mute carries no colour on either face.
    #[must_use]
    pub fn is_mute(&self) -> bool {
        self.kind == PieceKind::Mute
    }

    /// Real faces, top then bottom, as two colour letters.
    #[must_use]
    pub fn colors(&self) -> String {
        format!("{}{}", self.real_top.letter(), self.real_bottom.letter())
    }

    /// Turn the piece over.
    ///
    /// Returns true if the two faces differ. If the old bottom had already
    /// been seen, both faces are now known and the piece is fully revealed.
    pub fn flip(&mut self) -> bool {
        let bottom_was_known = self.knowledge.is_known(Side::Bottom);
        std::mem::swap(&mut self.real_top, &mut self.real_bottom);
        std::mem::swap(&mut self.visible_top, &mut self.visible_bottom);
        self.knowledge.swap_sides();
        self.flipped = !self.flipped;
        if bottom_was_known {
            self.reveal_all();
        }
        self.real_top != self.real_bottom
    }

    /// Flip so that `face` is on top. Returns false if neither face matches.
    pub fn orient(&mut self, face: Face) -> bool {
        if self.real_top == face {
            true
        } else if self.real_bottom == face {
            self.flip();
            true
        } else {
            false
        }
    }

    /// Restore the natural orientation.
    pub fn flip_up(&mut self) {
        if self.flipped {
            std::mem::swap(&mut self.real_top, &mut self.real_bottom);
            std::mem::swap(&mut self.visible_top, &mut self.visible_bottom);
            self.knowledge.swap_sides();
            self.flipped = false;
        }
    }

    /// Expose the top face. Returns true if it was not known before.
    pub fn reveal_top(&mut self) -> bool {
        self.visible_top = self.real_top;
        self.knowledge.reveal(Side::Top, self.real_top)
    }

    /// Expose both faces.
    pub fn reveal_all(&mut self) {
        self.visible_top = self.real_top;
        self.visible_bottom = self.real_bottom;
        self.knowledge.confirm();
    }

    /// Forget everything an observer knew.
    pub fn anonymize(&mut self) {
        self.visible_top = Face::Unknown;
        self.visible_bottom = Face::Unknown;
        self.knowledge = Knowledge::concealed();
    }

    /// Order-independent digest of the piece's identity and orientation.
    #[must_use]
    pub fn identity_digest(&self) -> u64 {
        self.key
            ^ FACE_SALT[self.real_top.index()]
            ^ FACE_SALT[self.real_bottom.index()].rotate_left(17)
            ^ OWNER_SALT[self.owner.index()]
            ^ u64::from(self.placed_position).wrapping_mul(PLACED_SALT)
    }

    /// Position-sensitive digest: draws one value from `rng`.
    pub fn digest(&self, rng: &mut GameRng) -> u64 {
        self.identity_digest().wrapping_mul(rng.next_u64() | 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::KindSet;

    fn piece(kind: PieceKind) -> Piece {
        Piece::new(PieceId(0), PlayerId::FIRST, kind, 0x1234)
    }

    #[test]
    fn test_new_piece_is_concealed() {
        let p = piece(PieceKind::Red);
        assert_eq!(p.real_top(), Face::Red);
        assert_eq!(p.visible_top(), Face::Unknown);
        assert_eq!(p.knowledge().possible(), KindSet::ALL);
    }

    #[test]
    fn test_flip_swaps_real_and_visible() {
        let mut p = piece(PieceKind::Twister);
        p.reveal_top();
        assert!(p.flip());
        assert_eq!(p.real_top(), Face::Blue);
        assert_eq!(p.visible_bottom(), Face::Red);
        assert_eq!(p.visible_top(), Face::Unknown);
        assert!(p.is_flipped());
        assert!(p.knowledge().is_known(Side::Bottom));
    }

    #[test]
    fn test_mono_flip_is_uninteresting() {
        let mut p = piece(PieceKind::RedMask);
        assert!(!p.flip());
    }

    #[test]
    fn test_flip_with_known_bottom_reveals_all() {
        let mut p = piece(PieceKind::Blue);
        p.reveal_top();
        p.flip();
        assert!(p.knowledge().is_known(Side::Bottom));
        assert!(!p.knowledge().is_confirmed());
        p.flip();
        assert!(p.knowledge().is_confirmed());
        assert!(p.knowledge().possible().is_empty());
        assert_eq!(p.visible_bottom(), Face::Blank);
    }

    #[test]
    fn test_orient_and_flip_up() {
        let mut p = piece(PieceKind::Ace);
        assert!(p.orient(Face::Blank));
        assert_eq!(p.real_top(), Face::Blank);
        assert!(!p.orient(Face::Red));
        p.flip_up();
        assert_eq!(p.real_top(), Face::Orange);
        assert!(!p.is_flipped());
    }

    #[test]
    fn test_identity_digest_tracks_orientation() {
        let mut p = piece(PieceKind::Red);
        let before = p.identity_digest();
        p.flip();
        assert_ne!(before, p.identity_digest());
        p.flip();
        assert_eq!(before, p.identity_digest());
    }
}
