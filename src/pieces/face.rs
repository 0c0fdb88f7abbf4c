//! Face colours and piece kinds.
//!
//! ## Kinds
//!
//! | Kind     | Faces          | Value |
//! |----------|----------------|-------|
//! | Mute     | blank / blank  | 1     |
//! | Red      | red / blank    | 2     |
//! | Blue     | blue / blank   | 2     |
//! | RedMask  | red / red      | 5     |
//! | BlueMask | blue / blue    | 5     |
//! | Twister  | red / blue     | 10    |
//! | Ace      | orange / blank | 15    |
//!
//! Every kind has a distinct unordered face pair, so seeing both faces of a
//! piece identifies its kind.

use serde::{Deserialize, Serialize};

use crate::core::ParseError;

/// Number of piece kinds.
pub const KIND_COUNT: usize = 7;

/// A face colour, or `Unknown` for a face an observer has not seen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    Blank,
    Red,
    Blue,
    Orange,
    Unknown,
}

impl Face {
    /// Single-letter form used in colour strings.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Face::Blank => 'X',
            Face::Red => 'R',
            Face::Blue => 'B',
            Face::Orange => 'O',
            Face::Unknown => '?',
        }
    }

    /// Parse a colour letter.
    pub fn from_letter(c: char) -> Result<Self, ParseError> {
        match c.to_ascii_uppercase() {
            'X' => Ok(Face::Blank),
            'R' => Ok(Face::Red),
            'B' => Ok(Face::Blue),
            'O' => Ok(Face::Orange),
            '?' => Ok(Face::Unknown),
            _ => Err(ParseError::BadColor(c.to_string())),
        }
    }

    /// Index into per-face salt tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// One side of a piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Top,
    Bottom,
}

/// The seven kinds of piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PieceKind {
    Mute,
    Red,
    Blue,
    RedMask,
    BlueMask,
    Twister,
    Ace,
}

impl PieceKind {
    /// Every kind, in rack order.
    pub const ALL: [PieceKind; KIND_COUNT] = [
        PieceKind::Mute,
        PieceKind::Red,
        PieceKind::Blue,
        PieceKind::RedMask,
        PieceKind::BlueMask,
        PieceKind::Twister,
        PieceKind::Ace,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Faces in the kind's natural (unflipped) orientation, top first.
    #[must_use]
    pub const fn faces(self) -> (Face, Face) {
        match self {
            PieceKind::Mute => (Face::Blank, Face::Blank),
            PieceKind::Red => (Face::Red, Face::Blank),
            PieceKind::Blue => (Face::Blue, Face::Blank),
            PieceKind::RedMask => (Face::Red, Face::Red),
            PieceKind::BlueMask => (Face::Blue, Face::Blue),
            PieceKind::Twister => (Face::Red, Face::Blue),
            PieceKind::Ace => (Face::Orange, Face::Blank),
        }
    }

    /// Point value used in exchanges.
    #[must_use]
    pub const fn value(self) -> u32 {
        match self {
            PieceKind::Mute => 1,
            PieceKind::Red | PieceKind::Blue => 2,
            PieceKind::RedMask | PieceKind::BlueMask => 5,
            PieceKind::Twister => 10,
            PieceKind::Ace => 15,
        }
    }

    /// True if both faces are the same colour, so flipping changes nothing.
    #[must_use]
    pub fn is_mono_color(self) -> bool {
        let (top, bottom) = self.faces();
        top == bottom
    }

    /// True if `face` appears on either side.
    #[must_use]
    pub fn has_face(self, face: Face) -> bool {
        let (top, bottom) = self.faces();
        top == face || bottom == face
    }

    /// True if the kind's faces are `a` and `b` in either order.
    #[must_use]
    pub fn matches_pair(self, a: Face, b: Face) -> bool {
        let (top, bottom) = self.faces();
        (top == a && bottom == b) || (top == b && bottom == a)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            PieceKind::Mute => "Mute",
            PieceKind::Red => "Red",
            PieceKind::Blue => "Blue",
            PieceKind::RedMask => "RedMask",
            PieceKind::BlueMask => "BlueMask",
            PieceKind::Twister => "Twister",
            PieceKind::Ace => "Ace",
        }
    }
}

impl std::fmt::Display for PieceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of piece kinds, one bit per kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KindSet(u8);

impl KindSet {
    pub const EMPTY: KindSet = KindSet(0);
    pub const ALL: KindSet = KindSet((1 << KIND_COUNT) - 1);

    #[must_use]
    pub const fn single(kind: PieceKind) -> Self {
        KindSet(1 << kind.index())
    }

    /// Kinds that show `face` on at least one side.
    #[must_use]
    pub fn with_face(face: Face) -> Self {
        PieceKind::ALL
            .into_iter()
            .filter(|k| k.has_face(face))
            .fold(KindSet::EMPTY, |set, k| set.with(k))
    }

    /// Kinds whose two faces are exactly `a` and `b`.
    #[must_use]
    pub fn with_pair(a: Face, b: Face) -> Self {
        PieceKind::ALL
            .into_iter()
            .filter(|k| k.matches_pair(a, b))
            .fold(KindSet::EMPTY, |set, k| set.with(k))
    }

    #[must_use]
    pub const fn with(self, kind: PieceKind) -> Self {
        KindSet(self.0 | (1 << kind.index()))
    }

    #[must_use]
    pub const fn intersect(self, other: KindSet) -> Self {
        KindSet(self.0 & other.0)
    }

    #[must_use]
    pub const fn contains(self, kind: PieceKind) -> bool {
        self.0 & (1 << kind.index()) != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    pub fn iter(self) -> impl Iterator<Item = PieceKind> {
        PieceKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}
