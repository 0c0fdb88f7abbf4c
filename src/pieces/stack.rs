//! Ordered stacks of pieces.
//!
//! Index 0 is the bottom. Board-stack order is load-bearing: it decides
//! capture depth, take-off height and whether a piece is unobstructed, so
//! every predicate here reads the order rather than a summary of it.
//!
//! A `Stack` holds only piece handles. Predicates that need owners or faces
//! take the piece arena as an argument.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::arena::Pieces;
use super::face::{Face, PieceKind};
use super::piece::PieceId;
use crate::core::{Cell, Locus, PlayerId};

/// Stable stack handle, also used as the `<stackId>` operand of `Drop`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StackId(pub u16);

impl StackId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for StackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a stack lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    Board,
    Rack,
    Bar,
    Trade,
    /// Transit stack holding pieces in hand.
    Scratch,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Origin::Board => "board",
            Origin::Rack => "rack",
            Origin::Bar => "bar",
            Origin::Trade => "trade",
            Origin::Scratch => "scratch",
        };
        f.write_str(name)
    }
}

/// Piece handles, bottom first.
pub type PieceList = SmallVec<[PieceId; 8]>;

/// A stack of pieces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    id: StackId,
    origin: Origin,
    owner: Option<PlayerId>,
    cell: Option<Cell>,
    kind: Option<PieceKind>,
    pieces: PieceList,
}

impl Stack {
    /// An empty board cell.
    #[must_use]
    pub fn board(id: StackId, cell: Cell) -> Self {
        Self {
            id,
            origin: Origin::Board,
            owner: None,
            cell: Some(cell),
            kind: None,
            pieces: PieceList::new(),
        }
    }

    /// A per-kind rack, bar, or trade stack belonging to `owner`.
    #[must_use]
    pub fn holding(id: StackId, origin: Origin, owner: PlayerId, kind: PieceKind) -> Self {
        Self {
            id,
            origin,
            owner: Some(owner),
            cell: None,
            kind: Some(kind),
            pieces: PieceList::new(),
        }
    }

    /// A transit stack.
    #[must_use]
    pub fn scratch(id: StackId) -> Self {
        Self {
            id,
            origin: Origin::Scratch,
            owner: None,
            cell: None,
            kind: None,
            pieces: PieceList::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> StackId {
        self.id
    }

    #[must_use]
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Owner of a rack, bar, or trade stack.
    #[must_use]
    pub fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    /// Board coordinate of a board stack.
    #[must_use]
    pub fn cell(&self) -> Option<Cell> {
        self.cell
    }

    /// The kind a rack, bar, or trade stack is sorted by.
    #[must_use]
    pub fn kind(&self) -> Option<PieceKind> {
        self.kind
    }

    #[must_use]
    pub fn locus(&self) -> Locus {
        match (self.origin, self.cell) {
            (Origin::Board, Some(cell)) => Locus::Cell(cell),
            (Origin::Rack, _) => Locus::Rack,
            (Origin::Bar, _) => Locus::Bar,
            (Origin::Trade, _) => Locus::Trade,
            _ => Locus::Unknown,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    #[must_use]
    pub fn pieces(&self) -> &[PieceId] {
        &self.pieces
    }

    #[must_use]
    pub fn top(&self) -> Option<PieceId> {
        self.pieces.last().copied()
    }

    #[must_use]
    pub fn bottom(&self) -> Option<PieceId> {
        self.pieces.first().copied()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<PieceId> {
        self.pieces.get(index).copied()
    }

    #[must_use]
    pub fn index_of(&self, piece: PieceId) -> Option<usize> {
        self.pieces.iter().position(|&p| p == piece)
    }

    #[must_use]
    pub fn contains(&self, piece: PieceId) -> bool {
        self.pieces.contains(&piece)
    }

    /// A copy of this stack holding `pieces` instead of its current contents.
    #[must_use]
    pub(crate) fn with_contents(&self, pieces: &[PieceId]) -> Stack {
        Stack {
            pieces: PieceList::from_slice(pieces),
            ..self.clone()
        }
    }

    pub(crate) fn push(&mut self, piece: PieceId) {
        self.pieces.push(piece);
    }

    /// Insert so that the new piece ends up at `index`; past the end means on top.
    pub(crate) fn insert(&mut self, index: usize, piece: PieceId) {
        let index = index.min(self.pieces.len());
        self.pieces.insert(index, piece);
    }

    /// Remove `piece` if present. Returns its former index.
    pub(crate) fn remove(&mut self, piece: PieceId) -> Option<usize> {
        let index = self.index_of(piece)?;
        self.pieces.remove(index);
        Some(index)
    }

    /// Remove and return everything from `index` upward.
    pub(crate) fn split_off(&mut self, index: usize) -> PieceList {
        if index >= self.pieces.len() {
            return PieceList::new();
        }
        self.pieces.drain(index..).collect()
    }

    /// Owner of the top piece.
    #[must_use]
    pub fn top_owner(&self, pieces: &Pieces) -> Option<PlayerId> {
        self.top().map(|p| pieces[p].owner())
    }

    /// Real colour of the top face.
    #[must_use]
    pub fn real_top_face(&self, pieces: &Pieces) -> Option<Face> {
        self.top().map(|p| pieces[p].real_top())
    }

    /// Contiguous pieces from the top that share the top piece's owner.
    #[must_use]
    pub fn capture_depth(&self, pieces: &Pieces) -> usize {
        let Some(owner) = self.top_owner(pieces) else {
            return 0;
        };
        self.pieces
            .iter()
            .rev()
            .take_while(|&&p| pieces[p].owner() == owner)
            .count()
    }

    /// How many pieces the controlling player may lift off together.
    #[must_use]
    pub fn take_off_height(&self, pieces: &Pieces) -> usize {
        self.capture_depth(pieces)
    }

    /// True if no piece of a different owner sits above `index`.
    #[must_use]
    pub fn unobstructed(&self, pieces: &Pieces, index: usize) -> bool {
        let Some(&piece) = self.pieces.get(index) else {
            return false;
        };
        let owner = pieces[piece].owner();
        self.pieces[index + 1..].iter().all(|&p| pieces[p].owner() == owner)
    }

    /// True if `player` may slip a new piece in at `index` (or on top when
    /// `on_top`) without resting it on an opposing piece.
    ///
    /// The piece at `index` must belong to `player`, be unobstructed, and
    /// either sit at the bottom or rest on another of `player`'s pieces.
    #[must_use]
    pub fn unsandwiched(&self, pieces: &Pieces, index: usize, on_top: bool, player: PlayerId) -> bool {
        let Some(&piece) = self.pieces.get(index) else {
            return false;
        };
        if pieces[piece].owner() != player {
            return false;
        }
        if on_top {
            return index + 1 == self.pieces.len();
        }
        self.unobstructed(pieces, index)
            && (index == 0 || pieces[self.pieces[index - 1]].owner() == player)
    }

    /// A stack whose bottom piece is covered by a different owner: dropping
    /// back onto it captures.
    #[must_use]
    pub fn stomp_capture(&self, pieces: &Pieces) -> bool {
        !self.is_empty() && !self.unobstructed(pieces, 0)
    }

    /// True if any piece is not a mute.
    #[must_use]
    pub fn contains_color(&self, pieces: &Pieces) -> bool {
        self.pieces.iter().any(|&p| !pieces[p].is_mute())
    }

    /// True if `player` has `height` contiguous pieces somewhere in the stack.
    #[must_use]
    pub fn contains_run(&self, pieces: &Pieces, player: PlayerId, height: usize) -> bool {
        let mut run = 0;
        for &p in self.pieces.iter().rev() {
            if pieces[p].owner() == player {
                run += 1;
                if run >= height {
                    return true;
                }
            } else {
                run = 0;
            }
        }
        false
    }

    /// Sum of piece values.
    #[must_use]
    pub fn point_total(&self, pieces: &Pieces) -> u32 {
        self.pieces.iter().map(|&p| pieces[p].kind().value()).sum()
    }

    /// Real colours of every piece, top piece first, two letters per piece.
    #[must_use]
    pub fn real_colors(&self, pieces: &Pieces) -> String {
        self.pieces.iter().rev().map(|&p| pieces[p].colors()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::Piece;

    /// Pieces 0..n owned per `owners`, all Red.
    fn arena(owners: &[u8]) -> (Pieces, Stack) {
        let mut pieces = Pieces::new();
        let mut stack = Stack::board(StackId(0), Cell::new(0, 0));
        for (i, &o) in owners.iter().enumerate() {
            let id = PieceId(i as u16);
            pieces.push(Piece::new(id, PlayerId::try_from(o).unwrap(), PieceKind::Red, i as u64));
            stack.push(id);
        }
        (pieces, stack)
    }

    #[test]
    fn test_capture_depth() {
        let (pieces, stack) = arena(&[1, 0, 0]);
        assert_eq!(stack.capture_depth(&pieces), 2);
        assert_eq!(stack.top_owner(&pieces), Some(PlayerId::FIRST));

        let (pieces, empty) = arena(&[]);
        assert_eq!(empty.capture_depth(&pieces), 0);
    }

    #[test]
    fn test_unobstructed() {
        let (pieces, stack) = arena(&[1, 0, 0]);
        assert!(!stack.unobstructed(&pieces, 0));
        assert!(stack.unobstructed(&pieces, 1));
        assert!(stack.unobstructed(&pieces, 2));
        assert!(stack.stomp_capture(&pieces));
    }

    #[test]
    fn test_unsandwiched() {
        let (pieces, stack) = arena(&[1, 0, 0]);
        let me = PlayerId::FIRST;
        assert!(stack.unsandwiched(&pieces, 2, true, me));
        assert!(stack.unsandwiched(&pieces, 2, false, me));
        // Index 1 rests on an opposing piece.
        assert!(!stack.unsandwiched(&pieces, 1, false, me));
        assert!(!stack.unsandwiched(&pieces, 0, false, me));
    }

    #[test]
    fn test_contains_run() {
        let (pieces, stack) = arena(&[0, 0, 1, 0, 0, 0]);
        assert!(stack.contains_run(&pieces, PlayerId::FIRST, 3));
        assert!(!stack.contains_run(&pieces, PlayerId::FIRST, 4));
    }

    #[test]
    fn test_split_and_insert() {
        let (_, mut stack) = arena(&[0, 0, 0, 0]);
        let top = stack.split_off(2);
        assert_eq!(top.as_slice(), &[PieceId(2), PieceId(3)]);
        assert_eq!(stack.len(), 2);
        stack.insert(0, PieceId(3));
        assert_eq!(stack.bottom(), Some(PieceId(3)));
        stack.insert(99, PieceId(2));
        assert_eq!(stack.top(), Some(PieceId(2)));
        assert_eq!(stack.remove(PieceId(0)), Some(1));
        assert_eq!(stack.remove(PieceId(0)), None);
    }

    #[test]
    fn test_real_colors_top_first() {
        let (mut pieces, stack) = arena(&[0, 0]);
        if let Some(p) = pieces.get_mut(PieceId(1)) {
            p.flip();
        }
        assert_eq!(stack.real_colors(&pieces), "XRRX");
    }
}
