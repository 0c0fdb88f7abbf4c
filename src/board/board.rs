//! The board: stacks, pieces, and turn bookkeeping.
//!
//! ## Layout
//!
//! Stack ids are assigned once at setup, in this order:
//!
//! 1. board cells, row by row (`A1`, `B1`, ... then `A2`, ...);
//! 2. for each player, a bar and a trade stack per kind, interleaved;
//! 3. for each player, a rack stack per kind;
//! 4. the transit stack that holds pieces in hand.
//!
//! Piece ids are assigned player by player, kind by kind, and every piece
//! starts in its owner's rack.
//!
//! ## Snapshots
//!
//! Pieces and stacks live in persistent arenas, so the mutable part of a
//! board (`pieces`, `stacks`, `turn`) can be captured in O(1) before each
//! move and restored exactly by `un_execute`.

use smallvec::SmallVec;
use tracing::trace;

use super::state::{FlipMark, State};
use crate::core::{Cell, EngineConfig, EngineError, PlayerId, PlayerMap, Variation};
use crate::core::{GameRng, PlateauResult};
use crate::moves::{Level, Move};
use crate::pieces::{Origin, Piece, PieceId, PieceKind, PieceList, Pieces, Stack, StackId, Stacks, KIND_COUNT};

/// Seed for the per-piece hash keys. Shared by every board.
pub(crate) const PIECE_KEY_SEED: u64 = 1_035_356;

/// One stop of an in-progress board move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Hop {
    /// The stack left (hop 0) or landed on (later hops).
    pub stack: StackId,
    /// Its contents before this move touched it.
    pub before: PieceList,
}

/// The move being assembled from pick and drop micro-steps.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Chain {
    pub hops: SmallVec<[Hop; 6]>,
    /// Index of the hop the pieces in hand came from; `None` when idle.
    pub step: Option<usize>,
    /// A flip carried along while the flipped stack is being moved.
    pub flip: Option<FlipMark>,
}

impl Chain {
    pub fn origin(&self) -> Option<StackId> {
        self.hops.first().map(|h| h.stack)
    }

    pub fn current(&self) -> Option<&Hop> {
        self.step.and_then(|s| self.hops.get(s))
    }

    pub fn clear(&mut self) {
        self.hops.clear();
        self.step = None;
        self.flip = None;
    }
}

/// Turn bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Turn {
    pub whose_turn: PlayerId,
    pub move_number: u32,
    pub state: State,
    /// State to return to if a resignation is withdrawn.
    pub unresign: Option<State>,
    pub chain: Chain,
    /// Bottom piece of the most recent drop.
    pub dropped: Option<PieceId>,
    pub placement_index: u32,
    pub win: PlayerMap<bool>,
}

/// Everything `un_execute` needs to put back.
#[derive(Clone, Debug)]
pub(crate) struct Snapshot {
    pub pieces: Pieces,
    pub stacks: Stacks,
    pub turn: Turn,
}

#[derive(Clone, Debug)]
pub(crate) struct UndoEntry {
    pub mv: Move,
    pub snapshot: Snapshot,
}

/// Fixed stack handles of a variation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Layout {
    pub size: usize,
    pub racks: PlayerMap<[StackId; KIND_COUNT]>,
    pub bars: PlayerMap<[StackId; KIND_COUNT]>,
    pub trades: PlayerMap<[StackId; KIND_COUNT]>,
    pub scratch: StackId,
}

/// A Plateau board.
#[derive(Debug)]
pub struct Board {
    pub(crate) config: EngineConfig,
    pub(crate) layout: Layout,
    pub(crate) pieces: Pieces,
    pub(crate) stacks: Stacks,
    pub(crate) turn: Turn,
    pub(crate) undo: Vec<UndoEntry>,
}

impl Clone for Board {
    /// Clones start with an empty undo history.
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            layout: self.layout.clone(),
            pieces: self.pieces.clone(),
            stacks: self.stacks.clone(),
            turn: self.turn.clone(),
            undo: Vec::new(),
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Board {
    /// A fresh board with every piece in its owner's rack, waiting for the
    /// first player's opening pair.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let variation = config.variation;
        let size = variation.board_size();
        let mut stacks = Stacks::new();
        let mut next_id = 0u16;
        let mut alloc = |stacks: &mut Stacks, make: &dyn Fn(StackId) -> Stack| {
            let id = StackId(next_id);
            next_id += 1;
            stacks.push(make(id));
            id
        };

        for row in 0..size as u8 {
            for col in 0..size as u8 {
                alloc(&mut stacks, &|id| Stack::board(id, Cell::new(col, row)));
            }
        }

        let mut bars = PlayerMap::with_value([StackId(0); KIND_COUNT]);
        let mut trades = PlayerMap::with_value([StackId(0); KIND_COUNT]);
        let mut racks = PlayerMap::with_value([StackId(0); KIND_COUNT]);
        for player in PlayerId::all() {
            for kind in PieceKind::ALL {
                bars[player][kind.index()] =
                    alloc(&mut stacks, &|id| Stack::holding(id, Origin::Bar, player, kind));
                trades[player][kind.index()] =
                    alloc(&mut stacks, &|id| Stack::holding(id, Origin::Trade, player, kind));
            }
        }
        for player in PlayerId::all() {
            for kind in PieceKind::ALL {
                racks[player][kind.index()] =
                    alloc(&mut stacks, &|id| Stack::holding(id, Origin::Rack, player, kind));
            }
        }
        let scratch = alloc(&mut stacks, &|id| Stack::scratch(id));

        let layout = Layout {
            size,
            racks,
            bars,
            trades,
            scratch,
        };

        let mut keys = GameRng::new(PIECE_KEY_SEED);
        let mut board = Self {
            config,
            layout,
            pieces: Pieces::new(),
            stacks,
            turn: Turn {
                whose_turn: PlayerId::FIRST,
                move_number: 1,
                state: State::Onboard2,
                unresign: None,
                chain: Chain::default(),
                dropped: None,
                placement_index: 1,
                win: PlayerMap::with_value(false),
            },
            undo: Vec::new(),
        };

        let counts = variation.piece_counts();
        let mut piece_number = 0u16;
        for player in PlayerId::all() {
            for kind in PieceKind::ALL {
                let rack = board.layout.racks[player][kind.index()];
                for _ in 0..counts[kind.index()] {
                    let id = PieceId(piece_number);
                    piece_number += 1;
                    board.pieces.push(Piece::new(id, player, kind, keys.next_u64()));
                    board.attach(id, rack, None);
                }
            }
        }
        board
    }

    /// A fresh board for `variation` with standard rules.
    #[must_use]
    pub fn for_variation(variation: Variation) -> Self {
        Self::new(EngineConfig::new(variation))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn variation(&self) -> Variation {
        self.config.variation
    }

    /// Board edge length.
    #[must_use]
    pub fn size(&self) -> usize {
        self.layout.size
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.turn.state
    }

    #[must_use]
    pub fn whose_turn(&self) -> PlayerId {
        self.turn.whose_turn
    }

    #[must_use]
    pub fn move_number(&self) -> u32 {
        self.turn.move_number
    }

    /// Bottom piece of the most recent drop.
    #[must_use]
    pub fn dropped_piece(&self) -> Option<PieceId> {
        self.turn.dropped
    }

    /// True if `Done` may be played now.
    #[must_use]
    pub fn done_state(&self) -> bool {
        self.turn.state.is_done_state()
    }

    /// True if the current state should be recorded for repetition checks.
    #[must_use]
    pub fn digest_state(&self) -> bool {
        self.turn.state.is_digest_state()
    }

    /// True if `player` has won. Both flags are false in a draw.
    #[must_use]
    pub fn has_won(&self, player: PlayerId) -> bool {
        self.turn.win[player]
    }

    /// The winner, once the game is over.
    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        PlayerId::all().find(|&p| self.turn.win[p])
    }

    /// The stack turned over for inspection, if any.
    #[must_use]
    pub fn flipped(&self) -> Option<FlipMark> {
        match self.turn.state {
            State::Flipped(mark) => Some(mark),
            _ => self.turn.chain.flip,
        }
    }

    #[must_use]
    pub fn pieces(&self) -> &Pieces {
        &self.pieces
    }

    #[must_use]
    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(id)
    }

    #[must_use]
    pub fn stack(&self, id: StackId) -> Option<&Stack> {
        self.stacks.get(id)
    }

    /// Every stack, in id order.
    pub fn stacks(&self) -> impl Iterator<Item = &Stack> {
        self.stacks.iter()
    }

    /// Stack id of a board cell.
    #[must_use]
    pub fn cell_id(&self, cell: Cell) -> Option<StackId> {
        let size = self.layout.size;
        let (col, row) = (usize::from(cell.col), usize::from(cell.row));
        (col < size && row < size).then(|| StackId((row * size + col) as u16))
    }

    /// The stack on a board cell.
    #[must_use]
    pub fn cell(&self, cell: Cell) -> Option<&Stack> {
        self.cell_id(cell).and_then(|id| self.stacks.get(id))
    }

    /// Every board cell, row by row.
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let size = self.layout.size as u8;
        (0..size).flat_map(move |row| (0..size).map(move |col| Cell::new(col, row)))
    }

    /// Board stacks, row by row.
    pub fn board_stacks(&self) -> impl Iterator<Item = &Stack> + '_ {
        self.cells().filter_map(move |c| self.cell(c))
    }

    #[must_use]
    pub fn rack(&self, player: PlayerId, kind: PieceKind) -> StackId {
        self.layout.racks[player][kind.index()]
    }

    #[must_use]
    pub fn bar(&self, player: PlayerId, kind: PieceKind) -> StackId {
        self.layout.bars[player][kind.index()]
    }

    #[must_use]
    pub fn trade(&self, player: PlayerId, kind: PieceKind) -> StackId {
        self.layout.trades[player][kind.index()]
    }

    /// The transit stack holding pieces in hand.
    #[must_use]
    pub fn in_hand(&self) -> &Stack {
        &self.stacks[self.layout.scratch]
    }

    /// `owner`'s stack for `kind` in an off-board area. Board and transit
    /// origins map to the transit stack.
    #[must_use]
    pub(crate) fn holding_stack(&self, owner: PlayerId, origin: Origin, kind: PieceKind) -> StackId {
        match origin {
            Origin::Rack => self.rack(owner, kind),
            Origin::Bar => self.bar(owner, kind),
            Origin::Trade => self.trade(owner, kind),
            Origin::Board | Origin::Scratch => self.layout.scratch,
        }
    }

    /// Every off-board stack of `player` with the given origin.
    pub fn holdings(&self, player: PlayerId, origin: Origin) -> impl Iterator<Item = &Stack> + '_ {
        let ids = match origin {
            Origin::Rack => self.layout.racks[player],
            Origin::Bar => self.layout.bars[player],
            Origin::Trade => self.layout.trades[player],
            Origin::Board | Origin::Scratch => [self.layout.scratch; KIND_COUNT],
        };
        let skip = matches!(origin, Origin::Board | Origin::Scratch);
        ids.into_iter().filter(move |_| !skip).map(move |id| &self.stacks[id])
    }

    /// Number of pieces in `player`'s holding of the given origin.
    #[must_use]
    pub fn holding_count(&self, player: PlayerId, origin: Origin) -> usize {
        self.holdings(player, origin).map(Stack::len).sum()
    }

    /// Point value of `player`'s holding of the given origin.
    #[must_use]
    pub fn holding_total(&self, player: PlayerId, origin: Origin) -> u32 {
        self.holdings(player, origin).map(|s| s.point_total(&self.pieces)).sum()
    }

    pub(crate) fn piece_checked(&self, id: PieceId) -> Result<&Piece, EngineError> {
        self.pieces.get(id).ok_or(EngineError::UnknownPiece(id.0))
    }

    pub(crate) fn stack_checked(&self, id: StackId) -> Result<&Stack, EngineError> {
        self.stacks.get(id).ok_or(EngineError::UnknownStack(id.0))
    }

    /// Stack currently holding `piece`.
    pub(crate) fn home_of(&self, piece: PieceId) -> Result<StackId, EngineError> {
        self.piece_checked(piece)?
            .stack()
            .ok_or(EngineError::UnknownPiece(piece.0))
    }

    // =========================================================================
    // Piece movement primitives
    // =========================================================================

    pub(crate) fn piece_mut(&mut self, id: PieceId) -> Result<&mut Piece, EngineError> {
        self.pieces.get_mut(id).ok_or(EngineError::UnknownPiece(id.0))
    }

    pub(crate) fn stack_mut(&mut self, id: StackId) -> Result<&mut Stack, EngineError> {
        self.stacks.get_mut(id).ok_or(EngineError::UnknownStack(id.0))
    }

    /// Remove a piece from whatever stack holds it. No-op if detached.
    pub(crate) fn remove_from_stack(&mut self, piece: PieceId) {
        let home = self.pieces.get(piece).and_then(Piece::stack);
        if let Some(stack) = home.and_then(|h| self.stacks.get_mut(h)) {
            stack.remove(piece);
        }
        if let Some(p) = self.pieces.get_mut(piece) {
            p.set_stack(None);
        }
    }

    /// Put a detached piece into `stack` at `index`, or on top.
    fn attach(&mut self, piece: PieceId, stack: StackId, index: Option<usize>) {
        if let Some(s) = self.stacks.get_mut(stack) {
            match index {
                Some(i) => s.insert(i, piece),
                None => s.push(piece),
            }
        }
        if let Some(p) = self.pieces.get_mut(piece) {
            p.set_stack(Some(stack));
        }
    }

    /// Move a piece onto the top of `stack`.
    pub(crate) fn add_to_stack(&mut self, piece: PieceId, stack: StackId) {
        self.remove_from_stack(piece);
        self.attach(piece, stack, None);
    }

    /// Lift `piece` and everything above it into the hand.
    pub(crate) fn split_from(&mut self, piece: PieceId) -> Result<(), EngineError> {
        let home = self.home_of(piece)?;
        let index = self.stack_checked(home)?.index_of(piece).ok_or(EngineError::UnknownPiece(piece.0))?;
        let lifted = self.stack_mut(home)?.split_off(index);
        trace!(piece = piece.0, stack = home.0, count = lifted.len(), "split_from");
        let scratch = self.layout.scratch;
        for p in lifted {
            self.attach(p, scratch, None);
        }
        Ok(())
    }

    /// Lift only `piece` into the hand.
    pub(crate) fn split_single(&mut self, piece: PieceId) -> Result<(), EngineError> {
        self.piece_checked(piece)?;
        self.remove_from_stack(piece);
        self.attach(piece, self.layout.scratch, None);
        Ok(())
    }

    /// Lift everything above `keep` pieces of `stack` into the hand.
    pub(crate) fn lift_above(&mut self, stack: StackId, keep: usize) -> Result<(), EngineError> {
        let lifted = self.stack_mut(stack)?.split_off(keep);
        let scratch = self.layout.scratch;
        for p in lifted {
            self.attach(p, scratch, None);
        }
        Ok(())
    }

    /// Put everything in hand into `target` at `level`.
    ///
    /// Returns the bottom piece of what was dropped.
    pub(crate) fn drop_hand(&mut self, target: StackId, level: Level) -> Result<Option<PieceId>, EngineError> {
        let scratch = self.layout.scratch;
        let carried = self.stack_mut(scratch)?.split_off(0);
        let Some(&bottom) = carried.first() else {
            return Ok(None);
        };
        let len = self.stack_checked(target)?.len();
        let start = match level {
            Level::At(i) if i < len => Some(i),
            _ => None,
        };
        for (offset, p) in carried.into_iter().enumerate() {
            self.attach(p, target, start.map(|i| i + offset));
        }
        trace!(target = target.0, level = level.code(), bottom = bottom.0, "drop_hand");
        Ok(Some(bottom))
    }

    /// Reveal the top face of the top piece of `stack`.
    pub(crate) fn reveal_top_of(&mut self, stack: StackId) {
        let top = self.stacks.get(stack).and_then(Stack::top);
        if let Some(p) = top.and_then(|t| self.pieces.get_mut(t)) {
            p.reveal_top();
        }
    }

    /// Reveal the top face of one piece.
    pub(crate) fn reveal_piece(&mut self, piece: PieceId) {
        if let Some(p) = self.pieces.get_mut(piece) {
            p.reveal_top();
        }
    }

    // =========================================================================
    // Visibility
    // =========================================================================

    /// Hide every piece of `player`'s opponent from `player`'s point of view
    /// except what is showing on the board.
    pub fn anonymize(&mut self, viewer: PlayerId) {
        let hidden: Vec<PieceId> = self
            .pieces
            .iter()
            .filter(|p| p.owner() != viewer)
            .map(Piece::id)
            .collect();
        for id in hidden {
            let on_board = self.piece(id).and_then(Piece::stack).and_then(|s| self.stack(s)).map(Stack::origin)
                == Some(Origin::Board);
            if let Some(p) = self.pieces.get_mut(id) {
                p.anonymize();
                if on_board {
                    p.reveal_top();
                }
            }
        }
    }

    /// Reveal every face of every piece, as at the end of a game.
    pub fn reveal_all(&mut self) {
        let ids: Vec<PieceId> = self.pieces.iter().map(Piece::id).collect();
        for id in ids {
            if let Some(p) = self.pieces.get_mut(id) {
                p.reveal_all();
            }
        }
    }

    // =========================================================================
    // Win conditions
    // =========================================================================

    /// True if `player` has met a winning condition on the current board.
    #[must_use]
    pub fn win_for_player_now(&self, player: PlayerId) -> bool {
        if self.turn.win[player] {
            return true;
        }
        if self.holding_count(player, Origin::Bar) >= self.config.win_captures {
            return true;
        }
        let height = self.config.win_stack_height;
        self.board_stacks().any(|s| s.contains_run(&self.pieces, player, height))
    }

    // =========================================================================
    // Snapshots and comparison
    // =========================================================================

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            pieces: self.pieces.clone(),
            stacks: self.stacks.clone(),
            turn: self.turn.clone(),
        }
    }

    pub(crate) fn restore(&mut self, snapshot: Snapshot) {
        self.pieces = snapshot.pieces;
        self.stacks = snapshot.stacks;
        self.turn = snapshot.turn;
    }

    /// Make this board an exact copy of `other`, discarding undo history.
    pub fn copy_from(&mut self, other: &Board) {
        *self = other.clone();
    }

    /// Check that `other` holds the same position, piece for piece, and
    /// digests identically.
    ///
    /// Unlike [`Board::digest`], this also compares the move in progress:
    /// two boards partway through different chains are not the same board.
    pub fn same_board(&self, other: &Board) -> PlateauResult<()> {
        let mismatch = |what: String| Err(EngineError::BoardMismatch(what).into());
        if self.config != other.config {
            return mismatch("configuration".into());
        }
        if self.turn.state != other.turn.state || self.turn.whose_turn != other.turn.whose_turn {
            return mismatch(format!(
                "turn {} {} vs {} {}",
                self.turn.whose_turn, self.turn.state, other.turn.whose_turn, other.turn.state
            ));
        }
        if self.turn.move_number != other.turn.move_number {
            return mismatch("move number".into());
        }
        if self.turn.chain != other.turn.chain {
            return mismatch(format!(
                "move in progress {:?}/{:?} vs {:?}/{:?}",
                self.turn.chain.origin(),
                self.turn.chain.step,
                other.turn.chain.origin(),
                other.turn.chain.step
            ));
        }
        for (a, b) in self.stacks.iter().zip(other.stacks.iter()) {
            if a.pieces() != b.pieces() {
                return mismatch(format!("stack {} ({})", a.id(), a.locus()));
            }
        }
        for (a, b) in self.pieces.iter().zip(other.pieces.iter()) {
            if a != b {
                return mismatch(format!("piece {}", a.id()));
            }
        }
        let (left, right) = (self.digest(), other.digest());
        if left != right {
            return Err(EngineError::DigestMismatch { left, right }.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_layout() {
        let board = Board::default();
        assert_eq!(board.size(), 4);
        assert_eq!(board.state(), State::Onboard2);
        assert_eq!(board.whose_turn(), PlayerId::FIRST);
        assert_eq!(board.pieces().len(), 24);
        assert_eq!(board.cell_id(Cell::new(1, 2)), Some(StackId(9)));
        assert!(board.cell_id(Cell::new(4, 0)).is_none());
        assert_eq!(board.holding_count(PlayerId::SECOND, Origin::Rack), 12);
        assert!(board.in_hand().is_empty());
    }

    #[test]
    fn test_racks_sorted_by_kind() {
        let board = Board::default();
        for player in PlayerId::all() {
            for kind in PieceKind::ALL {
                let rack = board.stack(board.rack(player, kind)).unwrap();
                assert_eq!(rack.kind(), Some(kind));
                for &p in rack.pieces() {
                    assert_eq!(board.pieces()[p].kind(), kind);
                    assert_eq!(board.pieces()[p].owner(), player);
                    assert_eq!(board.pieces()[p].stack(), Some(rack.id()));
                }
            }
        }
    }

    #[test]
    fn test_split_and_drop() {
        let mut board = Board::default();
        let rack = board.rack(PlayerId::FIRST, PieceKind::Mute);
        let pieces: Vec<_> = board.stack(rack).unwrap().pieces().to_vec();
        board.split_from(pieces[2]).unwrap();
        assert_eq!(board.in_hand().len(), 2);
        assert_eq!(board.stack(rack).unwrap().len(), 2);

        let a1 = board.cell_id(Cell::new(0, 0)).unwrap();
        let bottom = board.drop_hand(a1, Level::Top).unwrap();
        assert_eq!(bottom, Some(pieces[2]));
        assert_eq!(board.cell(Cell::new(0, 0)).unwrap().len(), 2);
        assert_eq!(board.piece(pieces[3]).unwrap().stack(), Some(a1));
    }

    #[test]
    fn test_drop_at_level_inserts() {
        let mut board = Board::default();
        let a1 = board.cell_id(Cell::new(0, 0)).unwrap();
        let rack = board.rack(PlayerId::FIRST, PieceKind::Red);
        let reds: Vec<_> = board.stack(rack).unwrap().pieces().to_vec();
        board.add_to_stack(reds[0], a1);
        board.split_single(reds[1]).unwrap();
        board.drop_hand(a1, Level::At(0)).unwrap();
        assert_eq!(board.cell(Cell::new(0, 0)).unwrap().pieces(), &[reds[1], reds[0]]);
    }

    #[test]
    fn test_clone_same_board() {
        let board = Board::default();
        let copy = board.clone();
        assert!(board.same_board(&copy).is_ok());

        let mut moved = board.clone();
        let a1 = moved.cell_id(Cell::new(0, 0)).unwrap();
        let rack = moved.rack(PlayerId::FIRST, PieceKind::Mute);
        let top = moved.stack(rack).unwrap().top().unwrap();
        moved.add_to_stack(top, a1);
        assert!(board.same_board(&moved).is_err());
    }

    #[test]
    fn test_same_board_compares_chain() {
        let board = Board::default();
        let a1 = board.cell_id(Cell::new(0, 0)).unwrap();
        let mut chained = board.clone();
        chained.turn.chain.hops.push(Hop {
            stack: a1,
            before: PieceList::new(),
        });
        chained.turn.chain.step = Some(0);

        // Same pieces, same digest, different move in progress.
        assert_eq!(chained.digest(), board.digest());
        assert!(matches!(
            board.same_board(&chained),
            Err(crate::core::PlateauError::Engine(EngineError::BoardMismatch(_)))
        ));

        chained.turn.chain.clear();
        assert!(board.same_board(&chained).is_ok());
    }
}
