//! Move generation.
//!
//! The generator proposes a superset of plausible moves for the current
//! state and keeps exactly those [`Board::legal_move`] accepts, so the two
//! never disagree. `Pick`, `Resign`, `Start`, `Edit`, and `GameOverOnTime`
//! are never proposed: they are interface moves, not game choices.
//!
//! When the mover has nothing at all in Play, Flipped, or PlayUndone, the
//! list is a single `Pass`.

use smallvec::smallvec;

use crate::board::{Board, State};
use crate::core::Cell;
use crate::moves::{Colors, Level, Move, MoveOp, PieceIds};
use crate::pieces::{Face, Origin, PieceId, PieceKind, Stack};

/// Captives beyond this are not enumerated as exchange offers.
const MAX_OFFER_POOL: usize = 12;

/// Generator switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenOptions {
    /// Keep flips that can reveal nothing: mono-colour pieces in Play and
    /// turning a flipped piece straight back.
    pub include_redundant_flips: bool,
}

impl Default for GenOptions {
    fn default() -> Self {
        Self {
            include_redundant_flips: true,
        }
    }
}

impl Board {
    /// Every legal move for the player to move.
    #[must_use]
    pub fn list_moves(&self) -> Vec<Move> {
        self.list_moves_with(GenOptions::default())
    }

    /// Legal moves, filtered by `options`.
    ///
    /// Dropping redundant flips never empties the list: if they were the
    /// only moves, they are kept.
    #[must_use]
    pub fn list_moves_with(&self, options: GenOptions) -> Vec<Move> {
        let moves = self.core_moves();
        if moves.is_empty() {
            let pass = Move::new(self.turn.whose_turn, MoveOp::Pass);
            return if self.legal_move(&pass) { vec![pass] } else { moves };
        }
        if options.include_redundant_flips {
            return moves;
        }
        let trimmed: Vec<Move> = moves.iter().filter(|m| !self.redundant_flip(m)).cloned().collect();
        if trimmed.is_empty() {
            moves
        } else {
            trimmed
        }
    }

    fn redundant_flip(&self, mv: &Move) -> bool {
        let MoveOp::Flip { piece, .. } = mv.op else {
            return false;
        };
        match self.turn.state {
            State::Play => self.piece(piece).is_some_and(|p| p.is_mono_color()),
            State::Flipped(mark) => mark.piece == piece,
            _ => false,
        }
    }

    /// Legal moves, before the `Pass` fallback.
    pub(crate) fn core_moves(&self) -> Vec<Move> {
        let mut ops = Vec::new();
        match self.turn.state {
            State::Play => {
                self.onboard_candidates(&mut ops);
                for stack in self.board_stacks() {
                    if stack.top_owner(&self.pieces) == Some(self.turn.whose_turn) {
                        self.from_to_candidates(stack, stack.take_off_height(&self.pieces), &mut ops);
                        self.flip_candidate(stack, &mut ops);
                    }
                }
                self.offer_candidates(&mut ops);
            }
            State::Flipped(mark) => {
                if let Some(stack) = self.stack(mark.stack) {
                    self.from_to_candidates(stack, stack.take_off_height(&self.pieces), &mut ops);
                    self.flip_candidate(stack, &mut ops);
                }
            }
            State::PlayDone | State::PlayCapture | State::PlayUndone | State::Draw => {
                ops.push(MoveOp::Done);
                self.continuation_candidates(&mut ops);
            }
            State::PlayDrop | State::RackDrop | State::Rack2Drop | State::OnboardDrop | State::Onboard2Drop => {
                self.drop_candidates(&mut ops);
            }
            State::Onboard2 => self.opening_candidates(&mut ops),
            State::CaptiveShuffle | State::Exchange | State::ExchangeDone => {
                ops.push(MoveOp::Done);
                self.offer_candidates(&mut ops);
            }
            State::Resign | State::Onboard2Done | State::OnboardDone => ops.push(MoveOp::Done),
            State::Puzzle | State::GameOver => {}
        }

        let me = self.turn.whose_turn;
        ops.into_iter()
            .map(|op| Move::new(me, op))
            .filter(|m| self.legal_move(m))
            .collect()
    }

    // =========================================================================
    // Candidates
    // =========================================================================

    /// Single rack pieces onto any cell, in either orientation.
    fn onboard_candidates(&self, ops: &mut Vec<MoveOp>) {
        for kind in PieceKind::ALL {
            let Some(piece) = self.stack(self.rack(self.turn.whose_turn, kind)).and_then(Stack::top) else {
                continue;
            };
            for colors in orientations(kind) {
                for cell in self.cells() {
                    let len = self.cell(cell).map_or(0, Stack::len);
                    for level in std::iter::once(Level::Top).chain((0..len).map(Level::At)) {
                        ops.push(MoveOp::Onboard {
                            to: cell,
                            level,
                            colors: Colors(smallvec![colors]),
                            pieces: smallvec![piece],
                        });
                    }
                }
            }
        }
    }

    /// Opening pairs: a rack top and whatever is exposed once it is gone.
    fn opening_candidates(&self, ops: &mut Vec<MoveOp>) {
        let me = self.turn.whose_turn;
        let tops: Vec<PieceId> = self.holdings(me, Origin::Rack).filter_map(Stack::top).collect();
        let edges: Vec<Cell> = self
            .cells()
            .filter(|c| c.is_edge(self.size()) && self.cell(*c).is_some_and(Stack::is_empty))
            .collect();

        for &first in &tops {
            let Some(rack) = self.piece(first).and_then(|p| p.stack()).and_then(|s| self.stack(s)) else {
                continue;
            };
            let under = rack.len().checked_sub(2).and_then(|i| rack.get(i));
            let seconds = tops.iter().copied().filter(|&p| p != first).chain(under);
            for second in seconds {
                let (Some(a), Some(b)) = (self.piece(first), self.piece(second)) else {
                    continue;
                };
                for top_colors in orientations(a.kind()) {
                    for bottom_colors in orientations(b.kind()) {
                        for &cell in &edges {
                            ops.push(MoveOp::Onboard {
                                to: cell,
                                level: Level::Top,
                                colors: Colors(smallvec![top_colors, bottom_colors]),
                                pieces: smallvec![first, second],
                            });
                        }
                    }
                }
            }
        }
    }

    /// Lifts of 1..=`max_height` pieces off `stack` to every cell.
    fn from_to_candidates(&self, stack: &Stack, max_height: usize, ops: &mut Vec<MoveOp>) {
        let Some(from) = stack.cell() else {
            return;
        };
        for height in 1..=max_height.min(stack.len()) {
            let lifted = &stack.pieces()[stack.len() - height..];
            let colors = Colors(
                lifted
                    .iter()
                    .rev()
                    .map(|&p| (self.pieces[p].real_top(), self.pieces[p].real_bottom()))
                    .collect(),
            );
            for to in self.cells() {
                ops.push(MoveOp::FromTo {
                    from,
                    height,
                    colors: colors.clone(),
                    to,
                });
            }
        }
    }

    fn flip_candidate(&self, stack: &Stack, ops: &mut Vec<MoveOp>) {
        if let Some(piece) = stack.top().and_then(|t| self.piece(t)) {
            ops.push(MoveOp::Flip {
                piece: piece.id(),
                locus: stack.locus(),
                color: piece.real_bottom(),
            });
        }
    }

    /// Carrying on from the stack the move last landed on.
    fn continuation_candidates(&self, ops: &mut Vec<MoveOp>) {
        let Some(hop) = self.turn.chain.current() else {
            return;
        };
        if let Some(stack) = self.stack(hop.stack) {
            let moving = stack.len().saturating_sub(hop.before.len());
            self.from_to_candidates(stack, moving, ops);
        }
    }

    fn drop_candidates(&self, ops: &mut Vec<MoveOp>) {
        let scratch = self.in_hand().id();
        for stack in self.stacks().filter(|s| s.id() != scratch) {
            ops.push(MoveOp::Drop {
                stack: Some(stack.id()),
                level: Level::Top,
                locus: None,
            });
            if self.turn.state == State::OnboardDrop && stack.origin() == Origin::Board {
                for i in 0..stack.len() {
                    ops.push(MoveOp::Drop {
                        stack: Some(stack.id()),
                        level: Level::At(i),
                        locus: None,
                    });
                }
            }
        }
        ops.push(MoveOp::Drop {
            stack: None,
            level: Level::Return,
            locus: None,
        });
    }

    /// Every subset of the mover's captives as an offer.
    fn offer_candidates(&self, ops: &mut Vec<MoveOp>) {
        let mut pool = self.captives(self.turn.whose_turn);
        pool.truncate(MAX_OFFER_POOL);
        for mask in 0u32..(1 << pool.len()) {
            let pieces: PieceIds = pool
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, &p)| p)
                .collect();
            ops.push(MoveOp::Exchange { pieces });
        }
    }
}

/// Face pairs `kind` can be placed with, top first.
fn orientations(kind: PieceKind) -> impl Iterator<Item = (Face, Face)> {
    let (a, b) = kind.faces();
    std::iter::once((a, b)).chain((a != b).then_some((b, a)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ReplayMode;
    use crate::core::PlayerId;

    fn play(board: &mut Board, text: &str) {
        let mv = Move::parse(text, board.whose_turn()).unwrap();
        board.execute(&mv, ReplayMode::Live).unwrap();
    }

    #[test]
    fn test_opening_moves() {
        let board = Board::default();
        let moves = board.list_moves();
        assert!(!moves.is_empty());
        for mv in &moves {
            assert!(matches!(mv.op, MoveOp::Onboard { ref pieces, .. } if pieces.len() == 2), "{mv}");
            assert!(board.legal_move(mv));
        }
    }

    #[test]
    fn test_generated_moves_execute() {
        let mut board = Board::default();
        for _ in 0..6 {
            let moves = board.list_moves();
            let Some(mv) = moves.first().cloned() else {
                break;
            };
            let mut probe = board.clone();
            for candidate in &moves {
                probe.execute(candidate, ReplayMode::Live).unwrap();
                probe.un_execute(candidate).unwrap();
            }
            play(&mut board, &mv.to_string());
        }
    }

    #[test]
    fn test_carrying_offers_drops() {
        let mut board = Board::default();
        let red = board.stack(board.rack(PlayerId::FIRST, PieceKind::Red)).unwrap().top().unwrap();
        let blue = board.stack(board.rack(PlayerId::FIRST, PieceKind::Blue)).unwrap().top().unwrap();
        play(&mut board, &format!("Onboard A1 100 RXBX {},{}", red.0, blue.0));
        play(&mut board, "Done");
        let mute = board.stack(board.rack(PlayerId::SECOND, PieceKind::Mute)).unwrap().top().unwrap();
        play(&mut board, &format!("Pick {}", mute.0));
        assert_eq!(board.state(), State::OnboardDrop);

        let moves = board.list_moves();
        assert!(moves.iter().all(|m| matches!(m.op, MoveOp::Drop { .. })));
        // Back to the rack, or any empty cell.
        assert!(moves.iter().any(|m| matches!(m.op, MoveOp::Drop { stack: None, .. })));
        assert!(moves.len() >= 15);
    }

    #[test]
    fn test_redundant_flips_filtered() {
        let mut board = Board::default();
        let mask = board.stack(board.rack(PlayerId::FIRST, PieceKind::RedMask)).unwrap().top().unwrap();
        let mute = board.stack(board.rack(PlayerId::FIRST, PieceKind::Mute)).unwrap().top().unwrap();
        play(&mut board, &format!("Onboard A1 100 RRXX {},{}", mask.0, mute.0));
        play(&mut board, "Done");
        let theirs = board.stack(board.rack(PlayerId::SECOND, PieceKind::Mute)).unwrap().top().unwrap();
        play(&mut board, &format!("Onboard D4 100 XX {}", theirs.0));
        play(&mut board, "Done");

        let flip_of_mask = |m: &Move| matches!(m.op, MoveOp::Flip { piece, .. } if piece == mask);
        assert!(board.list_moves().iter().any(flip_of_mask));
        let trimmed = board.list_moves_with(GenOptions {
            include_redundant_flips: false,
        });
        assert!(!trimmed.iter().any(flip_of_mask));
        assert!(!trimmed.is_empty());
    }
}
