//! Position digests.
//!
//! A digest is a 64-bit hash of everything that makes two positions the
//! same for play: the order of pieces in every board stack, the contents of
//! every rack, bar, and trade, the pieces in hand, the turn state, and the
//! player to move. It ignores history, visibility, and the undo stack.
//!
//! The salt stream is re-seeded on every call, so structurally equal boards
//! always digest identically.

use super::board::Board;
use crate::core::{GameRng, PlayerId};
use crate::pieces::{Origin, Pieces, Stack};

const DIGEST_SEED: u64 = 64_000;

impl Board {
    /// Hash of the current position.
    #[must_use]
    pub fn digest(&self) -> u64 {
        let mut rng = GameRng::new(DIGEST_SEED);
        let mut v = 0u64;

        for stack in self.board_stacks() {
            let salt = rng.next_u64();
            v ^= salt ^ ordered_digest(stack, &self.pieces, &mut rng);
        }
        for player in PlayerId::all() {
            for origin in [Origin::Rack, Origin::Bar, Origin::Trade] {
                for stack in self.holdings(player, origin) {
                    v ^= rng.next_u64() ^ unordered_digest(stack, &self.pieces);
                }
            }
        }
        v ^= rng.next_u64() ^ unordered_digest(self.in_hand(), &self.pieces);

        let state = self.turn.state.ordinal() * 10 + self.turn.whose_turn.index() as u64 + 1;
        v ^ rng.next_u64().wrapping_mul(state)
    }
}

/// Bottom-to-top: swapping two pieces changes the result.
fn ordered_digest(stack: &Stack, pieces: &Pieces, rng: &mut GameRng) -> u64 {
    stack
        .pieces()
        .iter()
        .fold(rng.next_u64(), |acc, &p| acc ^ pieces[p].digest(rng))
}

fn unordered_digest(stack: &Stack, pieces: &Pieces) -> u64 {
    stack
        .pieces()
        .iter()
        .fold(0, |acc, &p| acc ^ pieces[p].identity_digest())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Cell;
    use crate::moves::Level;
    use crate::pieces::PieceKind;

    #[test]
    fn test_digest_is_stable() {
        let a = Board::default();
        let b = Board::default();
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest(), a.digest());
    }

    #[test]
    fn test_digest_sees_order_and_turn() {
        let mut board = Board::default();
        let a1 = board.cell_id(Cell::new(0, 0)).unwrap();
        let red = board.stack(board.rack(PlayerId::FIRST, PieceKind::Red)).unwrap().top().unwrap();
        let blue = board.stack(board.rack(PlayerId::FIRST, PieceKind::Blue)).unwrap().top().unwrap();

        let mut up = board.clone();
        up.add_to_stack(red, a1);
        up.add_to_stack(blue, a1);
        let mut down = board.clone();
        down.add_to_stack(blue, a1);
        down.add_to_stack(red, a1);
        assert_ne!(up.digest(), down.digest());

        let mut other_turn = up.clone();
        other_turn.turn.whose_turn = PlayerId::SECOND;
        assert_ne!(up.digest(), other_turn.digest());

        board.split_single(red).unwrap();
        let carrying = board.digest();
        board.drop_hand(board.rack(PlayerId::FIRST, PieceKind::Red), Level::Top).unwrap();
        assert_ne!(carrying, board.digest());
        assert_eq!(board.digest(), Board::default().digest());
    }

    #[test]
    fn test_digest_ignores_visibility() {
        let mut board = Board::default();
        let before = board.digest();
        board.reveal_all();
        assert_eq!(before, board.digest());
    }
}
