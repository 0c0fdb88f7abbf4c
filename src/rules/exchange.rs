//! Prisoner exchange arithmetic.
//!
//! A player who holds captives may offer some of them back. The responder
//! must answer with at least the best they could do without overpaying:
//! the largest subset total of their own captives that does not exceed the
//! offer on the table.

use crate::board::Board;
use crate::core::PlayerId;
use crate::pieces::{Origin, PieceId};

/// Largest sum of a subset of `values` that does not exceed `ask`.
///
/// Captive counts are small (a player wins at six), so this enumerates
/// subsets directly.
#[must_use]
pub fn largest_subset_below(values: &[u32], ask: u32) -> u32 {
    let n = values.len().min(20);
    let mut best = 0;
    for mask in 0u32..(1 << n) {
        let total: u32 = (0..n).filter(|i| mask & (1 << i) != 0).map(|i| values[i]).sum();
        if total <= ask && total > best {
            best = total;
            if best == ask {
                break;
            }
        }
    }
    best
}

impl Board {
    /// Captives `player` holds, on the bar and on offer.
    #[must_use]
    pub fn captives(&self, player: PlayerId) -> Vec<PieceId> {
        [Origin::Bar, Origin::Trade]
            .into_iter()
            .flat_map(|origin| self.holdings(player, origin))
            .flat_map(|s| s.pieces().iter().copied())
            .collect()
    }

    /// Smallest offer `player` may make in response to the opponent's.
    #[must_use]
    pub fn min_acceptable(&self, player: PlayerId) -> u32 {
        let values: Vec<u32> = self
            .captives(player)
            .into_iter()
            .map(|p| self.pieces[p].kind().value())
            .collect();
        largest_subset_below(&values, self.holding_total(player.other(), Origin::Trade))
    }

    /// True if the mover's current offer answers the opponent's.
    #[must_use]
    pub fn exchange_is_legal(&self) -> bool {
        let me = self.turn.whose_turn;
        self.holding_total(me, Origin::Trade) >= self.min_acceptable(me)
    }
}
