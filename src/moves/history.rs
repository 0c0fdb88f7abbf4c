//! The move log of a game.
//!
//! Interactive play produces a lot of noise: a stack picked up and put
//! straight back, a piece flipped twice, a resignation withdrawn. After each
//! append the log looks at its tail and removes same-player sequences that
//! had no net effect. Whether a sequence had no effect is decided by the
//! position digests recorded around each move, never by the move text alone.
//!
//! Nothing is compacted while the board is in Puzzle.
//!
//! The log is an `im::Vector`, so cloning a game's history for a robot or a
//! replay costs nothing until one side changes.

use im::Vector;
use serde::{Deserialize, Serialize};

use super::protocol::{Move, MoveOp};
use crate::board::State;
use crate::pieces::{PieceId, StackId};

/// One executed move and what it did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub mv: Move,
    pub state_before: State,
    pub state_after: State,
    pub digest_before: u64,
    pub digest_after: u64,
    /// Piece lifted by a `Pick`.
    pub picked: Option<PieceId>,
    /// Stack a `Pick` lifted from.
    pub from: Option<StackId>,
    /// Stack a `Drop` landed on.
    pub to: Option<StackId>,
}

impl LogEntry {
    fn is_pick(&self) -> bool {
        matches!(self.mv.op, MoveOp::Pick { .. })
    }

    fn is_drop(&self) -> bool {
        matches!(self.mv.op, MoveOp::Drop { .. })
    }

    fn in_puzzle(&self) -> bool {
        self.state_before == State::Puzzle || self.state_after == State::Puzzle
    }
}

/// Ordered history of executed moves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveLog {
    entries: Vector<LogEntry>,
}

impl MoveLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// The moves in order.
    pub fn moves(&self) -> impl Iterator<Item = &Move> {
        self.entries.iter().map(|e| &e.mv)
    }

    #[must_use]
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    /// Append without compacting.
    pub fn push_raw(&mut self, entry: LogEntry) {
        self.entries.push_back(entry);
    }

    /// Append, then compact the tail. Returns how many entries were removed.
    pub fn push(&mut self, entry: LogEntry) -> usize {
        self.entries.push_back(entry);
        self.compact()
    }

    /// Remove the last entry, as when a move is taken back.
    pub fn pop(&mut self) -> Option<LogEntry> {
        self.entries.pop_back()
    }

    /// Apply the compaction rules to the tail until none fires.
    pub fn compact(&mut self) -> usize {
        let start = self.entries.len();
        while self.compact_once() {}
        start - self.entries.len()
    }

    fn compact_once(&mut self) -> bool {
        let n = self.entries.len();
        if n < 2 {
            return false;
        }
        let last = &self.entries[n - 1];
        let prev = &self.entries[n - 2];
        let pair = last.mv.player == prev.mv.player && !last.in_puzzle() && !prev.in_puzzle();

        let cancels_pair = pair
            && match (&prev.mv.op, &last.mv.op) {
                (MoveOp::Resign, MoveOp::Resign) => true,
                (MoveOp::Flip { piece: a, .. }, MoveOp::Flip { piece: b, .. }) => a == b,
                // Dropped somewhere and picked straight back up.
                (MoveOp::Drop { .. }, MoveOp::Pick { .. }) => {
                    prev.to == last.from && prev.digest_before == last.digest_after
                }
                _ => false,
            };
        if cancels_pair {
            return self.remove_range(n - 2, n);
        }

        // Pick p, Drop B, Pick p again, Drop C: the stop at B never happened.
        if n >= 4 && self.rerouted(n - 4) {
            return self.remove_range(n - 3, n - 1);
        }

        self.cancel_run()
    }

    fn rerouted(&self, at: usize) -> bool {
        let window: Vec<&LogEntry> = self.entries.iter().skip(at).take(4).collect();
        let &[first, stop, repick, last] = window.as_slice() else {
            return false;
        };
        window.iter().all(|e| e.mv.player == first.mv.player && !e.in_puzzle())
            && first.is_pick()
            && stop.is_drop()
            && repick.is_pick()
            && last.is_drop()
            && first.picked.is_some()
            && first.picked == repick.picked
            && first.digest_after == repick.digest_after
    }

    /// A drop that puts the board back to where a run of the same player's
    /// pick/drop work began cancels the whole run.
    fn cancel_run(&mut self) -> bool {
        let Some(last) = self.entries.last() else {
            return false;
        };
        if !last.is_drop() || last.in_puzzle() {
            return false;
        }
        let player = last.mv.player;
        let (target_digest, target_state) = (last.digest_after, last.state_after);

        let mut start = None;
        for (i, entry) in self.entries.iter().enumerate().rev() {
            let in_run = entry.mv.player == player
                && !entry.in_puzzle()
                && matches!(
                    entry.mv.op,
                    MoveOp::Pick { .. } | MoveOp::Drop { .. } | MoveOp::Onboard { .. } | MoveOp::FromTo { .. }
                );
            if !in_run {
                break;
            }
            if entry.digest_before == target_digest && entry.state_before == target_state {
                start = Some(i);
            }
        }
        match start {
            Some(i) => self.remove_range(i, self.entries.len()),
            None => false,
        }
    }

    fn remove_range(&mut self, from: usize, to: usize) -> bool {
        let tail = self.entries.split_off(from);
        self.entries.append(tail.skip(to - from));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlayerId;

    fn entry(text: &str, before: (State, u64), after: (State, u64)) -> LogEntry {
        LogEntry {
            mv: Move::parse(text, PlayerId::FIRST).unwrap(),
            state_before: before.0,
            state_after: after.0,
            digest_before: before.1,
            digest_after: after.1,
            picked: None,
            from: None,
            to: None,
        }
    }

    #[test]
    fn test_resign_twice_vanishes() {
        let mut log = MoveLog::new();
        log.push(entry("Resign", (State::Play, 1), (State::Resign, 2)));
        assert_eq!(log.push(entry("Resign", (State::Resign, 2), (State::Play, 1))), 2);
        assert!(log.is_empty());
    }

    #[test]
    fn test_pick_drop_back_vanishes() {
        let mut log = MoveLog::new();
        log.push(entry("Done", (State::OnboardDone, 7), (State::Play, 1)));
        log.push(entry("Pick 3", (State::Play, 1), (State::PlayDrop, 2)));
        log.push(entry("Drop 0 100", (State::PlayDrop, 2), (State::Play, 1)));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_puzzle_is_never_compacted() {
        let mut log = MoveLog::new();
        log.push(entry("Pick 3", (State::Puzzle, 1), (State::Puzzle, 2)));
        log.push(entry("Drop 0 100", (State::Puzzle, 2), (State::Puzzle, 1)));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_real_move_is_kept() {
        let mut log = MoveLog::new();
        log.push(entry("Pick 3", (State::Play, 1), (State::PlayDrop, 2)));
        log.push(entry("Drop 5 100", (State::PlayDrop, 2), (State::PlayDone, 3)));
        log.push(entry("Done", (State::PlayDone, 3), (State::Play, 4)));
        assert_eq!(log.len(), 3);
        assert_eq!(log.moves().last().map(ToString::to_string).as_deref(), Some("Done"));
    }

    #[test]
    fn test_rerouted_stop_is_removed() {
        let mut log = MoveLog::new();
        let mut pick = entry("Pick 3", (State::Play, 1), (State::PlayDrop, 2));
        pick.picked = Some(PieceId(3));
        let mut drop_b = entry("Drop 5 100", (State::PlayDrop, 2), (State::PlayDone, 3));
        drop_b.to = Some(StackId(5));
        let mut repick = entry("Pick 3", (State::PlayDone, 3), (State::PlayDrop, 2));
        repick.picked = Some(PieceId(3));
        repick.from = Some(StackId(9));
        let drop_c = entry("Drop 6 100", (State::PlayDrop, 2), (State::PlayDone, 4));
        log.push(pick);
        log.push(drop_b);
        log.push(repick);
        log.push(drop_c);
        let texts: Vec<String> = log.moves().map(ToString::to_string).collect();
        assert_eq!(texts, ["Pick 3", "Drop 6 100"]);
    }
}
