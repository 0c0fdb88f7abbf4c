//! A game in progress.
//!
//! [`Game`] wraps a [`Board`] with everything a host needs around it: the
//! compacted move log, the full list of executed moves for undo and for the
//! game record, and repetition counting.
//!
//! ## Repetition
//!
//! Each time the turn passes into Play, the position digest is counted. The
//! third occurrence of the same position offers a draw, which the mover
//! accepts with `Done`.

use rustc_hash::FxHashMap;
use tracing::info;

use crate::board::{Board, ReplayMode, State, Transition};
use crate::core::{EngineConfig, PlateauResult, PlayerId};
use crate::moves::{GameRecord, LogEntry, Move, MoveLog, MoveOp};

/// Occurrences of a position that offer a draw.
pub const REPETITION_LIMIT: u32 = 3;

/// What `undo` needs beyond the board's own snapshot.
#[derive(Clone, Debug)]
struct Played {
    mv: Move,
    log: MoveLog,
    counted: Option<u64>,
}

/// A board plus its history.
#[derive(Clone, Debug)]
pub struct Game {
    board: Board,
    log: MoveLog,
    played: Vec<Played>,
    repetitions: FxHashMap<u64, u32>,
    compact: bool,
}

impl Default for Game {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Game {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            board: Board::new(config),
            log: MoveLog::new(),
            played: Vec::new(),
            repetitions: FxHashMap::default(),
            compact: true,
        }
    }

    /// Keep every move in the log instead of compacting it.
    #[must_use]
    pub fn without_compaction(mut self) -> Self {
        self.compact = false;
        self
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn log(&self) -> &MoveLog {
        &self.log
    }

    /// Every executed move, including those compaction dropped from the log.
    pub fn played(&self) -> impl Iterator<Item = &Move> {
        self.played.iter().map(|p| &p.mv)
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.board.state().is_game_over()
    }

    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        self.board.winner()
    }

    /// Times the current position has been reached at the start of a turn.
    #[must_use]
    pub fn repetitions(&self) -> u32 {
        self.repetitions.get(&self.board.digest()).copied().unwrap_or(0)
    }

    /// Execute `mv` for real.
    pub fn play(&mut self, mv: &Move) -> PlateauResult<Transition> {
        let state_before = self.board.state();
        let digest_before = self.board.digest();
        let (picked, from) = match mv.op {
            MoveOp::Pick { piece, .. } => (Some(piece), self.board.piece(piece).and_then(|p| p.stack())),
            _ => (None, None),
        };
        let to = match mv.op {
            MoveOp::Drop { stack, .. } => stack.or_else(|| self.board.turn.chain.origin()),
            _ => None,
        };

        let transition = self.board.execute(mv, ReplayMode::Live)?;
        let snapshot = self.log.clone();

        let entry = LogEntry {
            mv: mv.clone(),
            state_before,
            state_after: transition.after,
            digest_before,
            digest_after: self.board.digest(),
            picked,
            from,
            to,
        };
        if self.compact {
            self.log.push(entry);
        } else {
            self.log.push_raw(entry);
        }

        let mut counted = None;
        if transition.turn_passed() && transition.after == State::Play {
            let digest = self.board.digest();
            let seen = self.repetitions.entry(digest).or_insert(0);
            *seen += 1;
            counted = Some(digest);
            if *seen >= REPETITION_LIMIT {
                info!(digest, occurrences = *seen, "repeated position");
                self.board.set_draw_state();
            }
        }

        self.played.push(Played {
            mv: mv.clone(),
            log: snapshot,
            counted,
        });
        Ok(transition)
    }

    /// Parse and execute a move for the player to move.
    pub fn play_text(&mut self, text: &str) -> PlateauResult<Transition> {
        let mv = Move::parse(text, self.board.whose_turn())?;
        self.play(&mv)
    }

    /// Take back the last move. Returns it, or `None` if nothing was played.
    pub fn undo(&mut self) -> PlateauResult<Option<Move>> {
        let Some(last) = self.played.pop() else {
            return Ok(None);
        };
        if let Err(e) = self.board.un_execute(&last.mv) {
            self.played.push(last);
            return Err(e);
        }
        if let Some(digest) = last.counted {
            if let Some(seen) = self.repetitions.get_mut(&digest) {
                *seen = seen.saturating_sub(1);
            }
        }
        self.log = last.log;
        Ok(Some(last.mv))
    }

    /// The game so far, as a replayable record.
    #[must_use]
    pub fn record(&self) -> GameRecord {
        let mut record = GameRecord::new(self.board.config().clone());
        for p in &self.played {
            record.push(&p.mv);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pieces::PieceKind;

    fn open(game: &mut Game) {
        let board = game.board();
        let red = board.stack(board.rack(PlayerId::FIRST, PieceKind::Red)).unwrap().top().unwrap();
        let blue = board.stack(board.rack(PlayerId::FIRST, PieceKind::Blue)).unwrap().top().unwrap();
        game.play_text(&format!("Onboard A1 100 RXBX {},{}", red.0, blue.0)).unwrap();
        game.play_text("Done").unwrap();
    }

    #[test]
    fn test_play_and_undo() {
        let mut game = Game::default();
        let fresh = game.board().digest();
        open(&mut game);
        assert_eq!(game.log().len(), 2);
        assert_eq!(game.board().state(), State::Play);

        assert!(game.undo().unwrap().is_some());
        assert!(game.undo().unwrap().is_some());
        assert!(game.undo().unwrap().is_none());
        assert_eq!(game.board().digest(), fresh);
        assert!(game.log().is_empty());
    }

    #[test]
    fn test_cancelled_pick_leaves_no_trace() {
        let mut game = Game::default();
        open(&mut game);
        let mute = {
            let b = game.board();
            b.stack(b.rack(PlayerId::SECOND, PieceKind::Mute)).unwrap().top().unwrap()
        };
        game.play_text(&format!("Pick {}", mute.0)).unwrap();
        game.play_text("Drop -1 -1").unwrap();
        assert_eq!(game.board().state(), State::Play);
        assert_eq!(game.log().len(), 2);
        assert_eq!(game.played().count(), 4);
    }

    #[test]
    fn test_record_replays() {
        let mut game = Game::default();
        open(&mut game);
        let replayed = game.record().replay().unwrap();
        assert!(replayed.same_board(game.board()).is_ok());
    }
}
