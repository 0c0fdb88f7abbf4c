//! Move execution.
//!
//! [`Board::execute`] is the only way a game advances. Every move is broken
//! into pick, drop, and flip micro-steps that drive the turn state machine;
//! compound moves (`Onboard`, `FromTo`) are just scripted sequences of them.
//!
//! ## Move chains
//!
//! A board move may stop on several cells before it is finished. The chain
//! records each stop (`Hop`) along with what that stack held before the move
//! reached it. `step` names the hop the pieces in hand were lifted from, so
//! dropping back onto an earlier hop can put every stack back the way it was:
//!
//! ```text
//! A --pick--> hand --drop--> B --pick (pin)--> hand --drop--> C
//! hops: [A, B, C]                                  step: 2
//! dropping on B again: C is emptied back into hand and returned to B
//! dropping on A again: the whole move is cancelled
//! ```
//!
//! ## Failure
//!
//! A failed `execute` restores the snapshot taken on entry, so a board never
//! holds a half-applied move.

use serde::{Deserialize, Serialize};
use smallvec::smallvec;
use tracing::{debug, info, trace, warn};

use super::board::{Board, Chain, Hop, UndoEntry};
use super::state::{FlipMark, State};
use crate::core::{Cell, EngineError, PlateauResult, PlayerId};
use crate::moves::{Colors, Level, Move, MoveOp, PieceIds};
use crate::pieces::{Face, Origin, PieceId, PieceKind, PieceList, StackId};

/// How much `execute` trusts its input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReplayMode {
    /// Live play: every move must pass the legality checks first.
    #[default]
    Live,
    /// Replaying a stored game: legality is assumed, and a few transitions
    /// seen in damaged records are tolerated.
    Replay,
}

/// What one `execute` call did to the turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub before: State,
    pub after: State,
    pub player_before: PlayerId,
    pub player_after: PlayerId,
}

impl Transition {
    /// True if the move handed the turn to the other player.
    #[must_use]
    pub fn turn_passed(&self) -> bool {
        self.player_before != self.player_after
    }
}

impl Board {
    // =========================================================================
    // Entry points
    // =========================================================================

    /// Apply `mv`.
    ///
    /// In [`ReplayMode::Live`] the move must be accepted by
    /// [`Board::legal_move`]. On error the board is left exactly as it was.
    pub fn execute(&mut self, mv: &Move, mode: ReplayMode) -> PlateauResult<Transition> {
        if mode == ReplayMode::Live && !self.legal_move(mv) {
            return Err(EngineError::IllegalMove {
                mv: mv.to_string(),
                state: self.turn.state.to_string(),
            }
            .into());
        }

        let snapshot = self.snapshot();
        let before = self.turn.state;
        let player_before = self.turn.whose_turn;

        if let Err(error) = self.apply(mv, mode) {
            self.restore(snapshot);
            warn!(%mv, %error, "move rejected");
            return Err(error.into());
        }
        self.undo.push(UndoEntry {
            mv: mv.clone(),
            snapshot,
        });

        let after = self.turn.state;
        debug!(%mv, player = %player_before, from = %before, to = %after, "executed");
        if after.is_game_over() && !before.is_game_over() {
            info!(winner = ?self.winner(), move_number = self.turn.move_number, "game over");
        }

        Ok(Transition {
            before,
            after,
            player_before,
            player_after: self.turn.whose_turn,
        })
    }

    /// Undo `mv`, which must be the last move executed on this board.
    pub fn un_execute(&mut self, mv: &Move) -> PlateauResult<()> {
        let entry = self.undo.pop().ok_or(EngineError::UndoUnderflow)?;
        if entry.mv != *mv {
            let last = entry.mv.to_string();
            self.undo.push(entry);
            return Err(EngineError::UndoMismatch {
                requested: mv.to_string(),
                last,
            }
            .into());
        }
        self.restore(entry.snapshot);
        trace!(%mv, "un_executed");
        Ok(())
    }

    /// Number of moves `un_execute` can still take back.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Offer the draw decided outside the engine (agreement, repetition).
    /// The mover confirms it with `Done`.
    pub fn set_draw_state(&mut self) {
        if !self.turn.state.is_game_over() {
            debug!(from = %self.turn.state, "draw offered");
            self.turn.state = State::Draw;
        }
    }

    fn apply(&mut self, mv: &Move, mode: ReplayMode) -> Result<(), EngineError> {
        match &mv.op {
            MoveOp::Onboard { to, level, colors, pieces } => self.do_onboard(*to, *level, colors, pieces),
            MoveOp::Pick { piece, at } => {
                if let Some((locus, _)) = at {
                    let home = self.home_of(*piece)?;
                    let actual = self.stack_checked(home)?.locus();
                    if actual != *locus {
                        return Err(EngineError::BoardMismatch(format!(
                            "piece {piece} is at {actual}, not {locus}"
                        )));
                    }
                }
                self.handle_pick(*piece)
            }
            MoveOp::Drop { stack, level, locus } => {
                let target = match stack {
                    Some(id) => *id,
                    None => self.turn.chain.origin().ok_or(EngineError::NothingInHand)?,
                };
                if let Some(locus) = locus {
                    let actual = self.stack_checked(target)?.locus();
                    if actual != *locus {
                        return Err(EngineError::BoardMismatch(format!(
                            "stack {target} is at {actual}, not {locus}"
                        )));
                    }
                }
                let level = if stack.is_none() && *level == Level::Top {
                    Level::Settle
                } else {
                    *level
                };
                self.handle_drop(target, level)
            }
            MoveOp::FromTo { from, height, colors, to } => self.do_from_to(*from, *height, colors, *to),
            MoveOp::Flip { piece, color, .. } => self.handle_flip(*piece, *color),
            MoveOp::Exchange { pieces } => self.do_exchange(pieces),
            MoveOp::Done => self.set_next_state_after_done(mode),
            MoveOp::Resign => self.toggle_resign(),
            MoveOp::Start(player) => {
                self.cancel_in_hand()?;
                self.turn.chain.clear();
                self.turn.whose_turn = *player;
                self.turn.state = if self.turn.move_number < 2 {
                    State::Onboard2
                } else {
                    State::Play
                };
                Ok(())
            }
            MoveOp::Edit => {
                self.cancel_in_hand()?;
                self.turn.chain.clear();
                self.turn.state = State::Puzzle;
                Ok(())
            }
            MoveOp::Pass => {
                self.cancel_chain()?;
                if let Some(mark) = self.flipped() {
                    self.reveal_piece(mark.piece);
                }
                self.turn.chain.clear();
                self.turn.state = State::Play;
                self.set_next_player();
                Ok(())
            }
            MoveOp::GameOverOnTime => {
                self.set_game_over(mv.player);
                Ok(())
            }
        }
    }

    fn illegal(&self, op: &'static str, stack: StackId) -> EngineError {
        let origin = self
            .stacks
            .get(stack)
            .map_or_else(|| "unknown".to_string(), |s| s.origin().to_string());
        EngineError::IllegalTransition {
            op,
            origin,
            state: self.turn.state.to_string(),
        }
    }

    // =========================================================================
    // Micro-steps
    // =========================================================================

    /// Lift `piece` (and, for most origins, everything above it) into hand.
    pub(crate) fn handle_pick(&mut self, piece: PieceId) -> Result<(), EngineError> {
        let scratch = self.layout.scratch;
        if !self.in_hand().is_empty() {
            return Err(self.illegal("pick", scratch));
        }
        let home = self.home_of(piece)?;

        match self.turn.state {
            State::Puzzle
            | State::Exchange
            | State::ExchangeDone
            | State::CaptiveShuffle
            | State::Onboard2
            | State::Play
            | State::Flipped(_) => {
                let before = PieceList::from_slice(self.stack_checked(home)?.pieces());
                let flip = match self.turn.state {
                    State::Flipped(mark) => Some(mark),
                    _ => None,
                };
                self.turn.chain = Chain {
                    hops: smallvec![Hop { stack: home, before }],
                    step: Some(0),
                    flip,
                };
                self.split_from(piece)?;
            }
            State::Onboard2Done => self.split_from(piece)?,
            State::OnboardDone => self.split_single(piece)?,
            State::PlayDone | State::PlayCapture | State::PlayUndone | State::Draw => {
                // Lifting the whole landed stack again takes back that landing.
                if let Some(step) = self.turn.chain.step {
                    if step > 0 && self.turn.dropped == Some(piece) {
                        self.turn.chain.hops.truncate(step);
                        self.turn.chain.step = Some(step - 1);
                    }
                }
                self.split_from(piece)?;
            }
            _ => return Err(self.illegal("pick", home)),
        }

        trace!(piece = piece.0, stack = home.0, "pick");
        self.set_next_state_after_pick(home)
    }

    /// Put the pieces in hand on `target` at `level`.
    pub(crate) fn handle_drop(&mut self, target: StackId, level: Level) -> Result<(), EngineError> {
        if self.in_hand().is_empty() {
            return Err(EngineError::NothingInHand);
        }
        let target_origin = self.stack_checked(target)?.origin();

        if self.turn.state == State::Puzzle {
            self.place_hand(target, level)?;
            self.turn.chain.clear();
            return Ok(());
        }

        if let Some(hop) = self.unwind_target(target, level) {
            return self.unwind_to(hop, level);
        }

        if self.board_chain() && target_origin == Origin::Board {
            let step = self.turn.chain.step.map_or(1, |s| s + 1);
            let limit = self.config.max_hops();
            if step > limit {
                return Err(EngineError::ChainOverflow(limit));
            }
            let before = PieceList::from_slice(self.stacks[target].pieces());
            let chain = &mut self.turn.chain;
            chain.hops.truncate(step);
            chain.hops.push(Hop { stack: target, before });
            chain.step = Some(step);
        }

        // Once a flipped piece lands, the piece under it is no longer hidden.
        if let Some(mark) = self.turn.chain.flip {
            let hand = self.in_hand();
            if hand.top() == Some(mark.piece) && hand.len() >= 2 {
                if let Some(under) = hand.get(hand.len() - 2) {
                    self.reveal_piece(under);
                }
            }
        }
        if let Level::At(index) = level {
            let below = index
                .checked_sub(1)
                .filter(|_| index < self.stacks[target].len())
                .and_then(|i| self.stacks[target].get(i));
            if let Some(below) = below {
                self.reveal_piece(below);
            }
        }

        self.place_hand(target, level)?;
        trace!(target = target.0, level = level.code(), "drop");
        self.set_next_state_after_drop(target, false)
    }

    /// Turn `piece` over so that `color` is on top.
    pub(crate) fn handle_flip(&mut self, piece: PieceId, color: Face) -> Result<(), EngineError> {
        let home = self.home_of(piece)?;
        let state = self.turn.state;
        let flipped = self.piece_mut(piece)?;
        flipped.flip();
        if flipped.real_top() != color {
            return Err(EngineError::ColorMismatch {
                piece: piece.0,
                expected: color.to_string(),
                found: flipped.real_top().to_string(),
            });
        }
        trace!(piece = piece.0, stack = home.0, face = %color, "flip");

        self.turn.state = match state {
            State::Play if self.stack_checked(home)?.origin() == Origin::Board => {
                State::Flipped(FlipMark { stack: home, piece })
            }
            State::Flipped(mark) if mark.piece == piece => {
                self.reveal_piece(piece);
                State::Play
            }
            state @ (State::Puzzle | State::Exchange | State::ExchangeDone | State::CaptiveShuffle) => state,
            _ => return Err(self.illegal("flip", home)),
        };
        Ok(())
    }

    /// Drop the hand on `target`, recording where rack pieces were placed.
    ///
    /// Off-board areas keep one stack per kind, so a drop on any of them
    /// sends each piece to the stack of its own kind in that area.
    fn place_hand(&mut self, target: StackId, level: Level) -> Result<(), EngineError> {
        let stack = self.stack_checked(target)?;
        if let (Some(owner), Origin::Rack | Origin::Bar | Origin::Trade) = (stack.owner(), stack.origin()) {
            let area = stack.origin();
            let hand = PieceList::from_slice(self.in_hand().pieces());
            for &p in &hand {
                let piece = self.piece_mut(p)?;
                if area == Origin::Rack {
                    piece.flip_up();
                    piece.set_placed_position(0);
                }
                // Racks hold their owner's pieces; bars and trades hold captives.
                let (kind, dest) = match area {
                    Origin::Rack => (piece.kind(), piece.owner()),
                    _ => (piece.kind(), owner),
                };
                self.add_to_stack(p, self.holding_stack(dest, area, kind));
            }
            self.turn.dropped = hand.first().copied();
            self.turn.placement_index += 1;
            return Ok(());
        }

        let from_rack = self
            .turn
            .chain
            .origin()
            .and_then(|o| self.stacks.get(o))
            .is_some_and(|s| s.origin() == Origin::Rack);
        if from_rack && self.stack_checked(target)?.origin() == Origin::Board {
            let position = (u32::from(target.0) << 8) + (level.code() & 0xff) as u32;
            let hand = PieceList::from_slice(self.in_hand().pieces());
            for p in hand {
                self.piece_mut(p)?.set_placed_position(position);
            }
        }
        self.turn.dropped = self.drop_hand(target, level)?;
        self.turn.placement_index += 1;
        Ok(())
    }

    /// True while a move that started on the board is in progress.
    fn board_chain(&self) -> bool {
        self.turn
            .chain
            .origin()
            .and_then(|o| self.stacks.get(o))
            .is_some_and(|s| s.origin() == Origin::Board)
    }

    /// The hop a drop on `target` returns to, if it retraces the chain.
    pub(crate) fn unwind_target(&self, target: StackId, level: Level) -> Option<usize> {
        if !self.board_chain() {
            return None;
        }
        let chain = &self.turn.chain;
        let step = chain.step?;
        let origin = chain.hops.first()?;
        if target == origin.stack && matches!(level, Level::Settle | Level::Return) {
            return Some(0);
        }
        let last = step.min(chain.hops.len().saturating_sub(1));
        let hop = chain.hops[..=last].iter().rposition(|h| h.stack == target)?;
        // Dropping a stack back onto the cell it came from captures whatever
        // it had been covering.
        if hop == 0 && step == 0 && self.covers_opponent(&origin.before) {
            return None;
        }
        Some(hop)
    }

    /// True if some piece above the bottom of `list` has a different owner.
    fn covers_opponent(&self, list: &[PieceId]) -> bool {
        let Some(&bottom) = list.first() else {
            return false;
        };
        let owner = self.pieces[bottom].owner();
        list[1..].iter().any(|&p| self.pieces[p].owner() != owner)
    }

    /// Retrace the chain back to hop `hop` and put the hand down there.
    fn unwind_to(&mut self, hop: usize, level: Level) -> Result<(), EngineError> {
        let mut step = self.turn.chain.step.unwrap_or(0);
        while step > hop {
            let Hop { stack, before } = self.turn.chain.hops[step].clone();
            self.drop_hand(stack, Level::Top)?;
            self.lift_above(stack, before.len())?;
            step -= 1;
        }

        let target = self.turn.chain.hops[hop].stack;
        self.turn.chain.hops.truncate(hop + 1);
        self.turn.chain.step = Some(hop);
        self.place_hand(target, Level::Top)?;
        trace!(target = target.0, hop, "unwind");

        if hop > 0 {
            let landed = self.turn.chain.hops[hop].before.len();
            self.turn.dropped = self.stacks[target].get(landed);
            return self.set_next_state_after_drop(target, false);
        }

        if level == Level::Return {
            if let Some(mark) = self.turn.chain.flip.take() {
                self.piece_mut(mark.piece)?.flip();
            }
        }
        self.set_next_state_after_drop(target, true)
    }

    /// Send whatever is in hand back where it came from.
    fn cancel_in_hand(&mut self) -> Result<(), EngineError> {
        if self.in_hand().is_empty() {
            return Ok(());
        }
        let origin = self.turn.chain.origin().ok_or(EngineError::NothingInHand)?;
        self.handle_drop(origin, Level::Settle)
    }

    /// Take back an unfinished board move entirely.
    fn cancel_chain(&mut self) -> Result<(), EngineError> {
        if self.in_hand().is_empty() {
            let Some(step) = self.turn.chain.step.filter(|&s| s > 0) else {
                return Ok(());
            };
            let Hop { stack, before } = self.turn.chain.hops[step].clone();
            self.lift_above(stack, before.len())?;
            self.turn.chain.hops.truncate(step);
            self.turn.chain.step = Some(step - 1);
            self.turn.state = State::PlayDrop;
        }
        self.cancel_in_hand()
    }

    // =========================================================================
    // Compound moves
    // =========================================================================

    fn do_onboard(&mut self, to: Cell, level: Level, colors: &Colors, pieces: &PieceIds) -> Result<(), EngineError> {
        self.cancel_in_hand()?;
        let target = self.cell_id(to).ok_or_else(|| EngineError::BoardMismatch(format!("no cell {to}")))?;
        if pieces.is_empty() || colors.len() != pieces.len() {
            return Err(EngineError::IllegalMove {
                mv: format!("Onboard {to} {level} {colors}"),
                state: self.turn.state.to_string(),
            });
        }

        // Listed top first; each must be on top of its rack once the pieces
        // listed before it are gone.
        let mut origin = None;
        for &piece in pieces {
            let home = self.home_of(piece)?;
            let stack = self.stack_checked(home)?;
            if stack.origin() != Origin::Rack || stack.top() != Some(piece) {
                return Err(self.illegal("onboard", home));
            }
            origin = Some(Hop {
                stack: home,
                before: PieceList::from_slice(stack.pieces()),
            });
            self.remove_from_stack(piece);
        }
        let Some(origin) = origin else {
            return Err(EngineError::NothingInHand);
        };
        let home = origin.stack;
        self.turn.chain = Chain {
            hops: smallvec![origin],
            step: Some(0),
            flip: None,
        };
        let scratch = self.layout.scratch;
        for &piece in pieces.iter().rev() {
            self.add_to_stack(piece, scratch);
        }

        for (&piece, &(top, bottom)) in pieces.iter().zip(colors.iter()) {
            let p = self.piece_mut(piece)?;
            if !p.orient(top) || p.real_bottom() != bottom {
                return Err(EngineError::ColorMismatch {
                    piece: piece.0,
                    expected: p.colors(),
                    found: format!("{top}{bottom}"),
                });
            }
        }
        if let Some(&top) = pieces.first() {
            self.reveal_piece(top);
        }

        self.set_next_state_after_pick(home)?;
        self.handle_drop(target, level)
    }

    fn do_from_to(
        &mut self,
        from: Cell,
        height: usize,
        colors: &Colors,
        to: Cell,
    ) -> Result<(), EngineError> {
        let source = self.cell_id(from).ok_or_else(|| EngineError::BoardMismatch(format!("no cell {from}")))?;
        let target = self.cell_id(to).ok_or_else(|| EngineError::BoardMismatch(format!("no cell {to}")))?;
        let stack = self.stack_checked(source)?;
        let piece = stack
            .len()
            .checked_sub(height)
            .filter(|_| height > 0)
            .and_then(|i| stack.get(i))
            .ok_or_else(|| self.illegal("fromto", source))?;

        self.handle_pick(piece)?;
        let expected = self.in_hand().real_colors(&self.pieces);
        let found = colors.to_string();
        if expected != found {
            return Err(EngineError::ColorMismatch {
                piece: piece.0,
                expected,
                found,
            });
        }
        self.handle_drop(target, Level::Top)
    }

    /// Make the mover's trade offer exactly `offer`.
    fn do_exchange(&mut self, offer: &PieceIds) -> Result<(), EngineError> {
        let me = self.turn.whose_turn;
        for &piece in offer {
            let home = self.home_of(piece)?;
            let stack = self.stack_checked(home)?;
            if !matches!(stack.origin(), Origin::Bar | Origin::Trade) || stack.owner() != Some(me) {
                return Err(self.illegal("exchange", home));
            }
        }

        let offered: Vec<PieceId> = self
            .holdings(me, Origin::Trade)
            .flat_map(|s| s.pieces().iter().copied())
            .collect();
        for piece in offered {
            let bar = self.bar(me, self.pieces[piece].kind());
            self.add_to_stack(piece, bar);
        }
        for &piece in offer {
            let trade = self.trade(me, self.pieces[piece].kind());
            self.add_to_stack(piece, trade);
        }
        trace!(player = %me, count = offer.len(), "exchange offer");

        self.turn.state = match self.turn.state {
            State::Play | State::CaptiveShuffle if offer.is_empty() => State::Play,
            State::Play | State::CaptiveShuffle => State::CaptiveShuffle,
            State::Exchange | State::ExchangeDone => self.exchange_state(),
            State::Puzzle => State::Puzzle,
            _ => return Err(self.illegal("exchange", self.trade(me, PieceKind::Mute))),
        };
        Ok(())
    }

    fn toggle_resign(&mut self) -> Result<(), EngineError> {
        match self.turn.unresign.take() {
            Some(previous) if self.turn.state == State::Resign => self.turn.state = previous,
            _ => {
                self.turn.unresign = Some(self.turn.state);
                self.turn.state = State::Resign;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Turn state machine
    // =========================================================================

    fn exchange_state(&self) -> State {
        if self.exchange_is_legal() {
            State::ExchangeDone
        } else {
            State::Exchange
        }
    }

    fn set_next_state_after_pick(&mut self, home: StackId) -> Result<(), EngineError> {
        let origin = self.stack_checked(home)?.origin();
        let carried = self.in_hand().len();
        let state = self.turn.state;

        let next = match (origin, state) {
            (_, State::Puzzle) => State::Puzzle,
            (Origin::Board, State::Play | State::Flipped(_)) => {
                self.reveal_top_of(self.layout.scratch);
                self.reveal_top_of(home);
                State::PlayDrop
            }
            (Origin::Board, State::PlayDone | State::PlayCapture | State::PlayUndone | State::Draw) => {
                self.reveal_top_of(home);
                State::PlayDrop
            }
            (Origin::Board, State::OnboardDone) => State::OnboardDrop,
            (Origin::Board, State::Onboard2Done) => State::Onboard2Drop,
            (Origin::Rack, State::Play) if carried == 1 => State::OnboardDrop,
            (Origin::Rack, State::Play) => State::RackDrop,
            (Origin::Rack, State::Onboard2) if carried == 2 => State::Onboard2Drop,
            (Origin::Rack, State::Onboard2) => State::Rack2Drop,
            (Origin::Trade | Origin::Bar, State::ExchangeDone) => State::Exchange,
            (Origin::Trade | Origin::Bar, State::Exchange | State::CaptiveShuffle) => state,
            (Origin::Bar, State::Play) => State::CaptiveShuffle,
            _ => return Err(self.illegal("pick", home)),
        };
        self.turn.state = next;
        Ok(())
    }

    /// `at_start` is true when the drop returned a board move to where it
    /// began.
    fn set_next_state_after_drop(&mut self, target: StackId, at_start: bool) -> Result<(), EngineError> {
        let stack = self.stack_checked(target)?;
        let origin = stack.origin();
        let stomp = stack.stomp_capture(&self.pieces);
        let landed_face = stack.real_top_face(&self.pieces);
        let landed_cell = stack.cell();
        let state = self.turn.state;

        let next = match (origin, state) {
            (Origin::Board, State::Onboard2Drop) => State::Onboard2Done,
            (Origin::Board, State::OnboardDrop) => State::OnboardDone,
            (Origin::Board, State::PlayDrop) if at_start => {
                let flip = self.turn.chain.flip;
                self.turn.chain.clear();
                match flip {
                    Some(mark) => State::Flipped(mark),
                    None => State::Play,
                }
            }
            (Origin::Board, State::PlayDrop) => {
                let origin_stack = self.turn.chain.origin();
                let distance = origin_stack
                    .and_then(|o| self.stacks[o].cell())
                    .zip(landed_cell)
                    .map(|(a, b)| {
                        let (dx, dy) = a.delta(b);
                        dx.abs() + dy.abs()
                    });
                // An orange top must finish on the far end of its L.
                if landed_face == Some(Face::Orange) && origin_stack != Some(target) && distance != Some(3) {
                    State::PlayUndone
                } else if stomp {
                    State::PlayCapture
                } else {
                    State::PlayDone
                }
            }
            (Origin::Rack, State::Onboard2Drop | State::Rack2Drop) => {
                self.turn.chain.clear();
                State::Onboard2
            }
            (Origin::Rack, State::OnboardDrop | State::RackDrop) => {
                self.turn.chain.clear();
                State::Play
            }
            (Origin::Trade | Origin::Bar, State::Exchange | State::ExchangeDone) => self.exchange_state(),
            (Origin::Trade, State::CaptiveShuffle) => State::CaptiveShuffle,
            (Origin::Bar, State::CaptiveShuffle) => {
                if self.holding_count(self.turn.whose_turn, Origin::Trade) == 0 {
                    State::Play
                } else {
                    State::CaptiveShuffle
                }
            }
            _ => return Err(self.illegal("drop", target)),
        };
        self.turn.state = next;
        Ok(())
    }

    fn set_next_state_after_done(&mut self, mode: ReplayMode) -> Result<(), EngineError> {
        let me = self.turn.whose_turn;
        match self.turn.state {
            State::Resign => {
                self.turn.unresign = None;
                self.set_game_over(me.other());
            }
            State::ExchangeDone => {
                if self.holding_total(me, Origin::Trade) == 0 {
                    debug!(player = %me, "exchange refused");
                    self.turn.state = State::CaptiveShuffle;
                    self.set_next_player();
                } else {
                    self.complete_exchange()?;
                    // The responder keeps the turn.
                    self.turn.state = State::Play;
                }
            }
            State::CaptiveShuffle => {
                self.set_next_player();
                self.turn.state = self.exchange_state();
            }
            State::Onboard2Done => {
                let second_opening = self.config.paired_opening && me == PlayerId::FIRST;
                self.turn.chain.clear();
                self.turn.state = if second_opening { State::Onboard2 } else { State::Play };
                self.set_next_player();
            }
            State::Draw => {
                self.turn.chain.clear();
                self.turn.win = crate::core::PlayerMap::with_value(false);
                self.turn.state = State::GameOver;
            }
            State::PlayDone | State::PlayUndone | State::PlayCapture => {
                self.resolve_captures()?;
                if let Some(mark) = self.flipped() {
                    self.reveal_piece(mark.piece);
                }
                self.turn.chain.clear();
                self.finish_turn();
            }
            State::OnboardDone => {
                self.turn.chain.clear();
                self.finish_turn();
            }
            State::Play if mode == ReplayMode::Replay => {
                warn!(player = %me, "done with no move in progress");
                self.set_next_player();
            }
            _ => return Err(self.illegal("done", self.layout.scratch)),
        }
        Ok(())
    }

    /// Move every captured piece under the landed stack to the mover's bar.
    fn resolve_captures(&mut self) -> Result<(), EngineError> {
        let Some(hop) = self.turn.chain.current().cloned() else {
            return Ok(());
        };
        let victims: Vec<(usize, PieceId)> = hop
            .before
            .iter()
            .enumerate()
            .filter(|&(_, &p)| self.is_captured(p))
            .map(|(i, &p)| (i, p))
            .collect();

        let mover = self.turn.whose_turn;
        for (index, victim) in victims {
            if index > 0 {
                self.reveal_piece(hop.before[index - 1]);
            }
            let kind = self.piece_checked(victim)?.kind();
            let piece = self.piece_mut(victim)?;
            piece.reveal_all();
            piece.flip_up();
            piece.set_placed_position(0);
            self.add_to_stack(victim, self.bar(mover, kind));
            debug!(piece = victim.0, %kind, player = %mover, "captured");
        }
        Ok(())
    }

    /// True if `piece`, from under the landing, is taken by the stack that
    /// just landed on it.
    ///
    /// Walking down from the bottom of the lander's run, each of the
    /// lander's pieces can pin one opposing piece.
    fn is_captured(&self, piece: PieceId) -> bool {
        if self.turn.state != State::PlayCapture {
            return false;
        }
        let Some(hop) = self.turn.chain.current() else {
            return false;
        };
        let stack = &self.stacks[hop.stack];
        let owner = self.pieces[piece].owner();
        if stack.top_owner(&self.pieces) == Some(owner) {
            return false;
        }
        if !self.turn.dropped.is_some_and(|d| stack.contains(d)) {
            return false;
        }
        let mut depth = stack.capture_depth(&self.pieces);
        let mut index = stack.len() - depth;
        while index > 0 && depth > 0 {
            index -= 1;
            let victim = stack.pieces()[index];
            if victim == piece {
                return true;
            }
            if self.pieces[victim].owner() == owner {
                depth -= 1;
            }
        }
        false
    }

    /// Both offers go home to their owners' racks.
    fn complete_exchange(&mut self) -> Result<(), EngineError> {
        let mut traded: Vec<PieceId> = Vec::new();
        for player in PlayerId::all() {
            traded.extend(self.holdings(player, Origin::Trade).flat_map(|s| s.pieces().iter().copied()));
        }
        for piece in traded {
            let p = self.piece_mut(piece)?;
            p.flip_up();
            p.set_placed_position(0);
            let (owner, kind) = (p.owner(), p.kind());
            self.add_to_stack(piece, self.rack(owner, kind));
        }
        debug!(player = %self.turn.whose_turn, "exchange completed");
        Ok(())
    }

    fn finish_turn(&mut self) {
        let me = self.turn.whose_turn;
        let mine = self.win_for_player_now(me);
        let theirs = self.win_for_player_now(me.other());
        if mine || theirs {
            self.turn.win[me] = mine;
            self.turn.win[me.other()] = theirs;
            self.turn.state = State::GameOver;
            self.turn.move_number += 1;
        } else {
            self.turn.state = State::Play;
            self.set_next_player();
        }
    }

    fn set_game_over(&mut self, winner: PlayerId) {
        self.turn.chain.clear();
        self.turn.win[winner] = true;
        self.turn.win[winner.other()] = false;
        self.turn.state = State::GameOver;
    }

    fn set_next_player(&mut self) {
        self.turn.whose_turn = self.turn.whose_turn.other();
        self.turn.move_number += 1;
    }
}
