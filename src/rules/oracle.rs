//! The legality oracle.
//!
//! [`Board::legal_move`] answers "may this move be executed now?" without
//! touching the board. The move generator is built on the same predicates,
//! so anything it emits is accepted here and vice versa.
//!
//! ## Movement geometry
//!
//! Measured from the take-off cell, by the top face of the moving stack,
//! with `h` the take-off height:
//!
//! | Top    | Destination                                  |
//! |--------|----------------------------------------------|
//! | Blank  | straight or diagonal line, up to `h` cells   |
//! | Red    | orthogonal, up to `h` cells                  |
//! | Blue   | diagonal, up to `h` cells                    |
//! | Orange | one cell orthogonally, or a knight's L       |
//!
//! Later hops of the same move keep going the same way and never come back
//! closer to the take-off cell.

use smallvec::SmallVec;

use crate::board::{Board, State};
use crate::core::{Cell, Locus};
use crate::moves::{Colors, Level, Move, MoveOp};
use crate::pieces::{Face, Origin, PieceId, Stack, StackId};

impl Board {
    /// True if `mv` may be executed now.
    #[must_use]
    pub fn legal_move(&self, mv: &Move) -> bool {
        match &mv.op {
            MoveOp::Start(_) | MoveOp::Edit => return true,
            MoveOp::GameOverOnTime => return !self.turn.state.is_game_over(),
            _ => {}
        }
        if mv.player != self.turn.whose_turn || self.turn.state.is_game_over() {
            return false;
        }

        let hand_empty = self.in_hand().is_empty();
        match &mv.op {
            MoveOp::Pick { piece, at } => {
                let locus_ok = match at {
                    Some((locus, _)) => self.locus_of(*piece) == Some(*locus),
                    None => true,
                };
                hand_empty && locus_ok && self.legal_pick(*piece)
            }
            MoveOp::Drop { stack, level, locus } => {
                !hand_empty && self.legal_drop(*stack, *level, locus.as_ref())
            }
            MoveOp::Onboard { to, level, colors, pieces } => self.legal_onboard(*to, *level, colors, pieces),
            MoveOp::FromTo { from, height, colors, to } => {
                hand_empty && self.legal_from_to(*from, *height, colors, *to)
            }
            MoveOp::Flip { piece, locus, color } => hand_empty && self.legal_flip(*piece, *locus, *color),
            MoveOp::Exchange { pieces } => hand_empty && self.legal_exchange(pieces),
            MoveOp::Done => hand_empty && self.done_state(),
            MoveOp::Resign => hand_empty && self.turn.state != State::Puzzle,
            MoveOp::Pass => {
                hand_empty
                    && matches!(self.turn.state, State::Play | State::Flipped(_) | State::PlayUndone)
                    && self.core_moves().is_empty()
            }
            MoveOp::Start(_) | MoveOp::Edit | MoveOp::GameOverOnTime => true,
        }
    }

    fn locus_of(&self, piece: PieceId) -> Option<Locus> {
        let home = self.piece(piece)?.stack()?;
        self.stack(home).map(Stack::locus)
    }

    // =========================================================================
    // Picks
    // =========================================================================

    /// True if the mover may lift `piece` (with everything above it) now.
    pub(crate) fn legal_pick(&self, piece: PieceId) -> bool {
        let Some(stack) = self.locus_stack(piece) else {
            return false;
        };
        let Some(index) = stack.index_of(piece) else {
            return false;
        };
        let me = self.turn.whose_turn;
        let state = self.turn.state;
        let mine = stack.owner() == Some(me);

        if state == State::Puzzle {
            return stack.origin() != Origin::Scratch;
        }
        match stack.origin() {
            Origin::Board => match state {
                State::Play => stack.top_owner(&self.pieces) == Some(me) && stack.unobstructed(&self.pieces, index),
                State::Flipped(mark) => {
                    stack.id() == mark.stack
                        && stack.top_owner(&self.pieces) == Some(me)
                        && stack.unobstructed(&self.pieces, index)
                }
                State::PlayDone | State::PlayCapture | State::PlayUndone | State::Draw => {
                    self.legal_continuation(stack, index)
                }
                State::OnboardDone | State::Onboard2Done => self.turn.dropped == Some(piece),
                _ => false,
            },
            Origin::Rack => mine && matches!(state, State::Play | State::Onboard2),
            Origin::Bar => {
                mine && matches!(
                    state,
                    State::Play | State::CaptiveShuffle | State::Exchange | State::ExchangeDone
                )
            }
            Origin::Trade => mine && matches!(state, State::Exchange | State::ExchangeDone | State::CaptiveShuffle),
            Origin::Scratch => false,
        }
    }

    fn locus_stack(&self, piece: PieceId) -> Option<&Stack> {
        let home = self.piece(piece)?.stack()?;
        self.stack(home)
    }

    /// Picking up again from the stack the move last landed on.
    fn legal_continuation(&self, stack: &Stack, index: usize) -> bool {
        let chain = &self.turn.chain;
        let (Some(origin), Some(hop)) = (chain.hops.first(), chain.current()) else {
            return false;
        };
        let Some(&moving_top) = origin.before.last() else {
            return false;
        };
        let me = self.turn.whose_turn;
        if stack.id() != hop.stack
            || !stack.contains(moving_top)
            || stack.top_owner(&self.pieces) != Some(me)
            || !stack.unobstructed(&self.pieces, index)
            || index < hop.before.len()
        {
            return false;
        }
        let landed_on_opponent = hop.before.last().is_some_and(|&p| self.pieces[p].owner() != me);
        !landed_on_opponent || self.legal_pin(stack, index)
    }

    /// A piece can be lifted off a pin unless it would leave a mute it
    /// brought along holding the pin alone.
    fn legal_pin(&self, stack: &Stack, index: usize) -> bool {
        if index == 0 {
            return true;
        }
        let below = stack.pieces()[index - 1];
        let brought = self.turn.chain.hops.first().is_some_and(|h| h.before.contains(&below));
        !self.pieces[below].is_mute() || !brought
    }

    // =========================================================================
    // Drops
    // =========================================================================

    fn legal_drop(&self, stack: Option<StackId>, level: Level, locus: Option<&Locus>) -> bool {
        let (target, level) = match stack {
            Some(id) => (id, level),
            None => match self.turn.chain.origin() {
                Some(origin) if level == Level::Top => (origin, Level::Settle),
                Some(origin) => (origin, level),
                None => return false,
            },
        };
        let Some(target_stack) = self.stack(target) else {
            return false;
        };
        if locus.is_some_and(|l| *l != target_stack.locus()) {
            return false;
        }
        if self.turn.state != State::Puzzle && self.unwind_target(target, level).is_some() {
            return true;
        }
        self.legal_drop_target(target, level)
    }

    /// True if the pieces in hand may land on `target` at `level`.
    pub(crate) fn legal_drop_target(&self, target: StackId, level: Level) -> bool {
        let Some(stack) = self.stack(target) else {
            return false;
        };
        let me = self.turn.whose_turn;
        let state = self.turn.state;
        let on_top = level.is_on_top();
        let inside = match level {
            Level::At(n) => n < stack.len(),
            _ => true,
        };

        if state == State::Puzzle {
            return stack.origin() != Origin::Scratch && (on_top || inside);
        }
        match stack.origin() {
            Origin::Board => match state {
                State::PlayDrop => {
                    on_top
                        && self.legal_destination(stack)
                        && match stack.top_owner(&self.pieces) {
                            None => true,
                            Some(owner) if owner == me => true,
                            Some(_) => self.in_hand().contains_color(&self.pieces),
                        }
                }
                State::Onboard2Drop => {
                    on_top && stack.is_empty() && stack.cell().is_some_and(|c| c.is_edge(self.size()))
                }
                State::OnboardDrop => {
                    if stack.is_empty() {
                        on_top
                    } else {
                        let index = match level {
                            Level::At(n) => n,
                            _ => stack.len() - 1,
                        };
                        inside && stack.unsandwiched(&self.pieces, index, on_top, me)
                    }
                }
                _ => false,
            },
            Origin::Rack => {
                on_top
                    && stack.owner() == Some(me)
                    && matches!(
                        state,
                        State::OnboardDrop | State::RackDrop | State::Rack2Drop | State::Onboard2Drop
                    )
            }
            Origin::Bar | Origin::Trade => {
                on_top
                    && stack.owner() == Some(me)
                    && matches!(state, State::Exchange | State::ExchangeDone | State::CaptiveShuffle)
            }
            Origin::Scratch => false,
        }
    }

    /// True if the move being carried may land on `target` geometrically.
    pub(crate) fn legal_destination(&self, target: &Stack) -> bool {
        let chain = &self.turn.chain;
        let Some(origin) = chain.hops.first() else {
            return false;
        };
        let origin_stack = &self.stacks[origin.stack];
        let (Some(from), Some(to)) = (origin_stack.cell(), target.cell()) else {
            return false;
        };
        let moving = origin_stack.with_contents(&origin.before);
        let height = moving.capture_depth(&self.pieces) as i32;
        let face = moving.real_top_face(&self.pieces);

        let (dx, dy) = from.delta(to);
        let (adx, ady) = (dx.abs(), dy.abs());
        let step = chain.step.unwrap_or(0);

        if step > 0 {
            let Some(prev) = chain.hops.get(step).and_then(|h| self.stacks[h.stack].cell()) else {
                return false;
            };
            let (pdx, pdy) = from.delta(prev);
            if face == Some(Face::Orange) {
                let (sx, sy) = prev.delta(to);
                if sx.abs() > 1 || sy.abs() > 1 {
                    return false;
                }
            } else if dx.signum() != pdx.signum() || dy.signum() != pdy.signum() {
                return false;
            }
            if adx < pdx.abs() || ady < pdy.abs() {
                return false;
            }
        }

        match face {
            Some(Face::Blank) => adx.max(ady) <= height && (adx == 0 || ady == 0 || adx == ady),
            Some(Face::Red) => (adx == 0 || ady == 0) && adx + ady <= height,
            Some(Face::Blue) => adx == ady && adx <= height,
            Some(Face::Orange) => match (adx, ady) {
                _ if adx + ady <= 1 => true,
                (1, 2) | (2, 1) => step > 0 || self.elbow_open(from, dx, dy),
                _ => false,
            },
            _ => false,
        }
    }

    /// The cell an Orange L turns at must be empty or the mover's.
    fn elbow_open(&self, from: Cell, dx: i32, dy: i32) -> bool {
        let (ex, ey) = if dy.abs() > dx.abs() { (0, dy.signum()) } else { (dx.signum(), 0) };
        let Some(elbow) = from.offset(ex, ey, self.size()).and_then(|c| self.cell(c)) else {
            return false;
        };
        match elbow.top_owner(&self.pieces) {
            None => true,
            Some(owner) => owner == self.turn.whose_turn,
        }
    }

    // =========================================================================
    // Compound moves
    // =========================================================================

    fn legal_onboard(&self, to: Cell, level: Level, colors: &Colors, pieces: &[PieceId]) -> bool {
        let state = self.turn.state;
        let me = self.turn.whose_turn;
        let count_ok = match state {
            State::Play => pieces.len() == 1,
            State::Onboard2 => pieces.len() == 2,
            State::Puzzle => !pieces.is_empty(),
            _ => false,
        };
        if !count_ok || colors.len() != pieces.len() || !self.in_hand().is_empty() {
            return false;
        }

        let mut taken: SmallVec<[PieceId; 4]> = SmallVec::new();
        for (&piece, &(top, bottom)) in pieces.iter().zip(colors.iter()) {
            let (Some(p), Some(rack)) = (self.piece(piece), self.locus_stack(piece)) else {
                return false;
            };
            if rack.origin() != Origin::Rack || (state != State::Puzzle && rack.owner() != Some(me)) {
                return false;
            }
            let exposed = rack.pieces().iter().rev().find(|q| !taken.contains(q));
            if exposed != Some(&piece) || !p.kind().matches_pair(top, bottom) {
                return false;
            }
            taken.push(piece);
        }

        let Some(target) = self.cell(to) else {
            return false;
        };
        match state {
            State::Puzzle => true,
            State::Onboard2 => level == Level::Top && target.is_empty() && to.is_edge(self.size()),
            State::Play => match level {
                Level::Top => target.is_empty() || target.top_owner(&self.pieces) == Some(me),
                Level::At(n) => n < target.len() && target.unsandwiched(&self.pieces, n, false, me),
                Level::Settle | Level::Return => false,
            },
            _ => false,
        }
    }

    fn legal_from_to(&self, from: Cell, height: usize, colors: &Colors, to: Cell) -> bool {
        if !matches!(
            self.turn.state,
            State::Play | State::Flipped(_) | State::PlayDone | State::PlayCapture | State::PlayUndone
        ) {
            return false;
        }
        let (Some(source), Some(target)) = (self.cell(from), self.cell_id(to)) else {
            return false;
        };
        if height == 0 || height > source.len() {
            return false;
        }
        let lifted = &source.pieces()[source.len() - height..];
        let shown: String = lifted.iter().rev().map(|&p| self.pieces[p].colors()).collect();
        if shown != colors.to_string() || !self.legal_pick(lifted[0]) {
            return false;
        }

        let mut probe = self.clone();
        if probe.handle_pick(lifted[0]).is_err() {
            return false;
        }
        probe.unwind_target(target, Level::Top).is_none() && probe.legal_drop_target(target, Level::Top)
    }

    fn legal_flip(&self, piece: PieceId, locus: Locus, color: Face) -> bool {
        let (Some(p), Some(stack)) = (self.piece(piece), self.locus_stack(piece)) else {
            return false;
        };
        if stack.locus() != locus || p.real_bottom() != color {
            return false;
        }
        match self.turn.state {
            State::Play => {
                stack.origin() == Origin::Board
                    && stack.top() == Some(piece)
                    && p.owner() == self.turn.whose_turn
            }
            State::Flipped(mark) => mark.piece == piece,
            State::Puzzle => true,
            _ => false,
        }
    }

    fn legal_exchange(&self, offer: &[PieceId]) -> bool {
        let me = self.turn.whose_turn;
        let captives = self.captives(me);
        let distinct = offer.iter().enumerate().all(|(i, p)| !offer[..i].contains(p));
        if !distinct || !offer.iter().all(|p| captives.contains(p)) {
            return false;
        }
        let total: u32 = offer.iter().map(|&p| self.pieces[p].kind().value()).sum();
        match self.turn.state {
            State::Play => !offer.is_empty(),
            State::CaptiveShuffle | State::Puzzle => true,
            State::Exchange | State::ExchangeDone => total >= self.min_acceptable(me),
            _ => false,
        }
    }
}
