//! Automated players and self-play.
//!
//! A [`Robot`] looks at a board and proposes the next move. Robots never
//! touch the authoritative board: anything they want to try is tried on a
//! clone.
//!
//! - [`RandomRobot`]: uniform over the generated moves
//! - [`GreedyRobot`]: one-ply lookahead with a material and height score
//!
//! [`self_play`] runs one game between two robots; [`self_play_many`] runs a
//! batch of independent games across threads, each with its own boards.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::board::{Board, ReplayMode};
use crate::core::{EngineConfig, GameRng, PlateauResult, PlayerId, RobotConfig};
use crate::game::Game;
use crate::movegen::GenOptions;
use crate::moves::{GameRecord, Move};
use crate::pieces::Origin;

// =============================================================================
// Robot trait
// =============================================================================

/// Something that can choose moves.
pub trait Robot: Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// The move to play on `board`, or `None` if there is nothing to play.
    fn choose_move(&mut self, board: &Board) -> Option<Move>;
}

fn gen_options(config: &RobotConfig) -> GenOptions {
    GenOptions {
        include_redundant_flips: config.include_redundant_flips,
    }
}

// =============================================================================
// RandomRobot
// =============================================================================

/// Picks uniformly among the generated moves.
#[derive(Clone, Debug)]
pub struct RandomRobot {
    rng: GameRng,
    options: GenOptions,
}

impl RandomRobot {
    #[must_use]
    pub fn new(config: &RobotConfig) -> Self {
        Self {
            rng: GameRng::new(config.seed).for_context("random-robot"),
            options: gen_options(config),
        }
    }
}

impl Robot for RandomRobot {
    fn name(&self) -> &'static str {
        "random"
    }

    fn choose_move(&mut self, board: &Board) -> Option<Move> {
        let moves = board.list_moves_with(self.options);
        self.rng.choose(&moves).cloned()
    }
}

// =============================================================================
// GreedyRobot
// =============================================================================

const WIN_SCORE: i64 = 1_000_000;
const CAPTURE_WEIGHT: i64 = 100;
const HEIGHT_WEIGHT: i64 = 10;

/// Tries every move on a scratch board and keeps the best-scoring one.
/// Ties are broken at random.
#[derive(Clone, Debug)]
pub struct GreedyRobot {
    rng: GameRng,
    options: GenOptions,
}

impl GreedyRobot {
    #[must_use]
    pub fn new(config: &RobotConfig) -> Self {
        Self {
            rng: GameRng::new(config.seed).for_context("greedy-robot"),
            options: gen_options(config),
        }
    }

    /// Score of `board` from `me`'s side.
    #[must_use]
    pub fn evaluate(board: &Board, me: PlayerId) -> i64 {
        let them = me.other();
        if board.state().is_game_over() {
            return match board.winner() {
                Some(w) if w == me => WIN_SCORE,
                Some(_) => -WIN_SCORE,
                None => 0,
            };
        }
        if board.win_for_player_now(me) {
            return WIN_SCORE / 2;
        }
        if board.win_for_player_now(them) {
            return -WIN_SCORE / 2;
        }

        let captures = board.holding_total(me, Origin::Bar) as i64 - board.holding_total(them, Origin::Bar) as i64;
        let mut height = 0i64;
        for stack in board.board_stacks() {
            match stack.top_owner(board.pieces()) {
                Some(owner) if owner == me => height += stack.len() as i64,
                Some(_) => height -= stack.len() as i64,
                None => {}
            }
        }
        captures * CAPTURE_WEIGHT + height * HEIGHT_WEIGHT
    }
}

impl Robot for GreedyRobot {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn choose_move(&mut self, board: &Board) -> Option<Move> {
        let moves = board.list_moves_with(self.options);
        if moves.len() <= 1 {
            return moves.into_iter().next();
        }

        let me = board.whose_turn();
        let mut scratch = board.clone();
        let mut best: Vec<&Move> = Vec::new();
        let mut best_score = i64::MIN;
        for mv in &moves {
            if scratch.execute(mv, ReplayMode::Replay).is_err() {
                continue;
            }
            let score = Self::evaluate(&scratch, me);
            if scratch.un_execute(mv).is_err() {
                scratch.copy_from(board);
            }
            if score > best_score {
                best_score = score;
                best.clear();
            }
            if score == best_score {
                best.push(mv);
            }
        }
        self.rng.choose(&best).map(|m| (*m).clone())
    }
}

// =============================================================================
// Self-play
// =============================================================================

/// How a self-play game ended.
#[derive(Clone, Debug)]
pub struct GameOutcome {
    /// `None` for a draw or an abandoned game.
    pub winner: Option<PlayerId>,
    /// Moves executed.
    pub moves: usize,
    /// False if the move limit was hit or a robot had nothing to play.
    pub finished: bool,
    pub record: GameRecord,
}

/// Play one game. `robots[0]` moves for the first player.
pub fn self_play(
    config: &EngineConfig,
    robot_config: &RobotConfig,
    robots: &mut [Box<dyn Robot>; 2],
) -> PlateauResult<GameOutcome> {
    let mut game = Game::new(config.clone());
    let mut moves = 0;

    while !game.is_over() && moves < robot_config.max_moves {
        let player = game.board().whose_turn();
        let robot = &mut robots[player.index()];
        let Some(mv) = robot.choose_move(game.board()) else {
            debug!(%player, robot = robot.name(), state = %game.board().state(), "robot has no move");
            break;
        };
        game.play(&mv)?;
        moves += 1;
    }

    let outcome = GameOutcome {
        winner: game.winner(),
        moves,
        finished: game.is_over(),
        record: game.record(),
    };
    info!(
        winner = ?outcome.winner,
        moves,
        finished = outcome.finished,
        "self-play game ended"
    );
    Ok(outcome)
}

/// Play `games` independent games in parallel.
///
/// `make` builds the two robots for a game from that game's robot config,
/// whose seed is the base seed plus the game index.
pub fn self_play_many<F>(
    config: &EngineConfig,
    robot_config: &RobotConfig,
    games: usize,
    make: F,
) -> PlateauResult<Vec<GameOutcome>>
where
    F: Fn(&RobotConfig) -> [Box<dyn Robot>; 2] + Sync,
{
    (0..games)
        .into_par_iter()
        .map(|index| {
            let mut game_config = robot_config.clone();
            game_config.seed = robot_config.seed.wrapping_add(index as u64);
            let mut robots = make(&game_config);
            self_play(config, &game_config, &mut robots)
        })
        .collect()
}
