//! Property tests over random legal move sequences.
//!
//! Each case walks a game by picking moves from the generator with a list of
//! random indices, checking the engine's invariants at every step.

use proptest::prelude::*;

use plateau::{Board, Colors, EngineConfig, Level, Move, MoveOp, Origin, PieceId, ReplayMode, State, Variation};

/// Play up to `choices.len()` generated moves, calling `check` before each.
fn walk(config: EngineConfig, choices: &[usize], mut check: impl FnMut(&Board, &[Move], &Move)) -> Board {
    let mut board = Board::new(config);
    for &choice in choices {
        let moves = board.list_moves();
        if moves.is_empty() {
            break;
        }
        let mv = moves[choice % moves.len()].clone();
        check(&board, &moves, &mv);
        board.execute(&mv, ReplayMode::Live).unwrap();
    }
    board
}

fn all_piece_ids(board: &Board) -> Vec<PieceId> {
    let mut ids: Vec<PieceId> = board.stacks().flat_map(|s| s.pieces().iter().copied()).collect();
    ids.sort();
    ids
}

/// Every move of the kinds the generator proposes, built from the board
/// alone without looking at the state: all lifts to all cells, single rack
/// pieces onto all cells in both orientations, top flips, drops, `Done` and
/// `Pass`. Interface moves (`Pick`, `Resign`, `Start`, `Edit`,
/// `GameOverOnTime`) and alternate spellings of the same drop are left out.
fn candidate_moves(board: &Board) -> Vec<Move> {
    let me = board.whose_turn();
    let mut ops = vec![MoveOp::Done, MoveOp::Pass];

    for stack in board.board_stacks() {
        let Some(from) = stack.cell() else { continue };
        for height in 1..=stack.len() {
            let lifted = &stack.pieces()[stack.len() - height..];
            let colors = Colors(
                lifted
                    .iter()
                    .rev()
                    .map(|&p| {
                        let piece = board.piece(p).unwrap();
                        (piece.real_top(), piece.real_bottom())
                    })
                    .collect(),
            );
            for to in board.cells() {
                ops.push(MoveOp::FromTo { from, height, colors: colors.clone(), to });
            }
        }
        if let Some(top) = stack.top().and_then(|t| board.piece(t)) {
            ops.push(MoveOp::Flip { piece: top.id(), locus: stack.locus(), color: top.real_bottom() });
        }
    }

    for rack in board.holdings(me, Origin::Rack) {
        let Some(piece) = rack.top().and_then(|t| board.piece(t)) else { continue };
        let (a, b) = piece.kind().faces();
        for faces in [(a, b), (b, a)] {
            for to in board.cells() {
                let len = board.cell(to).unwrap().len();
                for level in std::iter::once(Level::Top).chain((0..len).map(Level::At)) {
                    ops.push(MoveOp::Onboard {
                        to,
                        level,
                        colors: Colors([faces].into_iter().collect()),
                        pieces: [piece.id()].into_iter().collect(),
                    });
                }
            }
        }
    }

    let scratch = board.in_hand().id();
    for stack in board.stacks().filter(|s| s.id() != scratch) {
        ops.push(MoveOp::Drop { stack: Some(stack.id()), level: Level::Top, locus: None });
        if board.state() == State::OnboardDrop && stack.origin() == Origin::Board {
            for i in 0..stack.len() {
                ops.push(MoveOp::Drop { stack: Some(stack.id()), level: Level::At(i), locus: None });
            }
        }
    }
    ops.push(MoveOp::Drop { stack: None, level: Level::Return, locus: None });

    ops.into_iter().map(|op| Move::new(me, op)).collect()
}

fn config_strategy() -> impl Strategy<Value = EngineConfig> {
    (prop_oneof![Just(Variation::Plateau), Just(Variation::Plateau5)], any::<bool>())
        .prop_map(|(variation, paired)| EngineConfig::new(variation).with_paired_opening(paired))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Invariant: execute followed by un_execute restores the position.
    #[test]
    fn execute_then_undo_restores(config in config_strategy(), choices in prop::collection::vec(any::<usize>(), 1..40)) {
        walk(config, &choices, |board, _, mv| {
            let mut probe = board.clone();
            let before = probe.digest();
            probe.execute(mv, ReplayMode::Live).unwrap();
            probe.un_execute(mv).unwrap();
            assert_eq!(probe.digest(), before, "undo of {mv} changed the digest");
            probe.same_board(board).unwrap();
        });
    }

    /// Invariant: a clone is the same board and digests identically.
    #[test]
    fn clones_are_faithful(config in config_strategy(), choices in prop::collection::vec(any::<usize>(), 1..40)) {
        let board = walk(config, &choices, |_, _, _| {});
        let copy = board.clone();
        prop_assert!(copy.same_board(&board).is_ok());
        prop_assert_eq!(copy.digest(), board.digest());

        let mut target = Board::default();
        target.copy_from(&board);
        prop_assert!(target.same_board(&board).is_ok());
    }

    /// Invariant: every piece is in exactly one stack.
    #[test]
    fn pieces_are_conserved(config in config_strategy(), choices in prop::collection::vec(any::<usize>(), 1..40)) {
        let fresh = Board::new(config.clone());
        let expected = all_piece_ids(&fresh);
        prop_assert_eq!(expected.len(), fresh.pieces().len());
        walk(config, &choices, |board, _, _| {
            assert_eq!(all_piece_ids(board), expected);
        });
    }

    /// Invariant: everything the generator emits is legal and executes.
    #[test]
    fn generated_moves_are_sound(config in config_strategy(), choices in prop::collection::vec(any::<usize>(), 1..25)) {
        walk(config, &choices, |board, moves, _| {
            for mv in moves {
                assert!(board.legal_move(mv), "generated {mv} is not legal in {}", board.state());
                let mut probe = board.clone();
                assert!(probe.execute(mv, ReplayMode::Live).is_ok(), "generated {mv} failed to execute");
            }
        });
    }

    /// Invariant: nothing the oracle accepts is missing from the generator.
    #[test]
    fn legal_moves_are_generated(config in config_strategy(), choices in prop::collection::vec(any::<usize>(), 1..30)) {
        walk(config, &choices, |board, moves, _| {
            for mv in candidate_moves(board) {
                if board.legal_move(&mv) {
                    assert!(moves.contains(&mv), "legal {mv} missing from the generator in {}", board.state());
                }
            }
        });
    }

    /// Invariant: move text survives a print/parse round trip mid-game.
    #[test]
    fn generated_moves_reparse(choices in prop::collection::vec(any::<usize>(), 1..25)) {
        walk(EngineConfig::default(), &choices, |board, moves, _| {
            for mv in moves {
                let text = mv.to_string();
                let parsed = Move::parse(&text, board.whose_turn()).unwrap();
                assert_eq!(&parsed, mv, "{text} did not reparse");
            }
        });
    }

    /// Invariant: a failed move leaves the board untouched.
    #[test]
    fn rejected_moves_change_nothing(choices in prop::collection::vec(any::<usize>(), 1..25), piece in 0u16..24) {
        let mut board = walk(EngineConfig::default(), &choices, |_, _, _| {});
        let before = board.digest();
        let depth = board.undo_depth();
        let mv = Move::parse(&format!("Pick {piece}"), board.whose_turn().other()).unwrap();
        prop_assert!(board.execute(&mv, ReplayMode::Live).is_err());
        prop_assert_eq!(board.digest(), before);
        prop_assert_eq!(board.undo_depth(), depth);
    }
}
