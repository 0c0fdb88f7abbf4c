//! Move protocol tests: text decoding, board cross-checks, and the agreement
//! between compound moves and their pick/drop spelling.

use plateau::{
    Board, Cell, EngineError, Level, Locus, Move, MoveOp, ParseError, PieceId, PieceKind, PlateauError, PlayerId,
    ReplayMode, State, Variation,
};

fn play(board: &mut Board, text: &str) {
    let mv = Move::parse(text, board.whose_turn()).unwrap();
    board
        .execute(&mv, ReplayMode::Live)
        .unwrap_or_else(|e| panic!("{text}: {e}"));
}

fn rack_top(board: &Board, player: PlayerId, kind: PieceKind) -> PieceId {
    board.stack(board.rack(player, kind)).unwrap().top().unwrap()
}

fn cell_id(board: &Board, name: &str) -> u16 {
    board.cell_id(name.parse::<Cell>().unwrap()).unwrap().0
}

/// A1 holds the first player's red over blue; D4 the second player's mute.
fn opened() -> (Board, PieceId) {
    let mut board = Board::default();
    let red = rack_top(&board, PlayerId::FIRST, PieceKind::Red);
    let blue = rack_top(&board, PlayerId::FIRST, PieceKind::Blue);
    play(&mut board, &format!("Onboard A1 100 RXBX {},{}", red.0, blue.0));
    play(&mut board, "Done");
    let mute = rack_top(&board, PlayerId::SECOND, PieceKind::Mute);
    play(&mut board, &format!("Onboard D4 100 XX {}", mute.0));
    play(&mut board, "Done");
    (board, red)
}

// =============================================================================
// Decoding
// =============================================================================

#[test]
fn test_loci() {
    assert_eq!("R".parse::<Locus>().unwrap(), Locus::Rack);
    assert_eq!("P".parse::<Locus>().unwrap(), Locus::Bar);
    assert_eq!("T".parse::<Locus>().unwrap(), Locus::Trade);
    assert_eq!("C2".parse::<Locus>().unwrap(), Locus::Cell(Cell::new(2, 1)));
    assert!(matches!("Q".parse::<Locus>(), Err(ParseError::BadLocus(_))));
}

#[test]
fn test_sentinel_levels() {
    assert_eq!("100".parse::<Level>().unwrap(), Level::Top);
    assert_eq!("99".parse::<Level>().unwrap(), Level::Settle);
    assert_eq!("-1".parse::<Level>().unwrap(), Level::Return);
    assert_eq!("2".parse::<Level>().unwrap(), Level::At(2));
    assert!("-5".parse::<Level>().is_err());
}

#[test]
fn test_setup_tokens() {
    assert_eq!("plateau".parse::<Variation>().unwrap(), Variation::Plateau);
    assert_eq!("plateau-5".parse::<Variation>().unwrap(), Variation::Plateau5);
    assert_eq!(Variation::Plateau5.to_string(), "plateau-5");
    assert!(matches!("chess".parse::<Variation>(), Err(ParseError::UnknownVariation(_))));
}

#[test]
fn test_bad_tokens() {
    let cases = [
        ("Teleport A1", "unrecognized"),
        ("Onboard A1 100 RZ 1", "colour"),
        ("Drop x 100", "number"),
        ("Start P7", "player"),
        ("FromTo A1 2 RXBX", "missing"),
        ("Drop 65536 100", "number"),
        ("Drop -2 100", "number"),
        ("Done foo", "trailing"),
        ("Resign 3", "trailing"),
        ("FromTo A1 2 RXBX A3 A4", "trailing"),
    ];
    for (text, needle) in cases {
        let err = Move::parse(text, PlayerId::FIRST).unwrap_err();
        assert!(err.to_string().contains(needle), "{text}: {err}");
    }
}

/// Stack ids past the id range are refused, never wrapped onto a real stack.
#[test]
fn test_out_of_range_stack_id() {
    let err = Move::parse("Drop 65536 100", PlayerId::FIRST).unwrap_err();
    assert_eq!(err, ParseError::BadNumber("65536".to_string()));
    let top = Move::parse("Drop 65535 100", PlayerId::FIRST).unwrap();
    assert!(matches!(top.op, MoveOp::Drop { stack: Some(plateau::StackId(65535)), .. }));
}

#[test]
fn test_parse_error_is_not_fatal() {
    let err: PlateauError = Move::parse("Jump", PlayerId::FIRST).unwrap_err().into();
    assert!(!err.is_fatal());
}

// =============================================================================
// Board cross-checks
// =============================================================================

#[test]
fn test_pick_locus_must_match() {
    let (board, red) = opened();
    let mv = Move::parse(&format!("Pick {} B2 100", red.0), PlayerId::FIRST).unwrap();
    assert!(!board.legal_move(&mv));

    // Replay skips the oracle, so the engine's own check fires.
    let mut replay = board.clone();
    let err = replay.execute(&mv, ReplayMode::Replay).unwrap_err();
    assert!(matches!(err, PlateauError::Engine(EngineError::BoardMismatch(_))));
    assert!(err.is_fatal());
    assert!(replay.same_board(&board).is_ok());
}

#[test]
fn test_colour_commitment_checked_in_replay() {
    let (board, _) = opened();
    let mv = Move::parse("FromTo A1 2 BXRX A3", PlayerId::FIRST).unwrap();
    let mut replay = board.clone();
    let err = replay.execute(&mv, ReplayMode::Replay).unwrap_err();
    assert!(matches!(err, PlateauError::Engine(EngineError::ColorMismatch { .. })));
    assert_eq!(replay.digest(), board.digest());
    assert_eq!(replay.state(), State::Play);
}

#[test]
fn test_drop_locus_must_match() {
    let (mut board, red) = opened();
    play(&mut board, &format!("Pick {}", red.0));
    let a3 = cell_id(&board, "A3");
    let wrong = Move::parse(&format!("Drop {a3} 100 B3"), PlayerId::FIRST).unwrap();
    assert!(!board.legal_move(&wrong));
    play(&mut board, &format!("Drop {a3} 100 A3"));
    assert_eq!(board.state(), State::PlayDone);
}

#[test]
fn test_wrong_player_rejected() {
    let (board, _) = opened();
    let mv = Move::parse("FromTo A1 2 RXBX A3", PlayerId::SECOND).unwrap();
    assert!(!board.legal_move(&mv));
    let mut copy = board.clone();
    assert!(matches!(
        copy.execute(&mv, ReplayMode::Live),
        Err(PlateauError::Engine(EngineError::IllegalMove { .. }))
    ));
}

// =============================================================================
// Compound moves and micro-steps
// =============================================================================

/// `FromTo` is exactly a pick followed by a drop.
#[test]
fn test_from_to_matches_pick_and_drop() {
    let (mut compound, red) = opened();
    let mut steps = compound.clone();

    play(&mut compound, "FromTo A1 1 RX A3");
    play(&mut steps, &format!("Pick {}", red.0));
    assert_eq!(steps.state(), State::PlayDrop);
    let a3 = cell_id(&steps, "A3");
    play(&mut steps, &format!("Drop {a3} 100"));

    assert_eq!(compound.state(), State::PlayDone);
    assert_eq!(compound.digest(), steps.digest());
    assert!(compound.same_board(&steps).is_ok());
}

/// Dropping back on the origin cancels the move.
#[test]
fn test_drop_on_origin_cancels() {
    let (mut board, red) = opened();
    let before = board.digest();
    play(&mut board, &format!("Pick {}", red.0));
    play(&mut board, "Drop -1 100");
    assert_eq!(board.state(), State::Play);
    assert_eq!(board.digest(), before);
}

/// A landed stack can be lifted again and moved further the same way.
#[test]
fn test_continue_after_landing() {
    let (mut board, red) = opened();
    play(&mut board, "FromTo A1 2 RXBX A2");
    assert_eq!(board.state(), State::PlayDone);
    assert!(board.list_moves().iter().any(|m| matches!(m.op, MoveOp::Done)));

    // Lifting the red back off and carrying it on to A3.
    play(&mut board, &format!("Pick {}", red.0));
    assert_eq!(board.state(), State::PlayDrop);
    let a3 = cell_id(&board, "A3");
    play(&mut board, &format!("Drop {a3} 100"));
    assert_eq!(board.state(), State::PlayDone);
    assert_eq!(board.cell("A3".parse().unwrap()).unwrap().pieces(), &[red]);
}

#[test]
fn test_onboard_in_play_is_single() {
    let (board, _) = opened();
    let me = board.whose_turn();
    let mute = rack_top(&board, me, PieceKind::Mute);
    let twister = rack_top(&board, me, PieceKind::Twister);
    assert!(board.legal_move(&Move::parse(&format!("Onboard B2 100 XX {}", mute.0), me).unwrap()));
    assert!(!board.legal_move(
        &Move::parse(&format!("Onboard B2 100 XXRB {},{}", mute.0, twister.0), me).unwrap()
    ));
    // Onto the opponent's piece is not allowed.
    assert!(!board.legal_move(&Move::parse(&format!("Onboard D4 100 XX {}", mute.0), me).unwrap()));
}
