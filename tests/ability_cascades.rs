//! Scenario tests for ability-driven event cascades, run through the full
//! turn pipeline the way a real game would drive them.

use gambit::{
    AbilityKind, BasePiece, Board, EventPayload, GameState, LastPieceStanding, Move, MoveKind,
    Piece, PieceKind, PlayerColor, Square, TurnManager,
};

fn empty_state() -> GameState {
    GameState::new(Board::new(8, 8), PlayerColor::White)
}

fn place(state: &mut GameState, piece: Piece, at: Square) {
    state.board_mut().place_piece(piece, at).unwrap();
}

fn capture_move(state: &GameState, from: Square, to: Square) -> Move {
    let piece = state.board().piece_at(from).unwrap();
    Move::new(piece.id(), from, to, true, MoveKind::Slide)
}

#[test]
fn rebounder_throws_the_victim_and_takes_its_square() {
    let mut state = empty_state();
    let attacker = Piece::Base(BasePiece::new(PieceKind::Rook, PlayerColor::White))
        .wrap(AbilityKind::Rebounder);
    let attacker_entity = attacker.entity_id();
    place(&mut state, attacker, Square::new(0, 1));

    let victim = Piece::Base(BasePiece::new(PieceKind::Pawn, PlayerColor::Black));
    let victim_entity = victim.entity_id();
    place(&mut state, victim, Square::new(0, 3));
    // A second black piece keeps the game from ending on the first turn.
    place(
        &mut state,
        Piece::Base(BasePiece::new(PieceKind::Rook, PlayerColor::Black)),
        Square::new(7, 7),
    );

    let mv = capture_move(&state, Square::new(0, 1), Square::new(0, 3));
    let mut manager = TurnManager::new(state, Box::new(LastPieceStanding));
    manager.take_turn(mv).unwrap();

    let board = manager.current_state().board();
    // The attacker sits on the vacated square, the victim survived two
    // squares further along the attack line.
    let (attacker_square, _) = board.find_entity(attacker_entity).unwrap();
    let (victim_square, victim_piece) = board.find_entity(victim_entity).unwrap();
    assert_eq!(attacker_square, Square::new(0, 3));
    assert_eq!(victim_square, Square::new(0, 5));
    assert_eq!(victim_piece.owner(), PlayerColor::Black);

    // No capture committed: the replacement swallowed it.
    assert!(
        manager
            .last_turn_events()
            .iter()
            .all(|e| !matches!(e.event.payload, EventPayload::Capture { .. }))
    );
}

#[test]
fn rebounder_with_off_board_landing_degrades_to_plain_capture() {
    let mut state = empty_state();
    let attacker = Piece::Base(BasePiece::new(PieceKind::Rook, PlayerColor::White))
        .wrap(AbilityKind::Rebounder);
    let attacker_entity = attacker.entity_id();
    place(&mut state, attacker, Square::new(0, 5));

    let victim = Piece::Base(BasePiece::new(PieceKind::Pawn, PlayerColor::Black));
    let victim_entity = victim.entity_id();
    // The bounce square (0, 9) is off the board.
    place(&mut state, victim, Square::new(0, 7));
    place(
        &mut state,
        Piece::Base(BasePiece::new(PieceKind::Rook, PlayerColor::Black)),
        Square::new(7, 0),
    );

    let mv = capture_move(&state, Square::new(0, 5), Square::new(0, 7));
    let mut manager = TurnManager::new(state, Box::new(LastPieceStanding));
    manager.take_turn(mv).unwrap();

    let board = manager.current_state().board();
    assert!(board.find_entity(victim_entity).is_none(), "victim captured");
    let (attacker_square, attacker_piece) = board.find_entity(attacker_entity).unwrap();
    assert_eq!(attacker_square, Square::new(0, 7));
    assert_eq!(attacker_piece.captures_made(), 1);
}

#[test]
fn rebounder_destroys_an_enemy_on_the_landing_square_first() {
    let mut state = empty_state();
    let attacker = Piece::Base(BasePiece::new(PieceKind::Rook, PlayerColor::White))
        .wrap(AbilityKind::Rebounder);
    place(&mut state, attacker, Square::new(0, 1));

    let victim = Piece::Base(BasePiece::new(PieceKind::Pawn, PlayerColor::Black));
    let victim_entity = victim.entity_id();
    place(&mut state, victim, Square::new(0, 3));

    let bystander = Piece::Base(BasePiece::new(PieceKind::Knight, PlayerColor::Black));
    let bystander_entity = bystander.entity_id();
    place(&mut state, bystander, Square::new(0, 5));
    place(
        &mut state,
        Piece::Base(BasePiece::new(PieceKind::Rook, PlayerColor::Black)),
        Square::new(7, 7),
    );

    let mv = capture_move(&state, Square::new(0, 1), Square::new(0, 3));
    let mut manager = TurnManager::new(state, Box::new(LastPieceStanding));
    manager.take_turn(mv).unwrap();

    let board = manager.current_state().board();
    assert!(
        board.find_entity(bystander_entity).is_none(),
        "the piece on the landing square dies before the victim arrives"
    );
    let (victim_square, _) = board.find_entity(victim_entity).unwrap();
    assert_eq!(victim_square, Square::new(0, 5));
}

#[test]
fn ascendant_climbs_one_rank_per_kill_and_stops_at_queen() {
    let ladder = [
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
    ];

    let mut state = empty_state();
    let hunter = Piece::Base(BasePiece::new(PieceKind::Pawn, PlayerColor::White))
        .wrap(AbilityKind::Ascendant);
    let hunter_entity = hunter.entity_id();
    let hunter_outer = hunter.id();
    place(&mut state, hunter, Square::new(3, 3));

    // Five victims; the fifth kill happens as a queen and must not promote.
    let victims = [
        Square::new(4, 4),
        Square::new(5, 5),
        Square::new(4, 4),
        Square::new(5, 5),
        Square::new(4, 4),
    ];
    for (round, victim_square) in victims.into_iter().enumerate() {
        place(
            &mut state,
            Piece::Base(BasePiece::new(PieceKind::Pawn, PlayerColor::Black)),
            victim_square,
        );

        let (from, piece) = state.board().find_entity(hunter_entity).unwrap();
        let mv = Move::new(piece.id(), from, victim_square, true, MoveKind::Slide);
        let seeds = {
            use gambit::{GameEvent, SourceId};
            let victim_id = state.board().piece_at(victim_square).unwrap().id();
            let capture = GameEvent::new(
                PlayerColor::White,
                SourceId::Piece(mv.piece),
                EventPayload::Capture {
                    attacker: mv.piece,
                    victim: victim_id,
                    at: victim_square,
                },
            )
            .as_player_action();
            let advance = GameEvent::new(
                PlayerColor::White,
                SourceId::Piece(mv.piece),
                EventPayload::Move {
                    piece: mv.piece,
                    from,
                    to: victim_square,
                    kind: MoveKind::Slide,
                },
            )
            .as_player_action()
            .depending_on(capture.id);
            vec![capture, advance]
        };

        let outcome =
            gambit::dispatch_events(&state, seeds, &gambit::DispatchConfig::default()).unwrap();
        state = outcome.state;

        let (_, evolved) = state.board().find_entity(hunter_entity).unwrap();
        let expected = *ladder.get(round).unwrap_or(&PieceKind::Queen);
        assert_eq!(evolved.kind(), expected, "after kill {}", round + 1);
        // The stable identity and the outer wrapper never change.
        assert_eq!(evolved.entity_id(), hunter_entity);
        assert_eq!(evolved.id(), hunter_outer);
        assert_eq!(evolved.captures_made() as usize, round + 1);
    }

    // The queen's final kill produced no further promotion event.
    assert_eq!(
        state.board().find_entity(hunter_entity).unwrap().1.kind(),
        PieceKind::Queen
    );
}

#[test]
fn guardian_dies_in_place_of_an_adjacent_ally() {
    let mut state = empty_state();
    let attacker = Piece::Base(BasePiece::new(PieceKind::Rook, PlayerColor::White));
    let attacker_entity = attacker.entity_id();
    place(&mut state, attacker, Square::new(0, 0));

    let protected = Piece::Base(BasePiece::new(PieceKind::Pawn, PlayerColor::Black));
    let protected_entity = protected.entity_id();
    place(&mut state, protected, Square::new(0, 4));

    let guardian = Piece::Base(BasePiece::new(PieceKind::Knight, PlayerColor::Black))
        .wrap(AbilityKind::Guardian);
    let guardian_entity = guardian.entity_id();
    place(&mut state, guardian, Square::new(1, 4));

    let mv = capture_move(&state, Square::new(0, 0), Square::new(0, 4));
    let mut manager = TurnManager::new(state, Box::new(LastPieceStanding));
    manager.take_turn(mv).unwrap();

    let board = manager.current_state().board();
    // The ally lives, the guardian is gone, the attacker never advanced.
    assert!(board.find_entity(protected_entity).is_some());
    assert!(board.find_entity(guardian_entity).is_none());
    let (attacker_square, _) = board.find_entity(attacker_entity).unwrap();
    assert_eq!(attacker_square, Square::new(0, 0));

    // Exactly one destroy in the turn's log, and no re-trigger on it.
    let destroys = manager
        .last_turn_events()
        .iter()
        .filter(|e| matches!(e.event.payload, EventPayload::Destroy { .. }))
        .count();
    assert_eq!(destroys, 1);
}

#[test]
fn event_log_tracks_survival_by_entity_id_across_promotion() {
    let mut state = empty_state();
    let hunter = Piece::Base(BasePiece::new(PieceKind::Pawn, PlayerColor::White))
        .wrap(AbilityKind::Ascendant);
    let hunter_entity = hunter.entity_id();
    place(&mut state, hunter, Square::new(3, 3));

    let victim = Piece::Base(BasePiece::new(PieceKind::Pawn, PlayerColor::Black));
    place(&mut state, victim, Square::new(4, 4));
    place(
        &mut state,
        Piece::Base(BasePiece::new(PieceKind::Rook, PlayerColor::Black)),
        Square::new(7, 7),
    );

    let mv = capture_move(&state, Square::new(3, 3), Square::new(4, 4));
    let mut manager = TurnManager::new(state, Box::new(LastPieceStanding));
    manager.take_turn(mv).unwrap();

    // The promotion shows up in the turn log, and the survivor is still
    // findable under its stable entity even though its base changed.
    assert!(manager.last_turn_events().iter().any(|e| matches!(
        e.event.payload,
        EventPayload::PieceChanged { .. }
    )));
    let (_, survivor) = manager
        .current_state()
        .board()
        .find_entity(hunter_entity)
        .unwrap();
    assert_eq!(survivor.kind(), PieceKind::Knight);
}
