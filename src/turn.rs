//! Turn lifecycle, history and undo.
//!
//! The manager owns the append-only log of `(event, resulting state)`
//! pairs and a cursor into it. A committed turn is four dispatches in
//! sequence: `TurnStart`, the player's move, `TurnEnd`, `TurnAdvanced` -
//! every one of them runs through the event engine, so abilities and tiles
//! react to turn boundaries exactly like they react to moves.
//!
//! Undo moves the cursor back one entry, redo moves it forward; committing
//! a new turn past an undone point discards the forward branch (linear
//! undo, not a tree). Observers only ever see fully-formed snapshots: a
//! turn either appends completely or not at all.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info};

use crate::color::PlayerColor;
use crate::event_processor::{
    dispatch_events, CommittedEvent, DispatchConfig, DispatchError, DispatchOutcome,
};
use crate::events::{EventPayload, GameEvent, SourceId};
use crate::game_state::GameState;
use crate::movement::Move;
use crate::ruleset::{legal_moves_for_player, Ruleset, Verdict};

/// Turn-level failures.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnError {
    /// The submitted move is not in the legal set. Nothing was applied.
    IllegalMove { mv: Move },
    /// The game has already been decided.
    GameAlreadyOver,
    /// The cursor is at the beginning of history.
    NothingToUndo,
    /// The cursor is at the end of history.
    NothingToRedo,
    /// The event engine failed while resolving the turn.
    Dispatch(DispatchError),
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::IllegalMove { mv } => {
                write!(f, "illegal move {} -> {}", mv.from, mv.to)
            }
            TurnError::GameAlreadyOver => write!(f, "the game is already over"),
            TurnError::NothingToUndo => write!(f, "nothing to undo"),
            TurnError::NothingToRedo => write!(f, "nothing to redo"),
            TurnError::Dispatch(err) => write!(f, "dispatch failed: {err}"),
        }
    }
}

impl std::error::Error for TurnError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TurnError::Dispatch(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DispatchError> for TurnError {
    fn from(err: DispatchError) -> Self {
        TurnError::Dispatch(err)
    }
}

/// Per-player time budgets, fed with caller-measured elapsed time.
///
/// The clock never samples wall time itself; the embedding layer owns real
/// timers and reports how long each turn took. That keeps resolution
/// deterministic and the clock testable. A timeout fires at most once.
#[derive(Debug, Clone, PartialEq)]
pub struct GameClock {
    remaining: [Duration; 2],
    timed_out: Option<PlayerColor>,
}

fn clock_index(player: PlayerColor) -> usize {
    match player {
        PlayerColor::White => 0,
        PlayerColor::Black => 1,
    }
}

impl GameClock {
    /// Both players start with the same budget.
    pub fn new(budget: Duration) -> Self {
        Self {
            remaining: [budget, budget],
            timed_out: None,
        }
    }

    /// Time left for a player.
    pub fn remaining(&self, player: PlayerColor) -> Duration {
        self.remaining[clock_index(player)]
    }

    /// The clock sees every committed event. Only bookkeeping; charging
    /// happens through [`GameClock::charge`].
    pub fn observe(&mut self, _event: &GameEvent) {}

    /// Deduct elapsed time from a player's budget. Returns the player the
    /// first time their budget hits zero, and never again after that.
    pub fn charge(&mut self, player: PlayerColor, elapsed: Duration) -> Option<PlayerColor> {
        if self.timed_out.is_some() {
            return None;
        }
        let budget = &mut self.remaining[clock_index(player)];
        *budget = budget.saturating_sub(elapsed);
        if budget.is_zero() {
            self.timed_out = Some(player);
            Some(player)
        } else {
            None
        }
    }
}

/// Build the seed events for one submitted move.
///
/// A capturing move seeds a capture plus a dependent follow-up move; a
/// plain move seeds just the move; a non-displacing action seeds nothing
/// and merely consumes the turn.
fn move_seeds(state: &GameState, mv: &Move) -> Vec<GameEvent> {
    if !mv.displacing {
        return Vec::new();
    }
    let actor = state.current_player();
    if mv.capture {
        let Some(victim) = state.board().piece_at(mv.to) else {
            return Vec::new();
        };
        let capture = GameEvent::new(
            actor,
            SourceId::Piece(mv.piece),
            EventPayload::Capture {
                attacker: mv.piece,
                victim: victim.id(),
                at: mv.to,
            },
        )
        .as_player_action();
        let advance = GameEvent::new(
            actor,
            SourceId::Piece(mv.piece),
            EventPayload::Move {
                piece: mv.piece,
                from: mv.from,
                to: mv.to,
                kind: mv.kind,
            },
        )
        .as_player_action()
        .depending_on(capture.id);
        vec![capture, advance]
    } else {
        vec![GameEvent::new(
            actor,
            SourceId::Piece(mv.piece),
            EventPayload::Move {
                piece: mv.piece,
                from: mv.from,
                to: mv.to,
                kind: mv.kind,
            },
        )
        .as_player_action()]
    }
}

fn validate_move(state: &GameState, ruleset: &dyn Ruleset, mv: &Move) -> Result<(), TurnError> {
    let illegal = || TurnError::IllegalMove { mv: *mv };
    let piece = state.board().piece_at(mv.from).ok_or_else(illegal)?;
    if piece.id() != mv.piece || piece.owner() != state.current_player() {
        return Err(illegal());
    }
    if mv.displacing && !ruleset.legal_moves(state, piece).moves.contains(mv) {
        return Err(illegal());
    }
    Ok(())
}

/// Resolve a move against `state` without touching any history.
///
/// Runs the full boundary sequence (`TurnStart`, the move, `TurnEnd`,
/// `TurnAdvanced`) so reactive abilities behave exactly as they would in a
/// committed turn. This is the entry point the adversarial search uses for
/// its simulations.
pub fn simulate_move(
    state: &GameState,
    ruleset: &dyn Ruleset,
    mv: &Move,
    config: &DispatchConfig,
) -> Result<DispatchOutcome, TurnError> {
    validate_move(state, ruleset, mv)?;

    let player = state.current_player();
    let turn = state.turn_number();
    let mut committed = Vec::new();
    let mut current = state.clone();

    let batches = [
        vec![GameEvent::new(
            player,
            SourceId::Engine,
            EventPayload::TurnStart { player, turn },
        )],
        move_seeds(&current, mv),
        vec![GameEvent::new(
            player,
            SourceId::Engine,
            EventPayload::TurnEnd { player, turn },
        )],
        vec![GameEvent::new(
            player,
            SourceId::Engine,
            EventPayload::TurnAdvanced {
                next_player: player.opponent(),
                turn: turn + 1,
            },
        )],
    ];

    for seeds in batches {
        let outcome = dispatch_events(&current, seeds, config)?;
        committed.extend(outcome.committed);
        current = outcome.state;
    }

    Ok(DispatchOutcome {
        committed,
        state: current,
    })
}

/// Owns the canonical history and drives the turn lifecycle.
pub struct TurnManager {
    ruleset: Box<dyn Ruleset>,
    config: DispatchConfig,
    initial: GameState,
    entries: Vec<CommittedEvent>,
    cursor: usize,
    clock: Option<GameClock>,
}

impl TurnManager {
    pub fn new(initial: GameState, ruleset: Box<dyn Ruleset>) -> Self {
        Self {
            ruleset,
            config: DispatchConfig::default(),
            initial,
            entries: Vec::new(),
            cursor: 0,
            clock: None,
        }
    }

    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: GameClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// The current committed snapshot.
    pub fn current_state(&self) -> &GameState {
        if self.cursor == 0 {
            &self.initial
        } else {
            &self.entries[self.cursor - 1].state
        }
    }

    pub fn ruleset(&self) -> &dyn Ruleset {
        self.ruleset.as_ref()
    }

    pub fn dispatch_config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn clock(&self) -> Option<&GameClock> {
        self.clock.as_ref()
    }

    /// The active portion of the canonical event log.
    pub fn log(&self) -> &[CommittedEvent] {
        &self.entries[..self.cursor]
    }

    /// The committed events of the most recent turn: everything from the
    /// last `TurnStart` onward.
    pub fn last_turn_events(&self) -> &[CommittedEvent] {
        let active = self.log();
        let start = active
            .iter()
            .rposition(|e| matches!(e.event.payload, EventPayload::TurnStart { .. }))
            .unwrap_or(0);
        &active[start..]
    }

    /// The verdict, if the active history contains a decided game.
    pub fn verdict(&self) -> Option<Verdict> {
        self.log().iter().rev().find_map(|e| match e.event.payload {
            EventPayload::GameOver { winner } => {
                Some(winner.map_or(Verdict::Draw, Verdict::Winner))
            }
            _ => None,
        })
    }

    pub fn is_over(&self) -> bool {
        self.verdict().is_some()
    }

    /// Every legal move for the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        legal_moves_for_player(self.current_state(), self.ruleset.as_ref())
    }

    /// Resolve a move against the current state without touching history.
    pub fn evaluate_move(&self, mv: &Move) -> Result<DispatchOutcome, TurnError> {
        simulate_move(self.current_state(), self.ruleset.as_ref(), mv, &self.config)
    }

    /// Commit one turn. Returns the events the turn appended.
    pub fn take_turn(&mut self, mv: Move) -> Result<&[CommittedEvent], TurnError> {
        self.commit_turn(mv, None)
    }

    /// Commit one turn, charging `elapsed` against the mover's clock.
    pub fn take_turn_timed(
        &mut self,
        mv: Move,
        elapsed: Duration,
    ) -> Result<&[CommittedEvent], TurnError> {
        self.commit_turn(mv, Some(elapsed))
    }

    fn commit_turn(
        &mut self,
        mv: Move,
        elapsed: Option<Duration>,
    ) -> Result<&[CommittedEvent], TurnError> {
        if self.is_over() {
            return Err(TurnError::GameAlreadyOver);
        }
        validate_move(self.current_state(), self.ruleset.as_ref(), &mv)?;

        // Committing past an undone point discards the forward branch.
        self.entries.truncate(self.cursor);
        let start = self.entries.len();

        let result = self.run_turn(mv, elapsed);
        match result {
            Ok(()) => {
                self.cursor = self.entries.len();
                info!(
                    events = self.cursor - start,
                    turn = self.current_state().turn_number(),
                    "turn committed"
                );
                Ok(&self.entries[start..self.cursor])
            }
            Err(err) => {
                // A failed turn appends nothing.
                self.entries.truncate(start);
                Err(err)
            }
        }
    }

    fn run_turn(&mut self, mv: Move, elapsed: Option<Duration>) -> Result<(), TurnError> {
        let state = self.current_state().clone();
        let player = state.current_player();
        let turn = state.turn_number();

        let state = self.dispatch_and_append(
            &state,
            vec![GameEvent::new(
                player,
                SourceId::Engine,
                EventPayload::TurnStart { player, turn },
            )],
        )?;

        let seeds = move_seeds(&state, &mv);
        let state = self.dispatch_and_append(&state, seeds)?;

        if let Some(verdict) = self.ruleset.game_over(&state) {
            let winner = match verdict {
                Verdict::Winner(player) => Some(player),
                Verdict::Draw => None,
            };
            info!(?winner, "game over");
            self.dispatch_and_append(
                &state,
                vec![GameEvent::new(
                    player,
                    SourceId::Engine,
                    EventPayload::GameOver { winner },
                )],
            )?;
            return Ok(());
        }

        let state = self.dispatch_and_append(
            &state,
            vec![GameEvent::new(
                player,
                SourceId::Engine,
                EventPayload::TurnEnd { player, turn },
            )],
        )?;
        let state = self.dispatch_and_append(
            &state,
            vec![GameEvent::new(
                player,
                SourceId::Engine,
                EventPayload::TurnAdvanced {
                    next_player: player.opponent(),
                    turn: turn + 1,
                },
            )],
        )?;

        // The clock fires its timeout through the same pipeline, once.
        let timed_out = match (self.clock.as_mut(), elapsed) {
            (Some(clock), Some(elapsed)) => clock.charge(player, elapsed),
            _ => None,
        };
        if let Some(loser) = timed_out {
            let winner = match self.ruleset.timeout_verdict(loser) {
                Verdict::Winner(winner) => Some(winner),
                Verdict::Draw => None,
            };
            info!(%loser, "clock exhausted");
            let timeout = GameEvent::new(
                loser,
                SourceId::Engine,
                EventPayload::TimeOut { player: loser },
            );
            let game_over =
                GameEvent::new(loser, SourceId::Engine, EventPayload::GameOver { winner })
                    .depending_on(timeout.id);
            self.dispatch_and_append(&state, vec![timeout, game_over])?;
        }

        Ok(())
    }

    fn dispatch_and_append(
        &mut self,
        state: &GameState,
        seeds: Vec<GameEvent>,
    ) -> Result<GameState, TurnError> {
        let outcome = dispatch_events(state, seeds, &self.config)?;
        for entry in outcome.committed {
            if let Some(clock) = self.clock.as_mut() {
                clock.observe(&entry.event);
            }
            self.entries.push(entry);
        }
        Ok(outcome.state)
    }

    /// Move the cursor back one entry.
    pub fn undo(&mut self) -> Result<(), TurnError> {
        if self.cursor == 0 {
            return Err(TurnError::NothingToUndo);
        }
        self.cursor -= 1;
        debug!(cursor = self.cursor, "undo");
        Ok(())
    }

    /// Move the cursor forward one entry.
    pub fn redo(&mut self) -> Result<(), TurnError> {
        if self.cursor == self.entries.len() {
            return Err(TurnError::NothingToRedo);
        }
        self.cursor += 1;
        debug!(cursor = self.cursor, "redo");
        Ok(())
    }

    /// Rewind the cursor to the state before the most recent turn.
    pub fn undo_turn(&mut self) -> Result<(), TurnError> {
        if self.cursor == 0 {
            return Err(TurnError::NothingToUndo);
        }
        let rewound = self.last_turn_events().len();
        self.cursor -= rewound.max(1);
        debug!(cursor = self.cursor, "undo turn");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::coord::Square;
    use crate::movement::MoveKind;
    use crate::piece::{BasePiece, Piece, PieceKind};
    use crate::ruleset::LastPieceStanding;

    fn manager_with_two_rooks() -> TurnManager {
        let mut state = GameState::new(Board::new(8, 8), PlayerColor::White);
        let white = Piece::Base(BasePiece::new(PieceKind::Rook, PlayerColor::White));
        let black = Piece::Base(BasePiece::new(PieceKind::Rook, PlayerColor::Black));
        state.board_mut().place_piece(white, Square::new(0, 0)).unwrap();
        state.board_mut().place_piece(black, Square::new(7, 7)).unwrap();
        TurnManager::new(state, Box::new(LastPieceStanding))
    }

    fn first_legal_move(manager: &TurnManager) -> Move {
        manager.legal_moves()[0]
    }

    #[test]
    fn test_turn_emits_boundary_sequence() {
        let mut manager = manager_with_two_rooks();
        let mv = first_legal_move(&manager);
        let events = manager.take_turn(mv).unwrap();

        let kinds: Vec<_> = events
            .iter()
            .map(|e| e.event.payload.kind_name())
            .collect();
        assert_eq!(kinds, vec!["turn-start", "move", "turn-end", "turn-advanced"]);
        assert_eq!(manager.current_state().current_player(), PlayerColor::Black);
        assert_eq!(manager.current_state().turn_number(), 2);
    }

    #[test]
    fn test_illegal_move_is_rejected_not_applied() {
        let mut manager = manager_with_two_rooks();
        let piece = manager.current_state().board().piece_at(Square::new(0, 0)).unwrap();
        let bad = Move::new(
            piece.id(),
            Square::new(0, 0),
            Square::new(5, 4),
            false,
            MoveKind::Slide,
        );
        let err = manager.take_turn(bad).unwrap_err();
        assert!(matches!(err, TurnError::IllegalMove { .. }));
        assert!(manager.log().is_empty());
    }

    #[test]
    fn test_undo_redo_restore_states_exactly() {
        let mut manager = manager_with_two_rooks();
        let before = manager.current_state().clone();

        let mv = first_legal_move(&manager);
        manager.take_turn(mv).unwrap();
        let after_one = manager.current_state().clone();

        let mv = first_legal_move(&manager);
        manager.take_turn(mv).unwrap();

        // Rewind both turns entry by entry.
        while manager.current_state() != &before {
            manager.undo().unwrap();
        }
        assert_eq!(manager.current_state(), &before);

        // Redo reproduces the pre-undo states bit for bit.
        while manager.current_state() != &after_one {
            manager.redo().unwrap();
        }
        assert_eq!(manager.current_state(), &after_one);
    }

    #[test]
    fn test_commit_after_undo_discards_forward_branch() {
        let mut manager = manager_with_two_rooks();
        let mv = first_legal_move(&manager);
        manager.take_turn(mv).unwrap();
        let full_len = manager.entries.len();

        manager.undo_turn().unwrap();
        assert_eq!(manager.log().len(), 0);

        let mv = first_legal_move(&manager);
        manager.take_turn(mv).unwrap();
        assert!(manager.entries.len() <= full_len + 1);
        assert_eq!(manager.log().len(), manager.entries.len());
        assert!(manager.redo().is_err());
    }

    #[test]
    fn test_evaluate_move_leaves_history_untouched() {
        let manager = manager_with_two_rooks();
        let mv = first_legal_move(&manager);
        let outcome = manager.evaluate_move(&mv).unwrap();

        assert_eq!(outcome.state.current_player(), PlayerColor::Black);
        assert!(manager.log().is_empty());
        assert_eq!(manager.current_state().current_player(), PlayerColor::White);
    }

    #[test]
    fn test_capturing_the_last_piece_ends_the_game() {
        let mut state = GameState::new(Board::new(8, 8), PlayerColor::White);
        let white = Piece::Base(BasePiece::new(PieceKind::Rook, PlayerColor::White));
        let white_id = white.id();
        let black = Piece::Base(BasePiece::new(PieceKind::Pawn, PlayerColor::Black));
        state.board_mut().place_piece(white, Square::new(0, 0)).unwrap();
        state.board_mut().place_piece(black, Square::new(0, 5)).unwrap();
        let mut manager = TurnManager::new(state, Box::new(LastPieceStanding));

        let capture = Move::new(
            white_id,
            Square::new(0, 0),
            Square::new(0, 5),
            true,
            MoveKind::Slide,
        );
        manager.take_turn(capture).unwrap();

        assert_eq!(manager.verdict(), Some(Verdict::Winner(PlayerColor::White)));
        assert!(manager.is_over());
        let err = manager.take_turn(capture).unwrap_err();
        assert_eq!(err, TurnError::GameAlreadyOver);
    }

    #[test]
    fn test_timeout_fires_through_the_pipeline_once() {
        let mut manager = manager_with_two_rooks();
        manager = manager.with_clock(GameClock::new(Duration::from_secs(5)));

        let mv = first_legal_move(&manager);
        manager
            .take_turn_timed(mv, Duration::from_secs(10))
            .unwrap();

        assert_eq!(manager.verdict(), Some(Verdict::Winner(PlayerColor::Black)));
        let kinds: Vec<_> = manager
            .log()
            .iter()
            .map(|e| e.event.payload.kind_name())
            .collect();
        assert_eq!(
            kinds
                .iter()
                .filter(|k| **k == "time-out")
                .count(),
            1
        );
        assert_eq!(kinds.iter().filter(|k| **k == "game-over").count(), 1);
    }

    #[test]
    fn test_non_displacing_action_consumes_the_turn() {
        let mut manager = manager_with_two_rooks();
        let piece = manager
            .current_state()
            .board()
            .piece_at(Square::new(0, 0))
            .unwrap();
        let action = Move::stationary(piece.id(), Square::new(0, 0));

        let events = manager.take_turn(action).unwrap();
        // Boundaries fire, but nothing displaces.
        let kinds: Vec<_> = events
            .iter()
            .map(|e| e.event.payload.kind_name())
            .collect();
        assert_eq!(kinds, vec!["turn-start", "turn-end", "turn-advanced"]);
        assert_eq!(manager.current_state().current_player(), PlayerColor::Black);
        assert!(
            manager
                .current_state()
                .board()
                .piece_at(Square::new(0, 0))
                .is_some()
        );
    }

    #[test]
    fn test_clock_charge_is_idempotent_after_timeout() {
        let mut clock = GameClock::new(Duration::from_secs(1));
        assert_eq!(
            clock.charge(PlayerColor::White, Duration::from_secs(2)),
            Some(PlayerColor::White)
        );
        assert_eq!(clock.charge(PlayerColor::White, Duration::from_secs(2)), None);
        assert_eq!(clock.charge(PlayerColor::Black, Duration::from_secs(2)), None);
    }
}
