//! Immutable game state snapshots.
//!
//! A `GameState` is never mutated once published: applying an event clones
//! the state and mutates the clone, so every snapshot retained in history
//! stays observably frozen. Observers may read any published snapshot
//! without coordination.
//!
//! Mutable access to the board exists for setup (building a position before
//! play begins); during play all change flows through the dispatch engine.

use crate::board::{Board, BoardError};
use crate::color::PlayerColor;
use crate::events::{EventPayload, GameEvent};
use crate::movement::Move;
use crate::piece::Piece;

/// One snapshot of a game in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    board: Board,
    current_player: PlayerColor,
    turn_number: u32,
    move_history: Vec<Move>,
}

impl GameState {
    /// A fresh state on the given board, `starting_player` to move, turn 1.
    pub fn new(board: Board, starting_player: PlayerColor) -> Self {
        Self {
            board,
            current_player: starting_player,
            turn_number: 1,
            move_history: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Mutable board access for setup. Not for use once a state has been
    /// published to history.
    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn current_player(&self) -> PlayerColor {
        self.current_player
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    /// Every displacement applied to this state, in order.
    pub fn move_history(&self) -> &[Move] {
        &self.move_history
    }

    /// Apply one committed event, producing the next snapshot.
    ///
    /// `Ok(None)` means the event no longer applies: the piece it expected
    /// is gone or elsewhere, so the event is dropped without effect. That is
    /// the pass-through rule for cascades whose earlier events rearranged
    /// the board. `Err` is reserved for genuine invariant violations.
    pub(crate) fn apply(&self, event: &GameEvent) -> Result<Option<GameState>, BoardError> {
        let mut next = self.clone();
        match &event.payload {
            EventPayload::Move {
                piece,
                from,
                to,
                kind,
            } => {
                let found = next.board.piece_at(*from).map(Piece::id);
                if found != Some(*piece) {
                    return Ok(None);
                }
                next.board.move_piece(*from, *to)?;
                if let Some(moved) = next.board.piece_at_mut(*to) {
                    moved.record_move();
                }
                next.move_history
                    .push(Move::new(*piece, *from, *to, false, *kind));
            }
            EventPayload::Capture {
                attacker,
                victim,
                at,
            } => {
                let found = next.board.piece_at(*at).map(Piece::id);
                if found != Some(*victim) {
                    return Ok(None);
                }
                next.board.remove_piece(*at);
                if let Some((square, _)) = next.board.find_piece(*attacker) {
                    if let Some(piece) = next.board.piece_at_mut(square) {
                        piece.record_capture();
                    }
                }
            }
            EventPayload::Destroy { piece } => {
                let Some((square, _)) = next.board.find_piece(*piece) else {
                    return Ok(None);
                };
                next.board.remove_piece(square);
            }
            EventPayload::TileChanged { at, tile } => {
                next.board.set_tile(tile.clone(), *at)?;
            }
            EventPayload::PieceChanged { piece, new_base } => {
                let Some((square, _)) = next.board.find_piece(*piece) else {
                    return Ok(None);
                };
                let old = next
                    .board
                    .remove_piece(square)
                    .ok_or(BoardError::Vacant(square))?;
                let rebuilt = old.rebuild_with_base(new_base.clone());
                next.board.place_piece(rebuilt, square)?;
            }
            EventPayload::TurnStart { .. } | EventPayload::TurnEnd { .. } => {}
            EventPayload::TurnAdvanced { next_player, turn } => {
                next.current_player = *next_player;
                next.turn_number = *turn;
            }
            EventPayload::GameOver { .. } | EventPayload::TimeOut { .. } => {}
        }
        Ok(Some(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Square;
    use crate::events::SourceId;
    use crate::movement::MoveKind;
    use crate::piece::{BasePiece, PieceKind};

    fn state_with_pawn(at: Square) -> (GameState, crate::ids::PieceId) {
        let mut state = GameState::new(Board::new(8, 8), PlayerColor::White);
        let piece = Piece::Base(BasePiece::new(PieceKind::Pawn, PlayerColor::White));
        let id = piece.id();
        state.board_mut().place_piece(piece, at).unwrap();
        (state, id)
    }

    #[test]
    fn test_apply_move_leaves_original_frozen() {
        let from = Square::new(3, 3);
        let to = Square::new(3, 4);
        let (state, id) = state_with_pawn(from);

        let event = GameEvent::new(
            PlayerColor::White,
            SourceId::Piece(id),
            EventPayload::Move {
                piece: id,
                from,
                to,
                kind: MoveKind::Slide,
            },
        );
        let next = state.apply(&event).unwrap().expect("move applies");

        // Published snapshot untouched.
        assert!(state.board().piece_at(from).is_some());
        assert!(state.board().piece_at(to).is_none());
        assert!(state.move_history().is_empty());

        // New snapshot reflects the move.
        assert!(next.board().piece_at(from).is_none());
        assert_eq!(next.board().piece_at(to).unwrap().moves_made(), 1);
        assert_eq!(next.move_history().len(), 1);
    }

    #[test]
    fn test_apply_move_with_missing_piece_is_skipped() {
        let (state, id) = state_with_pawn(Square::new(3, 3));
        let event = GameEvent::new(
            PlayerColor::White,
            SourceId::Piece(id),
            EventPayload::Move {
                piece: id,
                from: Square::new(5, 5),
                to: Square::new(5, 6),
                kind: MoveKind::Slide,
            },
        );
        assert!(state.apply(&event).unwrap().is_none());
    }

    #[test]
    fn test_apply_capture_credits_attacker() {
        let from = Square::new(0, 0);
        let target = Square::new(1, 1);
        let (mut state, attacker) = state_with_pawn(from);
        let victim = Piece::Base(BasePiece::new(PieceKind::Knight, PlayerColor::Black));
        let victim_id = victim.id();
        state.board_mut().place_piece(victim, target).unwrap();

        let event = GameEvent::new(
            PlayerColor::White,
            SourceId::Piece(attacker),
            EventPayload::Capture {
                attacker,
                victim: victim_id,
                at: target,
            },
        );
        let next = state.apply(&event).unwrap().expect("capture applies");
        assert!(next.board().piece_at(target).is_none());
        assert_eq!(next.board().piece_at(from).unwrap().captures_made(), 1);
    }

    #[test]
    fn test_apply_turn_advanced_flips_player() {
        let (state, _) = state_with_pawn(Square::new(0, 0));
        let event = GameEvent::new(
            PlayerColor::White,
            SourceId::Engine,
            EventPayload::TurnAdvanced {
                next_player: PlayerColor::Black,
                turn: 2,
            },
        );
        let next = state.apply(&event).unwrap().unwrap();
        assert_eq!(next.current_player(), PlayerColor::Black);
        assert_eq!(next.turn_number(), 2);
    }
}
