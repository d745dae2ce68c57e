//! Pluggable legality and win-condition policy.
//!
//! A ruleset owns two judgements: which candidate moves are actually legal
//! (raw generation merged with tile restrictions), and whether a state is
//! terminal. The turn manager consults it before applying a move; the
//! adversarial search consults the same object for its terminal test, so
//! the two can never disagree.

use crate::color::PlayerColor;
use crate::game_state::GameState;
use crate::movement::{CandidateMoves, Move, MoveKind};
use crate::piece::Piece;
use crate::tile::Restriction;

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Winner(PlayerColor),
    Draw,
}

/// Legality filtering and game-over policy for one game mode.
pub trait Ruleset {
    /// Candidate moves for `piece`, with tile restrictions merged in.
    fn legal_moves(&self, state: &GameState, piece: &Piece) -> CandidateMoves;

    /// `Some` when the state is terminal.
    fn game_over(&self, state: &GameState) -> Option<Verdict>;

    /// The verdict when `loser` runs out of time.
    fn timeout_verdict(&self, loser: PlayerColor) -> Verdict {
        Verdict::Winner(loser.opponent())
    }
}

/// Move tile-restricted entries out of the playable list.
///
/// Any restriction makes a square an illegal destination. `Obstacle`
/// squares additionally block sliding rays that pass over them; `Forbidden`
/// squares stay passable. Jumps only care about their destination.
pub fn apply_tile_restrictions(state: &GameState, raw: CandidateMoves) -> CandidateMoves {
    let mut filtered = CandidateMoves {
        friendly_blocks: raw.friendly_blocks,
        illegal_tiles: raw.illegal_tiles,
        ..Default::default()
    };

    for mv in raw.moves {
        if move_restricted(state, &mv) {
            filtered.illegal_tiles.push(mv);
        } else {
            filtered.moves.push(mv);
            if mv.capture {
                filtered.enemy_captures.push(mv);
            }
        }
    }

    filtered
}

fn move_restricted(state: &GameState, mv: &Move) -> bool {
    let board = state.board();

    if let Some(tile) = board.tile_at(mv.to) {
        if tile.kind.restriction().is_some() {
            return true;
        }
    }

    if mv.kind == MoveKind::Slide {
        let (dx, dy) = mv.from.step_toward(mv.to);
        let mut square = mv.from.offset(dx, dy);
        while square != mv.to {
            if let Some(tile) = board.tile_at(square) {
                if tile.kind.restriction() == Some(Restriction::Obstacle) {
                    return true;
                }
            }
            square = square.offset(dx, dy);
        }
    }

    false
}

/// Every legal move for the side to move, in deterministic board order.
pub fn legal_moves_for_player(state: &GameState, ruleset: &dyn Ruleset) -> Vec<Move> {
    let mut moves = Vec::new();
    for square in state.board().occupied_squares() {
        let Some(piece) = state.board().piece_at(square) else {
            continue;
        };
        if piece.owner() != state.current_player() {
            continue;
        }
        moves.extend(ruleset.legal_moves(state, piece).moves);
    }
    moves
}

/// The default mode: a side with no pieces left loses.
///
/// Kings are ordinary pieces. Rosters without a king are fully supported
/// and there is no notion of check or checkmate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastPieceStanding;

impl Ruleset for LastPieceStanding {
    fn legal_moves(&self, state: &GameState, piece: &Piece) -> CandidateMoves {
        apply_tile_restrictions(state, piece.candidate_moves(state))
    }

    fn game_over(&self, state: &GameState) -> Option<Verdict> {
        let white = state.board().piece_count(PlayerColor::White);
        let black = state.board().piece_count(PlayerColor::Black);
        match (white, black) {
            (0, 0) => Some(Verdict::Draw),
            (0, _) => Some(Verdict::Winner(PlayerColor::Black)),
            (_, 0) => Some(Verdict::Winner(PlayerColor::White)),
            _ => None,
        }
    }
}
