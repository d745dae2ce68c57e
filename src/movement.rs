//! Candidate move generation.
//!
//! Pure functions: a piece, the current state and a set of direction or
//! offset vectors go in, a [`CandidateMoves`] partition comes out. Nothing
//! here consults tile restrictions; the ruleset merges those afterwards.
//!
//! Direction iteration order is stable and matches the supplied order.
//! Ability logic downstream correlates blocked squares with the direction
//! that produced them, so the order is part of the contract.

use crate::color::PlayerColor;
use crate::coord::Square;
use crate::game_state::GameState;
use crate::ids::PieceId;
use crate::piece::PieceKind;

/// Rook rays: the four orthogonal directions.
pub const ROOK_DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Bishop rays: the four diagonal directions.
pub const BISHOP_DIRECTIONS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Queen and king rays: orthogonals then diagonals.
pub const ROYAL_DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Knight offsets, clockwise from one o'clock.
pub const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

/// How a move travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    /// Along a ray, blockable en route.
    Slide,
    /// Directly to a fixed offset, ignoring what is in between.
    Jump,
    /// Anything else: forced displacement, turn-consuming non-movement.
    Other,
}

/// A move descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    /// Square the piece moves from.
    pub from: Square,
    /// Square the piece moves to.
    pub to: Square,
    /// Outermost ID of the moving piece.
    pub piece: PieceId,
    /// True if the destination holds an enemy piece.
    pub capture: bool,
    /// How the move travels.
    pub kind: MoveKind,
    /// False for turn-consuming actions that displace nothing.
    pub displacing: bool,
}

impl Move {
    /// A displacement move.
    pub fn new(piece: PieceId, from: Square, to: Square, capture: bool, kind: MoveKind) -> Self {
        Self {
            from,
            to,
            piece,
            capture,
            kind,
            displacing: true,
        }
    }

    /// A turn-consuming action that displaces nothing.
    pub fn stationary(piece: PieceId, at: Square) -> Self {
        Self {
            from: at,
            to: at,
            piece,
            capture: false,
            kind: MoveKind::Other,
            displacing: false,
        }
    }
}

/// Candidate destinations for one piece, partitioned by what sits there.
///
/// `moves` is the playable list; `enemy_captures` repeats its capture
/// subset. `friendly_blocks` holds the would-be moves that ran into a
/// friendly piece (not playable, but abilities that continue past a
/// friendly block need the original move). `illegal_tiles` is empty until
/// the ruleset merges tile restrictions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateMoves {
    pub moves: Vec<Move>,
    pub friendly_blocks: Vec<Move>,
    pub enemy_captures: Vec<Move>,
    pub illegal_tiles: Vec<Move>,
}

impl CandidateMoves {
    /// Merge another partition into this one, preserving order.
    pub fn merge(&mut self, other: CandidateMoves) {
        self.moves.extend(other.moves);
        self.friendly_blocks.extend(other.friendly_blocks);
        self.enemy_captures.extend(other.enemy_captures);
        self.illegal_tiles.extend(other.illegal_tiles);
    }

    /// Drop duplicate playable destinations, keeping first occurrences.
    pub fn dedup_by_destination(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.moves.retain(|m| seen.insert(m.to));
        self.enemy_captures = self.moves.iter().copied().filter(|m| m.capture).collect();
    }

    fn push_classified(&mut self, mv: Move, occupant_owner: Option<PlayerColor>, mover: PlayerColor) {
        match occupant_owner {
            None => self.moves.push(mv),
            Some(owner) if owner == mover => self.friendly_blocks.push(mv),
            Some(_) => {
                let capture = Move { capture: true, ..mv };
                self.moves.push(capture);
                self.enemy_captures.push(capture);
            }
        }
    }
}

/// Sliding movement: walk each direction until out of bounds or blocked.
///
/// Empty squares become non-capturing moves. The first occupied square on a
/// ray either becomes a capture (enemy) or a friendly block (never a move),
/// and the ray stops either way.
pub fn slide_moves(
    owner: PlayerColor,
    from: Square,
    as_id: PieceId,
    state: &GameState,
    directions: &[(i32, i32)],
) -> CandidateMoves {
    ray_moves(owner, from, as_id, state, directions, u32::MAX)
}

/// Sliding movement truncated to `max_steps` squares per ray.
pub fn ray_moves(
    owner: PlayerColor,
    from: Square,
    as_id: PieceId,
    state: &GameState,
    directions: &[(i32, i32)],
    max_steps: u32,
) -> CandidateMoves {
    let mut out = CandidateMoves::default();
    let board = state.board();

    for &(dx, dy) in directions {
        let mut square = from.offset(dx, dy);
        let mut steps = 0;
        while board.in_bounds(square) && steps < max_steps {
            let mv = Move::new(as_id, from, square, false, MoveKind::Slide);
            let occupant = board.piece_at(square).map(|p| p.owner());
            out.push_classified(mv, occupant, owner);
            if occupant.is_some() {
                break;
            }
            square = square.offset(dx, dy);
            steps += 1;
        }
    }

    out
}

/// Jump movement: each fixed offset evaluated independently, no blocking
/// along the path.
pub fn jump_moves(
    owner: PlayerColor,
    from: Square,
    as_id: PieceId,
    state: &GameState,
    offsets: &[(i32, i32)],
) -> CandidateMoves {
    let mut out = CandidateMoves::default();
    let board = state.board();

    for &(dx, dy) in offsets {
        let square = from.offset(dx, dy);
        if !board.in_bounds(square) {
            continue;
        }
        let mv = Move::new(as_id, from, square, false, MoveKind::Jump);
        let occupant = board.piece_at(square).map(|p| p.owner());
        out.push_classified(mv, occupant, owner);
    }

    out
}

/// Pawn movement: one forward push onto an empty square, diagonal-forward
/// captures only.
pub fn pawn_moves(
    owner: PlayerColor,
    from: Square,
    as_id: PieceId,
    state: &GameState,
) -> CandidateMoves {
    let mut out = CandidateMoves::default();
    let board = state.board();
    let dy = owner.forward();

    let push = from.offset(0, dy);
    if board.in_bounds(push) {
        match board.piece_at(push).map(|p| p.owner()) {
            None => out
                .moves
                .push(Move::new(as_id, from, push, false, MoveKind::Slide)),
            Some(occupant) if occupant == owner => out
                .friendly_blocks
                .push(Move::new(as_id, from, push, false, MoveKind::Slide)),
            // An enemy dead ahead blocks the push; pawns only take diagonally.
            Some(_) => {}
        }
    }

    for dx in [-1, 1] {
        let diagonal = from.offset(dx, dy);
        if !board.in_bounds(diagonal) {
            continue;
        }
        match board.piece_at(diagonal).map(|p| p.owner()) {
            Some(occupant) if occupant != owner => {
                let mv = Move::new(as_id, from, diagonal, true, MoveKind::Slide);
                out.moves.push(mv);
                out.enemy_captures.push(mv);
            }
            Some(_) => out
                .friendly_blocks
                .push(Move::new(as_id, from, diagonal, false, MoveKind::Slide)),
            None => {}
        }
    }

    out
}

/// Candidate moves for a base movement archetype.
pub fn kind_moves(
    kind: PieceKind,
    owner: PlayerColor,
    from: Square,
    as_id: PieceId,
    state: &GameState,
) -> CandidateMoves {
    match kind {
        PieceKind::Pawn => pawn_moves(owner, from, as_id, state),
        PieceKind::Knight => jump_moves(owner, from, as_id, state, &KNIGHT_OFFSETS),
        PieceKind::Bishop => slide_moves(owner, from, as_id, state, &BISHOP_DIRECTIONS),
        PieceKind::Rook => slide_moves(owner, from, as_id, state, &ROOK_DIRECTIONS),
        PieceKind::Queen => slide_moves(owner, from, as_id, state, &ROYAL_DIRECTIONS),
        PieceKind::King => ray_moves(owner, from, as_id, state, &ROYAL_DIRECTIONS, 1),
    }
}
