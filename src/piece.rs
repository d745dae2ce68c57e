//! Pieces and ability wrap chains.
//!
//! A piece is either a bare [`BasePiece`] or an ability wrapper owning
//! exactly one inner piece. The chain is a tagged, owned linked list:
//! each layer exclusively owns the next, chains are short and tree-shaped,
//! and cloning a piece clones the whole chain.
//!
//! Identity comes in two flavors:
//! - `PieceId` is per layer. The outermost layer's ID is what moves and
//!   events refer to; a promotion gives the replacement base a fresh ID.
//! - `EntityId` belongs to the underlying creature and never changes across
//!   wrapping or promotion. Survival bookkeeping matches on it.

use crate::abilities::AbilityKind;
use crate::color::PlayerColor;
use crate::coord::Square;
use crate::game_state::GameState;
use crate::ids::{EntityId, PieceId};
use crate::movement::{self, CandidateMoves};

/// Concrete movement archetypes for base pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Base material value.
    pub fn value(self) -> i32 {
        match self {
            PieceKind::Pawn => 100,
            PieceKind::Knight => 320,
            PieceKind::Bishop => 330,
            PieceKind::Rook => 500,
            PieceKind::Queen => 900,
            // Kings are ordinary pieces here: rosters are king-optional and
            // the terminal rule counts pieces, not royalty.
            PieceKind::King => 400,
        }
    }

    /// Display name for event descriptions and UI.
    pub fn display_name(self) -> &'static str {
        match self {
            PieceKind::Pawn => "Pawn",
            PieceKind::Knight => "Knight",
            PieceKind::Bishop => "Bishop",
            PieceKind::Rook => "Rook",
            PieceKind::Queen => "Queen",
            PieceKind::King => "King",
        }
    }

    /// Stable textual identifier, used by the catalog and the map format.
    pub fn identifier(self) -> &'static str {
        match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        }
    }

    /// Parse a textual identifier produced by [`PieceKind::identifier`].
    pub fn from_identifier(s: &str) -> Option<Self> {
        match s {
            "pawn" => Some(PieceKind::Pawn),
            "knight" => Some(PieceKind::Knight),
            "bishop" => Some(PieceKind::Bishop),
            "rook" => Some(PieceKind::Rook),
            "queen" => Some(PieceKind::Queen),
            "king" => Some(PieceKind::King),
            _ => None,
        }
    }
}

/// A concrete piece with a movement rule and per-piece counters.
#[derive(Debug, Clone, PartialEq)]
pub struct BasePiece {
    /// This layer's identifier.
    pub id: PieceId,
    /// The creature's stable identity; survives wrapping and promotion.
    pub entity_id: EntityId,
    /// Display name.
    pub name: String,
    /// Movement archetype.
    pub kind: PieceKind,
    /// Owning player.
    pub owner: PlayerColor,
    /// Current board position.
    pub position: Square,
    /// Number of moves this creature has made.
    pub moves_made: u32,
    /// Number of captures this creature has made.
    pub captures_made: u32,
}

impl BasePiece {
    /// Create an unpositioned base piece. Placement on a board sets the position.
    pub fn new(kind: PieceKind, owner: PlayerColor) -> Self {
        Self {
            id: PieceId::new(),
            entity_id: EntityId::new(),
            name: kind.display_name().to_string(),
            kind,
            owner,
            position: Square::new(0, 0),
            moves_made: 0,
            captures_made: 0,
        }
    }
}

/// One ability layer wrapping exactly one inner piece.
#[derive(Debug, Clone, PartialEq)]
pub struct AbilityPiece {
    /// This wrapper layer's identifier.
    pub id: PieceId,
    /// The ability this layer contributes.
    pub kind: AbilityKind,
    /// The wrapped piece. Exclusive ownership; the chain is never shared.
    inner: Box<Piece>,
}

impl AbilityPiece {
    /// The wrapped piece, one layer in.
    pub fn inner(&self) -> &Piece {
        &self.inner
    }
}

/// A piece: a base piece or an ability chain around one.
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Base(BasePiece),
    Wrapped(AbilityPiece),
}

impl Piece {
    /// Wrap this piece in a new ability layer.
    pub fn wrap(self, kind: AbilityKind) -> Piece {
        Piece::Wrapped(AbilityPiece {
            id: PieceId::new(),
            kind,
            inner: Box::new(self),
        })
    }

    /// The outermost layer's identifier. Moves and events refer to this.
    pub fn id(&self) -> PieceId {
        match self {
            Piece::Base(base) => base.id,
            Piece::Wrapped(layer) => layer.id,
        }
    }

    /// The creature's stable identity, invariant under wrapping and promotion.
    pub fn entity_id(&self) -> EntityId {
        self.base().entity_id
    }

    /// Owning player, forwarded to the base.
    pub fn owner(&self) -> PlayerColor {
        self.base().owner
    }

    /// Current position, forwarded to the base.
    pub fn position(&self) -> Square {
        self.base().position
    }

    /// Reposition the piece. Forwards through every layer to the base.
    pub fn set_position(&mut self, position: Square) {
        self.base_mut().position = position;
    }

    /// Moves made by this creature, forwarded to the base.
    pub fn moves_made(&self) -> u32 {
        self.base().moves_made
    }

    /// Captures made by this creature, forwarded to the base.
    pub fn captures_made(&self) -> u32 {
        self.base().captures_made
    }

    /// Record one completed move.
    pub fn record_move(&mut self) {
        self.base_mut().moves_made += 1;
    }

    /// Record one completed capture.
    pub fn record_capture(&mut self) {
        self.base_mut().captures_made += 1;
    }

    /// The creature's display name, forwarded to the base.
    pub fn name(&self) -> &str {
        &self.base().name
    }

    /// The base movement archetype.
    pub fn kind(&self) -> PieceKind {
        self.base().kind
    }

    /// Material value: base value plus every layer's additive bonus.
    pub fn value(&self) -> i32 {
        match self {
            Piece::Base(base) => base.kind.value(),
            Piece::Wrapped(layer) => layer.kind.value_bonus() + layer.inner.value(),
        }
    }

    /// Walk to the innermost base piece.
    pub fn base(&self) -> &BasePiece {
        let mut piece = self;
        loop {
            match piece {
                Piece::Base(base) => return base,
                Piece::Wrapped(layer) => piece = &*layer.inner,
            }
        }
    }

    /// Walk to the innermost base piece, mutably.
    pub fn base_mut(&mut self) -> &mut BasePiece {
        let mut piece = self;
        loop {
            match piece {
                Piece::Base(base) => return base,
                Piece::Wrapped(layer) => piece = &mut *layer.inner,
            }
        }
    }

    /// Ability layers from outermost to innermost, with their layer IDs.
    pub fn ability_layers(&self) -> Vec<(PieceId, &AbilityKind)> {
        let mut layers = Vec::new();
        let mut piece = self;
        while let Piece::Wrapped(layer) = piece {
            layers.push((layer.id, &layer.kind));
            piece = &*layer.inner;
        }
        layers
    }

    /// True if `id` names any layer of this chain, including the base.
    ///
    /// Abilities use this to recognize "myself, possibly wrapped further"
    /// after another ability rebuilt the chain under them.
    pub fn chain_contains(&self, id: PieceId) -> bool {
        let mut piece = self;
        loop {
            match piece {
                Piece::Base(base) => return base.id == id,
                Piece::Wrapped(layer) => {
                    if layer.id == id {
                        return true;
                    }
                    piece = &*layer.inner;
                }
            }
        }
    }

    /// Substitute a new base piece, preserving every wrapper layer.
    ///
    /// The wrapper instances keep their IDs and configuration, and the
    /// replacement base inherits the old creature's `EntityId`, owner,
    /// position and counters. Used for promotion/evolution.
    pub fn rebuild_with_base(self, new_base: BasePiece) -> Piece {
        match self {
            Piece::Base(old) => Piece::Base(carry_identity(old, new_base)),
            Piece::Wrapped(layer) => {
                let inner = layer.inner.rebuild_with_base(new_base);
                Piece::Wrapped(AbilityPiece {
                    id: layer.id,
                    kind: layer.kind,
                    inner: Box::new(inner),
                })
            }
        }
    }

    /// Candidate moves for this piece in `state`.
    ///
    /// Each layer may augment or replace what the layers beneath it
    /// generated; the base generates its archetype's moves. All generated
    /// moves are stamped with the outermost layer's ID.
    pub fn candidate_moves(&self, state: &GameState) -> CandidateMoves {
        self.candidate_moves_as(self.id(), state)
    }

    fn candidate_moves_as(&self, as_id: PieceId, state: &GameState) -> CandidateMoves {
        match self {
            Piece::Base(base) => {
                movement::kind_moves(base.kind, base.owner, base.position, as_id, state)
            }
            Piece::Wrapped(layer) => {
                let inherited = layer.inner.candidate_moves_as(as_id, state);
                layer
                    .kind
                    .augment_moves(inherited, self.owner(), self.position(), as_id, state)
            }
        }
    }
}

fn carry_identity(old: BasePiece, mut new_base: BasePiece) -> BasePiece {
    new_base.entity_id = old.entity_id;
    new_base.owner = old.owner;
    new_base.position = old.position;
    new_base.moves_made = old.moves_made;
    new_base.captures_made = old.captures_made;
    new_base
}

#[cfg(test)]
mod tests {
    use super::*;

    fn knight() -> Piece {
        Piece::Base(BasePiece::new(PieceKind::Knight, PlayerColor::White))
    }

    #[test]
    fn test_entity_id_survives_wrapping() {
        let base = knight();
        let entity = base.entity_id();
        let wrapped = base.wrap(AbilityKind::Veteran { bonus: 50 });
        assert_eq!(wrapped.entity_id(), entity);

        let twice = wrapped.wrap(AbilityKind::Guardian);
        assert_eq!(twice.entity_id(), entity);
    }

    #[test]
    fn test_entity_id_survives_rebuild() {
        let piece = knight().wrap(AbilityKind::Guardian);
        let entity = piece.entity_id();
        let outer = piece.id();

        let rebuilt =
            piece.rebuild_with_base(BasePiece::new(PieceKind::Bishop, PlayerColor::Black));
        assert_eq!(rebuilt.entity_id(), entity);
        assert_eq!(rebuilt.id(), outer, "wrapper layer keeps its id");
        assert_eq!(rebuilt.kind(), PieceKind::Bishop);
        // owner comes from the old chain, not the substitute base
        assert_eq!(rebuilt.owner(), PlayerColor::White);
    }

    #[test]
    fn test_rebuild_preserves_counters() {
        let mut piece = knight();
        piece.record_move();
        piece.record_move();
        piece.record_capture();

        let rebuilt =
            piece.rebuild_with_base(BasePiece::new(PieceKind::Queen, PlayerColor::White));
        assert_eq!(rebuilt.moves_made(), 2);
        assert_eq!(rebuilt.captures_made(), 1);
    }

    #[test]
    fn test_clone_clones_whole_chain() {
        let piece = knight()
            .wrap(AbilityKind::Veteran { bonus: 10 })
            .wrap(AbilityKind::Guardian);
        let copy = piece.clone();
        assert_eq!(copy, piece);
        assert_eq!(copy.ability_layers().len(), 2);
        assert_eq!(copy.entity_id(), piece.entity_id());
    }

    #[test]
    fn test_value_adds_layer_bonuses() {
        let piece = knight().wrap(AbilityKind::Veteran { bonus: 75 });
        assert_eq!(piece.value(), PieceKind::Knight.value() + 75);
    }

    #[test]
    fn test_chain_contains_every_layer() {
        let base = knight();
        let base_id = base.id();
        let wrapped = base.wrap(AbilityKind::Guardian);
        let layer_id = wrapped.id();

        assert!(wrapped.chain_contains(base_id));
        assert!(wrapped.chain_contains(layer_id));
        assert!(!wrapped.chain_contains(PieceId::from_raw(u64::MAX)));
    }

    #[test]
    fn test_property_writes_forward_to_base() {
        let mut piece = knight().wrap(AbilityKind::Guardian);
        piece.set_position(Square::new(4, 5));
        assert_eq!(piece.position(), Square::new(4, 5));
        assert_eq!(piece.base().position, Square::new(4, 5));
    }
}
