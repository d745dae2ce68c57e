//! The closed set of piece abilities.
//!
//! An ability is one wrapper layer in a piece chain: it may add value,
//! augment move generation, and hook into event dispatch with a fixed
//! priority. Recognition is always by the [`AbilityKind`] discriminant,
//! never by name strings.
//!
//! Interceptor contract: every hook must ignore events whose `source` is
//! its own layer. The engine caps runaway cascades but does not deduplicate
//! self-triggering; a hook that reacts to its own events will spin until
//! the cap trips.

use crate::color::PlayerColor;
use crate::coord::Square;
use crate::events::{EventPayload, GameEvent, Intercept, SourceId};
use crate::game_state::GameState;
use crate::ids::PieceId;
use crate::movement::{self, CandidateMoves, MoveKind};
use crate::piece::{BasePiece, Piece, PieceKind};

/// How far a rebound throws the captured piece past its own square.
const REBOUND_DISTANCE: i32 = 2;

/// The closed set of ability kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbilityKind {
    /// Captures bounce the victim away instead of destroying it.
    Rebounder,
    /// Each kill advances the base piece one rank toward Queen.
    Ascendant,
    /// Sacrifices itself to stop a capture of an adjacent ally.
    Guardian,
    /// Adds one-step king movement on top of the inner piece's movement.
    Sentinel,
    /// A flat value bonus, nothing else.
    Veteran { bonus: i32 },
}

impl AbilityKind {
    /// Additive value this layer contributes on top of the inner piece.
    pub fn value_bonus(&self) -> i32 {
        match self {
            AbilityKind::Rebounder => 40,
            AbilityKind::Ascendant => 60,
            AbilityKind::Guardian => 30,
            AbilityKind::Sentinel => 50,
            AbilityKind::Veteran { bonus } => *bonus,
        }
    }

    /// Dispatch priority; lower runs earlier. A guardian must be able to
    /// veto a capture before a rebounder transforms it.
    pub fn priority(&self) -> i32 {
        match self {
            AbilityKind::Guardian => 10,
            AbilityKind::Rebounder => 20,
            AbilityKind::Ascendant => 30,
            AbilityKind::Sentinel | AbilityKind::Veteran { .. } => i32::MAX,
        }
    }

    /// True if this ability registers event hooks.
    pub fn intercepts(&self) -> bool {
        matches!(
            self,
            AbilityKind::Rebounder | AbilityKind::Ascendant | AbilityKind::Guardian
        )
    }

    /// Display name for UI decoration.
    pub fn display_name(&self) -> &'static str {
        match self {
            AbilityKind::Rebounder => "Rebounder",
            AbilityKind::Ascendant => "Ascendant",
            AbilityKind::Guardian => "Guardian",
            AbilityKind::Sentinel => "Sentinel",
            AbilityKind::Veteran { .. } => "Veteran",
        }
    }

    /// Stable textual identifier, used by the catalog and the map format.
    pub fn identifier(&self) -> &'static str {
        match self {
            AbilityKind::Rebounder => "rebounder",
            AbilityKind::Ascendant => "ascendant",
            AbilityKind::Guardian => "guardian",
            AbilityKind::Sentinel => "sentinel",
            AbilityKind::Veteran { .. } => "veteran",
        }
    }

    /// Augment the candidate moves generated by the layers beneath this one.
    pub fn augment_moves(
        &self,
        inherited: CandidateMoves,
        owner: PlayerColor,
        position: Square,
        as_id: PieceId,
        state: &GameState,
    ) -> CandidateMoves {
        match self {
            AbilityKind::Sentinel => {
                let mut merged = inherited;
                merged.merge(movement::ray_moves(
                    owner,
                    position,
                    as_id,
                    state,
                    &movement::ROYAL_DIRECTIONS,
                    1,
                ));
                merged.dedup_by_destination();
                merged
            }
            _ => inherited,
        }
    }

    /// Before-hook: may cancel or replace a pending event.
    ///
    /// `layer_id` is this wrapper layer's ID; `host` is the whole piece the
    /// layer sits on, as found in `state`.
    pub fn before_event(
        &self,
        layer_id: PieceId,
        host: &Piece,
        event: &GameEvent,
        state: &GameState,
    ) -> Intercept {
        if event.source == SourceId::Piece(layer_id) {
            return Intercept::Continue;
        }
        match self {
            AbilityKind::Guardian => guardian_before(layer_id, host, event, state),
            AbilityKind::Rebounder => rebounder_before(layer_id, host, event, state),
            _ => Intercept::Continue,
        }
    }

    /// After-hook: may append follow-up events to a committed event.
    pub fn after_event(
        &self,
        layer_id: PieceId,
        host: &Piece,
        event: &GameEvent,
        _state: &GameState,
    ) -> Vec<GameEvent> {
        if event.source == SourceId::Piece(layer_id) {
            return Vec::new();
        }
        match self {
            AbilityKind::Ascendant => ascendant_after(layer_id, host, event),
            _ => Vec::new(),
        }
    }
}

/// The promotion ladder. `None` means fully ascended.
pub fn ascension_target(kind: PieceKind) -> Option<PieceKind> {
    match kind {
        PieceKind::Pawn => Some(PieceKind::Knight),
        PieceKind::Knight => Some(PieceKind::Bishop),
        PieceKind::Bishop => Some(PieceKind::Rook),
        PieceKind::Rook => Some(PieceKind::Queen),
        PieceKind::Queen | PieceKind::King => None,
    }
}

/// Cancel a capture of an adjacent ally by dying in its place.
fn guardian_before(
    layer_id: PieceId,
    host: &Piece,
    event: &GameEvent,
    state: &GameState,
) -> Intercept {
    let EventPayload::Capture { victim, at, .. } = &event.payload else {
        return Intercept::Continue;
    };
    // The guarded piece must be an ally, adjacent, and not the guardian
    // itself (adjacency excludes distance zero).
    if host.chain_contains(*victim) || !host.position().is_adjacent(*at) {
        return Intercept::Continue;
    }
    let Some((_, victim_piece)) = state.board().find_piece(*victim) else {
        return Intercept::Continue;
    };
    if victim_piece.owner() != host.owner() {
        return Intercept::Continue;
    }

    let sacrifice = GameEvent::new(
        host.owner(),
        SourceId::Piece(layer_id),
        EventPayload::Destroy { piece: host.id() },
    );
    Intercept::Replace(vec![sacrifice])
}

/// Replace this piece's captures with a two-square rebound of the victim,
/// the attacker taking the vacated square.
fn rebounder_before(
    layer_id: PieceId,
    host: &Piece,
    event: &GameEvent,
    state: &GameState,
) -> Intercept {
    let EventPayload::Capture {
        attacker,
        victim,
        at,
    } = &event.payload
    else {
        return Intercept::Continue;
    };
    if !host.chain_contains(*attacker) {
        return Intercept::Continue;
    }

    let from = host.position();
    let (dx, dy) = from.step_toward(*at);
    if (dx, dy) == (0, 0) {
        return Intercept::Continue;
    }
    let bounce = at.offset(dx * REBOUND_DISTANCE, dy * REBOUND_DISTANCE);
    if !state.board().in_bounds(bounce) {
        // Off the board: fall back to an ordinary capture.
        return Intercept::Continue;
    }

    let mut replacements = Vec::new();
    let mut bounce_cause = None;
    if let Some(occupant) = state.board().piece_at(bounce) {
        if occupant.owner() == host.owner() {
            // A friendly piece sits on the landing square: ordinary capture.
            return Intercept::Continue;
        }
        let clear = GameEvent::new(
            event.actor,
            SourceId::Piece(layer_id),
            EventPayload::Destroy {
                piece: occupant.id(),
            },
        );
        bounce_cause = Some(clear.id);
        replacements.push(clear);
    }

    let mut thrown = GameEvent::new(
        event.actor,
        SourceId::Piece(layer_id),
        EventPayload::Move {
            piece: *victim,
            from: *at,
            to: bounce,
            kind: MoveKind::Other,
        },
    );
    if let Some(cause) = bounce_cause {
        thrown = thrown.depending_on(cause);
    }
    let advance = GameEvent::new(
        event.actor,
        SourceId::Piece(layer_id),
        EventPayload::Move {
            piece: *attacker,
            from,
            to: *at,
            kind: MoveKind::Other,
        },
    )
    .depending_on(thrown.id);

    replacements.push(thrown);
    replacements.push(advance);
    Intercept::Replace(replacements)
}

/// After a kill, advance the base piece one rank up the ladder.
fn ascendant_after(layer_id: PieceId, host: &Piece, event: &GameEvent) -> Vec<GameEvent> {
    let EventPayload::Capture { attacker, .. } = &event.payload else {
        return Vec::new();
    };
    if !host.chain_contains(*attacker) {
        return Vec::new();
    }
    let Some(next_kind) = ascension_target(host.kind()) else {
        return Vec::new();
    };

    let promote = GameEvent::new(
        host.owner(),
        SourceId::Piece(layer_id),
        EventPayload::PieceChanged {
            piece: host.id(),
            new_base: BasePiece::new(next_kind, host.owner()),
        },
    );
    vec![promote]
}
