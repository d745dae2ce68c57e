//! Game events and interception results.
//!
//! Every observable change in a game is an event. Events carry provenance:
//! `source` names the entity whose behavior produced the event (or the
//! engine itself), and `player_action` marks events that came straight from
//! player intent rather than from a cascade. Interceptors rely on `source`
//! for self-loop prevention: an interceptor must ignore events it produced.
//!
//! Causal dependency is explicit. A capture's follow-up move depends on the
//! capture; cancelling an event also drops everything that depends on it.

use crate::color::PlayerColor;
use crate::coord::Square;
use crate::ids::{EventId, PieceId, TileId};
use crate::movement::MoveKind;
use crate::piece::BasePiece;
use crate::tile::Tile;

/// The entity whose behavior caused an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    /// A piece layer: a base piece or one ability wrapper in a chain.
    Piece(PieceId),
    /// A tile.
    Tile(TileId),
    /// The engine itself: turn lifecycle, ruleset verdicts, the clock.
    Engine,
}

/// What an event does when committed.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// A piece is displaced from `from` to `to`.
    Move {
        piece: PieceId,
        from: Square,
        to: Square,
        kind: MoveKind,
    },
    /// `attacker` takes `victim` at `at`. The attacker's follow-up move is a
    /// separate event that depends on this one.
    Capture {
        attacker: PieceId,
        victim: PieceId,
        at: Square,
    },
    /// A piece is removed from the board without capture credit.
    Destroy { piece: PieceId },
    /// The tile at `at` is swapped for `tile`.
    TileChanged { at: Square, tile: Tile },
    /// The piece identified by `piece` has its base substituted in place
    /// (promotion, evolution). The live chain is rebuilt around `new_base`
    /// at apply time, preserving wrapper layers, counters and `EntityId`.
    PieceChanged { piece: PieceId, new_base: BasePiece },
    /// A player's turn begins.
    TurnStart { player: PlayerColor, turn: u32 },
    /// A player's turn ends.
    TurnEnd { player: PlayerColor, turn: u32 },
    /// Control passes to `next_player`; the turn counter advances.
    TurnAdvanced { next_player: PlayerColor, turn: u32 },
    /// The game is decided. `None` means a draw.
    GameOver { winner: Option<PlayerColor> },
    /// A player's clock ran out.
    TimeOut { player: PlayerColor },
}

impl EventPayload {
    /// Short tag naming the event type, for logs and external consumers.
    pub fn kind_name(&self) -> &'static str {
        match self {
            EventPayload::Move { .. } => "move",
            EventPayload::Capture { .. } => "capture",
            EventPayload::Destroy { .. } => "destroy",
            EventPayload::TileChanged { .. } => "tile-changed",
            EventPayload::PieceChanged { .. } => "piece-changed",
            EventPayload::TurnStart { .. } => "turn-start",
            EventPayload::TurnEnd { .. } => "turn-end",
            EventPayload::TurnAdvanced { .. } => "turn-advanced",
            EventPayload::GameOver { .. } => "game-over",
            EventPayload::TimeOut { .. } => "time-out",
        }
    }
}

/// A single game event.
#[derive(Debug, Clone, PartialEq)]
pub struct GameEvent {
    /// Unique identifier.
    pub id: EventId,
    /// The player on whose behalf the event happens.
    pub actor: PlayerColor,
    /// The entity whose behavior produced this event.
    pub source: SourceId,
    /// True when the event came straight from player intent.
    pub player_action: bool,
    /// The event this one causally depends on, if any. Cancelling the
    /// dependency also cancels this event.
    pub depends_on: Option<EventId>,
    /// What happens.
    pub payload: EventPayload,
}

impl GameEvent {
    /// Create an event. Cascade provenance by default; use
    /// [`GameEvent::as_player_action`] for direct player intent.
    pub fn new(actor: PlayerColor, source: SourceId, payload: EventPayload) -> Self {
        Self {
            id: EventId::new(),
            actor,
            source,
            player_action: false,
            depends_on: None,
            payload,
        }
    }

    /// Mark this event as coming straight from player intent.
    pub fn as_player_action(mut self) -> Self {
        self.player_action = true;
        self
    }

    /// Make this event causally dependent on `cause`.
    pub fn depending_on(mut self, cause: EventId) -> Self {
        self.depends_on = Some(cause);
        self
    }

    /// Human-readable one-line description.
    pub fn describe(&self) -> String {
        match &self.payload {
            EventPayload::Move {
                piece, from, to, ..
            } => {
                format!("{} moves piece #{} {} -> {}", self.actor, piece.0, from, to)
            }
            EventPayload::Capture {
                attacker,
                victim,
                at,
            } => format!(
                "{} captures piece #{} at {} with piece #{}",
                self.actor, victim.0, at, attacker.0
            ),
            EventPayload::Destroy { piece } => {
                format!("piece #{} is destroyed", piece.0)
            }
            EventPayload::TileChanged { at, tile } => {
                format!("tile at {} becomes {}", at, tile.kind.display_name())
            }
            EventPayload::PieceChanged { piece, new_base } => {
                format!("piece #{} becomes {}", piece.0, new_base.name)
            }
            EventPayload::TurnStart { player, turn } => {
                format!("turn {} begins for {}", turn, player)
            }
            EventPayload::TurnEnd { player, turn } => {
                format!("turn {} ends for {}", turn, player)
            }
            EventPayload::TurnAdvanced { next_player, turn } => {
                format!("turn {} passes to {}", turn, next_player)
            }
            EventPayload::GameOver { winner } => match winner {
                Some(player) => format!("game over, {} wins", player),
                None => "game over, drawn".to_string(),
            },
            EventPayload::TimeOut { player } => format!("{} ran out of time", player),
        }
    }
}

/// What a before-hook decides about a pending event.
///
/// Exhaustively matched by the dispatch engine; adding a variant is a
/// compile error at every call site, which is the point.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum Intercept {
    /// Let the event proceed unchanged.
    Continue,
    /// Drop the event and every event causally dependent on it.
    Cancel,
    /// Cancel the event (and its dependents) and resolve these instead,
    /// ahead of everything else pending.
    Replace(Vec<GameEvent>),
}
