//! Tiles: board squares with optional behavior.
//!
//! Tile behavior comes in three shapes:
//! - movement restrictions, reported to the ruleset as [`Restriction`] tags;
//! - concealment, pure bookkeeping read by the presentation layer;
//! - event reactions, expressed as before/after hooks the dispatch engine
//!   calls like any other interceptor.
//!
//! Unlike pieces, tiles are flat variants, not wrap chains.

use crate::coord::Square;
use crate::events::{EventPayload, GameEvent, Intercept, SourceId};
use crate::game_state::GameState;
use crate::ids::TileId;

/// How a tile restricts movement onto or across its square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Restriction {
    /// Impassable: sliding rays stop, jumps cannot land here.
    Obstacle,
    /// Not a legal destination, but rays pass over it freely.
    Forbidden,
}

/// The closed set of tile behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    /// No behavior.
    Plain,
    /// Impassable obstruction.
    Wall,
    /// Conceals its occupant from the opponent's view. Engine-side this is
    /// bookkeeping only; the renderer decides what to hide.
    Fog,
    /// One-shot: destroys the piece that lands on it, then becomes plain.
    Snare,
    /// Cannot be stopped on, but can be passed over.
    Ward,
    /// Reactive: a piece landing here is thrown one extra square along its
    /// direction of travel, when that square is on the board and empty.
    Spring,
}

impl TileKind {
    /// The movement restriction this tile reports to the ruleset.
    pub fn restriction(self) -> Option<Restriction> {
        match self {
            TileKind::Wall => Some(Restriction::Obstacle),
            TileKind::Ward => Some(Restriction::Forbidden),
            TileKind::Plain | TileKind::Fog | TileKind::Snare | TileKind::Spring => None,
        }
    }

    /// True if the tile hides its occupant from the opposing player.
    pub fn conceals(self) -> bool {
        matches!(self, TileKind::Fog)
    }

    /// True if the tile registers event hooks with the dispatch engine.
    pub fn intercepts(self) -> bool {
        matches!(self, TileKind::Snare | TileKind::Spring)
    }

    /// Interceptor priority. Lower runs earlier; piece abilities run before
    /// tiles so a guardian can save a piece before the ground reacts to it.
    pub fn priority(self) -> i32 {
        match self {
            TileKind::Spring => 40,
            TileKind::Snare => 50,
            _ => i32::MAX,
        }
    }

    /// Display name for event descriptions and UI.
    pub fn display_name(self) -> &'static str {
        match self {
            TileKind::Plain => "Plain",
            TileKind::Wall => "Wall",
            TileKind::Fog => "Fog",
            TileKind::Snare => "Snare",
            TileKind::Ward => "Ward",
            TileKind::Spring => "Spring",
        }
    }

    /// Stable textual identifier, used by the catalog and the map format.
    pub fn identifier(self) -> &'static str {
        match self {
            TileKind::Plain => "plain",
            TileKind::Wall => "wall",
            TileKind::Fog => "fog",
            TileKind::Snare => "snare",
            TileKind::Ward => "ward",
            TileKind::Spring => "spring",
        }
    }

    /// Parse a textual identifier produced by [`TileKind::identifier`].
    pub fn from_identifier(s: &str) -> Option<Self> {
        match s {
            "plain" => Some(TileKind::Plain),
            "wall" => Some(TileKind::Wall),
            "fog" => Some(TileKind::Fog),
            "snare" => Some(TileKind::Snare),
            "ward" => Some(TileKind::Ward),
            "spring" => Some(TileKind::Spring),
            _ => None,
        }
    }
}

/// One board square's tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub id: TileId,
    pub position: Square,
    pub kind: TileKind,
}

impl Tile {
    pub fn new(kind: TileKind, position: Square) -> Self {
        Self {
            id: TileId::new(),
            position,
            kind,
        }
    }

    /// Before-hook: may redirect an incoming event.
    ///
    /// Events this tile itself produced are ignored (self-loop contract).
    pub fn before_event(&self, event: &GameEvent, state: &GameState) -> Intercept {
        if event.source == SourceId::Tile(self.id) {
            return Intercept::Continue;
        }
        match self.kind {
            TileKind::Spring => self.spring_before(event, state),
            _ => Intercept::Continue,
        }
    }

    /// After-hook: may append follow-up events to a committed event.
    ///
    /// Events this tile itself produced are ignored (self-loop contract).
    pub fn after_event(&self, event: &GameEvent, state: &GameState) -> Vec<GameEvent> {
        if event.source == SourceId::Tile(self.id) {
            return Vec::new();
        }
        match self.kind {
            TileKind::Snare => self.snare_after(event, state),
            _ => Vec::new(),
        }
    }

    /// Throw a landing piece one extra square along its travel direction.
    /// Off-board or occupied landing squares degrade to the unmodified move.
    fn spring_before(&self, event: &GameEvent, state: &GameState) -> Intercept {
        let EventPayload::Move {
            piece, from, to, ..
        } = &event.payload
        else {
            return Intercept::Continue;
        };
        if *to != self.position {
            return Intercept::Continue;
        }

        let (dx, dy) = from.step_toward(*to);
        if (dx, dy) == (0, 0) {
            return Intercept::Continue;
        }
        let beyond = to.offset(dx, dy);
        if !state.board().in_bounds(beyond) || state.board().piece_at(beyond).is_some() {
            // Nowhere to throw to: pass through, the move lands normally.
            return Intercept::Continue;
        }

        let thrown = GameEvent::new(
            event.actor,
            SourceId::Tile(self.id),
            EventPayload::Move {
                piece: *piece,
                from: *from,
                to: beyond,
                kind: crate::movement::MoveKind::Other,
            },
        );
        Intercept::Replace(vec![thrown])
    }

    /// Consume the trap: destroy whatever just landed here, then turn plain.
    fn snare_after(&self, event: &GameEvent, _state: &GameState) -> Vec<GameEvent> {
        let EventPayload::Move { piece, to, .. } = &event.payload else {
            return Vec::new();
        };
        if *to != self.position {
            return Vec::new();
        }

        let destroy = GameEvent::new(
            event.actor,
            SourceId::Tile(self.id),
            EventPayload::Destroy { piece: *piece },
        );
        let consumed = GameEvent::new(
            event.actor,
            SourceId::Tile(self.id),
            EventPayload::TileChanged {
                at: self.position,
                tile: Tile::new(TileKind::Plain, self.position),
            },
        );
        vec![destroy, consumed]
    }
}
