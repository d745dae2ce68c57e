pub mod abilities;
pub mod board;
pub mod catalog;
pub mod color;
pub mod coord;
pub mod event_processor;
pub mod events;
pub mod game_state;
pub mod ids;
#[cfg(feature = "serialization")]
pub mod map;
pub mod movement;
pub mod piece;
pub mod ruleset;
pub mod search;
pub mod tile;
pub mod turn;

pub use abilities::{ascension_target, AbilityKind};
pub use board::{Board, BoardError};
pub use catalog::{Catalog, CatalogError};
pub use color::PlayerColor;
pub use coord::Square;
pub use event_processor::{
    dispatch_events, CommittedEvent, DispatchConfig, DispatchError, DispatchOutcome,
};
pub use events::{EventPayload, GameEvent, Intercept, SourceId};
pub use game_state::GameState;
pub use ids::{EntityId, EventId, PieceId, TileId};
#[cfg(feature = "serialization")]
pub use map::{map_from_state, state_from_map, BoardMap, MapError, MapPiece, MapTile};
pub use movement::{
    jump_moves, kind_moves, pawn_moves, ray_moves, slide_moves, CandidateMoves, Move, MoveKind,
};
pub use piece::{AbilityPiece, BasePiece, Piece, PieceKind};
pub use ruleset::{
    apply_tile_restrictions, legal_moves_for_player, LastPieceStanding, Ruleset, Verdict,
};
pub use search::{static_eval, SearchConfig, SearchError, SearchResult, Searcher};
pub use tile::{Restriction, Tile, TileKind};
pub use turn::{simulate_move, GameClock, TurnError, TurnManager};
