//! The serializable board/map interchange format.
//!
//! Consumed by the map editor and produced by board generators. The shape
//! is deliberately plain: identifiers and coordinates only, no engine IDs.
//! Ability lists are stored innermost-first, i.e. in application order, so
//! reconstruction wraps in list order and `map -> state -> map` is
//! lossless for every identifier the catalog recognizes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{Board, BoardError};
use crate::catalog::{Catalog, CatalogError};
use crate::color::PlayerColor;
use crate::coord::Square;
use crate::game_state::GameState;
use crate::piece::Piece;
use crate::tile::TileKind;

/// One piece entry: kind, owner, coordinates, abilities innermost-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPiece {
    pub kind: String,
    pub owner: String,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub abilities: Vec<String>,
}

/// One non-plain tile entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapTile {
    pub kind: String,
    pub x: i32,
    pub y: i32,
}

/// A complete board description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardMap {
    pub width: i32,
    pub height: i32,
    pub starting_player: String,
    pub pieces: Vec<MapPiece>,
    pub tiles: Vec<MapTile>,
}

impl BoardMap {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<BoardMap> {
        serde_json::from_str(json)
    }
}

/// Map loading failures.
#[derive(Debug, Clone, PartialEq)]
pub enum MapError {
    /// A color string the engine does not know.
    UnknownColor(String),
    /// An identifier the catalog does not know.
    Catalog(CatalogError),
    /// A placement that violates board invariants.
    Placement(BoardError),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::UnknownColor(color) => write!(f, "unknown player color {color:?}"),
            MapError::Catalog(err) => write!(f, "{err}"),
            MapError::Placement(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::Catalog(err) => Some(err),
            MapError::Placement(err) => Some(err),
            MapError::UnknownColor(_) => None,
        }
    }
}

impl From<CatalogError> for MapError {
    fn from(err: CatalogError) -> Self {
        MapError::Catalog(err)
    }
}

impl From<BoardError> for MapError {
    fn from(err: BoardError) -> Self {
        MapError::Placement(err)
    }
}

fn parse_color(s: &str) -> Result<PlayerColor, MapError> {
    PlayerColor::from_identifier(s).ok_or_else(|| MapError::UnknownColor(s.to_string()))
}

/// Build a fresh [`GameState`] from a map.
pub fn state_from_map(map: &BoardMap, catalog: &Catalog) -> Result<GameState, MapError> {
    let starting_player = parse_color(&map.starting_player)?;
    let mut board = Board::new(map.width, map.height);

    for entry in &map.tiles {
        let square = Square::new(entry.x, entry.y);
        let tile = catalog.tile(&entry.kind, square)?;
        board.set_tile(tile, square)?;
    }

    for entry in &map.pieces {
        let owner = parse_color(&entry.owner)?;
        let mut piece = Piece::Base(catalog.base_piece(&entry.kind, owner)?);
        for ability in &entry.abilities {
            piece = catalog.wrap_ability(ability, piece)?;
        }
        board.place_piece(piece, Square::new(entry.x, entry.y))?;
    }

    Ok(GameState::new(board, starting_player))
}

/// Export a state to the map shape. Plain tiles are omitted; ability lists
/// come out innermost-first, matching the input convention.
pub fn map_from_state(state: &GameState) -> BoardMap {
    let board = state.board();

    let pieces = board
        .occupied_squares()
        .into_iter()
        .filter_map(|square| {
            let piece = board.piece_at(square)?;
            let mut abilities: Vec<String> = piece
                .ability_layers()
                .into_iter()
                .map(|(_, kind)| kind.identifier().to_string())
                .collect();
            // Layers list outermost-first; the format wants application order.
            abilities.reverse();
            Some(MapPiece {
                kind: piece.kind().identifier().to_string(),
                owner: piece.owner().identifier().to_string(),
                x: square.x,
                y: square.y,
                abilities,
            })
        })
        .collect();

    let mut tiles = Vec::new();
    for y in 0..board.height() {
        for x in 0..board.width() {
            let square = Square::new(x, y);
            if let Some(tile) = board.tile_at(square) {
                if tile.kind != TileKind::Plain {
                    tiles.push(MapTile {
                        kind: tile.kind.identifier().to_string(),
                        x,
                        y,
                    });
                }
            }
        }
    }

    BoardMap {
        width: board.width(),
        height: board.height(),
        starting_player: state.current_player().identifier().to_string(),
        pieces,
        tiles,
    }
}
