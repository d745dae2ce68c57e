//! The catalog: the only construction surface for external code.
//!
//! Renderers, map editors and the meta-game loop build entities through
//! stable textual identifiers; they never reach into wrap-chain internals
//! except through [`crate::piece::AbilityPiece::inner`] for decoration
//! rendering.

use std::fmt;

use crate::abilities::AbilityKind;
use crate::color::PlayerColor;
use crate::coord::Square;
use crate::piece::{BasePiece, Piece, PieceKind};
use crate::tile::{Tile, TileKind};

/// Value bonus granted by the stock "veteran" ability.
const VETERAN_BONUS: i32 = 50;

/// Lookup failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    UnknownPiece(String),
    UnknownTile(String),
    UnknownAbility(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::UnknownPiece(id) => write!(f, "unknown piece identifier {id:?}"),
            CatalogError::UnknownTile(id) => write!(f, "unknown tile identifier {id:?}"),
            CatalogError::UnknownAbility(id) => write!(f, "unknown ability identifier {id:?}"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Identifier-based construction of pieces, tiles and abilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct Catalog;

impl Catalog {
    pub fn new() -> Self {
        Self
    }

    /// Construct an unpositioned base piece for `owner`.
    pub fn base_piece(
        &self,
        identifier: &str,
        owner: PlayerColor,
    ) -> Result<BasePiece, CatalogError> {
        let kind = PieceKind::from_identifier(identifier)
            .ok_or_else(|| CatalogError::UnknownPiece(identifier.to_string()))?;
        Ok(BasePiece::new(kind, owner))
    }

    /// Construct a tile for a square.
    pub fn tile(&self, identifier: &str, position: Square) -> Result<Tile, CatalogError> {
        let kind = TileKind::from_identifier(identifier)
            .ok_or_else(|| CatalogError::UnknownTile(identifier.to_string()))?;
        Ok(Tile::new(kind, position))
    }

    /// Resolve an ability identifier to its kind.
    pub fn ability_kind(&self, identifier: &str) -> Result<AbilityKind, CatalogError> {
        match identifier {
            "rebounder" => Ok(AbilityKind::Rebounder),
            "ascendant" => Ok(AbilityKind::Ascendant),
            "guardian" => Ok(AbilityKind::Guardian),
            "sentinel" => Ok(AbilityKind::Sentinel),
            "veteran" => Ok(AbilityKind::Veteran {
                bonus: VETERAN_BONUS,
            }),
            _ => Err(CatalogError::UnknownAbility(identifier.to_string())),
        }
    }

    /// Wrap an existing piece in the named ability.
    pub fn wrap_ability(&self, identifier: &str, piece: Piece) -> Result<Piece, CatalogError> {
        Ok(piece.wrap(self.ability_kind(identifier)?))
    }

    pub fn piece_identifiers(&self) -> &'static [&'static str] {
        &["pawn", "knight", "bishop", "rook", "queen", "king"]
    }

    pub fn tile_identifiers(&self) -> &'static [&'static str] {
        &["plain", "wall", "fog", "snare", "ward", "spring"]
    }

    pub fn ability_identifiers(&self) -> &'static [&'static str] {
        &["rebounder", "ascendant", "guardian", "sentinel", "veteran"]
    }
}
