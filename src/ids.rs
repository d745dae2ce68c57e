use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for auto-incrementing piece IDs (starts at 1, 0 is reserved).
static PIECE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);
/// Global counter for auto-incrementing entity IDs (starts at 1, 0 is reserved).
static ENTITY_ID_COUNTER: AtomicU64 = AtomicU64::new(1);
/// Global counter for auto-incrementing tile IDs (starts at 1, 0 is reserved).
static TILE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);
/// Global counter for auto-incrementing event IDs (starts at 1, 0 is reserved).
static EVENT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique piece (or ability wrapper layer) identifier, monotonically increasing.
/// Never reused - a replacement base piece created by promotion gets a new ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(pub u64);

/// Stable creature identifier used across ability wrapping and promotion.
///
/// Effects that target "the base creature" match on this, never on the
/// transient `PieceId` of the outermost wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// Unique tile identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub u64);

/// Unique game event identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u64);

impl PieceId {
    /// Create a new piece ID with auto-incrementing counter.
    pub fn new() -> Self {
        Self(PIECE_ID_COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    /// Create a piece ID from a specific value (for when you need explicit control).
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }
}

impl Default for PieceId {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityId {
    /// Create a new entity ID with auto-incrementing counter.
    pub fn new() -> Self {
        Self(ENTITY_ID_COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    /// Create an entity ID from a specific value (for when you need explicit control).
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl TileId {
    /// Create a new tile ID with auto-incrementing counter.
    pub fn new() -> Self {
        Self(TILE_ID_COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    /// Create a tile ID from a specific value (for when you need explicit control).
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }
}

impl Default for TileId {
    fn default() -> Self {
        Self::new()
    }
}

impl EventId {
    /// Create a new event ID with auto-incrementing counter.
    pub fn new() -> Self {
        Self(EVENT_ID_COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    /// Create an event ID from a specific value (for when you need explicit control).
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

/// Reset all ID counters to their initial state (for testing).
/// This should only be used in tests to ensure deterministic behavior.
#[cfg(test)]
pub fn reset_id_counters() {
    PIECE_ID_COUNTER.store(1, Ordering::SeqCst);
    ENTITY_ID_COUNTER.store(1, Ordering::SeqCst);
    TILE_ID_COUNTER.store(1, Ordering::SeqCst);
    EVENT_ID_COUNTER.store(1, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_id_auto_increment() {
        let p1 = PieceId::new();
        let p2 = PieceId::new();
        assert_ne!(p1, p2);
        assert!(p1 < p2);
    }

    #[test]
    fn test_entity_id_from_raw() {
        let e1 = EntityId::from_raw(100);
        let e2 = EntityId::from_raw(200);
        assert_ne!(e1, e2);
        assert_eq!(e1.0, 100);
        assert_eq!(e2.0, 200);
    }

    #[test]
    fn test_event_id_auto_increment() {
        let e1 = EventId::new();
        let e2 = EventId::new();
        assert_ne!(e1, e2);
    }

    #[test]
    fn test_tile_id_auto_increment() {
        let t1 = TileId::new();
        let t2 = TileId::new();
        assert_ne!(t1, t2);
    }
}
