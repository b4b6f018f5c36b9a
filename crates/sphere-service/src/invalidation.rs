//! Cache invalidation signals.
//!
//! After a successful write, dependent room views must be refetched.
//! The service signals which ones; the caller owns the cache.

use uuid::Uuid;

/// A cached view of a room's slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomViewKey {
    /// Every slot, drawer states included.
    CalendarItems,
    /// Opened, unplaced slots.
    Inventory,
    /// Slots placed in the 3D scene.
    Placed,
}

/// Views to refetch after a write.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Invalidation {
    pub room_id: Uuid,
    pub views: Vec<RoomViewKey>,
}

impl Invalidation {
    /// Every slot-derived view of the room. Open/place/return writes
    /// touch all three.
    #[must_use]
    pub fn slot_views(room_id: Uuid) -> Self {
        Self {
            room_id,
            views: vec![
                RoomViewKey::CalendarItems,
                RoomViewKey::Inventory,
                RoomViewKey::Placed,
            ],
        }
    }
}
