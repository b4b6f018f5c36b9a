//! Read-only views of room state, decoupled from storage models.
//!
//! The decision layer operates on these snapshots; the service layer
//! maps database rows into them before stepping the flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sphere_core::types::ItemType;
use uuid::Uuid;

use crate::error::AdventError;

/// A point or Euler rotation in the room's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Component-wise equality within `epsilon`.
    #[must_use]
    pub fn approx_eq(self, other: Self, epsilon: f64) -> bool {
        (self.x - other.x).abs() < epsilon
            && (self.y - other.y).abs() < epsilon
            && (self.z - other.z).abs() < epsilon
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl TryFrom<&[f64]> for Vec3 {
    type Error = AdventError;

    fn try_from(value: &[f64]) -> Result<Self, Self::Error> {
        match value {
            [x, y, z] => Ok(Self::new(*x, *y, *z)),
            other => Err(AdventError::InvalidVectorLength(other.len())),
        }
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::new(x, y, z)
    }
}

pub type Position = Vec3;
pub type Rotation = Vec3;

/// The slice of a room the decision layer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomView {
    pub id: Uuid,
    /// Origin of day 1. Immutable for the life of the room.
    pub start_at: DateTime<Utc>,
    /// Calendar date on which the final snowdome part becomes revealable.
    pub snow_dome_parts_last_date: Option<DateTime<Utc>>,
}

/// One reveal slot, joined with the catalog fields the flow consults.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarItemView {
    pub id: Uuid,
    pub item_type: ItemType,
    pub open_date: DateTime<Utc>,
    pub is_opened: bool,
    pub position: Option<Position>,
    pub rotation: Option<Rotation>,
    /// Shared identity of a multi-part collectible's parts.
    pub bundle_id: Option<Uuid>,
}

impl CalendarItemView {
    #[must_use]
    pub const fn is_placed(&self) -> bool {
        self.position.is_some()
    }

    /// Opened but not yet placed in the room.
    #[must_use]
    pub const fn is_in_inventory(&self) -> bool {
        self.is_opened && self.position.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_approx_eq_within_epsilon() {
        let a = Vec3::new(1.0, 0.0, 2.0);
        let b = Vec3::new(1.0004, 0.0, 1.9996);
        assert!(a.approx_eq(b, 0.001));
        assert!(!a.approx_eq(Vec3::new(1.002, 0.0, 2.0), 0.001));
    }

    #[test]
    fn test_vec3_try_from_slice() {
        let v = Vec3::try_from([1.0, 2.0, 3.0].as_slice()).unwrap();
        assert_eq!(v, Vec3::new(1.0, 2.0, 3.0));

        let err = Vec3::try_from([1.0, 2.0].as_slice());
        assert!(matches!(
            err,
            Err(crate::error::AdventError::InvalidVectorLength(2))
        ));
    }
}
