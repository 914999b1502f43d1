//! Inventory data model: target kinds, quantities and capacity snapshots.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::TargetId;

/// The kind of bookable target a capacity counter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Seats on a trip.
    Trip,
    /// Seats in a time-boxed activity slot.
    ActivitySlot,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Trip => "trip",
            TargetKind::ActivitySlot => "activity_slot",
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when a string does not name a known target kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown target kind: {0}")]
pub struct UnknownTargetKind(pub String);

impl std::str::FromStr for TargetKind {
    type Err = UnknownTargetKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trip" => Ok(TargetKind::Trip),
            "activity_slot" => Ok(TargetKind::ActivitySlot),
            other => Err(UnknownTargetKind(other.to_string())),
        }
    }
}

/// Returned when a requested quantity is not a positive integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid quantity: {0} (must be at least 1)")]
pub struct InvalidQuantity(pub i64);

/// A validated, strictly positive number of seats.
///
/// Zero or negative quantities are rejected at construction, so stores never
/// see them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Quantity(u32);

impl Quantity {
    /// Validates a raw quantity.
    pub fn new(value: i64) -> Result<Self, InvalidQuantity> {
        if value < 1 || value > i64::from(u32::MAX) {
            return Err(InvalidQuantity(value));
        }
        Ok(Self(value as u32))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for Quantity {
    type Error = InvalidQuantity;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i64 {
    fn from(q: Quantity) -> Self {
        i64::from(q.0)
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Committed capacity state of a single inventory target.
///
/// Invariant: `available_capacity <= max_capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacity {
    pub target_id: TargetId,
    pub target_kind: TargetKind,
    pub max_capacity: u32,
    pub available_capacity: u32,
}

impl Capacity {
    /// Creates a capacity snapshot at full availability.
    pub fn full(target_id: TargetId, target_kind: TargetKind, max_capacity: u32) -> Self {
        Self {
            target_id,
            target_kind,
            max_capacity,
            available_capacity: max_capacity,
        }
    }

    /// Seats currently held by confirmed reservations.
    pub fn reserved(&self) -> u32 {
        self.max_capacity - self.available_capacity
    }

    /// Returns true if `quantity` seats can be taken right now.
    pub fn can_reserve(&self, quantity: Quantity) -> bool {
        self.available_capacity >= quantity.get()
    }
}
