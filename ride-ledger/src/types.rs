//! Core types for the ride ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Memory safety (no unsafe code)
//! - Exact arithmetic (Decimal for fares)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ride identifier
///
/// Allocated by the registry from a monotone counter: strictly increasing,
/// never reused, first id is 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RideId(u64);

impl RideId {
    /// Create from raw counter value
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw counter value
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Big-endian key bytes (sorts in id order)
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Rebuild from big-endian key bytes
    pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }
}

impl fmt::Display for RideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller identity (wallet address, account handle, etc.)
///
/// Opaque and externally authenticated. The registry only compares it
/// against stored passenger/driver identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerId(String);

impl CallerId {
    /// Create new caller ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty identity means the caller was never resolved
    pub fn is_anonymous(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geographic coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees, [-90, 90]
    pub latitude: f64,

    /// Longitude in degrees, [-180, 180]
    pub longitude: f64,
}

impl Location {
    /// Create a validated location
    pub fn new(latitude: f64, longitude: f64) -> crate::Result<Self> {
        let location = Self {
            latitude,
            longitude,
        };
        location.validate()?;
        Ok(location)
    }

    /// Check coordinate bounds
    pub fn validate(&self) -> crate::Result<()> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(crate::Error::InvalidInput(
                "Coordinates must be finite".to_string(),
            ));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(crate::Error::InvalidInput(format!(
                "Latitude {} out of range [-90, 90]",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(crate::Error::InvalidInput(format!(
                "Longitude {} out of range [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Ride lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RideStatus {
    /// Requested by a passenger, waiting for a driver
    Pending = 1,
    /// Claimed by a driver, trip in progress
    Accepted = 2,
    /// Trip finished by the assigned driver (terminal)
    Completed = 3,
    /// Withdrawn by the passenger before acceptance (terminal)
    Cancelled = 4,
}

impl RideStatus {
    /// Check if status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }

    /// Valid edges: Pending→Accepted, Accepted→Completed, Pending→Cancelled
    pub fn can_transition_to(&self, next: RideStatus) -> bool {
        matches!(
            (self, next),
            (RideStatus::Pending, RideStatus::Accepted)
                | (RideStatus::Accepted, RideStatus::Completed)
                | (RideStatus::Pending, RideStatus::Cancelled)
        )
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RideStatus::Pending => "pending",
            RideStatus::Accepted => "accepted",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Ride record
///
/// Only `status`, `driver` and `updated_at` ever change after creation, and
/// only through the registry's transition operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    /// Registry-allocated identifier
    pub id: RideId,

    /// Passenger who requested the ride
    pub passenger: CallerId,

    /// Assigned driver (None until accepted, immutable once set)
    pub driver: Option<CallerId>,

    /// Pickup coordinates
    pub pickup: Location,

    /// Dropoff coordinates
    pub dropoff: Location,

    /// Current lifecycle status
    pub status: RideStatus,

    /// Fare amount (exact decimal, non-negative)
    pub price: Decimal,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp; strictly increases on every transition
    pub updated_at: DateTime<Utc>,
}

impl Ride {
    /// Check if the ride is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Check if the given caller is the assigned driver
    pub fn is_assigned_driver(&self, caller: &CallerId) -> bool {
        self.driver.as_ref() == Some(caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ride_id_ordering() {
        assert!(RideId::new(1) < RideId::new(2));
        assert_eq!(RideId::from_be_bytes(RideId::new(42).to_be_bytes()), RideId::new(42));
    }

    #[test]
    fn test_caller_id_anonymous() {
        assert!(CallerId::new("").is_anonymous());
        assert!(!CallerId::new("0xCAFE").is_anonymous());
    }

    #[test]
    fn test_location_bounds() {
        assert!(Location::new(6.5, 3.3).is_ok());
        assert!(Location::new(90.0, -180.0).is_ok());
        assert!(Location::new(90.1, 0.0).is_err());
        assert!(Location::new(0.0, 180.5).is_err());
        assert!(Location::new(f64::NAN, 0.0).is_err());
        assert!(Location::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_status_transitions() {
        assert!(RideStatus::Pending.can_transition_to(RideStatus::Accepted));
        assert!(RideStatus::Pending.can_transition_to(RideStatus::Cancelled));
        assert!(RideStatus::Accepted.can_transition_to(RideStatus::Completed));

        assert!(!RideStatus::Pending.can_transition_to(RideStatus::Completed));
        assert!(!RideStatus::Accepted.can_transition_to(RideStatus::Cancelled));
        assert!(!RideStatus::Completed.can_transition_to(RideStatus::Pending));
        assert!(!RideStatus::Cancelled.can_transition_to(RideStatus::Accepted));
    }

    #[test]
    fn test_status_terminal() {
        assert!(!RideStatus::Pending.is_terminal());
        assert!(!RideStatus::Accepted.is_terminal());
        assert!(RideStatus::Completed.is_terminal());
        assert!(RideStatus::Cancelled.is_terminal());
    }
}
