//! The ride registry: shared map of rides plus id allocation
//!
//! The registry is both the data store and the state machine enforcer.
//! Every transition checks its precondition and applies the update while
//! holding the DashMap entry lock for that ride only, so:
//!
//! - two concurrent `accept_ride` calls on one pending ride have exactly
//!   one winner, the loser sees `InvalidState`
//! - operations on different rides never contend beyond shard level
//! - id allocation is a single atomic fetch-add
//!
//! When a store is attached, mutations persist before the in-memory commit;
//! a storage error leaves the map unchanged.

use crate::types::{CallerId, Location, Ride, RideId, RideStatus};
use crate::{Error, Result, Storage};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Authoritative in-memory store of all rides
pub struct RideRegistry {
    /// All rides keyed by id
    rides: DashMap<RideId, Ride>,

    /// Next id to allocate (starts at 1, monotone across restarts)
    next_id: AtomicU64,

    /// Optional write-through persistence
    store: Option<Arc<Storage>>,
}

impl RideRegistry {
    /// Create an empty in-memory registry (counter = 1, no persistence)
    pub fn new() -> Self {
        Self {
            rides: DashMap::new(),
            next_id: AtomicU64::new(1),
            store: None,
        }
    }

    /// Open a registry backed by storage, restoring the full map and counter
    pub fn with_store(store: Arc<Storage>) -> Result<Self> {
        let rides = store.load_rides()?;
        let max_id = rides.iter().map(|r| r.id.value()).max().unwrap_or(0);
        let persisted_next = store.next_id()?.unwrap_or(1);

        // The counter must never fall behind an id already handed out.
        let next_id = persisted_next.max(max_id + 1);

        let map = DashMap::with_capacity(rides.len());
        for ride in rides {
            map.insert(ride.id, ride);
        }

        tracing::info!(
            ride_count = map.len(),
            next_id,
            "Registry restored from storage"
        );

        Ok(Self {
            rides: map,
            next_id: AtomicU64::new(next_id),
            store: Some(store),
        })
    }

    /// Create a new pending ride on behalf of a passenger
    pub fn create_ride(
        &self,
        caller: &CallerId,
        pickup: Location,
        dropoff: Location,
        price: Decimal,
    ) -> Result<Ride> {
        if caller.is_anonymous() {
            return Err(Error::InvalidInput(
                "Caller identity must be resolved".to_string(),
            ));
        }
        pickup.validate()?;
        dropoff.validate()?;
        if price < Decimal::ZERO {
            return Err(Error::InvalidInput(
                "Price must be non-negative".to_string(),
            ));
        }

        let id = RideId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let now = Utc::now();
        let ride = Ride {
            id,
            passenger: caller.clone(),
            driver: None,
            pickup,
            dropoff,
            status: RideStatus::Pending,
            price,
            created_at: now,
            updated_at: now,
        };

        if let Some(store) = &self.store {
            store.insert_ride(&ride, id.value() + 1)?;
        }
        self.rides.insert(id, ride.clone());

        tracing::debug!(ride_id = %id, passenger = %caller, "Ride created");

        Ok(ride)
    }

    /// Look up a ride by id (no authorization check)
    pub fn get_ride(&self, id: RideId) -> Option<Ride> {
        self.rides.get(&id).map(|r| r.value().clone())
    }

    /// All rides requested by the given passenger, in id order
    pub fn passenger_rides(&self, passenger: &CallerId) -> Vec<Ride> {
        self.collect_sorted(|ride| ride.passenger == *passenger)
    }

    /// All rides still waiting for a driver, in id order
    pub fn available_rides(&self) -> Vec<Ride> {
        self.collect_sorted(|ride| ride.status == RideStatus::Pending)
    }

    /// All rides assigned to the given driver, in id order
    pub fn driver_rides(&self, driver: &CallerId) -> Vec<Ride> {
        self.collect_sorted(|ride| ride.is_assigned_driver(driver))
    }

    /// Claim a pending ride as driver
    ///
    /// Atomic per ride: the precondition check and the transition happen
    /// under the entry lock.
    pub fn accept_ride(&self, caller: &CallerId, id: RideId) -> Result<Ride> {
        let mut entry = self
            .rides
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if entry.status != RideStatus::Pending {
            return Err(Error::InvalidState(
                "Ride is not available for acceptance".to_string(),
            ));
        }
        if entry.passenger == *caller {
            return Err(Error::Unauthorized(
                "Passengers cannot accept their own ride".to_string(),
            ));
        }

        let mut updated = entry.clone();
        updated.status = RideStatus::Accepted;
        updated.driver = Some(caller.clone());
        updated.updated_at = next_timestamp(entry.updated_at);

        self.commit(&mut entry, updated)
    }

    /// Finish an accepted ride as the assigned driver
    pub fn complete_ride(&self, caller: &CallerId, id: RideId) -> Result<Ride> {
        let mut entry = self
            .rides
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if !entry.is_assigned_driver(caller) {
            return Err(Error::Unauthorized(
                "Only the assigned driver can complete the ride".to_string(),
            ));
        }
        if entry.status != RideStatus::Accepted {
            return Err(Error::InvalidState(
                "Only an accepted ride can be completed".to_string(),
            ));
        }

        let mut updated = entry.clone();
        updated.status = RideStatus::Completed;
        updated.updated_at = next_timestamp(entry.updated_at);

        self.commit(&mut entry, updated)
    }

    /// Withdraw a pending ride as the requesting passenger
    pub fn cancel_ride(&self, caller: &CallerId, id: RideId) -> Result<Ride> {
        let mut entry = self
            .rides
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if entry.passenger != *caller {
            return Err(Error::Unauthorized(
                "Only the requesting passenger can cancel the ride".to_string(),
            ));
        }
        if entry.status != RideStatus::Pending {
            return Err(Error::InvalidState(
                "Only a pending ride can be cancelled".to_string(),
            ));
        }

        let mut updated = entry.clone();
        updated.status = RideStatus::Cancelled;
        updated.updated_at = next_timestamp(entry.updated_at);

        self.commit(&mut entry, updated)
    }

    /// Total number of rides ever created and still tracked
    pub fn ride_count(&self) -> usize {
        self.rides.len()
    }

    /// Number of rides currently pending
    pub fn pending_count(&self) -> usize {
        self.rides
            .iter()
            .filter(|r| r.status == RideStatus::Pending)
            .count()
    }

    /// Persist (if a store is attached) and commit an already-validated
    /// transition, still holding the entry lock
    fn commit(
        &self,
        entry: &mut dashmap::mapref::one::RefMut<'_, RideId, Ride>,
        updated: Ride,
    ) -> Result<Ride> {
        debug_assert!(entry.status.can_transition_to(updated.status));

        if let Some(store) = &self.store {
            store.put_ride(&updated)?;
        }
        **entry = updated.clone();

        tracing::debug!(
            ride_id = %updated.id,
            status = %updated.status,
            "Ride transitioned"
        );

        Ok(updated)
    }

    fn collect_sorted(&self, predicate: impl Fn(&Ride) -> bool) -> Vec<Ride> {
        let mut rides: Vec<Ride> = self
            .rides
            .iter()
            .filter(|r| predicate(r.value()))
            .map(|r| r.value().clone())
            .collect();
        rides.sort_by_key(|r| r.id);
        rides
    }
}

impl Default for RideRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RideRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RideRegistry")
            .field("rides", &self.rides.len())
            .field("next_id", &self.next_id.load(Ordering::SeqCst))
            .field("persistent", &self.store.is_some())
            .finish()
    }
}

/// Next mutation timestamp: the wall clock, bumped by 1ns if it has not
/// advanced past the previous mutation
fn next_timestamp(prev: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > prev {
        now
    } else {
        prev + Duration::nanoseconds(1)
    }
}
