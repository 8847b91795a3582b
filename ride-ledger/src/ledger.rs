//! Main ledger orchestration layer
//!
//! This module ties together storage, registry, actor and metrics into a
//! high-level API for ride lifecycle processing.
//!
//! # Example
//!
//! ```no_run
//! use ride_ledger::{Config, RideLedger};
//!
//! #[tokio::main]
//! async fn main() -> ride_ledger::Result<()> {
//!     let config = Config::default();
//!     let ledger = RideLedger::open(config).await?;
//!
//!     // let ride = ledger.create_ride(caller, pickup, dropoff, price).await?;
//!
//!     ledger.shutdown().await?;
//!     Ok(())
//! }
//! ```

use crate::actor::{spawn_registry_actor, RegistryHandle};
use crate::types::{CallerId, Location, Ride, RideId};
use crate::{Config, Error, Metrics, Result, RideRegistry, Storage};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;

/// Main ride ledger interface
///
/// Mutations go through the actor handle; reads are lock-free snapshots
/// taken directly from the registry.
#[derive(Debug)]
pub struct RideLedger {
    /// Actor handle for async operations
    handle: RegistryHandle,

    /// Shared registry (for direct reads)
    registry: Arc<RideRegistry>,

    /// Prometheus metrics
    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl RideLedger {
    /// Open ledger with configuration
    pub async fn open(config: Config) -> Result<Self> {
        let registry = if config.persistence.enabled {
            let storage = Arc::new(Storage::open(&config)?);
            RideRegistry::with_store(storage)?
        } else {
            RideRegistry::new()
        };
        let registry = Arc::new(registry);

        let handle = spawn_registry_actor(Arc::clone(&registry));

        let metrics = Metrics::new().map_err(|e| Error::Config(e.to_string()))?;
        metrics.pending_rides.set(registry.pending_count() as i64);

        tracing::info!(
            service = %config.service_name,
            version = %config.service_version,
            persistent = config.persistence.enabled,
            rides = registry.ride_count(),
            "Ride ledger opened"
        );

        Ok(Self {
            handle,
            registry,
            metrics,
            config,
        })
    }

    /// Create a new pending ride on behalf of a passenger
    pub async fn create_ride(
        &self,
        caller: CallerId,
        pickup: Location,
        dropoff: Location,
        price: Decimal,
    ) -> Result<Ride> {
        let start = Instant::now();
        let result = self.handle.create_ride(caller, pickup, dropoff, price).await;
        self.metrics
            .record_operation_duration(start.elapsed().as_secs_f64());

        if result.is_ok() {
            self.metrics.record_ride_created();
        }
        result
    }

    /// Look up a ride by id
    pub fn get_ride(&self, id: RideId) -> Option<Ride> {
        self.registry.get_ride(id)
    }

    /// All rides requested by the given passenger
    pub fn passenger_rides(&self, passenger: &CallerId) -> Vec<Ride> {
        self.registry.passenger_rides(passenger)
    }

    /// All rides still waiting for a driver
    pub fn available_rides(&self) -> Vec<Ride> {
        self.registry.available_rides()
    }

    /// All rides assigned to the given driver
    pub fn driver_rides(&self, driver: &CallerId) -> Vec<Ride> {
        self.registry.driver_rides(driver)
    }

    /// Claim a pending ride as driver
    pub async fn accept_ride(&self, caller: CallerId, id: RideId) -> Result<Ride> {
        let start = Instant::now();
        let result = self.handle.accept_ride(caller, id).await;
        self.metrics
            .record_operation_duration(start.elapsed().as_secs_f64());

        match &result {
            Ok(_) => self.metrics.record_ride_accepted(),
            Err(Error::InvalidState(_)) => self.metrics.record_rejected_transition(),
            Err(_) => {}
        }
        result
    }

    /// Finish an accepted ride as the assigned driver
    pub async fn complete_ride(&self, caller: CallerId, id: RideId) -> Result<Ride> {
        let start = Instant::now();
        let result = self.handle.complete_ride(caller, id).await;
        self.metrics
            .record_operation_duration(start.elapsed().as_secs_f64());

        match &result {
            Ok(_) => self.metrics.record_ride_completed(),
            Err(Error::InvalidState(_)) => self.metrics.record_rejected_transition(),
            Err(_) => {}
        }
        result
    }

    /// Withdraw a pending ride as the requesting passenger
    pub async fn cancel_ride(&self, caller: CallerId, id: RideId) -> Result<Ride> {
        let start = Instant::now();
        let result = self.handle.cancel_ride(caller, id).await;
        self.metrics
            .record_operation_duration(start.elapsed().as_secs_f64());

        match &result {
            Ok(_) => self.metrics.record_ride_cancelled(),
            Err(Error::InvalidState(_)) => self.metrics.record_rejected_transition(),
            Err(_) => {}
        }
        result
    }

    /// Current ledger statistics
    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            total_rides: self.registry.ride_count(),
            pending_rides: self.registry.pending_count(),
        }
    }

    /// Metrics collector (for scrape endpoints)
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Configuration this ledger was opened with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shutdown ledger
    ///
    /// Returns once the actor and any in-flight operations have released
    /// the registry, so a persistent ledger can be reopened immediately.
    pub async fn shutdown(self) -> Result<()> {
        let RideLedger {
            handle, registry, ..
        } = self;

        handle.shutdown().await?;
        drop(handle);

        while Arc::strong_count(&registry) > 1 {
            tokio::task::yield_now().await;
        }
        Ok(())
    }
}

/// Ledger statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerStats {
    /// Total rides tracked
    pub total_rides: usize,

    /// Rides currently pending
    pub pending_rides: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RideStatus;

    fn memory_config() -> Config {
        let mut config = Config::default();
        config.persistence.enabled = false;
        config
    }

    fn persistent_config(dir: &tempfile::TempDir) -> Config {
        let mut config = Config::default();
        config.data_dir = dir.path().to_path_buf();
        config
    }

    fn locations() -> (Location, Location) {
        (
            Location::new(6.5, 3.3).unwrap(),
            Location::new(5.0, 7.5).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_ledger_open_in_memory() {
        let ledger = RideLedger::open(memory_config()).await.unwrap();
        assert_eq!(ledger.stats().total_rides, 0);
        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_ledger_lifecycle_and_metrics() {
        let ledger = RideLedger::open(memory_config()).await.unwrap();
        let (pickup, dropoff) = locations();
        let passenger = CallerId::new("0xP");
        let driver = CallerId::new("0xD");

        let ride = ledger
            .create_ride(passenger.clone(), pickup, dropoff, Decimal::TEN)
            .await
            .unwrap();
        assert_eq!(ledger.metrics().rides_created.get(), 1);
        assert_eq!(ledger.metrics().pending_rides.get(), 1);
        assert_eq!(ledger.stats().pending_rides, 1);

        ledger.accept_ride(driver.clone(), ride.id).await.unwrap();
        assert_eq!(ledger.metrics().rides_accepted.get(), 1);
        assert_eq!(ledger.metrics().pending_rides.get(), 0);

        // A racing driver loses and shows up as a rejected transition
        let loser = ledger.accept_ride(CallerId::new("0xD2"), ride.id).await;
        assert!(matches!(loser, Err(Error::InvalidState(_))));
        assert_eq!(ledger.metrics().rejected_transitions.get(), 1);

        ledger.complete_ride(driver, ride.id).await.unwrap();
        assert_eq!(ledger.metrics().rides_completed.get(), 1);

        let stored = ledger.get_ride(ride.id).unwrap();
        assert_eq!(stored.status, RideStatus::Completed);
        assert!(stored.updated_at > stored.created_at);

        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_ledger_cancel() {
        let ledger = RideLedger::open(memory_config()).await.unwrap();
        let (pickup, dropoff) = locations();
        let passenger = CallerId::new("0xP");

        let ride = ledger
            .create_ride(passenger.clone(), pickup, dropoff, Decimal::TEN)
            .await
            .unwrap();
        ledger.cancel_ride(passenger, ride.id).await.unwrap();

        assert_eq!(ledger.metrics().rides_cancelled.get(), 1);
        assert_eq!(ledger.get_ride(ride.id).unwrap().status, RideStatus::Cancelled);
        assert!(ledger.available_rides().is_empty());

        ledger.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_ledger_restores_across_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let (pickup, dropoff) = locations();
        let passenger = CallerId::new("0xP");
        let driver = CallerId::new("0xD");

        let first_id = {
            let ledger = RideLedger::open(persistent_config(&temp_dir)).await.unwrap();
            let ride = ledger
                .create_ride(passenger.clone(), pickup, dropoff, Decimal::TEN)
                .await
                .unwrap();
            ledger.accept_ride(driver.clone(), ride.id).await.unwrap();
            ledger.shutdown().await.unwrap();
            ride.id
        };

        let ledger = RideLedger::open(persistent_config(&temp_dir)).await.unwrap();

        // Full map restored, including the in-flight transition
        let restored = ledger.get_ride(first_id).unwrap();
        assert_eq!(restored.status, RideStatus::Accepted);
        assert_eq!(restored.driver, Some(driver));

        // Counter keeps increasing, never reuses an id
        let next = ledger
            .create_ride(passenger, pickup, dropoff, Decimal::ONE)
            .await
            .unwrap();
        assert!(next.id > first_id);

        ledger.shutdown().await.unwrap();
    }
}
